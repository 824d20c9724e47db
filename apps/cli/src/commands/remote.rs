use std::io;

use tokio::io::{AsyncBufReadExt, BufReader};

use vp_prompter_core::{LinkConfig, RemoteController};
use vp_relay_interface::SessionId;

use crate::RemoteArgs;
use crate::input::parse_command;
use crate::runtime::print_remote_event;

pub async fn run(args: RemoteArgs) -> io::Result<()> {
    let session = SessionId::parse(&args.session).ok_or_else(|| {
        io::Error::new(io::ErrorKind::InvalidInput, "session id must not be empty")
    })?;

    tracing::info!(session_id = %session, url = %args.relay_url, "remote_starting");
    let remote = RemoteController::spawn(LinkConfig::remote(args.relay_url), session, |event| {
        print_remote_event(&event)
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            line = lines.next_line() => match line? {
                Some(line) => line,
                None => break,
            },
        };
        if line.trim().is_empty() {
            continue;
        }

        match parse_command(&line) {
            Ok(command) => {
                remote.send(command);
            }
            Err(e) => eprintln!("{e}"),
        }
    }

    remote.shutdown();
    Ok(())
}
