use std::io;
use std::sync::Arc;

use serde_json::json;
use tokio::io::{AsyncBufReadExt, BufReader};

use vp_prompter_core::{
    BroadcastSource, LinkConfig, PrompterArgs, PrompterMsg, spawn_prompter,
};
use vp_relay_interface::Settings;

use crate::HostArgs;
use crate::input::{HostInput, parse_host_line};
use crate::runtime::StdoutRuntime;

pub async fn run(args: HostArgs) -> io::Result<()> {
    let script = std::fs::read_to_string(&args.script)?;

    let settings = Settings {
        mode: args.mode.into(),
        scroll_speed: args.scroll_speed,
        language: args.language,
        countdown: !args.no_countdown,
        ..Settings::default()
    };

    let source = BroadcastSource::new(64);
    let mut prompter_args = PrompterArgs::new(Arc::new(StdoutRuntime))
        .with_script(script)
        .with_settings(settings)
        .with_source(Arc::new(source.clone()));
    if let Some(url) = args.relay_url {
        prompter_args = prompter_args.with_relay(LinkConfig::host(url));
    }

    let (prompter, handle) = spawn_prompter(prompter_args)
        .await
        .map_err(io::Error::other)?;

    let (_, mut local) = ractor::call!(prompter, PrompterMsg::SubscribeLocal)
        .map_err(|e| io::Error::other(e.to_string()))?;
    tokio::spawn(async move {
        while let Ok(snapshot) = local.recv().await {
            println!(
                "{}",
                json!({ "snapshot": { "position": snapshot.position, "running": snapshot.running } })
            );
        }
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

        let msg = match parse_host_line(&line) {
            Ok(Some(HostInput::Start)) => PrompterMsg::Start,
            Ok(Some(HostInput::Stop)) => PrompterMsg::Stop,
            Ok(Some(HostInput::Command(command))) => PrompterMsg::Command(command),
            Ok(Some(HostInput::Hypothesis(hypothesis))) => {
                if !source.push(Ok(hypothesis)) {
                    tracing::debug!("hypothesis_ignored_not_listening");
                }
                continue;
            }
            Ok(None) => continue,
            Err(e) => {
                eprintln!("{e}");
                continue;
            }
        };

        if prompter.cast(msg).is_err() {
            break;
        }
    }

    prompter.stop(None);
    let _ = handle.await;
    Ok(())
}
