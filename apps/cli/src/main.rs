mod commands;
mod input;
mod runtime;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::prelude::*;

use vp_relay_interface::Mode;

#[derive(Parser)]
#[command(name = "vp", about = "Voice prompter in the terminal")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a prompter host. Reads hypotheses and commands from stdin.
    Host(HostArgs),
    /// Join a host's relay session as a remote control.
    Remote(RemoteArgs),
}

#[derive(clap::Args)]
pub struct HostArgs {
    /// Script file to load.
    script: std::path::PathBuf,

    /// Relay WebSocket endpoint, e.g. ws://192.168.1.20:32177/ws.
    #[arg(long, env = "VP_RELAY_URL")]
    relay_url: Option<String>,

    #[arg(long, env = "VP_LANGUAGE", default_value = "en-US")]
    language: String,

    #[arg(long, env = "VP_MODE", value_enum, default_value_t = ModeArg::Voice)]
    mode: ModeArg,

    #[arg(long, env = "VP_SCROLL_SPEED", default_value_t = 30)]
    scroll_speed: u32,

    /// Skip the 3-2-1 countdown on start.
    #[arg(long, env = "VP_NO_COUNTDOWN")]
    no_countdown: bool,
}

#[derive(clap::Args)]
pub struct RemoteArgs {
    /// Session id shown by the host.
    session: String,

    #[arg(long, env = "VP_RELAY_URL")]
    relay_url: String,
}

#[derive(Clone, Copy, ValueEnum)]
enum ModeArg {
    Voice,
    Auto,
}

impl From<ModeArg> for Mode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Voice => Mode::Voice,
            ModeArg::Auto => Mode::Auto,
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let result = match cli.command {
        Commands::Host(args) => commands::host::run(args).await,
        Commands::Remote(args) => commands::remote::run(args).await,
    };

    if let Err(e) = result {
        eprintln!("vp: {e}");
        std::process::exit(1);
    }
}
