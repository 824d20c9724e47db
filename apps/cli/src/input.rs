//! Line protocol for the terminal host.
//!
//! `/start`, `/stop` and `/<command>` (`/nextWord`, `/faster`, ...) drive the
//! prompter. `~ text` is an interim hypothesis, any other line a final one.

use std::str::FromStr;

use vp_relay_interface::Command;
use vp_tracker::Hypothesis;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostInput {
    Start,
    Stop,
    Command(Command),
    Hypothesis(Hypothesis),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("unknown command: /{0}")]
    UnknownCommand(String),
}

pub fn parse_host_line(line: &str) -> Result<Option<HostInput>, ParseError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }

    if let Some(name) = line.strip_prefix('/') {
        let input = match name {
            "start" => HostInput::Start,
            "stop" => HostInput::Stop,
            _ => HostInput::Command(parse_command(name)?),
        };
        return Ok(Some(input));
    }

    let hypothesis = match line.strip_prefix('~') {
        Some(text) => Hypothesis::new(text.trim(), false),
        None => Hypothesis::new(line, true),
    };
    Ok(Some(HostInput::Hypothesis(hypothesis)))
}

pub fn parse_command(name: &str) -> Result<Command, ParseError> {
    let name = name.trim().trim_start_matches('/');
    Command::from_str(name).map_err(|_| ParseError::UnknownCommand(name.to_string()))
}
