use serde_json::json;

use vp_prompter_core::{DisplayEvent, HostLinkEvent, PrompterRuntime, RemoteEvent};

/// Prints every prompter event as one JSON object per line on stdout.
pub struct StdoutRuntime;

impl StdoutRuntime {
    fn print(value: serde_json::Value) {
        println!("{value}");
    }
}

impl PrompterRuntime for StdoutRuntime {
    fn emit_display(&self, event: DisplayEvent) {
        Self::print(json!({ "display": event }));
    }

    fn emit_status(&self, status: &str) {
        Self::print(json!({ "status": status }));
    }

    fn emit_link(&self, event: HostLinkEvent) {
        Self::print(json!({ "link": event }));
    }
}

pub fn print_remote_event(event: &RemoteEvent) {
    let value = match event {
        RemoteEvent::Connected => json!({ "remote": "connected" }),
        RemoteEvent::Accepted => json!({ "remote": "accepted" }),
        RemoteEvent::State(snapshot) => json!({
            "remote": "state",
            "position": snapshot.position,
            "running": snapshot.running,
            "settings": snapshot.settings,
        }),
        RemoteEvent::RemoteCount(n) => json!({ "remote": "remoteCount", "n": n }),
        RemoteEvent::Error(message) => json!({ "remote": "error", "message": message }),
        RemoteEvent::Disconnected => json!({ "remote": "disconnected" }),
    };
    println!("{value}");
}
