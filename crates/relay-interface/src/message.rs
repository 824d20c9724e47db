use crate::common_derives;

pub const PROTOCOL_VERSION: u32 = 1;

common_derives! {
    #[derive(Copy, Eq, Hash)]
    #[serde(rename_all = "lowercase")]
    pub enum Role {
        Host,
        Remote,
    }
}

common_derives! {
    /// Frames a peer sends to the relay.
    #[serde(tag = "t", rename_all = "camelCase")]
    pub enum PeerMessage {
        Hello {
            role: Role,
            #[serde(default, skip_serializing_if = "Option::is_none")]
            id: Option<String>,
            #[serde(default, skip_serializing_if = "Option::is_none")]
            version: Option<u32>,
        },
        /// Forwarded to the host as received; only the host interprets `cmd`.
        Cmd {
            #[serde(default)]
            cmd: serde_json::Value,
        },
        /// A missing `state` reads as `null`.
        State {
            #[serde(default)]
            state: serde_json::Value,
        },
    }
}

impl PeerMessage {
    pub fn host_hello() -> Self {
        Self::Hello {
            role: Role::Host,
            id: None,
            version: Some(PROTOCOL_VERSION),
        }
    }

    pub fn remote_hello(id: impl Into<String>) -> Self {
        Self::Hello {
            role: Role::Remote,
            id: Some(id.into()),
            version: Some(PROTOCOL_VERSION),
        }
    }

    pub fn command(cmd: crate::Command) -> Self {
        Self::Cmd {
            cmd: serde_json::Value::String(cmd.to_string()),
        }
    }
}

common_derives! {
    /// Frames the relay sends to peers. `Cmd` and `State` are forwarded
    /// from the opposite side of the session.
    #[serde(tag = "t", rename_all = "camelCase")]
    pub enum RelayMessage {
        Session {
            id: String,
        },
        Ok,
        Err {
            message: String,
        },
        Cmd {
            cmd: String,
        },
        State {
            #[serde(default)]
            state: serde_json::Value,
        },
        RemoteCount {
            n: usize,
        },
    }
}

impl RelayMessage {
    pub fn err(message: impl Into<String>) -> Self {
        Self::Err {
            message: message.into(),
        }
    }

    pub fn to_json(&self) -> String {
        // Every variant serializes to a JSON object with string keys.
        serde_json::to_string(self).unwrap_or_default()
    }
}
