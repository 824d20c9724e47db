use serde_json::{Map, Value};

use crate::common_derives;

pub const MAX_SCROLL_SPEED: u32 = 160;

common_derives! {
    /// Full prompter state as mirrored to remotes.
    ///
    /// `settings` is kept opaque so the relay and older remotes do not need
    /// to know every option a host may add. Hosts read it through
    /// [`Settings`].
    #[serde(rename_all = "camelCase")]
    pub struct StateSnapshot {
        pub script: String,
        pub position: usize,
        pub running: bool,
        #[serde(default)]
        pub settings: Value,
    }
}

impl StateSnapshot {
    pub fn new(script: impl Into<String>, position: usize, running: bool, settings: &Settings) -> Self {
        Self {
            script: script.into(),
            position,
            running,
            settings: settings.to_value(),
        }
    }

    /// Typed view over `settings`, falling back to defaults if the host sent
    /// something unreadable.
    pub fn typed_settings(&self) -> Settings {
        serde_json::from_value(self.settings.clone()).unwrap_or_default()
    }
}

common_derives! {
    #[derive(Copy, Eq, Default)]
    #[serde(rename_all = "lowercase")]
    pub enum Mode {
        #[default]
        Voice,
        Auto,
    }
}

common_derives! {
    #[serde(rename_all = "camelCase", default)]
    pub struct Settings {
        pub mode: Mode,
        pub scroll_speed: u32,
        pub language: String,
        pub countdown: bool,
        /// Options this build does not interpret, carried through untouched.
        #[serde(flatten)]
        pub extra: Map<String, Value>,
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            mode: Mode::Voice,
            scroll_speed: 30,
            language: "en-US".to_string(),
            countdown: true,
            extra: Map::new(),
        }
    }
}

impl Settings {
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    /// Change the scroll speed by `delta`, clamped to `0..=160`.
    pub fn nudge_speed(&mut self, delta: i32) -> u32 {
        let next = (self.scroll_speed as i64 + delta as i64).clamp(0, MAX_SCROLL_SPEED as i64);
        self.scroll_speed = next as u32;
        self.scroll_speed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn snapshot_wire_shape() {
        let snapshot = StateSnapshot::new("Hello world.", 1, true, &Settings::default());
        let value = serde_json::to_value(&snapshot).unwrap();

        assert_eq!(
            value,
            json!({
                "script": "Hello world.",
                "position": 1,
                "running": true,
                "settings": {
                    "mode": "voice",
                    "scrollSpeed": 30,
                    "language": "en-US",
                    "countdown": true
                }
            })
        );
    }

    #[test]
    fn unknown_settings_survive() {
        let raw = json!({"mode": "auto", "fontSize": 48, "mirror": true});
        let settings: Settings = serde_json::from_value(raw).unwrap();

        assert_eq!(settings.mode, Mode::Auto);
        assert_eq!(settings.scroll_speed, 30);
        assert_eq!(settings.extra["fontSize"], json!(48));
        assert_eq!(settings.to_value()["mirror"], json!(true));
    }

    #[test]
    fn unreadable_settings_fall_back() {
        let snapshot = StateSnapshot {
            script: String::new(),
            position: 0,
            running: false,
            settings: json!("nonsense"),
        };
        assert_eq!(snapshot.typed_settings(), Settings::default());
    }

    #[test]
    fn speed_is_clamped() {
        let mut settings = Settings::default();
        assert_eq!(settings.nudge_speed(5), 35);
        assert_eq!(settings.nudge_speed(-100), 0);
        assert_eq!(settings.nudge_speed(500), 160);
    }
}
