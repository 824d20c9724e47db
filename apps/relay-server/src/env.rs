use std::path::Path;

use serde::{Deserialize, Deserializer};

#[derive(Debug, Deserialize)]
pub struct Env {
    /// Fixed port. When unset the server walks the default port list.
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default, deserialize_with = "filter_empty")]
    pub sentry_dsn: Option<String>,
}

fn filter_empty<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.trim().is_empty()))
}

pub fn load() -> Result<Env, envy::Error> {
    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));
    let _ = dotenvy::from_path(manifest_dir.join(".env"));
    let _ = dotenvy::dotenv();
    envy::from_env()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(vars: &[(&str, &str)]) -> Env {
        envy::from_iter(
            vars.iter()
                .map(|(k, v)| (k.to_string(), v.to_string())),
        )
        .unwrap()
    }

    #[test]
    fn defaults_when_unset() {
        let env = parse(&[]);
        assert_eq!(env.port, None);
        assert_eq!(env.sentry_dsn, None);
    }

    #[test]
    fn empty_dsn_is_unset() {
        let env = parse(&[("SENTRY_DSN", "  "), ("PORT", "40000")]);
        assert_eq!(env.port, Some(40000));
        assert_eq!(env.sentry_dsn, None);
    }
}
