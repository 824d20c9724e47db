use std::fmt;

/// Eight upper-case hex characters naming a relay session.
///
/// Remotes may type or paste the id in any case; [`SessionId::parse`] trims
/// it and folds it to upper case before lookup.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(String);

impl SessionId {
    pub const BYTES: usize = 4;

    pub fn generate() -> Self {
        let bytes: [u8; Self::BYTES] = rand::random();
        Self(hex::encode_upper(bytes))
    }

    /// Accepts any casing and surrounding whitespace. Returns `None` for
    /// an empty id. The id is not otherwise validated; unknown ids simply
    /// fail the lookup.
    pub fn parse(raw: &str) -> Option<Self> {
        let id = raw.trim();
        if id.is_empty() {
            None
        } else {
            Some(Self(id.to_uppercase()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for SessionId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_are_upper_hex() {
        for _ in 0..32 {
            let id = SessionId::generate();
            assert_eq!(id.as_str().len(), 8);
            assert!(
                id.as_str()
                    .chars()
                    .all(|c| c.is_ascii_digit() || ('A'..='F').contains(&c))
            );
        }
    }

    #[test]
    fn parse_folds_case() {
        assert_eq!(
            SessionId::parse(" ab12cd34 ").unwrap().as_str(),
            "AB12CD34"
        );
        assert!(SessionId::parse("  ").is_none());
    }

    #[test]
    fn parse_trims_pasted_ids() {
        assert_eq!(
            SessionId::parse("\tDEADBEEF\r\n").unwrap(),
            SessionId::parse("deadbeef").unwrap()
        );
    }
}
