use std::fmt;

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// The persisted session: an API key and the nickname classifications are
/// recorded under. Both are forwarded as-is.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    #[serde(rename = "apiKey")]
    pub api_key: String,
    pub nickname: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &"<redacted>")
            .field("nickname", &self.nickname)
            .finish()
    }
}

/// Owner of the persisted session values.
pub trait SessionProvider {
    fn read(&self) -> Result<Option<Credentials>>;
    fn write(&mut self, credentials: &Credentials) -> Result<()>;
    /// Removes both the key and the nickname.
    fn clear(&mut self) -> Result<()>;
}

/// In-process session, used by tests.
#[derive(Clone, Debug, Default)]
pub struct MemorySession {
    pub credentials: Option<Credentials>,
}

impl MemorySession {
    pub fn with(credentials: Credentials) -> Self {
        Self {
            credentials: Some(credentials),
        }
    }
}

impl SessionProvider for MemorySession {
    fn read(&self) -> Result<Option<Credentials>> {
        Ok(self.credentials.clone())
    }

    fn write(&mut self, credentials: &Credentials) -> Result<()> {
        self.credentials = Some(credentials.clone());
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        self.credentials = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_api_key() {
        let creds = Credentials {
            api_key: "super-secret".into(),
            nickname: "ann".into(),
        };
        let printed = format!("{creds:?}");
        assert!(!printed.contains("super-secret"));
        assert!(printed.contains("ann"));
    }

    #[test]
    fn test_memory_session_clear() {
        let mut session = MemorySession::with(Credentials {
            api_key: "k".into(),
            nickname: "n".into(),
        });
        assert!(session.read().unwrap().is_some());
        session.clear().unwrap();
        assert!(session.read().unwrap().is_none());
    }
}
