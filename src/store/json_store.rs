use std::fs;
use std::io::{ErrorKind, Write};
use std::path::PathBuf;

use anyhow::Result;
use tracing::{info, warn};

use crate::store::session::{Credentials, SessionProvider};

const SESSION_FILE: &str = "session.json";

/// Session persisted as JSON under the user's data directory.
pub struct JsonSessionStore {
    base_dir: PathBuf,
}

impl JsonSessionStore {
    pub fn new() -> Result<Self> {
        let base_dir = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("peerclass");
        Self::with_base_dir(base_dir)
    }

    pub fn with_base_dir(base_dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&base_dir)?;
        Ok(Self { base_dir })
    }

    fn file_path(&self) -> PathBuf {
        self.base_dir.join(SESSION_FILE)
    }
}

impl SessionProvider for JsonSessionStore {
    /// A missing file is no session. So is an unreadable one: the user is
    /// sent back to the login screen rather than stuck on a parse error.
    fn read(&self) -> Result<Option<Credentials>> {
        let path = self.file_path();
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        match serde_json::from_str::<Credentials>(&content) {
            Ok(creds) if !creds.api_key.is_empty() => Ok(Some(creds)),
            Ok(_) => Ok(None),
            Err(e) => {
                warn!(path = %path.display(), %e, "ignoring unreadable session file");
                Ok(None)
            }
        }
    }

    fn write(&mut self, credentials: &Credentials) -> Result<()> {
        let path = self.file_path();
        let tmp_path = path.with_extension("tmp");

        let json = serde_json::to_string_pretty(credentials)?;
        let mut file = fs::File::create(&tmp_path)?;
        file.write_all(json.as_bytes())?;
        file.sync_all()?;

        fs::rename(&tmp_path, &path)?;
        info!(nickname = %credentials.nickname, "session saved");
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        match fs::remove_file(self.file_path()) {
            Ok(()) => {
                info!("session cleared");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
