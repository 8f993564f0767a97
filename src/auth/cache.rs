//! Durable session cache shared across process invocations.

use super::session::Session;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Storage for the last acquired session.
pub trait SessionCache: Send {
    /// Load the cached session, `None` when nothing is cached.
    fn load(&self) -> Result<Option<Session>>;

    /// Replace the cached session.
    fn store(&self, session: &Session) -> Result<()>;
}

/// JSON file cache: `{"token": "...", "expire": "<RFC 3339>"}`.
///
/// Two processes pointed at the same file race benignly: last writer wins.
#[derive(Debug, Clone)]
pub struct FileSessionCache {
    path: PathBuf,
}

impl FileSessionCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionCache for FileSessionCache {
    fn load(&self) -> Result<Option<Session>> {
        if !self.path.is_file() {
            return Ok(None);
        }
        let json = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Cannot read session cache: {}", self.path.display()))?;
        let session: Session = serde_json::from_str(&json)
            .with_context(|| format!("Cannot parse session cache: {}", self.path.display()))?;
        Ok(Some(session))
    }

    fn store(&self, session: &Session) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string(session)?;
        std::fs::write(&self.path, json)
            .with_context(|| format!("Cannot write session cache: {}", self.path.display()))?;

        // The token is a bearer credential
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&self.path, std::fs::Permissions::from_mode(0o600))?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use tempfile::TempDir;

    #[test]
    fn test_store_then_load() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let cache = FileSessionCache::new(temp_dir.path().join("state").join(".cache"));
        assert!(cache.load()?.is_none());

        let session = Session::new(
            "Bearer abc",
            Utc.with_ymd_and_hms(2024, 5, 10, 12, 30, 15).unwrap(),
        );
        cache.store(&session)?;

        let loaded = cache.load()?.expect("cached session");
        assert_eq!(loaded, session);
        Ok(())
    }

    #[test]
    fn test_artifact_format() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let cache = FileSessionCache::new(temp_dir.path().join(".cache"));
        cache.store(&Session::new(
            "Bearer abc",
            Utc.with_ymd_and_hms(2024, 5, 10, 12, 30, 15).unwrap(),
        ))?;

        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(cache.path())?)?;
        assert_eq!(raw["token"], "Bearer abc");
        assert_eq!(raw["expire"], "2024-05-10T12:30:15Z");
        Ok(())
    }

    #[test]
    fn test_corrupt_cache_is_an_error() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join(".cache");
        std::fs::write(&path, "not json")?;
        assert!(FileSessionCache::new(path).load().is_err());
        Ok(())
    }
}
