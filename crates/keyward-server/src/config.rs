use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

/// On-disk configuration, loaded once at startup and passed by value into
/// the server — there is no process-wide config global.
///
/// ```json
/// { "admin_key": "hunter2", "database_path": "/var/lib/keyward/keyward.db" }
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Shared secret required in the `Authorization` header of every request.
    pub admin_key: String,
    /// Where the key database lives. Falls back to the platform data dir
    /// when omitted.
    #[serde(default)]
    pub database_path: Option<PathBuf>,
}

impl Config {
    /// Load a config file. A missing, unreadable, or malformed file is fatal
    /// to startup, as is an empty `admin_key`.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("read config file: {}", path.display()))?;
        let cfg: Config = serde_json::from_str(&raw)
            .with_context(|| format!("parse config file: {}", path.display()))?;
        if cfg.admin_key.is_empty() {
            anyhow::bail!("admin_key must not be empty: {}", path.display());
        }
        Ok(cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_config(contents: &str) -> (PathBuf, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("keyward.json");
        std::fs::write(&path, contents).unwrap();
        (path, dir)
    }

    #[test]
    fn loads_full_config() {
        let (path, _dir) =
            write_config(r#"{"admin_key": "s3cret", "database_path": "/tmp/k.db"}"#);
        let cfg = Config::load(&path).unwrap();
        assert_eq!(cfg.admin_key, "s3cret");
        assert_eq!(cfg.database_path, Some(PathBuf::from("/tmp/k.db")));
    }

    #[test]
    fn database_path_is_optional() {
        let (path, _dir) = write_config(r#"{"admin_key": "s3cret"}"#);
        let cfg = Config::load(&path).unwrap();
        assert!(cfg.database_path.is_none());
    }

    #[test]
    fn missing_file_fails() {
        assert!(Config::load(Path::new("/nonexistent/keyward.json")).is_err());
    }

    #[test]
    fn malformed_json_fails() {
        let (path, _dir) = write_config("{not json");
        assert!(Config::load(&path).is_err());
    }

    #[test]
    fn empty_admin_key_fails() {
        let (path, _dir) = write_config(r#"{"admin_key": ""}"#);
        assert!(Config::load(&path).is_err());
    }
}
