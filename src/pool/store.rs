//! Atomic JSON-file persistence for the account pool (§3, §6).
//!
//! The persisted document is `{ "version": "1.0", "accounts": [...] }` under
//! `${DATA_DIR}/accounts.json`. Every write goes to a temp file in the same
//! directory, then an atomic rename, so a crash mid-write never leaves a
//! torn file on disk.

use super::account::Account;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const SCHEMA_VERSION: &str = "1.0";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistedState {
    pub version: String,
    pub accounts: Vec<Account>,
}

impl Default for PersistedState {
    fn default() -> Self {
        Self {
            version: SCHEMA_VERSION.to_string(),
            accounts: Vec::new(),
        }
    }
}

/// Export/import envelope: same shape plus an `exportedAt` timestamp (§6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportedState {
    pub version: String,
    pub accounts: Vec<Account>,
    pub exported_at: i64,
}

/// Loads the persisted document, or an empty one if the file doesn't exist
/// yet (cold start with zero accounts).
pub async fn load(path: &Path) -> std::io::Result<PersistedState> {
    match tokio::fs::read_to_string(path).await {
        Ok(contents) => {
            let state: PersistedState = serde_json::from_str(&contents).map_err(|e| {
                std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
            })?;
            Ok(state)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(PersistedState::default()),
        Err(e) => Err(e),
    }
}

/// Writes `state` atomically: temp file in the same directory, then rename.
pub async fn save(path: &Path, state: &PersistedState) -> std::io::Result<()> {
    let json = serde_json::to_string_pretty(state)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))?;

    let dir = path.parent().ok_or_else(|| {
        std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            "accounts path has no parent directory",
        )
    })?;
    tokio::fs::create_dir_all(dir).await?;

    let tmp_path: PathBuf = dir.join(format!(".accounts.tmp.{}", std::process::id()));
    tokio::fs::write(&tmp_path, json.as_bytes()).await?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(0o600);
        tokio::fs::set_permissions(&tmp_path, perms).await?;
    }

    tokio::fs::rename(&tmp_path, path).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::account::AccountSource;

    fn sample_account(email: &str) -> Account {
        Account::new_oauth(email, "tok", Some("refresh".into()), 9_999_999_999_999, None)
    }

    #[tokio::test]
    async fn missing_file_loads_as_empty_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("accounts.json");
        let state = load(&path).await.unwrap();
        assert!(state.accounts.is_empty());
        assert_eq!(state.version, SCHEMA_VERSION);
    }

    #[tokio::test]
    async fn save_then_load_roundtrips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("accounts.json");

        let mut state = PersistedState::default();
        state.accounts.push(sample_account("a@example.com"));
        save(&path, &state).await.unwrap();

        let loaded = load(&path).await.unwrap();
        assert_eq!(loaded.accounts.len(), 1);
        assert_eq!(loaded.accounts[0].email, "a@example.com");
        assert_eq!(loaded.accounts[0].source, AccountSource::Oauth);
    }

    #[tokio::test]
    async fn save_creates_missing_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/data/accounts.json");
        save(&path, &PersistedState::default()).await.unwrap();
        assert!(path.exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn persisted_file_is_0600() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("accounts.json");
        save(&path, &PersistedState::default()).await.unwrap();
        let mode = tokio::fs::metadata(&path)
            .await
            .unwrap()
            .permissions()
            .mode()
            & 0o777;
        assert_eq!(mode, 0o600);
    }
}
