//! Saved-accounts persistence: an opaque read/save/delete key-value contract
//! over account ids. The on-disk representation is an implementation detail
//! of [`AccountsFile`].

use std::collections::HashMap;
use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::CoreConfig;
use crate::errors::Result;

/// What it takes to resume one account without a password.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedAccount {
    pub token: String,
    pub device_id: String,
    pub homeserver: String,
}

#[async_trait(?Send)]
pub trait SavedAccounts {
    async fn read(&self) -> Result<HashMap<String, SavedAccount>>;
    async fn save(&self, user_id: &str, account: SavedAccount) -> Result<()>;
    async fn delete(&self, user_id: &str) -> Result<()>;
}

/// JSON file under the config directory. Writes go through a temp file and a
/// rename, so a crash mid-write cannot corrupt the accounts file.
pub struct AccountsFile {
    path: PathBuf,
}

impl AccountsFile {
    pub fn new(config: &CoreConfig) -> Self {
        Self {
            path: config.config_dir.join("accounts.json"),
        }
    }

    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn read_all(&self) -> Result<HashMap<String, SavedAccount>> {
        match std::fs::read(&self.path) {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(HashMap::new()),
            Err(err) => Err(err.into()),
        }
    }

    fn write_all(&self, accounts: &HashMap<String, SavedAccount>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let bytes = serde_json::to_vec_pretty(accounts)?;
        let temp = self.path.with_extension("json.tmp");
        std::fs::write(&temp, &bytes)?;
        std::fs::rename(&temp, &self.path)?;
        Ok(())
    }
}

#[async_trait(?Send)]
impl SavedAccounts for AccountsFile {
    async fn read(&self) -> Result<HashMap<String, SavedAccount>> {
        self.read_all()
    }

    async fn save(&self, user_id: &str, account: SavedAccount) -> Result<()> {
        let mut accounts = self.read_all()?;
        accounts.insert(user_id.to_string(), account);
        self.write_all(&accounts)
    }

    async fn delete(&self, user_id: &str) -> Result<()> {
        let mut accounts = self.read_all()?;
        if accounts.remove(user_id).is_some() {
            self.write_all(&accounts)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn saved(token: &str) -> SavedAccount {
        SavedAccount {
            token: token.into(),
            device_id: "DEVICE".into(),
            homeserver: "https://example.org".into(),
        }
    }

    #[tokio::test]
    async fn missing_file_reads_as_empty() {
        let dir = tempdir().unwrap();
        let file = AccountsFile::at(dir.path().join("accounts.json"));

        assert!(file.read().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn save_read_delete_round_trip() {
        let dir = tempdir().unwrap();
        let file = AccountsFile::at(dir.path().join("accounts.json"));

        file.save("@alice:example.org", saved("tok-a")).await.unwrap();
        file.save("@bob:example.org", saved("tok-b")).await.unwrap();

        let accounts = file.read().await.unwrap();
        assert_eq!(accounts.len(), 2);
        assert_eq!(accounts["@alice:example.org"], saved("tok-a"));

        file.delete("@alice:example.org").await.unwrap();
        let accounts = file.read().await.unwrap();
        assert_eq!(accounts.len(), 1);
        assert!(!accounts.contains_key("@alice:example.org"));

        // Deleting an unknown account is a no-op.
        file.delete("@ghost:example.org").await.unwrap();
    }

    #[tokio::test]
    async fn save_creates_parent_directories() {
        let dir = tempdir().unwrap();
        let file = AccountsFile::at(dir.path().join("nested/config/accounts.json"));

        file.save("@alice:example.org", saved("tok")).await.unwrap();
        assert_eq!(file.read().await.unwrap().len(), 1);
    }
}
