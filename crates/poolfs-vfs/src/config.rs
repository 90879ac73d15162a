//! Pool configuration: one index account plus N data account credentials.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// A service account credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    /// The principal identity used in permission grants.
    pub client_email: String,
    /// The account's private key material.
    pub private_key: String,
}

fn default_root_name() -> String {
    "poolfs".to_string()
}

/// Configuration loaded once at construction; never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Name of the account whose tree constitutes the namespace.
    pub index_account: String,
    /// Display name of the root directory in the index account.
    #[serde(default = "default_root_name")]
    pub root_name: String,
    /// All accounts in the pool, keyed by stable name. Must include the
    /// index account.
    pub accounts: BTreeMap<String, Credential>,
}

impl PoolConfig {
    /// Load configuration from a TOML or JSON file, by extension.
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();

        let config: PoolConfig = match ext.to_lowercase().as_str() {
            "toml" => toml::from_str(&contents)?,
            "json" => serde_json::from_str(&contents)?,
            _ => anyhow::bail!("Unsupported config file extension: {}", ext),
        };
        config.validate()?;
        Ok(config)
    }

    /// Check pool shape: the index account must be present and at least
    /// one data account must remain for uploads.
    pub fn validate(&self) -> anyhow::Result<()> {
        if !self.accounts.contains_key(&self.index_account) {
            anyhow::bail!(
                "index account '{}' is not in the accounts map",
                self.index_account
            );
        }
        if self.data_accounts().next().is_none() {
            anyhow::bail!("pool needs at least one data account besides the index");
        }
        if self.root_name.is_empty() {
            anyhow::bail!("root_name must not be empty");
        }
        Ok(())
    }

    /// Names of upload-eligible accounts, in fixed enumeration order.
    pub fn data_accounts(&self) -> impl Iterator<Item = &str> {
        self.accounts
            .keys()
            .filter(move |name| **name != self.index_account)
            .map(|name| name.as_str())
    }
}
