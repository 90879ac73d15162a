//! Account pool: the fixed set of store handles behind the filesystem.
//!
//! The pool is built once at construction and never mutated. One member is
//! the index account (its tree is the namespace); every other member is a
//! data account eligible for blob uploads. Enumeration order is the sorted
//! account name order, so balancer scans are deterministic.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use poolfs_remote::{ObjectStore, StorageQuota};

use crate::config::{Credential, PoolConfig};
use crate::error::{FsError, FsResult};

/// One account's handle: name, grant principal, and store client.
pub struct PoolMember {
    /// Stable account name, used as the embedded owner reference.
    pub name: String,
    /// Principal identity used when granting permissions.
    pub principal: String,
    /// Store client scoped to this account's credential.
    pub store: Arc<dyn ObjectStore>,
}

struct Member {
    principal: String,
    store: Arc<dyn ObjectStore>,
}

/// Aggregate and per-account quota readings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageReport {
    /// Sum over every account in the pool.
    pub total: StorageQuota,
    /// Per-account breakdown, keyed by account name.
    pub accounts: BTreeMap<String, StorageQuota>,
}

/// The read-only set of accounts backing the filesystem.
pub struct AccountPool {
    index_account: String,
    members: BTreeMap<String, Member>,
}

impl AccountPool {
    /// Build a pool from members. The index account must be present and at
    /// least one data account must remain.
    pub fn new(index_account: &str, members: Vec<PoolMember>) -> FsResult<Self> {
        let members: BTreeMap<String, Member> = members
            .into_iter()
            .map(|m| {
                (
                    m.name,
                    Member {
                        principal: m.principal,
                        store: m.store,
                    },
                )
            })
            .collect();

        if !members.contains_key(index_account) {
            return Err(FsError::validation(format!(
                "index account '{}' is not in the pool",
                index_account
            )));
        }
        if members.len() < 2 {
            return Err(FsError::validation(
                "pool needs at least one data account besides the index",
            ));
        }

        info!(
            index = index_account,
            accounts = members.len(),
            "account pool constructed"
        );
        Ok(Self {
            index_account: index_account.to_string(),
            members,
        })
    }

    /// Build a pool from loaded configuration, constructing each account's
    /// store client through `factory`.
    pub fn from_config<F>(config: &PoolConfig, factory: F) -> FsResult<Self>
    where
        F: Fn(&str, &Credential) -> Arc<dyn ObjectStore>,
    {
        let members = config
            .accounts
            .iter()
            .map(|(name, cred)| PoolMember {
                name: name.clone(),
                principal: cred.client_email.clone(),
                store: factory(name, cred),
            })
            .collect();
        Self::new(&config.index_account, members)
    }

    /// Name of the index account.
    pub fn index_account(&self) -> &str {
        &self.index_account
    }

    /// Store handle for the index account.
    pub fn index_store(&self) -> Arc<dyn ObjectStore> {
        // Present by construction.
        Arc::clone(&self.members[&self.index_account].store)
    }

    /// Principal identity of the index account.
    pub fn index_principal(&self) -> &str {
        &self.members[&self.index_account].principal
    }

    /// Store handle for a named account. Unknown names are an
    /// `AuthResolution` failure: some blob claims an owner the pool
    /// does not hold a credential for.
    pub fn store(&self, name: &str) -> FsResult<Arc<dyn ObjectStore>> {
        self.members
            .get(name)
            .map(|m| Arc::clone(&m.store))
            .ok_or_else(|| FsError::auth_resolution(format!("account '{}' not in pool", name)))
    }

    /// Upload-eligible account names, sorted, index excluded.
    pub fn data_accounts(&self) -> Vec<String> {
        self.members
            .keys()
            .filter(|name| **name != self.index_account)
            .cloned()
            .collect()
    }

    /// Principal identities of every pool member.
    pub fn principals(&self) -> Vec<String> {
        self.members.values().map(|m| m.principal.clone()).collect()
    }

    /// Query every account's quota and aggregate.
    pub async fn storage_report(&self) -> FsResult<StorageReport> {
        let mut report = StorageReport::default();
        for (name, member) in &self.members {
            let quota = member.store.quota().await?;
            report.total = report.total.add(&quota);
            report.accounts.insert(name.clone(), quota);
        }
        Ok(report)
    }
}
