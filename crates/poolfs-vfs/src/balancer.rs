//! Quota balancer: picks a data account with enough free space.
//!
//! Selection is greedy and non-transactional. A "last used account" hint
//! avoids scanning the whole pool on every upload: the hint's live quota
//! is re-checked first, and only a stale or absent hint triggers a full
//! scan in fixed pool order. Two concurrent uploads can still both read a
//! stale quota from the provider; an in-process reservation ledger counts
//! in-flight upload bytes against free space to narrow that window. The
//! ledger cannot close the race across processes.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tracing::{debug, info};

use crate::account::AccountPool;
use crate::error::{FsError, FsResult};

#[derive(Default)]
struct BalancerState {
    hint: Option<String>,
    reserved: HashMap<String, u64>,
}

/// Bytes reserved on a data account for one in-flight upload.
/// Released when dropped.
pub struct Reservation {
    state: Arc<Mutex<BalancerState>>,
    account: String,
    bytes: u64,
}

impl Reservation {
    /// The selected account's name.
    pub fn account(&self) -> &str {
        &self.account
    }

    /// The reserved byte count.
    pub fn bytes(&self) -> u64 {
        self.bytes
    }
}

impl Drop for Reservation {
    fn drop(&mut self) {
        let mut state = self.state.lock().unwrap();
        if let Some(reserved) = state.reserved.get_mut(&self.account) {
            *reserved = reserved.saturating_sub(self.bytes);
            if *reserved == 0 {
                state.reserved.remove(&self.account);
            }
        }
    }
}

/// Selects upload targets from the pool's data accounts.
pub struct QuotaBalancer {
    pool: Arc<AccountPool>,
    state: Arc<Mutex<BalancerState>>,
}

impl QuotaBalancer {
    /// Create a balancer over the pool's data accounts.
    pub fn new(pool: Arc<AccountPool>) -> Self {
        Self {
            pool,
            state: Arc::new(Mutex::new(BalancerState::default())),
        }
    }

    /// Select a data account with at least `required` free bytes and
    /// reserve them. Fails with `CapacityExhausted` when no account
    /// qualifies.
    pub async fn select(&self, required: u64) -> FsResult<Reservation> {
        let hint = self.state.lock().unwrap().hint.clone();
        if let Some(name) = &hint {
            if let Some(reservation) = self.try_reserve(name, required).await? {
                debug!(account = %name, required, "balancer reused hint");
                return Ok(reservation);
            }
            // Hint went stale; fall through to the full scan.
            self.state.lock().unwrap().hint = None;
        }

        for name in self.pool.data_accounts() {
            if hint.as_deref() == Some(name.as_str()) {
                continue; // just checked
            }
            if let Some(reservation) = self.try_reserve(&name, required).await? {
                info!(account = %name, required, "balancer selected account");
                self.state.lock().unwrap().hint = Some(name);
                return Ok(reservation);
            }
        }

        Err(FsError::CapacityExhausted { required })
    }

    /// Re-check one account's live quota and reserve if it qualifies.
    /// Free space is the provider's reading minus bytes already reserved
    /// for in-flight uploads.
    async fn try_reserve(&self, name: &str, required: u64) -> FsResult<Option<Reservation>> {
        let store = self.pool.store(name)?;
        let quota = store.quota().await?;

        let mut state = self.state.lock().unwrap();
        let in_flight = state.reserved.get(name).copied().unwrap_or(0);
        let free = quota.free().saturating_sub(in_flight);
        if free < required {
            debug!(account = %name, free, required, "account lacks free space");
            return Ok(None);
        }

        *state.reserved.entry(name.to_string()).or_insert(0) += required;
        Ok(Some(Reservation {
            state: Arc::clone(&self.state),
            account: name.to_string(),
            bytes: required,
        }))
    }
}
