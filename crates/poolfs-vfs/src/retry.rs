//! Bounded retry with exponential backoff over a remote store.
//!
//! [`RetryingStore`] wraps any `ObjectStore` and re-issues calls that fail
//! with a transient provider error, up to a bounded attempt count. All
//! other failure kinds propagate immediately.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use tracing::warn;

use poolfs_remote::{
    ItemPatch, ListQuery, NewItem, ObjectStore, Page, PermissionRole, RemoteItem, RemoteResult,
    StorageQuota,
};

/// Backoff parameters for transient remote failures.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    /// Delay before the first retry.
    pub initial_delay_ms: u64,
    /// Upper bound on any single delay.
    pub max_delay_ms: u64,
    /// Growth factor between successive delays.
    pub multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay_ms: 50,
            max_delay_ms: 2_000,
            multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `retry` (1-based).
    pub fn delay_for(&self, retry: u32) -> Duration {
        let exponent = retry.saturating_sub(1).min(16);
        let delay = self.initial_delay_ms as f64 * self.multiplier.powi(exponent as i32);
        Duration::from_millis((delay as u64).min(self.max_delay_ms))
    }
}

/// `ObjectStore` decorator retrying transient failures.
pub struct RetryingStore {
    inner: Arc<dyn ObjectStore>,
    policy: RetryPolicy,
}

impl RetryingStore {
    /// Wrap a store with the given policy.
    pub fn new(inner: Arc<dyn ObjectStore>, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }
}

macro_rules! with_retry {
    ($self:ident, $op:literal, $call:expr) => {{
        let mut retry = 0u32;
        loop {
            match $call {
                Err(e) if e.is_transient() && retry + 1 < $self.policy.max_attempts => {
                    retry += 1;
                    let delay = $self.policy.delay_for(retry);
                    warn!(op = $op, retry, error = %e, "transient remote failure, backing off");
                    tokio::time::sleep(delay).await;
                }
                result => break result,
            }
        }
    }};
}

#[async_trait]
impl ObjectStore for RetryingStore {
    async fn list(
        &self,
        parent_id: &str,
        query: &ListQuery,
        page_token: Option<&str>,
    ) -> RemoteResult<Page> {
        with_retry!(self, "list", self.inner.list(parent_id, query, page_token).await)
    }

    async fn get(&self, id: &str) -> RemoteResult<RemoteItem> {
        with_retry!(self, "get", self.inner.get(id).await)
    }

    async fn create(&self, meta: NewItem, body: Option<Bytes>) -> RemoteResult<RemoteItem> {
        with_retry!(
            self,
            "create",
            self.inner.create(meta.clone(), body.clone()).await
        )
    }

    async fn update(&self, id: &str, patch: ItemPatch) -> RemoteResult<RemoteItem> {
        with_retry!(self, "update", self.inner.update(id, patch.clone()).await)
    }

    async fn delete(&self, id: &str) -> RemoteResult<()> {
        with_retry!(self, "delete", self.inner.delete(id).await)
    }

    async fn quota(&self) -> RemoteResult<StorageQuota> {
        with_retry!(self, "quota", self.inner.quota().await)
    }

    async fn grant_permission(
        &self,
        id: &str,
        principal: &str,
        role: PermissionRole,
    ) -> RemoteResult<()> {
        with_retry!(
            self,
            "grant_permission",
            self.inner.grant_permission(id, principal, role).await
        )
    }

    async fn download(&self, id: &str) -> RemoteResult<Bytes> {
        with_retry!(self, "download", self.inner.download(id).await)
    }
}
