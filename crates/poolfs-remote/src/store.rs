//! Abstract remote object store surface.
//!
//! This module defines the [`ObjectStore`] trait: the per-credential call
//! surface the virtual filesystem layer is built against. Real providers
//! and the in-memory test provider both implement this trait.

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::error::RemoteResult;
use crate::item::{ItemPatch, NewItem, RemoteItem};

/// Quota reading for one account, in bytes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageQuota {
    /// Total capacity.
    pub limit: u64,
    /// Bytes consumed, all usage classes.
    pub usage: u64,
    /// Bytes consumed by stored objects.
    pub usage_in_drive: u64,
}

impl StorageQuota {
    /// Free capacity: `limit - usage`, saturating at zero.
    pub fn free(&self) -> u64 {
        self.limit.saturating_sub(self.usage)
    }

    /// Component-wise sum, for pool-wide aggregation.
    pub fn add(&self, other: &StorageQuota) -> StorageQuota {
        StorageQuota {
            limit: self.limit.saturating_add(other.limit),
            usage: self.usage.saturating_add(other.usage),
            usage_in_drive: self.usage_in_drive.saturating_add(other.usage_in_drive),
        }
    }
}

/// Role granted to a principal on an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PermissionRole {
    /// Read-only access.
    Reader,
    /// Read/write access.
    Writer,
}

/// Additional constraints on a listing, beyond the parent id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListQuery {
    /// Exact name match.
    pub name_eq: Option<String>,
    /// Exact mime type match.
    pub mime_eq: Option<String>,
}

impl ListQuery {
    /// Constraint matching items named exactly `name`.
    pub fn name(name: &str) -> Self {
        Self {
            name_eq: Some(name.to_string()),
            ..Default::default()
        }
    }

    /// True if `item` satisfies every set constraint.
    pub fn matches(&self, item: &RemoteItem) -> bool {
        if let Some(name) = &self.name_eq {
            if &item.name != name {
                return false;
            }
        }
        if let Some(mime) = &self.mime_eq {
            if &item.mime_type != mime {
                return false;
            }
        }
        true
    }
}

/// One page of a listing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Page {
    /// Items on this page, in listing order.
    pub items: Vec<RemoteItem>,
    /// Token for the next page. Absent on the last page.
    pub next_page_token: Option<String>,
}

/// Per-credential remote object store operations.
///
/// Listings are ordered directory-first, then by name, then by modified
/// time, and paginated: each call returns one page, and the returned
/// token gates the next fetch.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// List one page of the children of `parent_id` matching `query`.
    async fn list(
        &self,
        parent_id: &str,
        query: &ListQuery,
        page_token: Option<&str>,
    ) -> RemoteResult<Page>;

    /// Fetch a single item by id.
    async fn get(&self, id: &str) -> RemoteResult<RemoteItem>;

    /// Create an item, optionally with a body (blobs only).
    async fn create(&self, meta: NewItem, body: Option<Bytes>) -> RemoteResult<RemoteItem>;

    /// Apply a partial metadata update to an item.
    async fn update(&self, id: &str, patch: ItemPatch) -> RemoteResult<RemoteItem>;

    /// Delete an item.
    async fn delete(&self, id: &str) -> RemoteResult<()>;

    /// Fetch this credential's quota reading.
    async fn quota(&self) -> RemoteResult<StorageQuota>;

    /// Grant `principal` the given role on an item.
    async fn grant_permission(
        &self,
        id: &str,
        principal: &str,
        role: PermissionRole,
    ) -> RemoteResult<()>;

    /// Download an item's bytes.
    async fn download(&self, id: &str) -> RemoteResult<Bytes>;
}
