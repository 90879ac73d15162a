//! In-memory multi-account object store provider.
//!
//! One [`MemoryProvider`] simulates the remote side; each registered
//! account gets a [`MemoryObjectStore`] handle scoped to that account's
//! credential. Visibility follows the provider model: an account sees an
//! item when it owns it or when its principal has been granted access.
//! Operation counters let tests assert exactly which remote calls happened.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::error::{RemoteError, RemoteResult};
use crate::item::{ItemKind, ItemPatch, NewItem, RemoteItem};
use crate::store::{ListQuery, ObjectStore, Page, PermissionRole, StorageQuota};

/// Prefix for the provider's opaque page tokens.
const PAGE_TOKEN_PREFIX: &str = "offset:";

/// Counters for remote operations, across all account handles.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderStats {
    /// Number of list calls.
    pub lists: u64,
    /// Number of get calls.
    pub gets: u64,
    /// Number of create calls.
    pub creates: u64,
    /// Number of update calls.
    pub updates: u64,
    /// Number of delete calls.
    pub deletes: u64,
    /// Number of quota calls.
    pub quota_calls: u64,
    /// Number of permission grants.
    pub grants: u64,
    /// Number of downloads.
    pub downloads: u64,
}

struct StoredItem {
    item: RemoteItem,
    body: Option<Bytes>,
    owner: String,
    granted: HashMap<String, PermissionRole>,
}

struct AccountState {
    principal: String,
    limit: u64,
    usage: u64,
}

struct ProviderInner {
    items: HashMap<String, StoredItem>,
    accounts: HashMap<String, AccountState>,
    clock: u64,
}

impl ProviderInner {
    fn visible_to(&self, stored: &StoredItem, account: &str) -> bool {
        if stored.owner == account {
            return true;
        }
        self.accounts
            .get(account)
            .map(|a| stored.granted.contains_key(&a.principal))
            .unwrap_or(false)
    }

    fn visible_item(&self, id: &str, account: &str) -> RemoteResult<&StoredItem> {
        let stored = self.items.get(id).ok_or_else(|| RemoteError::NotFound {
            id: id.to_string(),
        })?;
        if !self.visible_to(stored, account) {
            // Indistinguishable from absence, as real providers behave.
            return Err(RemoteError::NotFound {
                id: id.to_string(),
            });
        }
        Ok(stored)
    }

    fn tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }
}

/// The simulated remote provider shared by all account handles.
pub struct MemoryProvider {
    inner: Mutex<ProviderInner>,
    stats: Mutex<ProviderStats>,
    page_size: usize,
}

impl MemoryProvider {
    /// Create a provider with the given listing page size.
    pub fn new(page_size: usize) -> Self {
        Self {
            inner: Mutex::new(ProviderInner {
                items: HashMap::new(),
                accounts: HashMap::new(),
                clock: 0,
            }),
            stats: Mutex::new(ProviderStats::default()),
            page_size,
        }
    }

    /// Register an account and return a store handle scoped to it.
    pub fn register_account(
        self: &Arc<Self>,
        account: &str,
        principal: &str,
        limit: u64,
    ) -> MemoryObjectStore {
        let mut inner = self.inner.lock().unwrap();
        inner.accounts.insert(
            account.to_string(),
            AccountState {
                principal: principal.to_string(),
                limit,
                usage: 0,
            },
        );
        MemoryObjectStore {
            provider: Arc::clone(self),
            account: account.to_string(),
        }
    }

    /// Snapshot of the operation counters.
    pub fn stats(&self) -> ProviderStats {
        self.stats.lock().unwrap().clone()
    }

    /// Total number of stored items, all accounts.
    pub fn item_count(&self) -> usize {
        self.inner.lock().unwrap().items.len()
    }

    /// True if an item with this id exists anywhere in the provider.
    pub fn contains(&self, id: &str) -> bool {
        self.inner.lock().unwrap().items.contains_key(id)
    }

    /// Ids of all items owned by `account`, for test verification.
    pub fn owned_by(&self, account: &str) -> Vec<String> {
        let inner = self.inner.lock().unwrap();
        let mut ids: Vec<String> = inner
            .items
            .values()
            .filter(|s| s.owner == account)
            .map(|s| s.item.id.clone())
            .collect();
        ids.sort();
        ids
    }

    fn parse_token(token: &str) -> RemoteResult<usize> {
        token
            .strip_prefix(PAGE_TOKEN_PREFIX)
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| RemoteError::InvalidPageToken {
                token: token.to_string(),
            })
    }
}

/// A per-account handle onto a [`MemoryProvider`].
#[derive(Clone)]
pub struct MemoryObjectStore {
    provider: Arc<MemoryProvider>,
    account: String,
}

impl MemoryObjectStore {
    /// The account name this handle is scoped to.
    pub fn account(&self) -> &str {
        &self.account
    }

    /// The shared provider behind this handle.
    pub fn provider(&self) -> &Arc<MemoryProvider> {
        &self.provider
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn list(
        &self,
        parent_id: &str,
        query: &ListQuery,
        page_token: Option<&str>,
    ) -> RemoteResult<Page> {
        self.provider.stats.lock().unwrap().lists += 1;
        let offset = match page_token {
            Some(token) => MemoryProvider::parse_token(token)?,
            None => 0,
        };

        let inner = self.provider.inner.lock().unwrap();
        let mut matched: Vec<&RemoteItem> = inner
            .items
            .values()
            .filter(|s| inner.visible_to(s, &self.account))
            .map(|s| &s.item)
            .filter(|i| i.parents.iter().any(|p| p == parent_id))
            .filter(|i| query.matches(i))
            .collect();

        // Directory-first, then name, then modified time.
        matched.sort_by(|a, b| {
            let a_dir = a.kind() == ItemKind::Directory;
            let b_dir = b.kind() == ItemKind::Directory;
            b_dir
                .cmp(&a_dir)
                .then_with(|| a.name.cmp(&b.name))
                .then_with(|| a.modified_secs.cmp(&b.modified_secs))
        });

        let total = matched.len();
        let items: Vec<RemoteItem> = matched
            .into_iter()
            .skip(offset)
            .take(self.provider.page_size)
            .cloned()
            .collect();
        let consumed = offset + items.len();
        let next_page_token = if consumed < total {
            Some(format!("{}{}", PAGE_TOKEN_PREFIX, consumed))
        } else {
            None
        };

        debug!(
            account = %self.account,
            parent = parent_id,
            returned = items.len(),
            total,
            "memory list"
        );
        Ok(Page {
            items,
            next_page_token,
        })
    }

    async fn get(&self, id: &str) -> RemoteResult<RemoteItem> {
        self.provider.stats.lock().unwrap().gets += 1;
        let inner = self.provider.inner.lock().unwrap();
        inner.visible_item(id, &self.account).map(|s| s.item.clone())
    }

    async fn create(&self, meta: NewItem, body: Option<Bytes>) -> RemoteResult<RemoteItem> {
        self.provider.stats.lock().unwrap().creates += 1;
        let mut inner = self.provider.inner.lock().unwrap();
        let modified = inner.tick();
        let size = body.as_ref().map(|b| b.len() as u64);

        let item = RemoteItem {
            id: Uuid::new_v4().to_string(),
            name: meta.name,
            mime_type: meta.mime_type,
            parents: meta.parents,
            size,
            description: meta.description,
            shortcut: meta.shortcut,
            modified_secs: modified,
        };

        if let Some(bytes) = size {
            if let Some(acct) = inner.accounts.get_mut(&self.account) {
                // Usage may exceed the limit: the provider does not reserve,
                // it just accounts. The balancer race is accepted upstream.
                acct.usage = acct.usage.saturating_add(bytes);
            }
        }

        debug!(account = %self.account, id = %item.id, name = %item.name, "memory create");
        inner.items.insert(
            item.id.clone(),
            StoredItem {
                item: item.clone(),
                body,
                owner: self.account.clone(),
                granted: HashMap::new(),
            },
        );
        Ok(item)
    }

    async fn update(&self, id: &str, patch: ItemPatch) -> RemoteResult<RemoteItem> {
        self.provider.stats.lock().unwrap().updates += 1;
        let mut inner = self.provider.inner.lock().unwrap();
        inner.visible_item(id, &self.account)?;
        let modified = inner.tick();

        let stored = inner.items.get_mut(id).ok_or_else(|| RemoteError::NotFound {
            id: id.to_string(),
        })?;
        if let Some(name) = patch.name {
            stored.item.name = name;
        }
        if let Some(desc) = patch.description {
            stored.item.description = Some(desc);
        }
        if let Some(remove) = patch.remove_parent {
            stored.item.parents.retain(|p| p != &remove);
        }
        if let Some(add) = patch.add_parent {
            if !stored.item.parents.contains(&add) {
                stored.item.parents.push(add);
            }
        }
        stored.item.modified_secs = modified;
        Ok(stored.item.clone())
    }

    async fn delete(&self, id: &str) -> RemoteResult<()> {
        self.provider.stats.lock().unwrap().deletes += 1;
        let mut inner = self.provider.inner.lock().unwrap();
        inner.visible_item(id, &self.account)?;

        if let Some(stored) = inner.items.remove(id) {
            let bytes = stored.body.as_ref().map(|b| b.len() as u64).unwrap_or(0);
            if let Some(acct) = inner.accounts.get_mut(&stored.owner) {
                acct.usage = acct.usage.saturating_sub(bytes);
            }
        }
        debug!(account = %self.account, id, "memory delete");
        Ok(())
    }

    async fn quota(&self) -> RemoteResult<StorageQuota> {
        self.provider.stats.lock().unwrap().quota_calls += 1;
        let inner = self.provider.inner.lock().unwrap();
        let acct = inner
            .accounts
            .get(&self.account)
            .ok_or_else(|| RemoteError::Provider {
                reason: format!("unregistered account: {}", self.account),
            })?;
        Ok(StorageQuota {
            limit: acct.limit,
            usage: acct.usage,
            usage_in_drive: acct.usage,
        })
    }

    async fn grant_permission(
        &self,
        id: &str,
        principal: &str,
        role: PermissionRole,
    ) -> RemoteResult<()> {
        self.provider.stats.lock().unwrap().grants += 1;
        let mut inner = self.provider.inner.lock().unwrap();
        inner.visible_item(id, &self.account)?;
        let stored = inner.items.get_mut(id).ok_or_else(|| RemoteError::NotFound {
            id: id.to_string(),
        })?;
        stored.granted.insert(principal.to_string(), role);
        debug!(account = %self.account, id, principal, "memory grant");
        Ok(())
    }

    async fn download(&self, id: &str) -> RemoteResult<Bytes> {
        self.provider.stats.lock().unwrap().downloads += 1;
        let inner = self.provider.inner.lock().unwrap();
        let stored = inner.visible_item(id, &self.account)?;
        stored.body.clone().ok_or_else(|| RemoteError::Provider {
            reason: format!("item has no body: {}", id),
        })
    }
}
