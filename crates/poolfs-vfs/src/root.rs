//! Root directory resolution with a single-flight memoized initializer.
//!
//! Exactly one root directory exists per deployment. The first caller
//! discovers it in the index account (or creates it), and every concurrent
//! or later caller awaits the same in-flight or completed result through
//! `tokio::sync::OnceCell`, so concurrent first use never races into
//! duplicate roots. A failed initialization propagates to all waiters and
//! is retried on the next call.

use std::sync::Arc;

use tokio::sync::OnceCell;
use tracing::{debug, info};

use poolfs_remote::{
    ListQuery, NewItem, ObjectStore, PermissionRole, MIME_TYPE_DIRECTORY,
};

use crate::error::FsResult;

/// Sentinel id callers may use to mean "the namespace root".
pub const ROOT_SENTINEL: &str = "root";

/// Resolves and memoizes the root directory id.
pub struct RootResolver {
    index: Arc<dyn ObjectStore>,
    principals: Vec<String>,
    root_name: String,
    cell: OnceCell<String>,
}

impl RootResolver {
    /// Create a resolver over the index account's store. `principals` are
    /// granted access to the root once it is known, so every pool account
    /// can see the tree it writes blobs into.
    pub fn new(index: Arc<dyn ObjectStore>, principals: Vec<String>, root_name: &str) -> Self {
        Self {
            index,
            principals,
            root_name: root_name.to_string(),
            cell: OnceCell::new(),
        }
    }

    /// The configured root directory name.
    pub fn root_name(&self) -> &str {
        &self.root_name
    }

    /// Resolve the root directory id, initializing on first use.
    pub async fn resolve(&self) -> FsResult<String> {
        self.cell
            .get_or_try_init(|| self.discover_or_create())
            .await
            .cloned()
    }

    async fn discover_or_create(&self) -> FsResult<String> {
        let query = ListQuery {
            name_eq: Some(self.root_name.clone()),
            mime_eq: Some(MIME_TYPE_DIRECTORY.to_string()),
        };
        let page = self.index.list(ROOT_SENTINEL, &query, None).await?;

        let item = match page.items.into_iter().next() {
            Some(existing) => {
                debug!(id = %existing.id, name = %self.root_name, "root directory found");
                existing
            }
            None => {
                info!(name = %self.root_name, "creating root directory");
                self.index
                    .create(NewItem::directory(&self.root_name, ROOT_SENTINEL), None)
                    .await?
            }
        };

        for principal in &self.principals {
            self.index
                .grant_permission(&item.id, principal, PermissionRole::Writer)
                .await?;
        }
        Ok(item.id)
    }
}
