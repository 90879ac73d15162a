//! Namespace resolution and metadata merging.
//!
//! The index account's tree holds directories and shortcuts; the bytes a
//! shortcut points at live in some data account. Resolution turns a raw
//! [`RemoteItem`] into a typed [`Entry`] exactly once: the shortcut's
//! serialized [`LinkMeta`] is parsed and merged under the live item's own
//! fields (live fields win on conflict, except the embedded owner
//! reference, which always survives). Items that are neither directories
//! nor carry usable metadata pass through as `Unknown` and are logged.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::warn;

use poolfs_remote::{ItemKind, ListQuery, ObjectStore, RemoteItem};

use crate::error::{FsError, FsResult};
use crate::root::{RootResolver, ROOT_SENTINEL};

/// Serialized metadata carried in a shortcut's description field.
///
/// `account` is the owning data account and is authoritative for every
/// blob-targeted operation. Extra fields from the original blob survive
/// round trips via the flattened map.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkMeta {
    /// Name of the data account holding the blob.
    pub account: String,
    /// Id of the blob in the owning account.
    pub blob_id: String,
    /// Mime type of the blob.
    pub blob_mime: String,
    /// Size of the blob in bytes.
    pub size: Option<u64>,
    /// Any additional attributes recorded at upload time.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Attributes of a resolved file (shortcut merged with its blob metadata).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileAttrs {
    /// Owning data account name.
    pub owner: String,
    /// Id of the underlying blob.
    pub blob_id: String,
    /// Mime type of the underlying blob.
    pub blob_mime: String,
}

/// Kind of a resolved namespace entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryKind {
    /// A folder in the index tree.
    Directory,
    /// A file: a shortcut whose metadata resolved to a blob.
    File(FileAttrs),
    /// An item with neither a directory marker nor usable metadata.
    Unknown {
        /// The unrecognized mime type.
        mime_type: String,
    },
}

/// A resolved view of one namespace entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    /// Id of the namespace entry (the shortcut or directory itself).
    pub id: String,
    /// Display name.
    pub name: String,
    /// Parent directory id. `None` for the tree root.
    pub parent: Option<String>,
    /// Size in bytes, where known.
    pub size: Option<u64>,
    /// Last-modified time, seconds since epoch.
    pub modified_secs: u64,
    /// Resolved kind.
    pub kind: EntryKind,
}

impl Entry {
    /// True for directory entries.
    pub fn is_directory(&self) -> bool {
        matches!(self.kind, EntryKind::Directory)
    }

    /// File attributes, for file entries.
    pub fn file(&self) -> Option<&FileAttrs> {
        match &self.kind {
            EntryKind::File(attrs) => Some(attrs),
            _ => None,
        }
    }
}

/// One page of resolved entries.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EntryPage {
    /// Entries on this page, in listing order.
    pub entries: Vec<Entry>,
    /// Token for the next page. Absent on the last page.
    pub next_page_token: Option<String>,
}

/// Finds objects by id or by (name, parent) within the index tree.
pub struct Resolver {
    index: Arc<dyn ObjectStore>,
    root: Arc<RootResolver>,
}

impl Resolver {
    /// Create a resolver over the index store.
    pub fn new(index: Arc<dyn ObjectStore>, root: Arc<RootResolver>) -> Self {
        Self { index, root }
    }

    /// The index account's store handle.
    pub fn index(&self) -> &Arc<dyn ObjectStore> {
        &self.index
    }

    /// Map an optional parent reference to a concrete directory id. Absent
    /// parents and the root sentinel both mean the resolved root.
    pub async fn resolve_parent(&self, parent: Option<&str>) -> FsResult<String> {
        match parent {
            None | Some(ROOT_SENTINEL) => self.root.resolve().await,
            Some(id) if id.trim().is_empty() => {
                Err(FsError::validation("parent id must not be blank"))
            }
            Some(id) => Ok(id.to_string()),
        }
    }

    /// Resolve a single object by id. The root sentinel resolves through
    /// the root resolver, with `parent` cleared since the tree's true root
    /// has none. A provider 404 yields `None`.
    pub async fn find_by_id(&self, id: &str) -> FsResult<Option<Entry>> {
        if id == ROOT_SENTINEL {
            let root_id = self.root.resolve().await?;
            let mut entry = match self.get_entry(&root_id).await? {
                Some(entry) => entry,
                None => return Ok(None),
            };
            entry.parent = None;
            return Ok(Some(entry));
        }
        self.get_entry(id).await
    }

    async fn get_entry(&self, id: &str) -> FsResult<Option<Entry>> {
        match self.index.get(id).await {
            Ok(item) => Ok(Some(self.resolve_view(item))),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Find a child of `parent` with an exact name match. First match wins
    /// when duplicates exist; duplicates are only prevented at creation.
    pub async fn find_by_name(&self, name: &str, parent: Option<&str>) -> FsResult<Option<Entry>> {
        let parent_id = self.resolve_parent(parent).await?;
        let page = match self
            .index
            .list(&parent_id, &ListQuery::name(name), None)
            .await
        {
            Ok(page) => page,
            Err(e) if e.is_not_found() => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(page.items.into_iter().next().map(|i| self.resolve_view(i)))
    }

    /// List one page of a directory's children, resolved. A provider 404
    /// yields an empty page so tree walks survive concurrently-deleted
    /// nodes.
    pub async fn list(
        &self,
        parent_id: &str,
        filter: Option<&ListQuery>,
        page_token: Option<&str>,
    ) -> FsResult<EntryPage> {
        let default_query = ListQuery::default();
        let query = filter.unwrap_or(&default_query);
        let page = match self.index.list(parent_id, query, page_token).await {
            Ok(page) => page,
            Err(e) if e.is_not_found() => return Ok(EntryPage::default()),
            Err(e) => return Err(e.into()),
        };
        Ok(EntryPage {
            entries: page
                .items
                .into_iter()
                .map(|i| self.resolve_view(i))
                .collect(),
            next_page_token: page.next_page_token,
        })
    }

    /// Compute the typed view of a raw item.
    pub fn resolve_view(&self, item: RemoteItem) -> Entry {
        let meta = parse_link_meta(&item);
        let meta_size = meta.as_ref().and_then(|m| m.size);

        let kind = match (item.kind(), meta) {
            (ItemKind::Directory, _) => EntryKind::Directory,
            (ItemKind::Shortcut | ItemKind::Blob, Some(meta)) => {
                // Live shortcut target wins over recorded metadata; the
                // owner reference always comes from the metadata.
                let (blob_id, blob_mime) = match &item.shortcut {
                    Some(target) => (target.target_id.clone(), target.target_mime_type.clone()),
                    None => (meta.blob_id, meta.blob_mime),
                };
                EntryKind::File(FileAttrs {
                    owner: meta.account,
                    blob_id,
                    blob_mime,
                })
            }
            (ItemKind::Shortcut | ItemKind::Blob, None) => {
                warn!(id = %item.id, mime = %item.mime_type, "unknown item in namespace");
                EntryKind::Unknown {
                    mime_type: item.mime_type.clone(),
                }
            }
        };

        Entry {
            // The sentinel container is not a real entry; an item parented
            // there is the tree root.
            parent: item
                .parent()
                .filter(|p| *p != ROOT_SENTINEL)
                .map(|p| p.to_string()),
            size: item.size.or(meta_size),
            id: item.id,
            name: item.name,
            modified_secs: item.modified_secs,
            kind,
        }
    }
}

/// Parse the serialized link metadata off an item's description, if any.
fn parse_link_meta(item: &RemoteItem) -> Option<LinkMeta> {
    let description = item.description.as_deref()?;
    if description.is_empty() {
        return None;
    }
    serde_json::from_str(description).ok()
}
