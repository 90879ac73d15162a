//! Item model for the remote object store.
//!
//! Every entry the provider returns is a [`RemoteItem`]. Three kinds exist,
//! distinguished by fixed mime markers: directories, shortcuts (indirection
//! objects pointing at a blob in another account), and blobs (the real
//! bytes). Kind dispatch goes through the closed [`ItemKind`] enum so new
//! kinds cannot silently fall through string comparisons at call sites.

use serde::{Deserialize, Serialize};

/// Mime marker for directory items.
pub const MIME_TYPE_DIRECTORY: &str = "application/vnd.poolfs.directory";

/// Mime marker for shortcut (indirection) items.
pub const MIME_TYPE_SHORTCUT: &str = "application/vnd.poolfs.shortcut";

/// Default mime type for uploaded blobs when the caller supplies none.
pub const MIME_TYPE_BINARY: &str = "application/octet-stream";

/// Closed set of item kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemKind {
    /// A folder in the index account's tree.
    Directory,
    /// An index-account entry pointing at a blob stored elsewhere.
    Shortcut,
    /// Real object bytes stored in a data account.
    Blob,
}

/// Target of a shortcut item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShortcutTarget {
    /// Id of the blob the shortcut points at.
    pub target_id: String,
    /// Mime type of the target blob.
    pub target_mime_type: String,
}

/// An entry as returned by the remote provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteItem {
    /// Provider-assigned stable id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Mime type; compared against the fixed markers to derive the kind.
    pub mime_type: String,
    /// Parent ids. Single-parent in practice.
    pub parents: Vec<String>,
    /// Size in bytes. Absent for directories.
    pub size: Option<u64>,
    /// Free-form metadata field. Blobs carry the owning account name,
    /// shortcuts carry serialized link metadata.
    pub description: Option<String>,
    /// Present only on shortcut items.
    pub shortcut: Option<ShortcutTarget>,
    /// Last-modified time, seconds since epoch.
    pub modified_secs: u64,
}

impl RemoteItem {
    /// Derive the item kind from the mime marker.
    pub fn kind(&self) -> ItemKind {
        match self.mime_type.as_str() {
            MIME_TYPE_DIRECTORY => ItemKind::Directory,
            MIME_TYPE_SHORTCUT => ItemKind::Shortcut,
            _ => ItemKind::Blob,
        }
    }

    /// First (and in practice only) parent id.
    pub fn parent(&self) -> Option<&str> {
        self.parents.first().map(|p| p.as_str())
    }
}

/// Metadata for creating a new item.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewItem {
    /// Display name.
    pub name: String,
    /// Mime type of the new item.
    pub mime_type: String,
    /// Parent ids for the new item.
    pub parents: Vec<String>,
    /// Optional metadata field.
    pub description: Option<String>,
    /// Shortcut target, for shortcut items only.
    pub shortcut: Option<ShortcutTarget>,
}

impl NewItem {
    /// Metadata for a new directory under `parent_id`.
    pub fn directory(name: &str, parent_id: &str) -> Self {
        Self {
            name: name.to_string(),
            mime_type: MIME_TYPE_DIRECTORY.to_string(),
            parents: vec![parent_id.to_string()],
            ..Default::default()
        }
    }
}

/// A partial metadata update. `None` fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ItemPatch {
    /// New display name.
    pub name: Option<String>,
    /// Parent id to add.
    pub add_parent: Option<String>,
    /// Parent id to remove.
    pub remove_parent: Option<String>,
    /// New metadata field value.
    pub description: Option<String>,
}

impl ItemPatch {
    /// A name-only patch.
    pub fn rename(name: &str) -> Self {
        Self {
            name: Some(name.to_string()),
            ..Default::default()
        }
    }

    /// A reparenting patch: remove `from`, add `to`.
    pub fn reparent(from: &str, to: &str) -> Self {
        Self {
            add_parent: Some(to.to_string()),
            remove_parent: Some(from.to_string()),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(mime: &str) -> RemoteItem {
        RemoteItem {
            id: "i1".to_string(),
            name: "x".to_string(),
            mime_type: mime.to_string(),
            parents: vec!["p1".to_string()],
            size: None,
            description: None,
            shortcut: None,
            modified_secs: 0,
        }
    }

    #[test]
    fn test_kind_from_mime() {
        assert_eq!(item(MIME_TYPE_DIRECTORY).kind(), ItemKind::Directory);
        assert_eq!(item(MIME_TYPE_SHORTCUT).kind(), ItemKind::Shortcut);
        assert_eq!(item("text/plain").kind(), ItemKind::Blob);
        assert_eq!(item(MIME_TYPE_BINARY).kind(), ItemKind::Blob);
    }

    #[test]
    fn test_parent_accessor() {
        let it = item(MIME_TYPE_DIRECTORY);
        assert_eq!(it.parent(), Some("p1"));

        let mut orphan = it.clone();
        orphan.parents.clear();
        assert_eq!(orphan.parent(), None);
    }

    #[test]
    fn test_new_item_directory() {
        let meta = NewItem::directory("docs", "root-id");
        assert_eq!(meta.mime_type, MIME_TYPE_DIRECTORY);
        assert_eq!(meta.parents, vec!["root-id".to_string()]);
        assert!(meta.description.is_none());
        assert!(meta.shortcut.is_none());
    }

    #[test]
    fn test_patch_builders() {
        let p = ItemPatch::rename("new-name");
        assert_eq!(p.name.as_deref(), Some("new-name"));
        assert!(p.add_parent.is_none());

        let p = ItemPatch::reparent("a", "b");
        assert_eq!(p.remove_parent.as_deref(), Some("a"));
        assert_eq!(p.add_parent.as_deref(), Some("b"));
        assert!(p.name.is_none());
    }
}
