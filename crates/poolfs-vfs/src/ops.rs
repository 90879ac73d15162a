//! Namespace operations: folders, move/rename, recursive delete, download.
//!
//! Move and rename act on the index tree only, with the index credential —
//! the underlying blob is untouched. Delete descends depth-first and
//! strictly sequentially: a directory is removed only after every child on
//! every page has been processed, and the first child failure aborts the
//! walk. Blob-targeted steps resolve their credential through the owning
//! account recorded in the entry's metadata. The root directory is fixed:
//! it cannot be moved, renamed, or deleted.

use std::future::Future;
use std::pin::Pin;

use bytes::Bytes;
use tracing::{debug, info};

use poolfs_remote::{ItemPatch, NewItem};

use crate::account::AccountPool;
use crate::error::{FsError, FsResult};
use crate::resolve::{Entry, EntryKind, Resolver};

type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A downloaded file: namespace name plus blob bytes.
#[derive(Debug, Clone)]
pub struct DownloadedFile {
    /// Name of the namespace entry.
    pub name: String,
    /// Byte length of the content.
    pub size: u64,
    /// The content itself.
    pub data: Bytes,
}

pub(crate) async fn create_folder(
    resolver: &Resolver,
    name: &str,
    parent: Option<&str>,
) -> FsResult<Entry> {
    if name.trim().is_empty() {
        return Err(FsError::validation("folder name is required"));
    }
    let parent_id = resolver.resolve_parent(parent).await?;
    if resolver.find_by_name(name, Some(&parent_id)).await?.is_some() {
        return Err(FsError::validation(format!(
            "an object named '{}' already exists in the target folder",
            name
        )));
    }

    debug!(name, parent = %parent_id, "creating folder");
    let item = resolver
        .index()
        .create(NewItem::directory(name, &parent_id), None)
        .await?;
    Ok(resolver.resolve_view(item))
}

pub(crate) async fn move_entry(
    resolver: &Resolver,
    source_id: &str,
    dest_folder_id: Option<&str>,
) -> FsResult<Entry> {
    if source_id.trim().is_empty() {
        return Err(FsError::validation("source id must not be blank"));
    }
    let dest_id = resolver.resolve_parent(dest_folder_id).await?;

    let source = resolver
        .find_by_id(source_id)
        .await?
        .ok_or_else(|| FsError::NotFound {
            id: source_id.to_string(),
        })?;
    let dest = resolver
        .find_by_id(&dest_id)
        .await?
        .ok_or_else(|| FsError::NotFound {
            id: dest_id.clone(),
        })?;
    if !dest.is_directory() {
        return Err(FsError::NotDirectory { id: dest_id });
    }
    let old_parent = source
        .parent
        .clone()
        .ok_or_else(|| FsError::validation("cannot move the root directory"))?;
    if source.is_directory() {
        ensure_not_descendant(resolver, &source.id, &dest.id).await?;
    }

    // Reparenting happens in the index tree with the index credential;
    // the blob (if any) stays where it is.
    info!(id = %source.id, from = %old_parent, to = %dest.id, "moving entry");
    let updated = resolver
        .index()
        .update(&source.id, ItemPatch::reparent(&old_parent, &dest.id))
        .await?;
    Ok(resolver.resolve_view(updated))
}

/// Reject a destination inside the moving directory's own subtree, which
/// would cut the subtree loose as an unreachable cycle. Walks the
/// destination's ancestry up to the root.
async fn ensure_not_descendant(
    resolver: &Resolver,
    source_id: &str,
    dest_id: &str,
) -> FsResult<()> {
    if source_id == dest_id {
        return Err(FsError::validation("cannot move a directory into itself"));
    }
    let mut cursor = dest_id.to_string();
    loop {
        let entry = match resolver.find_by_id(&cursor).await? {
            Some(entry) => entry,
            None => return Ok(()),
        };
        match entry.parent {
            Some(parent) if parent == source_id => {
                return Err(FsError::validation(
                    "cannot move a directory into its own subtree",
                ))
            }
            Some(parent) => cursor = parent,
            None => return Ok(()),
        }
    }
}

pub(crate) async fn rename_entry(
    resolver: &Resolver,
    id: &str,
    new_name: &str,
) -> FsResult<Entry> {
    if id.trim().is_empty() {
        return Err(FsError::validation("id must not be blank"));
    }
    if new_name.trim().is_empty() {
        return Err(FsError::validation("new name is required"));
    }
    let entry = resolver
        .find_by_id(id)
        .await?
        .ok_or_else(|| FsError::NotFound { id: id.to_string() })?;
    if entry.parent.is_none() {
        // Renaming the root would break discovery of the configured root
        // name on the next process start.
        return Err(FsError::validation("cannot rename the root directory"));
    }

    let updated = resolver
        .index()
        .update(&entry.id, ItemPatch::rename(new_name))
        .await?;
    Ok(resolver.resolve_view(updated))
}

pub(crate) async fn delete_tree(
    resolver: &Resolver,
    pool: &AccountPool,
    id: &str,
) -> FsResult<()> {
    if id.trim().is_empty() {
        return Err(FsError::validation("id must not be blank"));
    }
    let entry = resolver
        .find_by_id(id)
        .await?
        .ok_or_else(|| FsError::NotFound { id: id.to_string() })?;
    if entry.parent.is_none() {
        // Only the root resolves without a parent. Its id stays memoized
        // for the process lifetime, so it must never be removed.
        return Err(FsError::validation("cannot delete the root directory"));
    }
    delete_recursive(resolver, pool, entry).await
}

fn delete_recursive<'a>(
    resolver: &'a Resolver,
    pool: &'a AccountPool,
    entry: Entry,
) -> BoxFuture<'a, FsResult<()>> {
    Box::pin(async move {
        match entry.kind {
            EntryKind::Directory => {
                info!(id = %entry.id, name = %entry.name, "deleting folder");
                let children = collect_children(resolver, &entry.id).await?;
                for child in children {
                    delete_recursive(resolver, pool, child).await?;
                }
                // Children gone on every page; now the folder itself.
                resolver.index().delete(&entry.id).await?;
                Ok(())
            }
            _ => delete_leaf(resolver, pool, &entry).await,
        }
    })
}

/// Exhaust the child listing, following page tokens to the end.
async fn collect_children(resolver: &Resolver, parent_id: &str) -> FsResult<Vec<Entry>> {
    let mut children = Vec::new();
    let mut token: Option<String> = None;
    loop {
        let page = resolver.list(parent_id, None, token.as_deref()).await?;
        children.extend(page.entries);
        match page.next_page_token {
            Some(next) => token = Some(next),
            None => break,
        }
    }
    Ok(children)
}

/// Delete a leaf: the target blob first, from its owning account, then the
/// shortcut from the index tree.
async fn delete_leaf(resolver: &Resolver, pool: &AccountPool, entry: &Entry) -> FsResult<()> {
    let attrs = entry.file().ok_or_else(|| {
        FsError::auth_resolution(format!("missing owner metadata on leaf '{}'", entry.id))
    })?;
    let store = pool.store(&attrs.owner)?;

    info!(id = %entry.id, blob = %attrs.blob_id, account = %attrs.owner, "deleting file");
    store.delete(&attrs.blob_id).await?;
    resolver.index().delete(&entry.id).await?;
    Ok(())
}

pub(crate) async fn download(
    resolver: &Resolver,
    pool: &AccountPool,
    id: &str,
) -> FsResult<DownloadedFile> {
    if id.trim().is_empty() {
        return Err(FsError::validation("id must not be blank"));
    }
    let entry = resolver
        .find_by_id(id)
        .await?
        .ok_or_else(|| FsError::NotFound { id: id.to_string() })?;
    let attrs = entry
        .file()
        .ok_or_else(|| FsError::validation(format!("'{}' is not a downloadable file", id)))?;

    let store = pool.store(&attrs.owner)?;
    let data = store.download(&attrs.blob_id).await?;
    Ok(DownloadedFile {
        name: entry.name,
        size: data.len() as u64,
        data,
    })
}
