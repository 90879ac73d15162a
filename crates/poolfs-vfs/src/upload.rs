//! Upload pipeline: place bytes in a data account, link them in the tree.
//!
//! Validation happens before any remote write. The blob lands in whichever
//! data account the balancer picks, tagged with the account name; the
//! index principal is then granted writer access on the blob so later
//! operations from the index identity can act on it; finally a shortcut
//! carrying the full link metadata is created in the parent directory.

use bytes::Bytes;
use tracing::info;

use poolfs_remote::{
    NewItem, PermissionRole, ShortcutTarget, MIME_TYPE_BINARY, MIME_TYPE_SHORTCUT,
};

use crate::account::AccountPool;
use crate::balancer::QuotaBalancer;
use crate::error::{FsError, FsResult};
use crate::resolve::{Entry, LinkMeta, Resolver};

/// Parameters for one upload.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    /// Name of the new file in the namespace.
    pub name: String,
    /// Declared size in bytes; drives account selection.
    pub size: u64,
    /// Target directory. Absent or the root sentinel means the root.
    pub parent_id: Option<String>,
    /// Mime type for the blob. Defaults to octet-stream.
    pub mime_type: Option<String>,
}

pub(crate) async fn upload(
    resolver: &Resolver,
    pool: &AccountPool,
    balancer: &QuotaBalancer,
    body: Bytes,
    request: UploadRequest,
) -> FsResult<Entry> {
    let parent_id = resolver
        .resolve_parent(request.parent_id.as_deref())
        .await?;

    if request.name.trim().is_empty() {
        return Err(FsError::validation("file name is required"));
    }
    if request.size != body.len() as u64 {
        return Err(FsError::validation(format!(
            "declared size {} does not match stream length {}",
            request.size,
            body.len()
        )));
    }
    if resolver
        .find_by_name(&request.name, Some(&parent_id))
        .await?
        .is_some()
    {
        return Err(FsError::validation(format!(
            "an object named '{}' already exists in the target folder",
            request.name
        )));
    }

    let reservation = balancer.select(request.size).await?;
    let account = reservation.account().to_string();
    let store = pool.store(&account)?;
    info!(name = %request.name, size = request.size, account = %account, "uploading blob");

    let blob_mime = request
        .mime_type
        .clone()
        .unwrap_or_else(|| MIME_TYPE_BINARY.to_string());
    // The blob stays unparented in the owning account; only the shortcut
    // appears in the namespace tree. Parenting the blob under the target
    // folder would double-list every file once the index can see it.
    let blob = store
        .create(
            NewItem {
                name: request.name.clone(),
                mime_type: blob_mime,
                parents: vec![],
                description: Some(account.clone()),
                shortcut: None,
            },
            Some(body),
        )
        .await?;
    drop(reservation); // bytes now show up in the provider's own accounting

    store
        .grant_permission(&blob.id, pool.index_principal(), PermissionRole::Writer)
        .await?;

    let meta = LinkMeta {
        account,
        blob_id: blob.id.clone(),
        blob_mime: blob.mime_type.clone(),
        size: blob.size,
        extra: serde_json::Map::new(),
    };
    let description = serde_json::to_string(&meta).map_err(|e| FsError::Metadata {
        reason: e.to_string(),
    })?;

    let shortcut = resolver
        .index()
        .create(
            NewItem {
                name: request.name,
                mime_type: MIME_TYPE_SHORTCUT.to_string(),
                parents: vec![parent_id],
                description: Some(description),
                shortcut: Some(ShortcutTarget {
                    target_id: blob.id,
                    target_mime_type: blob.mime_type,
                }),
            },
            None,
        )
        .await?;

    Ok(resolver.resolve_view(shortcut))
}
