//! The caller-facing pooling filesystem.
//!
//! [`PoolFs`] wires the account pool, quota balancer, root resolver and
//! namespace resolver together behind the operation surface: folders,
//! lookups, paged listings, uploads, move/rename, recursive delete,
//! download and storage info.

use std::sync::Arc;

use bytes::Bytes;

use poolfs_remote::{ListQuery, ObjectStore};

use crate::account::{AccountPool, StorageReport};
use crate::balancer::QuotaBalancer;
use crate::config::{Credential, PoolConfig};
use crate::error::FsResult;
use crate::ops::{self, DownloadedFile};
use crate::resolve::{Entry, EntryPage, Resolver};
use crate::retry::{RetryPolicy, RetryingStore};
use crate::root::RootResolver;
use crate::upload::{self, UploadRequest};

/// A hierarchical namespace pooled across quota-limited remote accounts.
pub struct PoolFs {
    pool: Arc<AccountPool>,
    balancer: QuotaBalancer,
    resolver: Resolver,
}

impl PoolFs {
    /// Build a filesystem over an existing pool.
    pub fn new(pool: AccountPool, root_name: &str) -> Self {
        let pool = Arc::new(pool);
        let root = Arc::new(RootResolver::new(
            pool.index_store(),
            pool.principals(),
            root_name,
        ));
        let resolver = Resolver::new(pool.index_store(), root);
        let balancer = QuotaBalancer::new(Arc::clone(&pool));
        Self {
            pool,
            balancer,
            resolver,
        }
    }

    /// Build a filesystem from loaded configuration. Each account's store
    /// client comes from `factory` and is wrapped in bounded retry with
    /// `policy`.
    pub fn from_config<F>(config: &PoolConfig, policy: RetryPolicy, factory: F) -> FsResult<Self>
    where
        F: Fn(&str, &Credential) -> Arc<dyn ObjectStore>,
    {
        let pool = AccountPool::from_config(config, |name, cred| {
            let store: Arc<dyn ObjectStore> =
                Arc::new(RetryingStore::new(factory(name, cred), policy.clone()));
            store
        })?;
        Ok(Self::new(pool, &config.root_name))
    }

    /// The account pool behind this filesystem.
    pub fn pool(&self) -> &AccountPool {
        &self.pool
    }

    /// Id of the root directory, resolved and memoized on first use.
    pub async fn root_id(&self) -> FsResult<String> {
        self.resolver.resolve_parent(None).await
    }

    /// Create a directory under `parent` (root when absent). Duplicate
    /// names in the target folder are rejected.
    pub async fn create_folder(&self, name: &str, parent: Option<&str>) -> FsResult<Entry> {
        ops::create_folder(&self.resolver, name, parent).await
    }

    /// Resolve a single object by id. `"root"` resolves to the tree root.
    pub async fn find_by_id(&self, id: &str) -> FsResult<Option<Entry>> {
        self.resolver.find_by_id(id).await
    }

    /// Find a child of `parent` by exact name.
    pub async fn find_by_name(&self, name: &str, parent: Option<&str>) -> FsResult<Option<Entry>> {
        self.resolver.find_by_name(name, parent).await
    }

    /// List one page of a directory's children, directory-first, then by
    /// name, then by modified time.
    pub async fn list(
        &self,
        parent: Option<&str>,
        filter: Option<&ListQuery>,
        page_token: Option<&str>,
    ) -> FsResult<EntryPage> {
        let parent_id = self.resolver.resolve_parent(parent).await?;
        self.resolver.list(&parent_id, filter, page_token).await
    }

    /// Upload a file into the namespace. The bytes land in whichever data
    /// account has room; the namespace gains a shortcut pointing at them.
    pub async fn upload(&self, body: Bytes, request: UploadRequest) -> FsResult<Entry> {
        upload::upload(&self.resolver, &self.pool, &self.balancer, body, request).await
    }

    /// Move an entry to another directory. The destination must be a
    /// directory; absent means the root.
    pub async fn move_entry(
        &self,
        source_id: &str,
        dest_folder_id: Option<&str>,
    ) -> FsResult<Entry> {
        ops::move_entry(&self.resolver, source_id, dest_folder_id).await
    }

    /// Rename an entry in place.
    pub async fn rename(&self, id: &str, new_name: &str) -> FsResult<Entry> {
        ops::rename_entry(&self.resolver, id, new_name).await
    }

    /// Delete an entry. Directories are deleted recursively, depth-first;
    /// file leaves lose their blob before their shortcut.
    pub async fn delete(&self, id: &str) -> FsResult<()> {
        ops::delete_tree(&self.resolver, &self.pool, id).await
    }

    /// Download a file's bytes from its owning account.
    pub async fn download(&self, id: &str) -> FsResult<DownloadedFile> {
        ops::download(&self.resolver, &self.pool, id).await
    }

    /// Aggregate and per-account quota readings for the whole pool.
    pub async fn storage_info(&self) -> FsResult<StorageReport> {
        self.pool.storage_report().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::PoolMember;
    use crate::error::FsError;
    use poolfs_remote::MemoryProvider;

    struct Fixture {
        provider: Arc<MemoryProvider>,
        fs: PoolFs,
    }

    fn fixture(limits: &[(&str, u64)]) -> Fixture {
        let provider = Arc::new(MemoryProvider::new(100));
        let mut members = vec![PoolMember {
            name: "index".to_string(),
            principal: "index@pool.test".to_string(),
            store: Arc::new(provider.register_account("index", "index@pool.test", 10_000)),
        }];
        for (name, limit) in limits {
            let principal = format!("{}@pool.test", name);
            members.push(PoolMember {
                name: name.to_string(),
                principal: principal.clone(),
                store: Arc::new(provider.register_account(name, &principal, *limit)),
            });
        }
        let pool = AccountPool::new("index", members).unwrap();
        Fixture {
            provider,
            fs: PoolFs::new(pool, "poolfs"),
        }
    }

    fn request(name: &str, size: u64) -> UploadRequest {
        UploadRequest {
            name: name.to_string(),
            size,
            parent_id: None,
            mime_type: None,
        }
    }

    #[tokio::test]
    async fn test_upload_creates_blob_and_shortcut() {
        let f = fixture(&[("data-a", 1000)]);
        let body = Bytes::from(vec![7u8; 64]);

        let entry = f.fs.upload(body, request("photo.bin", 64)).await.unwrap();
        let attrs = entry.file().expect("upload resolves to a file");
        assert_eq!(attrs.owner, "data-a");
        assert_eq!(entry.size, Some(64));

        // Blob lives in the data account, shortcut in the index tree.
        assert_eq!(f.provider.owned_by("data-a").len(), 1);
        assert!(f.provider.contains(&attrs.blob_id));
        assert!(f.provider.contains(&entry.id));
    }

    #[tokio::test]
    async fn test_upload_duplicate_name_fails_before_write() {
        let f = fixture(&[("data-a", 1000)]);
        f.fs
            .upload(Bytes::from(vec![0u8; 8]), request("dup.bin", 8))
            .await
            .unwrap();

        let creates_before = f.provider.stats().creates;
        let err = f
            .fs
            .upload(Bytes::from(vec![0u8; 8]), request("dup.bin", 8))
            .await
            .unwrap_err();
        assert!(matches!(err, FsError::Validation { .. }));
        assert_eq!(f.provider.stats().creates, creates_before, "no remote write");
    }

    #[tokio::test]
    async fn test_upload_blank_name_rejected() {
        let f = fixture(&[("data-a", 1000)]);
        let err = f
            .fs
            .upload(Bytes::new(), request("  ", 0))
            .await
            .unwrap_err();
        assert!(matches!(err, FsError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_upload_size_mismatch_rejected() {
        let f = fixture(&[("data-a", 1000)]);
        let err = f
            .fs
            .upload(Bytes::from(vec![0u8; 4]), request("f.bin", 99))
            .await
            .unwrap_err();
        assert!(matches!(err, FsError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_upload_capacity_exhausted() {
        let f = fixture(&[("data-a", 100), ("data-b", 100)]);
        let err = f
            .fs
            .upload(Bytes::from(vec![0u8; 200]), request("big.bin", 200))
            .await
            .unwrap_err();
        assert!(matches!(err, FsError::CapacityExhausted { required: 200 }));
    }

    #[tokio::test]
    async fn test_upload_skips_full_account() {
        let f = fixture(&[("data-a", 100), ("data-b", 1000)]);
        let entry = f
            .fs
            .upload(Bytes::from(vec![0u8; 500]), request("big.bin", 500))
            .await
            .unwrap();
        assert_eq!(entry.file().unwrap().owner, "data-b");
    }

    #[tokio::test]
    async fn test_create_folder_and_find() {
        let f = fixture(&[("data-a", 1000)]);
        let folder = f.fs.create_folder("docs", None).await.unwrap();
        assert!(folder.is_directory());

        let found = f.fs.find_by_name("docs", None).await.unwrap().unwrap();
        assert_eq!(found.id, folder.id);

        let err = f.fs.create_folder("docs", None).await.unwrap_err();
        assert!(matches!(err, FsError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_move_to_non_directory_fails() {
        let f = fixture(&[("data-a", 1000)]);
        let file = f
            .fs
            .upload(Bytes::from(vec![0u8; 8]), request("f.bin", 8))
            .await
            .unwrap();
        let other = f
            .fs
            .upload(Bytes::from(vec![0u8; 8]), request("g.bin", 8))
            .await
            .unwrap();

        let err = f
            .fs
            .move_entry(&file.id, Some(&other.id))
            .await
            .unwrap_err();
        assert!(matches!(err, FsError::NotDirectory { .. }));
    }

    #[tokio::test]
    async fn test_move_reparents_shortcut_only() {
        let f = fixture(&[("data-a", 1000)]);
        let folder = f.fs.create_folder("dest", None).await.unwrap();
        let file = f
            .fs
            .upload(Bytes::from(vec![0u8; 8]), request("f.bin", 8))
            .await
            .unwrap();
        let blob_id = file.file().unwrap().blob_id.clone();

        let moved = f.fs.move_entry(&file.id, Some(&folder.id)).await.unwrap();
        assert_eq!(moved.parent.as_deref(), Some(folder.id.as_str()));
        assert_eq!(moved.file().unwrap().blob_id, blob_id, "blob untouched");
    }

    #[tokio::test]
    async fn test_move_blank_source_rejected() {
        let f = fixture(&[("data-a", 1000)]);
        assert!(matches!(
            f.fs.move_entry("", None).await,
            Err(FsError::Validation { .. })
        ));
    }

    #[tokio::test]
    async fn test_rename() {
        let f = fixture(&[("data-a", 1000)]);
        let folder = f.fs.create_folder("old", None).await.unwrap();
        let renamed = f.fs.rename(&folder.id, "new").await.unwrap();
        assert_eq!(renamed.name, "new");

        assert!(f.fs.find_by_name("old", None).await.unwrap().is_none());
        assert!(f.fs.find_by_name("new", None).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_delete_leaf_removes_blob_and_shortcut() {
        let f = fixture(&[("data-a", 1000)]);
        let file = f
            .fs
            .upload(Bytes::from(vec![0u8; 8]), request("f.bin", 8))
            .await
            .unwrap();
        let blob_id = file.file().unwrap().blob_id.clone();

        f.fs.delete(&file.id).await.unwrap();
        assert!(!f.provider.contains(&blob_id), "blob bytes gone");
        assert!(!f.provider.contains(&file.id), "shortcut gone");
        assert!(f.fs.find_by_id(&file.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_missing_is_not_found() {
        let f = fixture(&[("data-a", 1000)]);
        assert!(matches!(
            f.fs.delete("ghost").await,
            Err(FsError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_download_round_trip() {
        let f = fixture(&[("data-a", 1000)]);
        let body = Bytes::from_static(b"the actual bytes");
        let file = f
            .fs
            .upload(body.clone(), request("doc.txt", body.len() as u64))
            .await
            .unwrap();

        let downloaded = f.fs.download(&file.id).await.unwrap();
        assert_eq!(downloaded.data, body);
        assert_eq!(downloaded.name, "doc.txt");
        assert_eq!(downloaded.size, body.len() as u64);
    }

    #[tokio::test]
    async fn test_download_directory_rejected() {
        let f = fixture(&[("data-a", 1000)]);
        let folder = f.fs.create_folder("docs", None).await.unwrap();
        assert!(matches!(
            f.fs.download(&folder.id).await,
            Err(FsError::Validation { .. })
        ));
    }

    #[tokio::test]
    async fn test_storage_info_aggregates_pool() {
        let f = fixture(&[("data-a", 1000), ("data-b", 500)]);
        f.fs
            .upload(Bytes::from(vec![0u8; 100]), request("f.bin", 100))
            .await
            .unwrap();

        let report = f.fs.storage_info().await.unwrap();
        assert_eq!(report.total.limit, 11_500);
        assert_eq!(report.total.usage, 100);
        assert_eq!(report.accounts["data-a"].usage, 100);
    }

    #[tokio::test]
    async fn test_from_config_wires_retry() {
        use std::collections::BTreeMap;

        let provider = Arc::new(MemoryProvider::new(100));
        let mut accounts = BTreeMap::new();
        for name in ["index", "data-a"] {
            accounts.insert(
                name.to_string(),
                Credential {
                    client_email: format!("{}@pool.test", name),
                    private_key: "k".to_string(),
                },
            );
        }
        let config = PoolConfig {
            index_account: "index".to_string(),
            root_name: "my-root".to_string(),
            accounts,
        };

        let fs = PoolFs::from_config(&config, RetryPolicy::default(), |name, cred| {
            let store: Arc<dyn ObjectStore> =
                Arc::new(provider.register_account(name, &cred.client_email, 1000));
            store
        })
        .unwrap();

        let root = fs.find_by_id("root").await.unwrap().unwrap();
        assert_eq!(root.name, "my-root");
    }
}
