//! Shared fixture for pooled-filesystem integration tests.

use std::sync::{Arc, Once};

use bytes::Bytes;
use poolfs_remote::MemoryProvider;
use poolfs_vfs::{AccountPool, Entry, PoolFs, PoolMember, UploadRequest};

/// In-memory pool with an index account plus named data accounts.
pub struct TestPool {
    /// The backing provider, for stats and post-condition checks.
    pub provider: Arc<MemoryProvider>,
    /// Filesystem under test.
    pub fs: PoolFs,
}

/// Builder for [`TestPool`].
pub struct TestPoolBuilder {
    page_size: usize,
    index_limit: u64,
    accounts: Vec<(String, u64)>,
}

impl TestPoolBuilder {
    pub fn new() -> Self {
        Self {
            page_size: 100,
            index_limit: 1_000_000,
            accounts: Vec::new(),
        }
    }

    /// Provider page size for listings.
    pub fn page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    /// Add a data account with a byte quota.
    pub fn account(mut self, name: &str, limit: u64) -> Self {
        self.accounts.push((name.to_string(), limit));
        self
    }

    pub fn build(self) -> TestPool {
        init_tracing();
        let provider = Arc::new(MemoryProvider::new(self.page_size));
        let mut members = vec![member(&provider, "index", self.index_limit)];
        for (name, limit) in &self.accounts {
            members.push(member(&provider, name, *limit));
        }
        let pool = AccountPool::new("index", members).expect("valid test pool");
        TestPool {
            provider,
            fs: PoolFs::new(pool, "poolfs"),
        }
    }
}

impl Default for TestPoolBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Install a fmt subscriber once per process, honoring `RUST_LOG`.
pub fn init_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

fn member(provider: &Arc<MemoryProvider>, name: &str, limit: u64) -> PoolMember {
    let principal = format!("{}@pool.test", name);
    PoolMember {
        name: name.to_string(),
        principal: principal.clone(),
        store: Arc::new(provider.register_account(name, &principal, limit)),
    }
}

impl TestPool {
    /// One index account and two 10 KiB data accounts.
    pub fn standard() -> Self {
        TestPoolBuilder::new()
            .account("data-a", 10_240)
            .account("data-b", 10_240)
            .build()
    }

    /// Upload `data` as a file named `name` into `parent`.
    pub async fn put(&self, name: &str, parent: Option<&str>, data: &[u8]) -> Entry {
        self.fs
            .upload(
                Bytes::copy_from_slice(data),
                UploadRequest {
                    name: name.to_string(),
                    size: data.len() as u64,
                    parent_id: parent.map(str::to_string),
                    mime_type: None,
                },
            )
            .await
            .expect("upload")
    }
}

/// Request with declared size matching `data`.
pub fn upload_request(name: &str, parent: Option<&str>, size: u64) -> UploadRequest {
    UploadRequest {
        name: name.to_string(),
        size,
        parent_id: parent.map(str::to_string),
        mime_type: None,
    }
}
