//! A virtual filesystem pooled across quota-limited storage accounts.
//!
//! One index account holds the namespace: a directory tree of folders and
//! shortcuts. File bytes live as blobs spread over data accounts, each with
//! its own quota; a balancer picks the account for every upload and a link
//! metadata record on the shortcut remembers where the bytes went.
//!
//! [`PoolFs`] is the entry point. Build one from an [`AccountPool`] (or from
//! [`PoolConfig`] with a store factory) and drive the namespace through its
//! async operation surface.

#![warn(missing_docs)]

pub mod account;
pub mod balancer;
pub mod config;
pub mod error;
pub mod fs;
pub mod ops;
pub mod resolve;
pub mod retry;
pub mod root;

mod upload;

pub use account::{AccountPool, PoolMember, StorageReport};
pub use balancer::{QuotaBalancer, Reservation};
pub use config::{Credential, PoolConfig};
pub use error::{FsError, FsResult};
pub use fs::PoolFs;
pub use ops::DownloadedFile;
pub use resolve::{Entry, EntryKind, EntryPage, FileAttrs, LinkMeta, Resolver};
pub use retry::{RetryPolicy, RetryingStore};
pub use root::{RootResolver, ROOT_SENTINEL};
pub use upload::UploadRequest;
