#![warn(missing_docs)]

//! PoolFS remote object store surface.
//!
//! This crate defines the capability-typed call surface the pooling
//! filesystem layer is written against: the item model, the per-credential
//! [`ObjectStore`] trait with ordered paginated listings, and an in-memory
//! multi-account provider used as the test double.

pub mod error;
pub mod item;
pub mod memory;
pub mod store;

pub use error::{RemoteError, RemoteResult};
pub use item::{
    ItemKind, ItemPatch, NewItem, RemoteItem, ShortcutTarget, MIME_TYPE_BINARY,
    MIME_TYPE_DIRECTORY, MIME_TYPE_SHORTCUT,
};
pub use memory::{MemoryObjectStore, MemoryProvider, ProviderStats};
pub use store::{ListQuery, ObjectStore, Page, PermissionRole, StorageQuota};
