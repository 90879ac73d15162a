//! PoolFS integration tests.
//!
//! End-to-end suites driving [`poolfs_vfs::PoolFs`] over the in-memory
//! provider: the write path, namespace operations, paged listings,
//! capacity behavior, recursive delete and root bootstrap.

pub mod harness;

pub mod namespace_tests;

pub use harness::{TestPool, TestPoolBuilder};
