#![warn(missing_docs, unreachable_pub)]
#![deny(unused_must_use, rust_2018_idioms)]
//! Byte-addressed key-value storage contract.
//!
//! The block tree persists headers, bodies, and chain levels through three
//! logical namespaces of this contract. Any engine satisfying
//! [`KeyValueStore`] suffices; [`MemoryStore`] is the reference engine used
//! by tests and dev tooling.

mod kv;
pub use kv::{KeyValueStore, StoreError};

mod mem;
pub use mem::MemoryStore;
