//! Adapters behind the domain ports.

pub mod disk;
pub mod gateway;
pub mod in_memory;
pub mod mailer;
#[cfg(feature = "storage-rocksdb")]
pub mod rocksdb;
