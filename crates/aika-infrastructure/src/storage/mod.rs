//! Key-value store adapters.

mod atomic;
mod file;
mod memory;

pub use atomic::write_atomic;
pub use file::FileKeyValueStore;
pub use memory::InMemoryKeyValueStore;
