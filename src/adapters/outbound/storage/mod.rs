/// Storage adapters for scan sessions and their vulnerabilities
mod memory_store;

pub use memory_store::{InMemoryScanStore, StoredRepository};
