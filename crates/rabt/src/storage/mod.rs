//! Local persistence: a string key-value store and the profile service.

mod error;
mod profile;
mod store;

pub use error::StorageError;
pub use profile::{DEFAULT_USERNAME, MUTED_KEY, ProfileService, USER_KEY, UserProfile};
pub use store::{FileStore, KeyValueStore, MemoryStore};
