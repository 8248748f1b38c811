pub mod access;
pub mod bridge;
pub mod collision;
pub mod commands;
pub mod config;
pub mod entry;
pub mod error;
pub mod naming;
pub mod storage;
pub mod utils;

pub use collision::CollisionPolicy;
pub use config::FsConfig;
pub use entry::{DirectoryEntry, FileEntry, Volume};
pub use error::{EntryError, EntryResult};
