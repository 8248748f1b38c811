//! Entry handles
//!
//! File and directory handles addressed by path, plus the volume that
//! creates them. Every structural operation resolves its destination under a
//! [`CollisionPolicy`](crate::collision::CollisionPolicy) before any storage
//! mutation happens.

pub(crate) mod destination;
pub mod directory;
pub mod file;
pub mod results;
pub mod state;
pub mod volume;

use std::sync::Arc;

use crate::naming::UniqueNaming;
use crate::storage::SharedStorage;

pub use directory::DirectoryEntry;
pub use file::FileEntry;
pub use results::{CopyFailure, CopyReport, Outcome};
pub use state::EntryState;
pub use volume::Volume;

/// Collaborators shared by every handle of one volume.
#[derive(Debug, Clone)]
pub(crate) struct EntryContext {
    pub(crate) storage: SharedStorage,
    pub(crate) naming: Arc<UniqueNaming>,
}

impl EntryContext {
    pub(crate) fn new(storage: SharedStorage, naming: UniqueNaming) -> Self {
        Self {
            storage,
            naming: Arc::new(naming),
        }
    }
}
