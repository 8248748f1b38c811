//! Collision handling
//!
//! Policies deciding what a structural operation does when its destination
//! is occupied, and the resolver that generates unique free names.

mod policy;
mod resolver;

pub use policy::CollisionPolicy;
pub use resolver::{EntryKind, PathParts, resolve};
