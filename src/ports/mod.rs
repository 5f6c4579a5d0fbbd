//! Port traits defining external boundaries.
//!
//! The generator touches exactly one external system, the filesystem.
//! Implementations live in `src/adapters/`.

pub mod filesystem;

pub use filesystem::{FileSystem, WriteLock};
