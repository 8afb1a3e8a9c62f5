//! Workspace providers: a real directory tree, or an in-memory file map.

mod local;
mod memory;

pub use local::LocalWorkspace;
pub use memory::InMemoryWorkspace;
