//! In-memory directory tree driven through a cursor.
//!
//! Directories own their children, which are kept in insertion order and
//! bounded by a per-directory capacity. Files are leaves. The tree keeps a
//! cursor on the current working directory and resolves every path relative
//! to it.

mod error;
mod node;
mod tree;

pub use error::FilesystemError;
pub use node::DEFAULT_MAX_CHILDREN;
pub use tree::{DirectoryTree, Scope};
