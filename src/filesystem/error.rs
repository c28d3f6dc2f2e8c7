use snafu::Snafu;

/// Failures raised by the directory tree. None of them are fatal: single-step
/// operations leave the tree untouched and multi-step ones roll back.
#[derive(Debug, Clone, PartialEq, Eq, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum FilesystemError {
    #[snafu(display("'{}' is not a valid name", name))]
    InvalidNameError { name: String },
    #[snafu(display("'{}' is not a directory", name))]
    NotADirectoryError { name: String },
    #[snafu(display("Directory '{}' already holds {} entries", name, capacity))]
    FullDirectoryError { name: String, capacity: usize },
    #[snafu(display("An entry named '{}' already exists", name))]
    ConflictingNameError { name: String },
    #[snafu(display("'{}' cannot be resolved", path))]
    UnresolvedPathError { path: String },
}
