use snafu::{OptionExt, ResultExt, Snafu, ensure};
use tracing::debug;

use crate::filesystem::{DirectoryTree, FilesystemError, Scope};

/// One line of shell input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    PrintWorkingDirectory,
    List,
    ListRecursive,
    Tree,
    ChangeToRoot,
    ChangeToParent,
    ChangeDirectory { path: String },
    MakeDirectory { name: String },
    MakeFile { name: String },
    Move { from: String, to: String },
    Find { name: String },
    Exit,
}

/// What the shell should do after a command ran
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Silent,
    Print(String),
    Exit,
}

impl Command {
    pub fn execute(&self, tree: &mut DirectoryTree) -> Result<Outcome, CommandError> {
        debug!("Executing {:?}", self);

        match self {
            Command::PrintWorkingDirectory => Ok(Outcome::Print(tree.present_working_directory())),
            Command::List => Ok(Outcome::Print(tree.list_children())),
            Command::ListRecursive => Ok(Outcome::Print(tree.render_tree(Scope::Root))),
            Command::Tree => Ok(Outcome::Print(tree.render_tree(Scope::Cursor))),
            Command::ChangeToRoot => {
                tree.reset_cursor();
                Ok(Outcome::Silent)
            }
            Command::ChangeToParent => {
                ensure!(!tree.is_at_root(), AlreadyAtRootSnafu);
                tree.go_to_parent();
                Ok(Outcome::Silent)
            }
            Command::ChangeDirectory { path } => {
                tree.change_directory(path)
                    .context(ChangeDirectorySnafu { path })?;
                Ok(Outcome::Silent)
            }
            Command::MakeDirectory { name } => {
                tree.make_directory(name).context(MakeSnafu { name })?;
                Ok(Outcome::Silent)
            }
            Command::MakeFile { name } => {
                tree.make_file(name).context(MakeSnafu { name })?;
                Ok(Outcome::Silent)
            }
            Command::Move { from, to } => {
                tree.move_node(from, to).context(MoveSnafu { from, to })?;
                Ok(Outcome::Silent)
            }
            Command::Find { name } => {
                let first = tree.find(name).context(NotFoundSnafu { name })?;
                debug!("First match for '{}' is {}", name, first);
                Ok(Outcome::Print(tree.find_all(name).join("\n")))
            }
            Command::Exit => Ok(Outcome::Exit),
        }
    }
}

impl TryFrom<&str> for Command {
    type Error = CommandError;

    fn try_from(line: &str) -> Result<Self, Self::Error> {
        let tokens = line.split_whitespace().collect::<Vec<_>>();

        let command = match tokens.as_slice() {
            ["pwd"] => Command::PrintWorkingDirectory,
            ["ls"] => Command::List,
            ["ls", "-R"] => Command::ListRecursive,
            ["tree"] => Command::Tree,
            ["cd", "/"] => Command::ChangeToRoot,
            ["cd", ".."] => Command::ChangeToParent,
            ["cd", path] => Command::ChangeDirectory {
                path: path.to_string(),
            },
            ["mkdir", name] => Command::MakeDirectory {
                name: name.to_string(),
            },
            ["touch", name] => Command::MakeFile {
                name: name.to_string(),
            },
            ["mv", from, to] => Command::Move {
                from: from.to_string(),
                to: to.to_string(),
            },
            ["find", name] => Command::Find {
                name: name.to_string(),
            },
            ["exit"] => Command::Exit,
            _ => {
                return UnknownCommandSnafu { line: line.trim() }.fail();
            }
        };

        Ok(command)
    }
}

#[derive(Debug, Snafu)]
pub enum CommandError {
    #[snafu(display("'{}' is not a valid command", line))]
    UnknownCommandError { line: String },
    #[snafu(display("Already at the root directory"))]
    AlreadyAtRootError,
    #[snafu(display("Cannot change directory to '{}': {}", path, source))]
    ChangeDirectoryError {
        path: String,
        source: FilesystemError,
    },
    #[snafu(display("Cannot create '{}': {}", name, source))]
    MakeError {
        name: String,
        source: FilesystemError,
    },
    #[snafu(display("Cannot move '{}' to '{}': {}", from, to, source))]
    MoveError {
        from: String,
        to: String,
        source: FilesystemError,
    },
    #[snafu(display("No entry named '{}' exists", name))]
    NotFoundError { name: String },
}
