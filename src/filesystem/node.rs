use derive_more::{Display, IsVariant};
use hashlink::LinkedHashMap;
use snafu::{OptionExt, ensure, location};
use tracing::error;

use crate::filesystem::error::{
    ConflictingNameSnafu, FilesystemError, FullDirectorySnafu, NotADirectorySnafu,
    UnresolvedPathSnafu,
};

/// Number of entries a directory accepts unless configured otherwise
pub const DEFAULT_MAX_CHILDREN: usize = 10;

/// What a node is. Only directories carry children, so a file can never
/// have any.
#[derive(Debug, Clone, PartialEq, Eq, Display, IsVariant)]
pub enum NodeKind {
    #[display("file")]
    File,
    #[display("directory")]
    Directory {
        /// Children keyed by name, kept in insertion order
        children: LinkedHashMap<String, Node>,
        max_children: usize,
    },
}

/// One entry of the simulated tree. A node owns its children; the way back
/// up is tracked by the tree's cursor, never by the node itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    name: String,
    kind: NodeKind,
}

impl Node {
    pub fn file(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: NodeKind::File,
        }
    }

    pub fn directory(name: impl Into<String>, max_children: usize) -> Self {
        Self {
            name: name.into(),
            kind: NodeKind::Directory {
                children: LinkedHashMap::new(),
                max_children,
            },
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn is_file(&self) -> bool {
        self.kind.is_file()
    }

    /// Children in stored order. Empty for files.
    pub fn children(&self) -> impl Iterator<Item = &Node> {
        self.children_map().into_iter().flat_map(LinkedHashMap::values)
    }

    pub fn child(&self, name: &str) -> Option<&Node> {
        self.children_map()?.get(name)
    }

    pub fn child_mut(&mut self, name: &str) -> Option<&mut Node> {
        match &mut self.kind {
            NodeKind::Directory { children, .. } => children.get_mut(name),
            NodeKind::File => None,
        }
    }

    pub fn child_index(&self, name: &str) -> Option<usize> {
        self.children_map()?.keys().position(|key| key == name)
    }

    /// Checks everything `add_child` would check for a child called `name`,
    /// without touching the node.
    pub fn ensure_can_adopt(&self, name: &str) -> Result<(), FilesystemError> {
        let NodeKind::Directory {
            children,
            max_children,
        } = &self.kind
        else {
            return NotADirectorySnafu { name: &self.name }.fail();
        };

        ensure!(
            children.len() < *max_children,
            FullDirectorySnafu {
                name: &self.name,
                capacity: *max_children,
            }
        );
        ensure!(
            !children.contains_key(name),
            ConflictingNameSnafu { name }
        );

        Ok(())
    }

    /// Appends `node` as the last child. Fails without side effects when this
    /// node is a file, is full, or already has a child with the same name.
    pub fn add_child(&mut self, node: Node) -> Result<(), FilesystemError> {
        self.ensure_can_adopt(&node.name)?;
        self.adopt(node);
        Ok(())
    }

    /// Detaches the child called `name` and hands it over to the caller.
    /// Remaining siblings keep their relative order.
    pub fn remove_child(&mut self, name: &str) -> Result<Node, FilesystemError> {
        let removed = match &mut self.kind {
            NodeKind::Directory { children, .. } => children.remove(name),
            NodeKind::File => None,
        };
        removed.context(UnresolvedPathSnafu { path: name })
    }

    /// Puts a previously detached child back at `index`, skipping the
    /// adoption checks. The slot and the name were freed by the removal.
    pub(crate) fn restore_child(&mut self, index: usize, node: Node) {
        let NodeKind::Directory { children, .. } = &mut self.kind else {
            error!(
                "Attempted to restore '{}' under file '{}' {}",
                node.name,
                self.name,
                location!()
            );
            return;
        };

        let trailing = children.keys().skip(index).cloned().collect::<Vec<_>>();
        children.insert(node.name.clone(), node);
        for key in &trailing {
            children.to_back(key);
        }
    }

    /// Pre-order walk of this subtree. `path` is the path of this node; the
    /// path of each descendant is built by appending `/name`.
    pub fn pre_order(&self, path: impl Into<String>) -> PreOrder<'_> {
        PreOrder {
            stack: vec![Visit {
                path: path.into(),
                depth: 0,
                node: self,
            }],
        }
    }

    /// Inserts without checks; callers go through `ensure_can_adopt` first.
    pub(crate) fn adopt(&mut self, node: Node) {
        match &mut self.kind {
            NodeKind::Directory { children, .. } => {
                children.insert(node.name.clone(), node);
            }
            NodeKind::File => error!(
                "Attempted to adopt '{}' under file '{}' {}",
                node.name,
                self.name,
                location!()
            ),
        }
    }

    fn children_map(&self) -> Option<&LinkedHashMap<String, Node>> {
        match &self.kind {
            NodeKind::Directory { children, .. } => Some(children),
            NodeKind::File => None,
        }
    }
}

/// A node reached during a pre-order walk
#[derive(Debug, Clone)]
pub struct Visit<'a> {
    pub path: String,
    pub depth: usize,
    pub node: &'a Node,
}

pub struct PreOrder<'a> {
    stack: Vec<Visit<'a>>,
}

impl<'a> Iterator for PreOrder<'a> {
    type Item = Visit<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let visit = self.stack.pop()?;

        // Pushed in reverse so the first child is popped first
        let children = visit.node.children().collect::<Vec<_>>();
        for child in children.into_iter().rev() {
            self.stack.push(Visit {
                path: format!("{}/{}", visit.path, child.name),
                depth: visit.depth + 1,
                node: child,
            });
        }

        Some(visit)
    }
}
