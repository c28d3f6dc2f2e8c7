use snafu::{OptionExt, ensure, location};
use tracing::{debug, error, info};

use crate::ext::{NodeNameExt, PathSegmentsExt};
use crate::filesystem::error::{
    FilesystemError, InvalidNameSnafu, NotADirectorySnafu, UnresolvedPathSnafu,
};
use crate::filesystem::node::{DEFAULT_MAX_CHILDREN, Node};

/// Name of the top-level directory, also the first segment of every path
pub const ROOT_NAME: &str = "root";

const INDENT: &str = "    ";

/// Where a rendered listing starts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Cursor,
    Root,
}

/// The simulated file system: a root directory plus a cursor marking the
/// current working directory.
///
/// The cursor is stored as the names leading from the root to the current
/// directory. Going up drops the last name, and the working path is built
/// from the same names, so it cannot drift from the cursor.
#[derive(Debug, Clone)]
pub struct DirectoryTree {
    root: Node,
    cursor: Vec<String>,
    max_children: usize,
}

impl Default for DirectoryTree {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CHILDREN)
    }
}

impl DirectoryTree {
    /// Creates a tree holding only `root`. Every directory, the root
    /// included, accepts at most `max_children` entries.
    pub fn new(max_children: usize) -> Self {
        Self {
            root: Node::directory(ROOT_NAME, max_children),
            cursor: Vec::new(),
            max_children,
        }
    }

    pub fn max_children(&self) -> usize {
        self.max_children
    }

    pub fn is_at_root(&self) -> bool {
        self.cursor.is_empty()
    }

    pub fn present_working_directory(&self) -> String {
        std::iter::once(ROOT_NAME)
            .chain(self.cursor.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join("/")
    }

    pub fn reset_cursor(&mut self) {
        self.cursor.clear();
        debug!("Cursor reset to {}", ROOT_NAME);
    }

    /// Enters the directory `name` directly below the cursor.
    pub fn go_to_child(&mut self, name: &str) -> Result<(), FilesystemError> {
        let child = self
            .cursor_node()
            .child(name)
            .context(UnresolvedPathSnafu { path: name })?;
        ensure!(!child.is_file(), NotADirectorySnafu { name });

        self.cursor.push(name.to_string());
        debug!("Cursor moved to {}", self.present_working_directory());
        Ok(())
    }

    /// Moves the cursor one level up. Does nothing at the root.
    pub fn go_to_parent(&mut self) {
        if self.cursor.pop().is_some() {
            debug!("Cursor moved to {}", self.present_working_directory());
        }
    }

    /// Follows `path` segment by segment from the cursor. If a segment does
    /// not resolve to a directory the cursor goes back to where it was, and
    /// the error names the whole `path`.
    pub fn change_directory(&mut self, path: &str) -> Result<(), FilesystemError> {
        let saved = self.cursor.clone();

        for segment in path.path_segments() {
            if let Err(err) = self.go_to_child(segment) {
                self.cursor = saved;
                debug!("Cursor restored to {}", self.present_working_directory());
                return Err(match err {
                    FilesystemError::NotADirectoryError { .. } => {
                        NotADirectorySnafu { name: path }.build()
                    }
                    _ => UnresolvedPathSnafu { path }.build(),
                });
            }
        }

        Ok(())
    }

    pub fn make_directory(&mut self, name: &str) -> Result<(), FilesystemError> {
        let name = name.valid_node_name().context(InvalidNameSnafu { name })?;
        self.attach_to_cursor(Node::directory(name, self.max_children))
    }

    pub fn make_file(&mut self, name: &str) -> Result<(), FilesystemError> {
        let name = name.valid_node_name().context(InvalidNameSnafu { name })?;
        self.attach_to_cursor(Node::file(name))
    }

    /// Moves the entry at `source` into the directory at `target`, both
    /// relative to the cursor.
    ///
    /// If anything fails once the entry is detached, it is put back at its
    /// former position under its former parent. The cursor is never moved.
    pub fn move_node(&mut self, source: &str, target: &str) -> Result<(), FilesystemError> {
        let (parent_segments, name) = source
            .split_last_segment()
            .context(UnresolvedPathSnafu { path: source })?;
        let source_parent = self.resolve(&parent_segments, source)?;

        let parent = descend_mut(&mut self.root, &source_parent)
            .context(UnresolvedPathSnafu { path: source })?;
        let index = parent
            .child_index(name)
            .context(UnresolvedPathSnafu { path: source })?;
        let node = parent.remove_child(name)?;
        debug!("Detached '{}' for move to '{}'", source, target);

        match self.adopting_directory(target, node.name()) {
            Ok(directory) => {
                directory.adopt(node);
                info!("Moved '{}' into '{}'", source, target);
                Ok(())
            }
            Err(err) => {
                debug!("Move of '{}' failed, restoring it: {}", source, err);
                self.restore(&source_parent, index, node);
                Err(err)
            }
        }
    }

    /// Path of the first entry called `name`, searching pre-order from the
    /// root.
    pub fn find(&self, name: &str) -> Option<String> {
        self.root
            .pre_order(ROOT_NAME)
            .find(|visit| visit.node.name() == name)
            .map(|visit| visit.path)
    }

    /// Paths of every entry called `name`, in pre-order.
    pub fn find_all(&self, name: &str) -> Vec<String> {
        self.root
            .pre_order(ROOT_NAME)
            .filter(|visit| visit.node.name() == name)
            .map(|visit| visit.path)
            .collect()
    }

    pub fn list_children(&self) -> String {
        self.cursor_node()
            .children()
            .map(Node::name)
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Indented listing, one line per entry. Directories are prefixed with
    /// `|- `, files with ` - `.
    pub fn render_tree(&self, scope: Scope) -> String {
        let (start, path) = match scope {
            Scope::Root => (&self.root, ROOT_NAME.to_string()),
            Scope::Cursor => (self.cursor_node(), self.present_working_directory()),
        };

        start
            .pre_order(path)
            .map(|visit| {
                let marker = if visit.node.is_file() { " " } else { "|" };
                format!(
                    "{}{}- {}",
                    INDENT.repeat(visit.depth),
                    marker,
                    visit.node.name()
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Walks `segments` from the cursor and returns the absolute name path
    /// of the directory reached. Errors mention the whole `path`.
    fn resolve(&self, segments: &[&str], path: &str) -> Result<Vec<String>, FilesystemError> {
        let mut resolved = self.cursor.clone();
        let mut node = self.cursor_node();

        for segment in segments {
            let child = node
                .child(segment)
                .context(UnresolvedPathSnafu { path })?;
            ensure!(!child.is_file(), NotADirectorySnafu { name: path });
            resolved.push(segment.to_string());
            node = child;
        }

        Ok(resolved)
    }

    /// Directory at `target` if it can take a child called `name`
    fn adopting_directory(
        &mut self,
        target: &str,
        name: &str,
    ) -> Result<&mut Node, FilesystemError> {
        let segments = target.path_segments();
        let resolved = self.resolve(&segments, target)?;
        let directory = descend_mut(&mut self.root, &resolved)
            .context(UnresolvedPathSnafu { path: target })?;
        directory.ensure_can_adopt(name)?;
        Ok(directory)
    }

    fn restore(&mut self, parent_path: &[String], index: usize, node: Node) {
        match descend_mut(&mut self.root, parent_path) {
            Some(parent) => parent.restore_child(index, node),
            None => error!(
                "Parent of '{}' vanished during a move {}",
                node.name(),
                location!()
            ),
        }
    }

    fn attach_to_cursor(&mut self, node: Node) -> Result<(), FilesystemError> {
        let description = format!("{} '{}'", node.kind(), node.name());
        self.cursor_node_mut()?.add_child(node)?;
        info!(
            "Created {} in {}",
            description,
            self.present_working_directory()
        );
        Ok(())
    }

    fn cursor_node(&self) -> &Node {
        descend(&self.root, &self.cursor).unwrap_or_else(|| {
            error!(
                "Cursor {:?} does not point at a live directory {}",
                self.cursor,
                location!()
            );
            &self.root
        })
    }

    fn cursor_node_mut(&mut self) -> Result<&mut Node, FilesystemError> {
        let path = self.present_working_directory();
        descend_mut(&mut self.root, &self.cursor).context(UnresolvedPathSnafu { path })
    }
}

fn descend<'a>(mut node: &'a Node, path: &[String]) -> Option<&'a Node> {
    for segment in path {
        node = node.child(segment)?;
    }
    Some(node)
}

fn descend_mut<'a>(mut node: &'a mut Node, path: &[String]) -> Option<&'a mut Node> {
    for segment in path {
        node = node.child_mut(segment)?;
    }
    Some(node)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::*;

    /// root
    /// |- a
    /// |   |- b
    /// |   |   - deep
    /// |    - note
    ///  - f
    /// |- c
    #[fixture]
    fn tree() -> DirectoryTree {
        let mut tree = DirectoryTree::default();
        tree.make_directory("a").unwrap();
        tree.make_file("f").unwrap();
        tree.make_directory("c").unwrap();
        tree.change_directory("a").unwrap();
        tree.make_directory("b").unwrap();
        tree.make_file("note").unwrap();
        tree.change_directory("b").unwrap();
        tree.make_file("deep").unwrap();
        tree.reset_cursor();
        tree
    }

    #[test]
    fn new_tree_starts_at_root() {
        let tree = DirectoryTree::default();

        assert_eq!(tree.present_working_directory(), "root");
        assert!(tree.is_at_root());
        assert_eq!(tree.list_children(), "");
        assert_eq!(tree.max_children(), DEFAULT_MAX_CHILDREN);
    }

    #[test]
    fn concrete_session() {
        let mut tree = DirectoryTree::default();

        tree.make_directory("a").unwrap();
        tree.change_directory("a").unwrap();
        assert_eq!(tree.present_working_directory(), "root/a");

        tree.go_to_parent();
        assert_eq!(tree.present_working_directory(), "root");

        tree.make_file("f").unwrap();
        assert!(matches!(
            tree.make_file("f"),
            Err(FilesystemError::ConflictingNameError { .. })
        ));
        assert_eq!(tree.find("f").as_deref(), Some("root/f"));

        tree.move_node("f", "a").unwrap();
        assert_eq!(tree.find("f").as_deref(), Some("root/a/f"));
        assert_eq!(tree.list_children(), "a");
    }

    #[rstest]
    #[case("a")]
    #[case("a/b")]
    #[case("c")]
    fn reset_cursor_always_returns_to_root(mut tree: DirectoryTree, #[case] path: &str) {
        tree.change_directory(path).unwrap();
        tree.reset_cursor();

        assert_eq!(tree.present_working_directory(), "root");
        assert!(tree.is_at_root());

        tree.reset_cursor();
        assert_eq!(tree.present_working_directory(), "root");
    }

    #[rstest]
    #[case("a", 1)]
    #[case("a/b", 2)]
    #[case("c", 1)]
    fn going_up_once_per_segment_returns_to_root(
        mut tree: DirectoryTree,
        #[case] path: &str,
        #[case] depth: usize,
    ) {
        tree.change_directory(path).unwrap();
        assert_eq!(tree.present_working_directory(), format!("root/{path}"));

        for _ in 0..depth {
            tree.go_to_parent();
        }

        assert!(tree.is_at_root());
        assert_eq!(tree.present_working_directory(), "root");
    }

    #[rstest]
    fn go_to_parent_at_root_is_a_no_op(mut tree: DirectoryTree) {
        tree.go_to_parent();
        tree.go_to_parent();

        assert_eq!(tree.present_working_directory(), "root");
    }

    #[rstest]
    fn go_to_child_enters_directories_only(mut tree: DirectoryTree) {
        assert!(matches!(
            tree.go_to_child("f"),
            Err(FilesystemError::NotADirectoryError { .. })
        ));
        assert!(matches!(
            tree.go_to_child("missing"),
            Err(FilesystemError::UnresolvedPathError { .. })
        ));
        assert_eq!(tree.present_working_directory(), "root");

        tree.go_to_child("a").unwrap();
        assert_eq!(tree.present_working_directory(), "root/a");
    }

    #[rstest]
    #[case("a/missing")]
    #[case("a/b/missing/deeper")]
    #[case("nope")]
    fn change_directory_to_unknown_path_changes_nothing(
        mut tree: DirectoryTree,
        #[case] path: &str,
    ) {
        tree.change_directory("a").unwrap();

        let result = tree.change_directory(path);

        assert!(matches!(
            result,
            Err(FilesystemError::UnresolvedPathError { path: reported }) if reported == path
        ));
        assert_eq!(tree.present_working_directory(), "root/a");
    }

    #[rstest]
    #[case("f")]
    #[case("a/note")]
    #[case("a/b/deep/x")]
    fn change_directory_through_a_file_changes_nothing(
        mut tree: DirectoryTree,
        #[case] path: &str,
    ) {
        let result = tree.change_directory(path);

        assert!(matches!(
            result,
            Err(FilesystemError::NotADirectoryError { name }) if name == path
        ));
        assert_eq!(tree.present_working_directory(), "root");
    }

    #[rstest]
    fn change_directory_accepts_a_trailing_slash(mut tree: DirectoryTree) {
        tree.change_directory("a/b/").unwrap();

        assert_eq!(tree.present_working_directory(), "root/a/b");
    }

    #[rstest]
    #[case("/b")]
    #[case("b//")]
    #[case("//b")]
    #[case("")]
    fn change_directory_with_empty_segment_changes_nothing(
        mut tree: DirectoryTree,
        #[case] path: &str,
    ) {
        tree.change_directory("a").unwrap();

        let result = tree.change_directory(path);

        assert!(matches!(
            result,
            Err(FilesystemError::UnresolvedPathError { path: reported }) if reported == path
        ));
        assert_eq!(tree.present_working_directory(), "root/a");
    }

    #[rstest]
    fn change_directory_with_inner_empty_segment_changes_nothing(mut tree: DirectoryTree) {
        let result = tree.change_directory("a//b");

        assert!(matches!(
            result,
            Err(FilesystemError::UnresolvedPathError { .. })
        ));
        assert_eq!(tree.present_working_directory(), "root");
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    #[case("a/b")]
    #[case("has space")]
    fn make_rejects_invalid_names(mut tree: DirectoryTree, #[case] name: &str) {
        assert!(matches!(
            tree.make_directory(name),
            Err(FilesystemError::InvalidNameError { .. })
        ));
        assert!(matches!(
            tree.make_file(name),
            Err(FilesystemError::InvalidNameError { .. })
        ));
        assert_eq!(tree.list_children(), "a f c");
    }

    #[rstest]
    fn make_trims_surrounding_whitespace(mut tree: DirectoryTree) {
        tree.make_file("  spaced  ").unwrap();

        assert_eq!(tree.list_children(), "a f c spaced");
    }

    #[rstest]
    #[case("a")]
    #[case("f")]
    fn make_with_existing_name_fails(mut tree: DirectoryTree, #[case] name: &str) {
        assert!(matches!(
            tree.make_directory(name),
            Err(FilesystemError::ConflictingNameError { .. })
        ));
        assert!(matches!(
            tree.make_file(name),
            Err(FilesystemError::ConflictingNameError { .. })
        ));
        assert_eq!(tree.list_children(), "a f c");
    }

    #[rstest]
    #[case(1)]
    #[case(3)]
    #[case(DEFAULT_MAX_CHILDREN)]
    fn make_fails_once_directory_is_full(#[case] capacity: usize) {
        let mut tree = DirectoryTree::new(capacity);
        for i in 0..capacity {
            tree.make_file(&format!("file{i}")).unwrap();
        }

        assert!(matches!(
            tree.make_directory("overflow"),
            Err(FilesystemError::FullDirectoryError { .. })
        ));
        assert!(matches!(
            tree.make_file("overflow"),
            Err(FilesystemError::FullDirectoryError { .. })
        ));
        assert_eq!(tree.find("overflow"), None);
    }

    #[test]
    fn new_directories_inherit_capacity() {
        let mut tree = DirectoryTree::new(2);
        tree.make_directory("d").unwrap();
        tree.change_directory("d").unwrap();
        tree.make_file("x").unwrap();
        tree.make_file("y").unwrap();

        assert!(matches!(
            tree.make_file("z"),
            Err(FilesystemError::FullDirectoryError { capacity: 2, .. })
        ));
    }

    #[rstest]
    fn find_returns_first_pre_order_match(mut tree: DirectoryTree) {
        tree.change_directory("c").unwrap();
        tree.make_file("note").unwrap();

        assert_eq!(tree.find("note").as_deref(), Some("root/a/note"));
        assert_eq!(tree.find("deep").as_deref(), Some("root/a/b/deep"));
        assert_eq!(tree.find("root").as_deref(), Some("root"));
        assert_eq!(tree.find("ghost"), None);
    }

    #[rstest]
    fn find_all_collects_every_match_in_pre_order(mut tree: DirectoryTree) {
        tree.change_directory("c").unwrap();
        tree.make_file("note").unwrap();
        tree.reset_cursor();
        tree.change_directory("a/b").unwrap();
        tree.make_directory("note").unwrap();

        assert_eq!(
            tree.find_all("note"),
            vec!["root/a/b/note", "root/a/note", "root/c/note"]
        );
        assert!(tree.find_all("ghost").is_empty());
    }

    #[rstest]
    fn render_tree_from_root(tree: DirectoryTree) {
        let expected = [
            "|- root",
            "    |- a",
            "        |- b",
            "             - deep",
            "         - note",
            "     - f",
            "    |- c",
        ]
        .join("\n");

        assert_eq!(tree.render_tree(Scope::Root), expected);
    }

    #[rstest]
    fn render_tree_from_cursor(mut tree: DirectoryTree) {
        tree.change_directory("a").unwrap();

        let expected = ["|- a", "    |- b", "         - deep", "     - note"].join("\n");

        assert_eq!(tree.render_tree(Scope::Cursor), expected);
        assert!(tree.render_tree(Scope::Root).starts_with("|- root"));
    }

    #[rstest]
    fn list_children_is_space_joined(mut tree: DirectoryTree) {
        assert_eq!(tree.list_children(), "a f c");

        tree.change_directory("a/b").unwrap();
        assert_eq!(tree.list_children(), "deep");
    }

    #[rstest]
    fn move_file_into_nested_directory(mut tree: DirectoryTree) {
        tree.move_node("f", "a/b").unwrap();

        assert_eq!(tree.find("f").as_deref(), Some("root/a/b/f"));
        assert_eq!(tree.list_children(), "a c");
        assert_eq!(tree.present_working_directory(), "root");
    }

    #[rstest]
    fn move_directory_carries_its_subtree(mut tree: DirectoryTree) {
        tree.move_node("a/b", "c").unwrap();

        assert_eq!(tree.find("deep").as_deref(), Some("root/c/b/deep"));
        tree.change_directory("a").unwrap();
        assert_eq!(tree.list_children(), "note");
    }

    #[rstest]
    fn move_is_relative_to_cursor_and_keeps_it(mut tree: DirectoryTree) {
        tree.change_directory("a").unwrap();

        tree.move_node("note", "b").unwrap();

        assert_eq!(tree.present_working_directory(), "root/a");
        assert_eq!(tree.find("note").as_deref(), Some("root/a/b/note"));
    }

    #[rstest]
    #[case("f", "missing")]
    #[case("f", "a/missing")]
    #[case("a", "a/b")]
    #[case("a", "a")]
    fn failed_move_to_unresolved_target_restores_source(
        mut tree: DirectoryTree,
        #[case] source: &str,
        #[case] target: &str,
    ) {
        let before = tree.render_tree(Scope::Root);

        let result = tree.move_node(source, target);

        assert!(matches!(
            result,
            Err(FilesystemError::UnresolvedPathError { .. })
        ));
        assert_eq!(tree.render_tree(Scope::Root), before);
    }

    #[rstest]
    #[case("c", "f")]
    #[case("c", "a/note")]
    fn failed_move_to_file_restores_source(
        mut tree: DirectoryTree,
        #[case] source: &str,
        #[case] target: &str,
    ) {
        let before = tree.render_tree(Scope::Root);

        let result = tree.move_node(source, target);

        assert!(matches!(
            result,
            Err(FilesystemError::NotADirectoryError { .. })
        ));
        assert_eq!(tree.render_tree(Scope::Root), before);
    }

    #[rstest]
    fn failed_move_on_name_conflict_restores_source(mut tree: DirectoryTree) {
        tree.change_directory("c").unwrap();
        tree.make_file("f").unwrap();
        tree.reset_cursor();
        let before = tree.render_tree(Scope::Root);

        let result = tree.move_node("f", "c");

        assert!(matches!(
            result,
            Err(FilesystemError::ConflictingNameError { .. })
        ));
        assert_eq!(tree.render_tree(Scope::Root), before);
        assert_eq!(tree.list_children(), "a f c");
        assert_eq!(tree.find_all("f"), vec!["root/f", "root/c/f"]);
    }

    #[test]
    fn failed_move_into_full_directory_restores_source() {
        let mut tree = DirectoryTree::new(2);
        tree.make_directory("full").unwrap();
        tree.make_file("f").unwrap();
        tree.change_directory("full").unwrap();
        tree.make_file("x").unwrap();
        tree.make_file("y").unwrap();
        tree.go_to_parent();

        let result = tree.move_node("f", "full");

        assert!(matches!(
            result,
            Err(FilesystemError::FullDirectoryError { .. })
        ));
        assert_eq!(tree.list_children(), "full f");
        assert_eq!(tree.find("f").as_deref(), Some("root/f"));
    }

    #[rstest]
    #[case("missing", "c")]
    #[case("a/missing", "c")]
    #[case("f/inner", "c")]
    #[case("", "c")]
    #[case("/f", "c")]
    #[case("a//note", "c")]
    #[case("f", "/c")]
    #[case("f", "a//b")]
    fn move_along_unresolved_paths_changes_nothing(
        mut tree: DirectoryTree,
        #[case] source: &str,
        #[case] target: &str,
    ) {
        let before = tree.render_tree(Scope::Root);

        assert!(tree.move_node(source, target).is_err());
        assert_eq!(tree.render_tree(Scope::Root), before);
    }

    #[rstest]
    fn failed_move_keeps_sibling_order(mut tree: DirectoryTree) {
        assert!(tree.move_node("f", "nowhere").is_err());

        assert_eq!(tree.list_children(), "a f c");
    }

    #[rstest]
    fn failed_move_keeps_cursor(mut tree: DirectoryTree) {
        tree.change_directory("a").unwrap();

        assert!(tree.move_node("note", "missing").is_err());

        assert_eq!(tree.present_working_directory(), "root/a");
        assert_eq!(tree.list_children(), "b note");
    }
}
