/// Splitting helpers for the `/`-delimited paths typed into the shell.
///
/// Paths are always relative to the cursor. A single trailing `/` is
/// dropped, so `a/b/` resolves like `a/b`. Any other empty segment is kept
/// and can never name an entry: `/a` and `a//b` do not resolve.
pub trait PathSegmentsExt {
    /// The segments of the path, in order.
    fn path_segments(&self) -> Vec<&str>;

    /// The leading segments and the final one, or `None` for a path without
    /// any segment.
    fn split_last_segment(&self) -> Option<(Vec<&str>, &str)>;
}

impl PathSegmentsExt for str {
    fn path_segments(&self) -> Vec<&str> {
        self.strip_suffix('/').unwrap_or(self).split('/').collect()
    }

    fn split_last_segment(&self) -> Option<(Vec<&str>, &str)> {
        let mut segments = self.path_segments();
        let last = segments.pop().filter(|last| !last.is_empty())?;
        Some((segments, last))
    }
}

/// Checks that a node name is usable: non-empty once trimmed and free of `/`
/// and whitespace. Returns the trimmed name.
pub trait NodeNameExt {
    fn valid_node_name(&self) -> Option<&str>;
}

impl NodeNameExt for str {
    fn valid_node_name(&self) -> Option<&str> {
        let name = self.trim();
        let invalid =
            name.is_empty() || name.contains('/') || name.chars().any(char::is_whitespace);
        (!invalid).then_some(name)
    }
}
