//! Helpers for repo-root-relative, slash-separated remote paths.

use std::path::{Component, Path};

/// Join a remote base path and a relative path, dropping empty segments.
pub fn join_remote(base: &str, relative: &str) -> String {
    base.split('/').chain(relative.split('/')).filter(|s| !s.is_empty()).collect::<Vec<_>>().join("/")
}

/// Parent of a remote path ("" for top-level entries and the root itself).
pub fn parent(path: &str) -> String {
    let trimmed = path.trim_matches('/');
    match trimmed.rfind('/') {
        Some(pos) => trimmed[..pos].to_string(),
        None => String::new(),
    }
}

/// Last segment of a remote path.
pub fn file_name(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    trimmed.rsplit('/').next().unwrap_or(trimmed)
}

/// Whether `path` equals `ancestor` or lies below it, compared component-wise.
pub fn is_within(path: &str, ancestor: &str) -> bool {
    let ancestor = ancestor.trim_matches('/');
    let path = path.trim_matches('/');
    ancestor.is_empty() || path == ancestor || path.strip_prefix(ancestor).is_some_and(|rest| rest.starts_with('/'))
}

/// Convert a local relative path into a remote path: OS separators become `/`.
pub fn normalize_relative(relative: &Path) -> String {
    relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().replace('\\', "/")),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn join_skips_empty_segments() {
        assert_eq!(join_remote("uploads", "sub/y.txt"), "uploads/sub/y.txt");
        assert_eq!(join_remote("", "x.txt"), "x.txt");
        assert_eq!(join_remote("uploads/", "/x.txt"), "uploads/x.txt");
    }

    #[test]
    fn parent_of_nested_and_top_level() {
        assert_eq!(parent("a/c/d.txt"), "a/c");
        assert_eq!(parent("e.txt"), "");
        assert_eq!(parent(""), "");
    }

    #[test]
    fn file_name_is_last_segment() {
        assert_eq!(file_name("a/c/d.txt"), "d.txt");
        assert_eq!(file_name("README.md"), "README.md");
    }

    #[test]
    fn within_is_component_wise() {
        assert!(is_within("a/b.txt", "a"));
        assert!(is_within("a", "a"));
        assert!(!is_within("ab/c", "a"));
        assert!(is_within("anything", ""));
    }

    #[test]
    fn normalize_relative_joins_with_slash() {
        let rel: PathBuf = ["sub", "deeper", "y.txt"].iter().collect();
        assert_eq!(normalize_relative(&rel), "sub/deeper/y.txt");
        assert_eq!(normalize_relative(Path::new("./x.txt")), "x.txt");
    }
}
