//! Path helpers shared by the walker and the reporter.

use std::path::{Component, Path, PathBuf};

/// Whether the basename starts with a dot.
///
/// ```
/// use dedup::scanner::path_utils::is_hidden;
/// use std::path::Path;
///
/// assert!(is_hidden(Path::new("photos/.DS_Store")));
/// assert!(!is_hidden(Path::new("photos/img.jpg")));
/// ```
#[must_use]
pub fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .is_some_and(|name| name.as_encoded_bytes().first() == Some(&b'.'))
}

/// Rebuild a path from its components, dropping trailing separators and
/// interior `.` segments.
///
/// ```
/// use dedup::scanner::path_utils::normalize_input;
/// use std::path::{Path, PathBuf};
///
/// assert_eq!(normalize_input(Path::new("music/")), PathBuf::from("music"));
/// ```
#[must_use]
pub fn normalize_input(path: &Path) -> PathBuf {
    let normalized: PathBuf = path.components().collect();
    if normalized.as_os_str().is_empty() {
        PathBuf::from(Component::CurDir.as_os_str())
    } else {
        normalized
    }
}

/// Render spaces visibly in report lines.
#[must_use]
pub fn display(path: &Path) -> String {
    path.display().to_string().replace(' ', "·")
}

/// Split two paths into their shared leading components and the remainders.
///
/// Used to print `shared/{a -> b}` instead of two full paths.
#[must_use]
pub fn split_common_prefix(a: &Path, b: &Path) -> (PathBuf, PathBuf, PathBuf) {
    let mut a_parts = a.components().peekable();
    let mut b_parts = b.components().peekable();
    let mut shared = PathBuf::new();

    while let (Some(x), Some(y)) = (a_parts.peek(), b_parts.peek()) {
        if x != y {
            break;
        }
        shared.push(x.as_os_str());
        a_parts.next();
        b_parts.next();
    }

    let rest_a: PathBuf = a_parts.collect();
    let rest_b: PathBuf = b_parts.collect();
    (shared, rest_a, rest_b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_hidden() {
        assert!(is_hidden(Path::new(".hidden")));
        assert!(is_hidden(Path::new("/a/b/.cache")));
        assert!(!is_hidden(Path::new("/a/.b/visible.txt")));
        assert!(!is_hidden(Path::new("/")));
    }

    #[cfg(unix)]
    #[test]
    fn test_is_hidden_non_utf8_name() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let name = OsStr::from_bytes(b".z\xff");
        assert!(is_hidden(&Path::new("/data").join(name)));
        assert!(!is_hidden(&Path::new("/data").join(OsStr::from_bytes(b"z\xff"))));
    }

    #[test]
    fn test_normalize_input_trailing_separator() {
        assert_eq!(normalize_input(Path::new("a/b/")), PathBuf::from("a/b"));
        assert_eq!(normalize_input(Path::new("a/./b")), PathBuf::from("a/b"));
        assert_eq!(normalize_input(Path::new("/")), PathBuf::from("/"));
    }

    #[test]
    fn test_display_replaces_spaces() {
        assert_eq!(display(Path::new("my docs/a b.txt")), "my·docs/a·b.txt");
    }

    #[test]
    fn test_split_common_prefix() {
        let (shared, a, b) =
            split_common_prefix(Path::new("/data/src/x.txt"), Path::new("/data/dst/x.txt"));
        assert_eq!(shared, PathBuf::from("/data"));
        assert_eq!(a, PathBuf::from("src/x.txt"));
        assert_eq!(b, PathBuf::from("dst/x.txt"));
    }

    #[test]
    fn test_split_common_prefix_nothing_shared() {
        let (shared, a, b) = split_common_prefix(Path::new("one/x"), Path::new("two/y"));
        assert!(shared.as_os_str().is_empty());
        assert_eq!(a, PathBuf::from("one/x"));
        assert_eq!(b, PathBuf::from("two/y"));
    }
}
