//! Lexical path resolution for secondary downloads.
//!
//! Nothing here touches the filesystem. Symlinks are not followed and the
//! target need not exist.

use crate::error::{Result, ServerError};

/// Collapse `.`, `..` and repeated separators.
///
/// `..` never climbs above the root, and a trailing separator is dropped.
pub fn normalize(path: &str) -> String {
    let absolute = path.starts_with('/');
    let mut segments: Vec<&str> = Vec::new();

    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                if segments.last().is_some_and(|s| *s != "..") {
                    segments.pop();
                } else if !absolute {
                    segments.push("..");
                }
            }
            other => segments.push(other),
        }
    }

    let joined = segments.join("/");
    if absolute {
        format!("/{}", joined)
    } else if joined.is_empty() {
        ".".to_string()
    } else {
        joined
    }
}

/// Resolve `relative` under `prefix`, refusing anything that escapes it.
///
/// The resolved path must equal the prefix or sit below it on a segment
/// boundary, so `t1` does not admit `t10`.
pub fn resolve_within(prefix: &str, relative: &str) -> Result<String> {
    let prefix = normalize(prefix);
    let resolved = normalize(&format!("{}/{}", prefix, relative));

    let inside = resolved == prefix
        || resolved
            .strip_prefix(prefix.as_str())
            .is_some_and(|rest| rest.starts_with('/') || prefix == "/");
    if !inside {
        return Err(ServerError::InvalidPath(relative.to_string()));
    }
    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("/a/b/../c"), "/a/c");
        assert_eq!(normalize("/a//b/./c/"), "/a/b/c");
        assert_eq!(normalize("/../../a"), "/a");
        assert_eq!(normalize("/"), "/");
        assert_eq!(normalize("a/../../b"), "../b");
        assert_eq!(normalize("a/.."), ".");
    }

    #[test]
    fn test_resolve_inside_prefix() {
        let prefix = "/mnt/secondary/g1/i1/t1";
        assert_eq!(
            resolve_within(prefix, "output/file.nii.gz").unwrap(),
            "/mnt/secondary/g1/i1/t1/output/file.nii.gz"
        );
        assert_eq!(
            resolve_within(prefix, "a/../b").unwrap(),
            "/mnt/secondary/g1/i1/t1/b"
        );
        assert_eq!(resolve_within(prefix, "").unwrap(), prefix);
        assert_eq!(resolve_within(prefix, "./").unwrap(), prefix);
    }

    #[test]
    fn test_absolute_looking_path_stays_inside() {
        let resolved = resolve_within("/data/1/i/t", "/etc/passwd").unwrap();
        assert_eq!(resolved, "/data/1/i/t/etc/passwd");
    }

    #[test]
    fn test_traversal_is_rejected() {
        let prefix = "/mnt/secondary/g1/i1/t1";
        for bad in ["..", "../t2", "../../../../etc/passwd", "a/../../x"] {
            let err = resolve_within(prefix, bad).unwrap_err();
            assert!(matches!(err, ServerError::InvalidPath(_)), "{bad}");
        }
    }

    #[test]
    fn test_sibling_with_shared_prefix_is_rejected() {
        let err = resolve_within("/data/1/i/t1", "../t10/secret").unwrap_err();
        assert!(matches!(err, ServerError::InvalidPath(_)));
    }

    #[test]
    fn test_unnormalized_prefix() {
        let resolved = resolve_within("/data//1/./i/t/", "x").unwrap();
        assert_eq!(resolved, "/data/1/i/t/x");
    }
}
