//! Remote path resolution
//!
//! Pure string functions: no remote calls happen here. Every path handed
//! to the engine goes through [`canonicalize`] first, so the engine only
//! ever sees absolute, normalized paths.

/// Resolve `path` against the working directory `cwd` and normalize:
/// collapse `.`, `..` and redundant separators. `..` above the root stays
/// at `/`.
pub fn canonicalize(cwd: &str, path: &str) -> String {
    let joined = if path.starts_with('/') {
        path.to_string()
    } else {
        format!("{cwd}/{path}")
    };

    let mut stack: Vec<&str> = Vec::new();
    for seg in joined.split('/') {
        match seg {
            "" | "." => {}
            ".." => {
                stack.pop();
            }
            seg => stack.push(seg),
        }
    }

    if stack.is_empty() {
        "/".to_string()
    } else {
        format!("/{}", stack.join("/"))
    }
}

/// Final component of a path; `/` for the root itself.
pub fn basename(path: &str) -> &str {
    path.rsplit('/').find(|s| !s.is_empty()).unwrap_or("/")
}

/// Append a leaf name to a directory path.
pub fn join(dir: &str, name: &str) -> String {
    if dir == "/" {
        format!("/{name}")
    } else {
        format!("{dir}/{name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_parent_resolves_against_cwd() {
        assert_eq!(canonicalize("/a/b", ".."), "/a");
        assert_eq!(canonicalize("/a/b", "."), "/a/b");
        assert_eq!(canonicalize("/a/b", "c"), "/a/b/c");
    }

    #[test]
    fn absolute_paths_ignore_cwd() {
        assert_eq!(canonicalize("/a/b", "/x/../y"), "/y");
        assert_eq!(canonicalize("/anything", "/"), "/");
    }

    #[test]
    fn canonicalization_is_idempotent() {
        for p in ["/", "/a", "/a/b/c", "/x.y/z"] {
            assert_eq!(canonicalize("/", p), p);
            let once = canonicalize("/q", p);
            assert_eq!(canonicalize("/q", &once), once);
        }
    }

    #[test]
    fn parent_of_root_is_root() {
        assert_eq!(canonicalize("/", ".."), "/");
        assert_eq!(canonicalize("/", "../../.."), "/");
    }

    #[test]
    fn redundant_separators_collapse() {
        assert_eq!(canonicalize("/", "//a///b/"), "/a/b");
        assert_eq!(canonicalize("/a", "b//c/./d/.."), "/a/b/c");
    }

    #[test]
    fn basename_takes_final_component() {
        assert_eq!(basename("/a/b/file.txt"), "file.txt");
        assert_eq!(basename("/file"), "file");
        assert_eq!(basename("/"), "/");
    }

    #[test]
    fn join_handles_root() {
        assert_eq!(join("/", "x"), "/x");
        assert_eq!(join("/a", "x"), "/a/x");
    }
}
