//! Resource path helpers.

/// Whether `path` is relative to the referencing script's directory.
pub(crate) fn is_relative(path: &str) -> bool {
    !path.contains("://") && !path.starts_with('/')
}

/// Resolve `path` against `base_dir` (which ends in `/`) and collapse `.` and
/// `..` segments. Absolute paths are only simplified.
pub(crate) fn resolve(base_dir: &str, path: &str) -> String {
    if is_relative(path) {
        simplify(&format!("{base_dir}{path}"))
    } else {
        simplify(path)
    }
}

/// Collapse `.`, `..` and empty segments below the scheme.
pub(crate) fn simplify(path: &str) -> String {
    let (prefix, rest) = match path.find("://") {
        Some(index) => path.split_at(index + 3),
        None if path.starts_with('/') => ("/", &path[1..]),
        None => ("", path),
    };

    let mut segments: Vec<&str> = Vec::new();
    for segment in rest.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    format!("{prefix}{}", segments.join("/"))
}

/// The file name of `path`, used when a class has no name of its own.
pub(crate) fn file_name(path: &str) -> &str {
    let path = path.split("::").next().unwrap_or(path);
    path.rsplit('/').next().unwrap_or(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_paths_join_the_script_directory() {
        assert_eq!(resolve("res://actors/", "enemy.os"), "res://actors/enemy.os");
        assert_eq!(resolve("res://actors/", "../base/unit.os"), "res://base/unit.os");
        assert_eq!(resolve("res://actors/", "./a/./b.os"), "res://actors/a/b.os");
        assert_eq!(resolve("res://actors/", "res://x.os"), "res://x.os");
    }

    #[test]
    fn parent_segments_stop_at_the_root() {
        assert_eq!(simplify("res://../../a.os"), "res://a.os");
        assert_eq!(simplify("/tmp//x/../y"), "/tmp/y");
    }

    #[test]
    fn file_names() {
        assert_eq!(file_name("res://actors/enemy.os"), "enemy.os");
        assert_eq!(file_name("res://actors/enemy.os::Inner"), "enemy.os");
    }
}
