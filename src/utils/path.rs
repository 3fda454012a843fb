//! Lexical path helpers.
//!
//! Mount destinations and sources are compared as strings after cleaning, so
//! nothing here touches the filesystem or resolves symlinks.

/// Shortest equivalent spelling of `path`: duplicate separators, `.` and
/// resolvable `..` components are removed. An empty path becomes `.`.
pub fn clean(path: &str) -> String {
    if path.is_empty() {
        return ".".to_string();
    }

    let rooted = path.starts_with('/');
    let mut parts: Vec<&str> = Vec::new();

    for part in path.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                if parts.last().map_or(false, |p| *p != "..") {
                    parts.pop();
                } else if !rooted {
                    parts.push("..");
                }
            }
            other => parts.push(other),
        }
    }

    let joined = parts.join("/");
    match (rooted, joined.is_empty()) {
        (true, _) => format!("/{}", joined),
        (false, true) => ".".to_string(),
        (false, false) => joined,
    }
}

/// Whether `ancestor` strictly contains `path`, comparing whole components.
///
/// Both arguments are expected to be cleaned.
pub fn is_strict_ancestor(ancestor: &str, path: &str) -> bool {
    if ancestor == path {
        return false;
    }
    if ancestor == "/" {
        return path.starts_with('/');
    }
    path.strip_prefix(ancestor)
        .map_or(false, |rest| rest.starts_with('/'))
}
