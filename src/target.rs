//! Remote object key derivation.

/// Drops one leading `/` from the configured target so object keys stay relative
/// to the container. Applied once when the request is built.
pub fn normalize_target(target: &str) -> String {
    target.strip_prefix('/').unwrap_or(target).to_string()
}

/// Object key for `local_path`: `strip_prefix` is removed by plain string prefix
/// (a partial segment is stripped too), the remainder is joined onto `target`,
/// and the result is cleaned lexically.
pub fn build_target(local_path: &str, target: &str, strip_prefix: &str) -> String {
    let relative = local_path.strip_prefix(strip_prefix).unwrap_or(local_path);
    let joined = [target, relative]
        .iter()
        .filter(|part| !part.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join("/");
    clean(&joined)
}

/// Collapses repeated separators, drops `.` segments, resolves `..` against the
/// preceding segment and removes any trailing separator.
pub(crate) fn clean(path: &str) -> String {
    let rooted = path.starts_with('/');
    let mut segments: Vec<&str> = Vec::new();

    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                if segments.last().is_some_and(|last| *last != "..") {
                    segments.pop();
                } else if !rooted {
                    segments.push("..");
                }
            }
            other => segments.push(other),
        }
    }

    let body = segments.join("/");
    match (rooted, body.is_empty()) {
        (true, _) => format!("/{body}"),
        (false, true) => ".".to_string(),
        (false, false) => body,
    }
}
