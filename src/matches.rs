//! Resolves the include/exclude glob patterns into the list of local paths to upload.
//!
//! Patterns support `*`, `?`, `[...]` and `{a,b}` within one path segment, and `**`
//! for zero or more whole segments. Expansion walks the filesystem from the longest
//! literal directory prefix of the pattern, visiting entries sorted by file name, so
//! the result order is stable for a given directory snapshot.

use std::collections::HashSet;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use globset::GlobBuilder;
use tracing::debug;
use walkdir::WalkDir;

use crate::error::ResolveError;
use crate::target::clean;

/// Returns every path matched by `include` that none of the `exclude` patterns match.
///
/// Exclusion compares concrete paths: each exclude pattern is expanded on its own
/// and the union of the results is subtracted from the include matches, keeping
/// their order. Directories are returned as-is; callers decide what to do with them.
pub fn matches(include: &str, exclude: &[String]) -> Result<Vec<PathBuf>, ResolveError> {
    let included = expand(include)?;
    debug!(pattern = %include, count = included.len(), "Expanded include pattern");

    if exclude.is_empty() {
        if included.is_empty() {
            return Err(ResolveError::NoMatches {
                pattern: include.to_string(),
            });
        }
        return Ok(included);
    }

    let mut excluded: HashSet<PathBuf> = HashSet::new();
    for pattern in exclude {
        let found = expand(pattern)?;
        debug!(pattern = %pattern, count = found.len(), "Expanded exclude pattern");
        excluded.extend(found);
    }

    let remaining: Vec<PathBuf> = included
        .into_iter()
        .filter(|path| !excluded.contains(path))
        .collect();

    if remaining.is_empty() {
        return Err(ResolveError::NoMatches {
            pattern: include.to_string(),
        });
    }
    Ok(remaining)
}

/// Expands one glob pattern against the filesystem.
///
/// The pattern is cleaned lexically first, so `dist/*/` and `dist//sub/*.txt`
/// behave like `dist/*` and `dist/sub/*.txt`.
pub fn expand(pattern: &str) -> Result<Vec<PathBuf>, ResolveError> {
    let cleaned = clean(pattern);
    let pattern = cleaned.as_str();
    let matcher = GlobBuilder::new(pattern)
        .literal_separator(true)
        .build()
        .map_err(|source| ResolveError::Pattern {
            pattern: pattern.to_string(),
            source,
        })?
        .compile_matcher();

    let components: Vec<&str> = pattern.split('/').collect();
    let literal_len = components.iter().take_while(|c| is_literal(c)).count();

    if literal_len == components.len() {
        let path = PathBuf::from(pattern);
        return Ok(if path.symlink_metadata().is_ok() {
            vec![path]
        } else {
            Vec::new()
        });
    }

    let (root, implicit_root) = walk_root(&components[..literal_len], pattern);
    let rest = &components[literal_len..];

    let mut walker = WalkDir::new(&root).min_depth(1).sort_by_file_name();
    if !rest.iter().any(|c| c.contains("**")) {
        walker = walker.max_depth(rest.len());
    }

    let mut found = Vec::new();
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) if err.depth() == 0 && is_not_found(&err) => break,
            Err(source) => {
                return Err(ResolveError::Walk {
                    pattern: pattern.to_string(),
                    source,
                })
            }
        };

        let path = if implicit_root {
            entry
                .path()
                .strip_prefix(&root)
                .map(Path::to_path_buf)
                .unwrap_or_else(|_| entry.path().to_path_buf())
        } else {
            entry.into_path()
        };

        if matcher.is_match(&path) {
            found.push(path);
        }
    }
    Ok(found)
}

fn is_literal(component: &str) -> bool {
    !component.contains(['*', '?', '[', '{'])
}

fn is_not_found(err: &walkdir::Error) -> bool {
    err.io_error().map(|io| io.kind()) == Some(ErrorKind::NotFound)
}

/// Directory the walk starts from. The flag is set when the pattern had no literal
/// prefix and the walk starts from `.`, whose prefix must not leak into results.
fn walk_root(literal: &[&str], pattern: &str) -> (PathBuf, bool) {
    let joined = literal.join("/");
    if !joined.is_empty() {
        return (PathBuf::from(joined), false);
    }
    if pattern.starts_with('/') {
        (PathBuf::from("/"), false)
    } else {
        (PathBuf::from("."), true)
    }
}
