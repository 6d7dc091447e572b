//! Input file discovery

use std::path::{Component, Path, PathBuf};

use anyhow::Context;
use globset::GlobBuilder;
use ignore::WalkBuilder;

const GLOB_META: &[char] = &['*', '?', '[', '{'];

/// Files to convert: explicit paths win over the glob pattern.
pub fn resolve_inputs(files: Vec<PathBuf>, glob: Option<&str>) -> anyhow::Result<Vec<PathBuf>> {
    if !files.is_empty() {
        return Ok(files);
    }
    match glob {
        Some(pattern) if !pattern.is_empty() => expand_glob(pattern),
        _ => Ok(Vec::new()),
    }
}

/// Expand a shell-style pattern into the sorted list of matching files.
///
/// Only the directory named by the pattern's literal prefix is walked.
/// Hidden and ignored files match like any other; `*` does not cross `/`.
pub fn expand_glob(pattern: &str) -> anyhow::Result<Vec<PathBuf>> {
    let matcher = GlobBuilder::new(pattern)
        .literal_separator(true)
        .build()
        .with_context(|| format!("Invalid glob pattern {pattern:?}"))?
        .compile_matcher();

    let path = Path::new(pattern);
    let mut base = PathBuf::new();
    let mut remaining = 0;
    for component in path.components() {
        let is_pattern = component.as_os_str().to_string_lossy().contains(GLOB_META);
        if remaining > 0 || is_pattern {
            remaining += 1;
        } else {
            base.push(component);
        }
    }

    if remaining == 0 {
        // No wildcards: the pattern names at most one file.
        return Ok(if path.is_file() { vec![path.to_path_buf()] } else { Vec::new() });
    }

    let implicit_base = base.as_os_str().is_empty();
    let root = if implicit_base { PathBuf::from(".") } else { base };
    if !root.is_dir() {
        return Ok(Vec::new());
    }

    let mut walker = WalkBuilder::new(&root);
    walker.standard_filters(false);
    if !pattern.contains("**") {
        walker.max_depth(Some(remaining));
    }

    let mut matches = Vec::new();
    for entry in walker.build() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!("Cannot read entry while expanding {pattern:?}: {}", e);
                continue;
            }
        };
        if !entry.file_type().is_some_and(|t| t.is_file()) {
            continue;
        }
        let candidate = if implicit_base {
            strip_current_dir(entry.path())
        } else {
            entry.path().to_path_buf()
        };
        if matcher.is_match(&candidate) {
            matches.push(candidate);
        }
    }

    matches.sort();
    tracing::debug!("Glob {pattern:?} matched {} file(s)", matches.len());
    Ok(matches)
}

fn strip_current_dir(path: &Path) -> PathBuf {
    path.components()
        .skip_while(|c| matches!(c, Component::CurDir))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "<graph/>").unwrap();
    }

    #[test]
    fn test_explicit_files_win() {
        let files = vec![PathBuf::from("b.xml"), PathBuf::from("a.xml")];
        let inputs = resolve_inputs(files.clone(), Some("*.graph")).unwrap();
        assert_eq!(inputs, files);
        assert!(resolve_inputs(Vec::new(), None).unwrap().is_empty());
        assert!(resolve_inputs(Vec::new(), Some("")).unwrap().is_empty());
    }

    #[test]
    fn test_star_stays_in_directory() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "b.xml");
        touch(dir.path(), "a.xml");
        touch(dir.path(), ".hidden.xml");
        touch(dir.path(), "notes.txt");
        touch(dir.path(), "nested/c.xml");

        let pattern = format!("{}/*.xml", dir.path().display());
        let found = expand_glob(&pattern).unwrap();
        let names: Vec<_> = found
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec![".hidden.xml", "a.xml", "b.xml"]);
    }

    #[test]
    fn test_double_star_recurses() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "top.xml");
        touch(dir.path(), "x/y/deep.xml");

        let pattern = format!("{}/**/*.xml", dir.path().display());
        let found = expand_glob(&pattern).unwrap();
        assert_eq!(found.len(), 2);
        assert!(found.iter().any(|p| p.ends_with("x/y/deep.xml")));
    }

    #[test]
    fn test_literal_pattern() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "one.xml");
        let existing = dir.path().join("one.xml");
        let pattern = existing.to_string_lossy().into_owned();
        assert_eq!(expand_glob(&pattern).unwrap(), vec![existing]);

        let missing = dir.path().join("two.xml").to_string_lossy().into_owned();
        assert!(expand_glob(&missing).unwrap().is_empty());
    }

    #[test]
    fn test_invalid_pattern() {
        assert!(expand_glob("graphs/[a.xml").is_err());
    }

    #[test]
    fn test_strip_current_dir() {
        assert_eq!(strip_current_dir(Path::new("./a/b.xml")), PathBuf::from("a/b.xml"));
    }
}
