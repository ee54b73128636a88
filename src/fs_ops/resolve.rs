//! Turning user-typed paths into the fully resolved paths the protocol works on.
//!
//! - Quotes pasted around a path (PowerShell, Explorer "copy as path") are stripped.
//! - `~` expands to the home directory; relative paths are joined to the cwd.
//! - The longest existing prefix is canonicalized (symlinks resolved, no `\\?\` prefix on
//!   Windows via dunce); the not-yet-existing remainder is appended lexically.

use anyhow::{Context, Result};
use std::env;
use std::ffi::OsString;
use std::fs;
use std::path::{Component, Path, PathBuf};

use crate::errors::RelocateError;

/// Clean a raw path string typed or pasted by the user.
pub fn clean_input(s: &str) -> PathBuf {
    let trimmed = s.trim();
    let inner = if trimmed.len() >= 2
        && ((trimmed.starts_with('"') && trimmed.ends_with('"'))
            || (trimmed.starts_with('\'') && trimmed.ends_with('\'')))
    {
        &trimmed[1..trimmed.len() - 1]
    } else {
        trimmed.trim_matches(|c| c == '\'' || c == '"')
    };
    let mut out = inner.trim().to_string();
    // One trailing separator is noise, except for a root like "/" or "C:\".
    if (out.ends_with('/') || out.ends_with('\\')) && out.len() > 1 && !out.ends_with(":\\") && !out.ends_with(":/") {
        out.pop();
    }
    PathBuf::from(out)
}

fn expand_home(p: &Path) -> PathBuf {
    let mut comps = p.components();
    match comps.next() {
        Some(Component::Normal(first)) if first == "~" => match dirs::home_dir() {
            Some(home) => home.join(comps.as_path()),
            None => p.to_path_buf(),
        },
        _ => p.to_path_buf(),
    }
}

/// Drop `.` and fold `..` without touching the filesystem.
fn lexical_normalize(p: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for c in p.components() {
        match c {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push(c);
                }
            }
            other => out.push(other),
        }
    }
    out
}

/// Absolute, `~`-expanded, lexically normalized form of `input`. Links are left as they are.
pub fn absolutize(input: &Path) -> Result<PathBuf> {
    let expanded = expand_home(input);
    let absolute = if expanded.is_absolute() {
        expanded
    } else {
        env::current_dir()
            .context("determine current directory")?
            .join(expanded)
    };
    Ok(lexical_normalize(&absolute))
}

/// Fully resolve `input`; works whether or not the path exists yet.
pub fn resolve_path(input: &Path) -> Result<PathBuf> {
    let absolute = absolutize(input)?;
    let mut existing = absolute.as_path();
    let mut rest: Vec<OsString> = Vec::new();
    loop {
        if let Ok(real) = dunce::canonicalize(existing) {
            let mut out = real;
            for name in rest.iter().rev() {
                out.push(name);
            }
            return Ok(out);
        }
        match (existing.parent(), existing.file_name()) {
            (Some(parent), Some(name)) => {
                rest.push(name.to_os_string());
                existing = parent;
            }
            _ => return Ok(absolute),
        }
    }
}

/// True if `path` itself is a symlink or junction (not followed).
pub fn is_link(path: &Path) -> bool {
    fs::symlink_metadata(path)
        .map(|m| m.file_type().is_symlink())
        .unwrap_or(false)
}

fn comparable(p: &Path) -> PathBuf {
    if cfg!(windows) {
        PathBuf::from(p.to_string_lossy().to_lowercase())
    } else {
        p.to_path_buf()
    }
}

/// Source and target must differ and neither may contain the other.
pub fn ensure_disjoint(source: &Path, target: &Path) -> Result<()> {
    let s = comparable(source);
    let t = comparable(target);
    if s == t {
        return Err(RelocateError::SamePath(source.to_path_buf()).into());
    }
    if t.starts_with(&s) {
        return Err(RelocateError::NestedPaths {
            outer: source.to_path_buf(),
            inner: target.to_path_buf(),
        }
        .into());
    }
    if s.starts_with(&t) {
        return Err(RelocateError::NestedPaths {
            outer: target.to_path_buf(),
            inner: source.to_path_buf(),
        }
        .into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn clean_input_strips_quotes_and_trailing_separator() {
        assert_eq!(clean_input("  \"/data/app\"  "), PathBuf::from("/data/app"));
        assert_eq!(clean_input("'/data/app/'"), PathBuf::from("/data/app"));
        assert_eq!(clean_input("/data/app\""), PathBuf::from("/data/app"));
        assert_eq!(clean_input("/"), PathBuf::from("/"));
        assert_eq!(clean_input("D:\\"), PathBuf::from("D:\\"));
    }

    #[test]
    fn lexical_normalize_folds_dots() {
        assert_eq!(
            lexical_normalize(Path::new("/a/./b/../c")),
            PathBuf::from("/a/c")
        );
    }

    #[test]
    fn resolve_existing_dir_is_canonical() {
        let td = tempdir().unwrap();
        let real = fs::canonicalize(td.path()).unwrap();
        fs::create_dir_all(real.join("x")).unwrap();
        let got = resolve_path(&real.join("x").join("..").join("x")).unwrap();
        assert_eq!(got, real.join("x"));
    }

    #[test]
    fn resolve_keeps_missing_tail() {
        let td = tempdir().unwrap();
        let real = fs::canonicalize(td.path()).unwrap();
        let got = resolve_path(&real.join("not").join("yet")).unwrap();
        assert_eq!(got, real.join("not").join("yet"));
        assert!(got.is_absolute());
    }

    #[cfg(unix)]
    #[test]
    fn resolve_follows_symlinked_prefix() {
        let td = tempdir().unwrap();
        let real = fs::canonicalize(td.path()).unwrap();
        fs::create_dir_all(real.join("volume")).unwrap();
        std::os::unix::fs::symlink(real.join("volume"), real.join("alias")).unwrap();
        let got = resolve_path(&real.join("alias").join("data")).unwrap();
        assert_eq!(got, real.join("volume").join("data"));
        assert!(is_link(&real.join("alias")));
        assert!(!is_link(&real.join("volume")));
    }

    #[test]
    fn relative_paths_become_absolute() {
        let got = absolutize(Path::new("some/rel")).unwrap();
        assert!(got.is_absolute());
        assert!(got.ends_with("some/rel"));
    }

    #[test]
    fn disjoint_checks() {
        let kind = |r: Result<()>| r.unwrap_err().downcast::<RelocateError>().unwrap();
        assert!(matches!(
            kind(ensure_disjoint(Path::new("/a/b"), Path::new("/a/b"))),
            RelocateError::SamePath(_)
        ));
        assert!(matches!(
            kind(ensure_disjoint(Path::new("/a/b"), Path::new("/a/b/c"))),
            RelocateError::NestedPaths { .. }
        ));
        assert!(matches!(
            kind(ensure_disjoint(Path::new("/a/b/c"), Path::new("/a/b"))),
            RelocateError::NestedPaths { .. }
        ));
        ensure_disjoint(Path::new("/a/b"), Path::new("/a/bc")).unwrap();
        ensure_disjoint(Path::new("/home/u/.app"), Path::new("/mnt/d/app")).unwrap();
    }
}
