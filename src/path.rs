use anyhow::Result;
use std::path::{Component, Path, PathBuf};

/// Absolute form of `path` with `.` and `..` folded away lexically.
/// Nothing is looked up on disk.
pub fn abspath(path: &Path) -> Result<PathBuf> {
    let absolute = std::path::absolute(path)?;
    let mut normalized = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            c => normalized.push(c.as_os_str()),
        }
    }
    Ok(normalized)
}

#[cfg(unix)]
#[test]
fn test_abspath_folds_dots() -> Result<()> {
    assert_eq!(abspath(Path::new("/env/./a/../b/"))?, PathBuf::from("/env/b"));
    assert_eq!(abspath(Path::new("/.."))?, PathBuf::from("/"));
    Ok(())
}

#[test]
fn test_abspath_relative() -> Result<()> {
    let cwd = std::env::current_dir()?;
    assert_eq!(abspath(Path::new("a/./b"))?, abspath(&cwd.join("a").join("b"))?);
    Ok(())
}

#[cfg(windows)]
#[test]
fn test_abspath_drive() -> Result<()> {
    assert_eq!(abspath(Path::new(r"C:\env\a\..\b"))?, PathBuf::from(r"C:\env\b"));
    Ok(())
}
