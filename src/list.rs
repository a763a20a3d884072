use anyhow::{Context, Result, ensure};
use ignore::WalkBuilder;
use std::path::{Path, PathBuf};

/// Every regular file beneath `source_root`, relative to it and sorted.
pub fn list_files(source_root: &Path) -> Result<Vec<PathBuf>> {
    ensure!(
        source_root.is_dir(),
        "source root {} is not a directory",
        source_root.display()
    );
    let mut files = vec![];
    for r in WalkBuilder::new(source_root)
        .standard_filters(false)
        .build()
    {
        let dent = r.with_context(|| format!("cannot walk {}", source_root.display()))?;
        if !dent.file_type().is_some_and(|t| t.is_file()) {
            continue;
        }
        let rel = dent.path().strip_prefix(source_root)?;
        files.push(rel.to_path_buf());
    }
    files.sort();
    Ok(files)
}

#[test]
fn test_list_files() -> Result<()> {
    let root = tempfile::tempdir()?;
    std::fs::create_dir_all(root.path().join("Lib/site-packages"))?;
    std::fs::write(root.path().join("python.exe"), "")?;
    std::fs::write(root.path().join("Lib/site-packages/.hidden"), "")?;
    std::fs::write(root.path().join("Lib/os.py"), "")?;
    let files = list_files(root.path())?;
    assert_eq!(
        files,
        vec![
            Path::new("Lib").join("os.py"),
            Path::new("Lib").join("site-packages").join(".hidden"),
            PathBuf::from("python.exe"),
        ]
    );
    Ok(())
}

#[test]
fn test_list_files_empty() -> Result<()> {
    let root = tempfile::tempdir()?;
    assert!(list_files(root.path())?.is_empty());
    Ok(())
}

#[test]
fn test_list_files_missing_root() -> Result<()> {
    let root = tempfile::tempdir()?;
    let missing = root.path().join("not-here");
    assert!(list_files(&missing).is_err());
    let file = root.path().join("file.dll");
    std::fs::write(&file, "")?;
    assert!(list_files(&file).is_err());
    Ok(())
}
