use anyhow::{Context, Result};
use colored::Colorize;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Where an existing script at `path` is moved before it is replaced.
/// Never names a file that already exists.
pub fn rotated_path(path: &Path) -> Result<PathBuf> {
    let local =
        time::OffsetDateTime::now_local().unwrap_or_else(|_| time::OffsetDateTime::now_utc());
    let format = time::format_description::parse(
        "[year][month][day]-[hour][minute][second].[subsecond digits:6]",
    )?;
    let mut stem = OsString::from(path.as_os_str());
    stem.push(".");
    stem.push(local.format(&format)?);
    let mut candidate = PathBuf::from(&stem);
    let mut n = 1;
    while candidate.exists() {
        let mut name = stem.clone();
        name.push(format!("-{n}"));
        candidate = PathBuf::from(name);
        n += 1;
    }
    Ok(candidate)
}

pub fn write_script(path: &Path, text: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    if path.exists() {
        let backup = rotated_path(path)?;
        info!("{} {} -> {}", "BACKUP:".yellow(), path.display(), backup.display());
        fs::rename(path, &backup)?;
    }
    info!("{} {}", "WRITE:".green(), path.display());
    fs::write(path, text).with_context(|| format!("cannot write {}", path.display()))
}

#[test]
fn test_write_script() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("env").join("batlink.bat");
    write_script(&path, "@echo off\n")?;
    assert_eq!(fs::read_to_string(&path)?, "@echo off\n");
    Ok(())
}

#[test]
fn test_write_script_rotates() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("batlink.bat");
    fs::write(&path, "old")?;
    write_script(&path, "new")?;
    assert_eq!(fs::read_to_string(&path)?, "new");
    let rotated: Vec<_> = fs::read_dir(dir.path())?
        .flatten()
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .filter(|n| n.starts_with("batlink.bat."))
        .collect();
    assert_eq!(rotated.len(), 1);
    assert_eq!(fs::read_to_string(dir.path().join(&rotated[0]))?, "old");
    Ok(())
}

#[test]
fn test_write_script_keeps_every_backup() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("batlink.bat");
    fs::write(&path, "first")?;
    write_script(&path, "second")?;
    write_script(&path, "third")?;
    assert_eq!(fs::read_to_string(&path)?, "third");
    let mut backups: Vec<String> = fs::read_dir(dir.path())?
        .flatten()
        .filter(|e| e.file_name().to_string_lossy().starts_with("batlink.bat."))
        .map(|e| fs::read_to_string(e.path()))
        .collect::<std::io::Result<_>>()?;
    backups.sort();
    assert_eq!(backups, vec!["first", "second"]);
    Ok(())
}

#[test]
fn test_rotated_path_skips_existing() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("batlink.bat");
    let taken = rotated_path(&path)?;
    fs::write(&taken, "")?;
    assert!(!rotated_path(&path)?.exists());
    Ok(())
}
