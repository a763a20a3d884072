//! Bodies of the deferred link and unlink batch scripts.
//!
//! A process cannot replace DLLs it has loaded itself, so those operations are
//! written out as a script that runs after the process exits. Both builders
//! only produce text.

use crate::path::abspath;
use crate::structs::{HardlinkTool, Script, ScriptCommand};
use anyhow::Result;
use std::collections::BTreeSet;
use std::path::Path;
use tracing::debug;

/// Script that creates the destination directories, then hardlinks every
/// `files` entry from `source_root` into `prefix`.
pub fn make_link_script<P: AsRef<Path>>(
    files: &[P],
    prefix: &Path,
    source_root: &Path,
    tool: HardlinkTool,
) -> Result<Script> {
    let mut dirs = BTreeSet::new();
    let mut links = Vec::with_capacity(files.len());
    for file in files {
        let file = file.as_ref();
        let source = abspath(&source_root.join(file))?;
        let dst_dir = prefix.join(file.parent().unwrap_or_else(|| Path::new("")));
        dirs.insert(abspath(&dst_dir)?);
        let dest = match file.file_name() {
            Some(name) => abspath(&dst_dir.join(name))?,
            None => abspath(&dst_dir)?,
        };
        links.push(ScriptCommand::Hardlink { tool, dest, source });
    }
    // mkdir creates intermediate directories, so order does not matter
    let mkdirs = dirs.into_iter().map(ScriptCommand::MakeDir).collect();
    Ok(Script::Link { mkdirs, links })
}

/// Script that deletes `files`, then `directories`, in the given order.
/// Relative entries resolve against the current directory, not `prefix`.
pub fn make_unlink_script<P: AsRef<Path>, D: AsRef<Path>>(
    files: &[P],
    directories: &[D],
    prefix: &Path,
) -> Result<Script> {
    debug!("unlink script for {}", prefix.display());
    let file_deletes = files
        .iter()
        .map(|f| abspath(f.as_ref()).map(ScriptCommand::DeleteFile))
        .collect::<Result<Vec<_>>>()?;
    let dir_deletes = directories
        .iter()
        .map(|d| abspath(d.as_ref()).map(ScriptCommand::DeleteDir))
        .collect::<Result<Vec<_>>>()?;
    Ok(Script::Unlink {
        file_deletes,
        dir_deletes,
    })
}

#[cfg(test)]
fn count_prefixed(text: &str, prefix: &str) -> usize {
    text.lines().filter(|l| l.starts_with(prefix)).count()
}

#[cfg(windows)]
#[test]
fn test_link_single_file() -> Result<()> {
    let script = make_link_script(
        &["a/b.dll"],
        Path::new(r"C:\env"),
        Path::new(r"C:\pkgs\foo"),
        HardlinkTool::Modern,
    )?;
    assert_eq!(
        script.to_string(),
        "@echo off\n> NUL (\nmkdir C:\\env\\a\n)\n\n> NUL (\nmklink /H C:\\env\\a\\b.dll C:\\pkgs\\foo\\a\\b.dll\n)\n"
    );
    Ok(())
}

#[cfg(unix)]
#[test]
fn test_link_single_file() -> Result<()> {
    let script = make_link_script(
        &["a/b.dll"],
        Path::new("/env"),
        Path::new("/pkgs/foo"),
        HardlinkTool::Modern,
    )?;
    assert_eq!(
        script.to_string(),
        "@echo off\n> NUL (\nmkdir /env/a\n)\n\n> NUL (\nmklink /H /env/a/b.dll /pkgs/foo/a/b.dll\n)\n"
    );
    Ok(())
}

#[cfg(unix)]
#[test]
fn test_link_dedups_dirs() -> Result<()> {
    let files = ["a/x.dll", "a/y.dll", "b/c/z.pyd", "top.exe", "./a/w.txt"];
    let text = make_link_script(
        &files,
        Path::new("/env"),
        Path::new("/pkgs/foo"),
        HardlinkTool::Legacy,
    )?
    .to_string();
    assert_eq!(count_prefixed(&text, "fsutil.exe hardlink create "), files.len());
    assert_eq!(count_prefixed(&text, "mklink"), 0);
    assert_eq!(count_prefixed(&text, "mkdir "), 3);
    assert!(text.contains("mkdir /env\n"));
    assert!(text.contains("mkdir /env/a\n"));
    assert!(text.contains("mkdir /env/b/c\n"));
    assert!(text.contains("fsutil.exe hardlink create /env/a/w.txt /pkgs/foo/a/w.txt\n"));
    Ok(())
}

#[cfg(unix)]
#[test]
fn test_link_keeps_file_order() -> Result<()> {
    let script = make_link_script(
        &["z.dll", "a.dll"],
        Path::new("/env"),
        Path::new("/src"),
        HardlinkTool::Modern,
    )?;
    let Script::Link { links, .. } = script else {
        panic!("expected link script");
    };
    assert_eq!(
        links[0],
        ScriptCommand::Hardlink {
            tool: HardlinkTool::Modern,
            dest: std::path::PathBuf::from("/env/z.dll"),
            source: std::path::PathBuf::from("/src/z.dll"),
        }
    );
    assert_eq!(links.len(), 2);
    Ok(())
}

#[test]
fn test_link_empty() -> Result<()> {
    let files: [&str; 0] = [];
    let text = make_link_script(
        &files,
        Path::new("env"),
        Path::new("src"),
        HardlinkTool::Modern,
    )?
    .to_string();
    assert_eq!(text, "@echo off\n> NUL (\n\n)\n\n> NUL (\n\n)\n");
    Ok(())
}

#[test]
fn test_link_is_deterministic() -> Result<()> {
    let files = ["lib/a.dll", "bin/b.exe", "lib/sub/c.dll", "d.txt"];
    let make = || {
        make_link_script(
            &files,
            Path::new("prefix"),
            Path::new("pkg"),
            HardlinkTool::Legacy,
        )
        .map(|s| s.to_string())
    };
    assert_eq!(make()?, make()?);
    Ok(())
}

#[test]
fn test_unlink_order() -> Result<()> {
    let cwd = std::env::current_dir()?;
    let text = make_unlink_script(&["x.txt", "y.txt"], &["sub"], Path::new("env"))?.to_string();
    let expected = format!(
        "@echo off\n\n> NUL (\ndel /Q {}\ndel /Q {}\n\nrmdir /Q {}\n)\n",
        abspath(&cwd.join("x.txt"))?.display(),
        abspath(&cwd.join("y.txt"))?.display(),
        abspath(&cwd.join("sub"))?.display(),
    );
    assert_eq!(text, expected);
    Ok(())
}

#[test]
fn test_unlink_ignores_prefix_for_relative_entries() -> Result<()> {
    let a = make_unlink_script(&["x.txt"], &["sub"], Path::new("one"))?;
    let b = make_unlink_script(&["x.txt"], &["sub"], Path::new("two"))?;
    assert_eq!(a, b);
    Ok(())
}

#[test]
fn test_unlink_is_deterministic() -> Result<()> {
    let files = ["Lib/os.py", "python.exe", "DLLs/_ctypes.pyd"];
    let dirs = ["Lib/site-packages", "Lib", "DLLs"];
    let make = || make_unlink_script(&files, &dirs, Path::new("prefix")).map(|s| s.to_string());
    assert_eq!(make()?, make()?);
    Ok(())
}

#[test]
fn test_link_legacy_line() -> Result<()> {
    let root = tempfile::tempdir()?;
    let prefix = root.path().join("env");
    let source_root = root.path().join("pkgs").join("foo");
    let text = make_link_script(&["a/b.dll"], &prefix, &source_root, HardlinkTool::Legacy)?
        .to_string();
    let dest = abspath(&prefix.join("a").join("b.dll"))?;
    let source = abspath(&source_root.join("a").join("b.dll"))?;
    let mkdir = format!("mkdir {}", abspath(&prefix.join("a"))?.display());
    let link = format!(
        "fsutil.exe hardlink create {} {}",
        dest.display(),
        source.display()
    );
    assert_eq!(count_prefixed(&text, "mkdir "), 1);
    assert_eq!(text.lines().filter(|l| *l == mkdir).count(), 1);
    assert_eq!(count_prefixed(&text, "fsutil.exe "), 1);
    assert_eq!(text.lines().filter(|l| *l == link).count(), 1);
    Ok(())
}

#[cfg(unix)]
#[test]
fn test_unlink_keeps_absolute_and_dir_order() -> Result<()> {
    let dirs = ["/env/a/b", "/env/a"];
    let text = make_unlink_script(&["/other/f.dll"], &dirs, Path::new("/env"))?.to_string();
    assert!(text.contains("del /Q /other/f.dll\n"));
    let deep = text.find("rmdir /Q /env/a/b").unwrap();
    let shallow = text.find("rmdir /Q /env/a\n").unwrap();
    assert!(deep < shallow);
    assert_eq!(count_prefixed(&text, "rmdir /Q "), 2);
    Ok(())
}

#[test]
fn test_unlink_empty() -> Result<()> {
    let none: [&str; 0] = [];
    let text = make_unlink_script(&none, &none, Path::new("env"))?.to_string();
    assert_eq!(text, "@echo off\n\n> NUL (\n\n\n)\n");
    Ok(())
}
