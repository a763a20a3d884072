use crate::structs::HardlinkTool;
use std::ffi::OsStr;
use std::path::Path;
use tracing::debug;

const MODERN_LINKER: &str = "mklink";

/// Pick the hardlink facility by looking for `mklink` on `PATH`.
///
/// `mklink` is a cmd.exe builtin rather than a file, so a stock Windows
/// install usually lands on [`HardlinkTool::Legacy`] here. Pass
/// `--tool modern` (or set `tool = "modern"`) to emit `mklink /H` anyway.
pub fn detect_hardlink_tool() -> HardlinkTool {
    select(which::which(MODERN_LINKER).ok().as_deref())
}

/// Same as [`detect_hardlink_tool`] with an explicit search path.
pub fn detect_in<P: AsRef<OsStr>>(paths: P, cwd: &Path) -> HardlinkTool {
    select(which::which_in(MODERN_LINKER, Some(paths), cwd).ok().as_deref())
}

fn select(found: Option<&Path>) -> HardlinkTool {
    match found {
        Some(p) => {
            debug!("found {MODERN_LINKER} at {}", p.display());
            HardlinkTool::Modern
        }
        None => {
            debug!("{MODERN_LINKER} not found, using fsutil.exe");
            HardlinkTool::Legacy
        }
    }
}

#[test]
fn test_detect_missing_is_legacy() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    assert_eq!(detect_in(dir.path(), dir.path()), HardlinkTool::Legacy);
    Ok(())
}

#[cfg(unix)]
#[test]
fn test_detect_present_is_modern() -> anyhow::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    let dir = tempfile::tempdir()?;
    let exe = dir.path().join(MODERN_LINKER);
    std::fs::write(&exe, "#!/bin/sh\n")?;
    std::fs::set_permissions(&exe, std::fs::Permissions::from_mode(0o755))?;
    assert_eq!(detect_in(dir.path(), dir.path()), HardlinkTool::Modern);
    Ok(())
}
