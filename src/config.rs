use crate::structs::ToolChoice;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_SCRIPT_NAME: &str = "batlink.bat";

#[derive(Deserialize, Debug, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    pub tool: ToolChoice,
    pub script_name: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tool: ToolChoice::Auto,
            script_name: DEFAULT_SCRIPT_NAME.to_owned(),
        }
    }
}

impl Config {
    pub fn from_path(confpath: &Path) -> Result<Self> {
        let buf = fs::read_to_string(confpath)
            .with_context(|| format!("cannot read {}", confpath.display()))?;
        Ok(toml::from_str::<Config>(&buf)?)
    }

    /// Explicit path must exist; the default location may be absent.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::from_path(path),
            None => match default_path() {
                Some(path) if path.exists() => Self::from_path(&path),
                _ => Ok(Self::default()),
            },
        }
    }
}

fn default_path() -> Option<PathBuf> {
    let mut path = dirs::config_dir()?;
    path.push("batlink");
    path.push("config.toml");
    Some(path)
}

#[test]
fn test_config_from_path() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("config.toml");
    fs::write(&path, "tool = \"legacy\"\nscript_name = \"deferred.bat\"\n")?;
    let config = Config::load(Some(&path))?;
    assert_eq!(config.tool, ToolChoice::Legacy);
    assert_eq!(config.script_name, "deferred.bat");
    Ok(())
}

#[test]
fn test_config_defaults() -> Result<()> {
    let config = toml::from_str::<Config>("")?;
    assert_eq!(config, Config::default());
    assert_eq!(config.script_name, DEFAULT_SCRIPT_NAME);
    Ok(())
}

#[test]
fn test_config_missing_explicit() {
    assert!(Config::load(Some(Path::new("no/such/config.toml"))).is_err());
}

#[test]
fn test_config_bad_tool() {
    assert!(toml::from_str::<Config>("tool = \"symlink\"").is_err());
}
