use serde::Deserialize;
use std::fmt;
use std::path::PathBuf;

/// Hardlink facility used for every link in one script.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HardlinkTool {
    /// `mklink /H`, Windows Vista and later.
    Modern,
    /// `fsutil.exe hardlink create`, Windows XP.
    Legacy,
}

#[derive(Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ToolChoice {
    #[default]
    Auto,
    Modern,
    Legacy,
}

impl ToolChoice {
    pub fn fixed(self) -> Option<HardlinkTool> {
        match self {
            ToolChoice::Auto => None,
            ToolChoice::Modern => Some(HardlinkTool::Modern),
            ToolChoice::Legacy => Some(HardlinkTool::Legacy),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptCommand {
    MakeDir(PathBuf),
    Hardlink {
        tool: HardlinkTool,
        dest: PathBuf,
        source: PathBuf,
    },
    DeleteFile(PathBuf),
    DeleteDir(PathBuf),
}

impl fmt::Display for ScriptCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScriptCommand::MakeDir(dir) => write!(f, "mkdir {}", dir.display()),
            // both tools take the destination first
            ScriptCommand::Hardlink { tool, dest, source } => match tool {
                HardlinkTool::Modern => {
                    write!(f, "mklink /H {} {}", dest.display(), source.display())
                }
                HardlinkTool::Legacy => write!(
                    f,
                    "fsutil.exe hardlink create {} {}",
                    dest.display(),
                    source.display()
                ),
            },
            ScriptCommand::DeleteFile(path) => write!(f, "del /Q {}", path.display()),
            ScriptCommand::DeleteDir(path) => write!(f, "rmdir /Q {}", path.display()),
        }
    }
}

/// A rendered batch script. Every section is wrapped in `> NUL ( ... )`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Script {
    Link {
        mkdirs: Vec<ScriptCommand>,
        links: Vec<ScriptCommand>,
    },
    Unlink {
        file_deletes: Vec<ScriptCommand>,
        dir_deletes: Vec<ScriptCommand>,
    },
}

fn join_lines(commands: &[ScriptCommand]) -> String {
    commands
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<String>>()
        .join("\n")
}

impl fmt::Display for Script {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Script::Link { mkdirs, links } => write!(
                f,
                "@echo off\n> NUL (\n{}\n)\n\n> NUL (\n{}\n)\n",
                join_lines(mkdirs),
                join_lines(links)
            ),
            Script::Unlink {
                file_deletes,
                dir_deletes,
            } => write!(
                f,
                "@echo off\n\n> NUL (\n{}\n\n{}\n)\n",
                join_lines(file_deletes),
                join_lines(dir_deletes)
            ),
        }
    }
}

#[test]
fn test_hardlink_argument_order() {
    let dest = PathBuf::from("dest.dll");
    let source = PathBuf::from("source.dll");
    for tool in [HardlinkTool::Modern, HardlinkTool::Legacy] {
        let line = ScriptCommand::Hardlink {
            tool,
            dest: dest.clone(),
            source: source.clone(),
        }
        .to_string();
        let d = line.find("dest.dll").unwrap();
        let s = line.find("source.dll").unwrap();
        assert!(d < s, "{line}");
    }
}

#[test]
fn test_command_templates() {
    let p = PathBuf::from("x");
    assert_eq!(ScriptCommand::MakeDir(p.clone()).to_string(), "mkdir x");
    assert_eq!(ScriptCommand::DeleteFile(p.clone()).to_string(), "del /Q x");
    assert_eq!(ScriptCommand::DeleteDir(p.clone()).to_string(), "rmdir /Q x");
    let legacy = ScriptCommand::Hardlink {
        tool: HardlinkTool::Legacy,
        dest: PathBuf::from("d"),
        source: PathBuf::from("s"),
    };
    assert_eq!(legacy.to_string(), "fsutil.exe hardlink create d s");
}

#[test]
fn test_empty_scripts_keep_template() {
    let link = Script::Link {
        mkdirs: vec![],
        links: vec![],
    };
    assert_eq!(link.to_string(), "@echo off\n> NUL (\n\n)\n\n> NUL (\n\n)\n");
    let unlink = Script::Unlink {
        file_deletes: vec![],
        dir_deletes: vec![],
    };
    assert_eq!(unlink.to_string(), "@echo off\n\n> NUL (\n\n\n)\n");
}

#[test]
fn test_tool_choice_fixed() {
    assert_eq!(ToolChoice::Auto.fixed(), None);
    assert_eq!(ToolChoice::Modern.fixed(), Some(HardlinkTool::Modern));
    assert_eq!(ToolChoice::Legacy.fixed(), Some(HardlinkTool::Legacy));
}
