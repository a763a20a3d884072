use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use colored::Colorize;
use std::path::{Path, PathBuf};
use tracing::info;

mod config;
mod list;
mod logging;
mod output;
mod path;
mod probe;
mod script;
mod structs;

use config::Config;
use structs::{HardlinkTool, Script, ToolChoice};

#[derive(Debug, Parser)]
#[command(version, about)]
struct Opt {
    #[command(subcommand)]
    command: Command,
    /// Hardlink command to emit
    #[arg(long, global = true, value_enum)]
    tool: Option<ToolChoice>,
    /// Config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Debug, clap::Args)]
struct Target {
    /// Write the script into the install prefix
    #[arg(long)]
    write: bool,
    /// Write the script to this path
    #[arg(long, short)]
    output: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Hardlink package files into a prefix
    #[command(alias = "ln")]
    Link {
        #[arg(long)]
        prefix: PathBuf,
        #[arg(long)]
        source: PathBuf,
        /// Files relative to the source root; all files when omitted
        files: Vec<PathBuf>,
        #[command(flatten)]
        target: Target,
    },
    /// Delete files and directories from a prefix
    #[command(alias = "rm")]
    Unlink {
        #[arg(long)]
        prefix: PathBuf,
        #[arg(long = "file")]
        files: Vec<PathBuf>,
        /// Deleted in the order given
        #[arg(long = "dir")]
        dirs: Vec<PathBuf>,
        #[command(flatten)]
        target: Target,
    },
    /// Show which hardlink command would be used
    Probe,
    /// Generate shell completions
    Completion {
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn select_tool(opt_tool: Option<ToolChoice>, config: &Config) -> HardlinkTool {
    opt_tool
        .unwrap_or(config.tool)
        .fixed()
        .unwrap_or_else(probe::detect_hardlink_tool)
}

fn emit(script: &Script, prefix: &Path, target: &Target, config: &Config) -> Result<()> {
    let text = script.to_string();
    let dest = match (&target.output, target.write) {
        (Some(path), _) => Some(path.clone()),
        (None, true) => Some(prefix.join(&config.script_name)),
        (None, false) => None,
    };
    match dest {
        Some(path) => output::write_script(&path, &text),
        None => {
            print!("{text}");
            Ok(())
        }
    }
}

fn main() -> Result<()> {
    let opt = Opt::parse();
    logging::init(opt.verbose);
    let config = Config::load(opt.config.as_deref())?;
    match &opt.command {
        Command::Link {
            prefix,
            source,
            files,
            target,
        } => {
            let files = if files.is_empty() {
                list::list_files(source)?
            } else {
                files.clone()
            };
            let tool = select_tool(opt.tool, &config);
            info!("{} {} file(s) with {tool:?} hardlinks", "LINK:".green(), files.len());
            let script = script::make_link_script(files.as_slice(), prefix, source, tool)?;
            emit(&script, prefix, target, &config)?
        }
        Command::Unlink {
            prefix,
            files,
            dirs,
            target,
        } => {
            info!(
                "{} {} file(s), {} dir(s)",
                "UNLINK:".cyan(),
                files.len(),
                dirs.len()
            );
            let script = script::make_unlink_script(files.as_slice(), dirs.as_slice(), prefix)?;
            emit(&script, prefix, target, &config)?
        }
        Command::Probe => {
            let tool = select_tool(opt.tool, &config);
            println!("{tool:?}");
        }
        Command::Completion { shell } => {
            clap_complete::generate(
                *shell,
                &mut Opt::command(),
                "batlink",
                &mut std::io::stdout(),
            );
        }
    }
    Ok(())
}

#[test]
fn test_select_tool_override() {
    let config = Config {
        tool: ToolChoice::Modern,
        ..Config::default()
    };
    assert_eq!(select_tool(None, &config), HardlinkTool::Modern);
    assert_eq!(
        select_tool(Some(ToolChoice::Legacy), &config),
        HardlinkTool::Legacy
    );
}

#[test]
fn test_cli_parses() {
    let opt = Opt::try_parse_from([
        "batlink", "ln", "--prefix", "env", "--source", "pkg", "a.dll", "--tool", "legacy",
    ])
    .unwrap();
    assert_eq!(opt.tool, Some(ToolChoice::Legacy));
    assert!(matches!(opt.command, Command::Link { ref files, .. } if files.len() == 1));
    Opt::command().debug_assert();
}

#[test]
fn test_emit_writes_into_prefix() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let prefix = dir.path().to_path_buf();
    let opt = Opt::try_parse_from(["batlink", "unlink", "--prefix", "x", "--write"])?;
    let Command::Unlink { target, .. } = opt.command else {
        panic!("expected unlink");
    };
    let config = Config::default();
    let script = script::make_unlink_script(&["a.txt"], &["sub"], &prefix)?;
    emit(&script, &prefix, &target, &config)?;
    let written = std::fs::read_to_string(prefix.join(config::DEFAULT_SCRIPT_NAME))?;
    assert_eq!(written, script.to_string());
    Ok(())
}

#[test]
fn test_output_flags_only_on_script_commands() {
    assert!(Opt::try_parse_from(["batlink", "probe", "--write"]).is_err());
    assert!(Opt::try_parse_from(["batlink", "probe", "-o", "out.bat"]).is_err());
    assert!(Opt::try_parse_from(["batlink", "completion", "bash", "--write"]).is_err());
    let opt = Opt::try_parse_from([
        "batlink", "ln", "--prefix", "env", "--source", "pkg", "-o", "out.bat",
    ])
    .unwrap();
    assert!(matches!(
        opt.command,
        Command::Link { ref target, .. } if target.output.is_some() && !target.write
    ));
}
