//! Command-line surface of the `devtree` binary

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "devtree - mirror, delete and list directory trees on a device's HTTP file API"
)]
pub struct Cli {
    /// Settings file (default: ~/.config/devtree/devtree.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Show individual remote operations as they happen
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Append timestamped operation lines to this file
    #[arg(long = "log-file", global = true)]
    pub log_file: Option<PathBuf>,

    /// Per-request timeout in seconds
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Copy a local directory tree onto the device (create/overwrite only)
    Mirror(MirrorArgs),
    /// Recursively delete a directory on the device
    Delete(DeleteArgs),
    /// Print a directory tree of the device
    #[command(alias = "ls")]
    Display(DisplayArgs),
    /// Rename a directory on the device
    Rename(RenameArgs),
}

#[derive(Debug, Args)]
pub struct MirrorArgs {
    /// Device URL (http://host:port or host[:port])
    pub url: String,
    /// Local source directory
    pub local: PathBuf,
    /// Remote destination directory
    pub remote: String,

    /// Upload without unlinking existing remote files first
    #[arg(long = "no-replace")]
    pub no_replace: bool,

    /// Visit directory entries in name order
    #[arg(long)]
    pub sorted: bool,

    /// List only - print the planned operations without touching the device
    #[arg(short = 'l', long, alias = "list-only")]
    pub dry_run: bool,

    /// Write a JSONL record of every remote operation
    #[arg(long)]
    pub report: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct DeleteArgs {
    /// Device URL (http://host:port or host[:port])
    pub url: String,
    /// Remote directory to remove
    pub remote: String,

    /// List only - print the removal order without touching the device
    #[arg(short = 'l', long, alias = "list-only")]
    pub dry_run: bool,

    /// Write a JSONL record of every remote operation
    #[arg(long)]
    pub report: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct DisplayArgs {
    /// Device URL (http://host:port or host[:port])
    pub url: String,
    /// Remote directory to show
    #[arg(default_value = "/")]
    pub remote: String,
}

#[derive(Debug, Args)]
pub struct RenameArgs {
    /// Device URL (http://host:port or host[:port])
    pub url: String,
    /// Remote directory to rename
    pub remote: String,
    /// New name, a single path segment
    pub new_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_mirror() {
        let cli = Cli::try_parse_from([
            "devtree",
            "mirror",
            "http://192.168.1.10:8000",
            "sdcard/static",
            "/static",
            "--sorted",
            "-v",
        ])
        .unwrap();
        assert!(cli.verbose);
        match cli.command {
            Command::Mirror(args) => {
                assert_eq!(args.url, "http://192.168.1.10:8000");
                assert_eq!(args.local, PathBuf::from("sdcard/static"));
                assert_eq!(args.remote, "/static");
                assert!(args.sorted);
                assert!(!args.no_replace);
                assert!(!args.dry_run);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn parse_display_alias_and_default_root() {
        let cli = Cli::try_parse_from(["devtree", "ls", "10.0.0.2"]).unwrap();
        match cli.command {
            Command::Display(args) => assert_eq!(args.remote, "/"),
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn parse_delete_dry_run_with_globals() {
        let cli = Cli::try_parse_from([
            "devtree",
            "delete",
            "10.0.0.2",
            "/static",
            "--list-only",
            "--timeout",
            "5",
            "--log-file",
            "/tmp/devtree.log",
        ])
        .unwrap();
        assert_eq!(cli.timeout, Some(5));
        assert_eq!(cli.log_file, Some(PathBuf::from("/tmp/devtree.log")));
        match cli.command {
            Command::Delete(args) => assert!(args.dry_run),
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn parse_rename_requires_new_name() {
        assert!(Cli::try_parse_from(["devtree", "rename", "10.0.0.2", "/music/old"]).is_err());
    }
}
