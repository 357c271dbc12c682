//! devtree - recursive mirror/delete/display against a device's HTTP file API

use anyhow::{bail, Context, Result};
use clap::Parser;
use std::io::IsTerminal;
use std::sync::Arc;

use devtree::cli::{Cli, Command, DeleteArgs, DisplayArgs, MirrorArgs, RenameArgs};
use devtree::config::{load_settings, Settings};
use devtree::logger::{Logger, NoopLogger, PlanLogger, TextLogger};
use devtree::progress::OpProgress;
use devtree::url::DeviceUrl;
use devtree::{
    delete_tree, fetch_snapshot, mirror_tree, removal_plan, render, HttpRemote,
    MirrorOptions, OpReport, RemoteFs, RemotePath,
};

fn main() -> Result<()> {
    // Set up Ctrl-C handler
    ctrlc::set_handler(move || {
        eprintln!("\nInterrupted by user. Exiting (Ctrl-C)...");
        // Exit immediately with 130 (128 + SIGINT)
        std::process::exit(130);
    })
    .context("Error setting Ctrl-C handler")?;

    let cli = Cli::parse();
    let mut settings = load_settings(cli.config.as_deref())?;
    if let Some(t) = cli.timeout {
        settings.timeout_secs = t;
    }
    if cli.log_file.is_some() {
        settings.log_file = cli.log_file.clone();
    }

    // Choose logger once; NoopLogger when no log file was requested
    let file_logger: Arc<dyn Logger> = match settings.log_file {
        Some(ref p) => Arc::new(
            TextLogger::new(p).with_context(|| format!("Failed to open log file {}", p.display()))?,
        ),
        None => Arc::new(NoopLogger),
    };

    match cli.command {
        Command::Mirror(ref args) => run_mirror(args, &settings, cli.verbose, file_logger),
        Command::Delete(ref args) => run_delete(args, &settings, cli.verbose, file_logger),
        Command::Display(ref args) => run_display(args, &settings),
        Command::Rename(ref args) => run_rename(args, &settings, file_logger),
    }
}

fn connect(url: &str, settings: &Settings) -> Result<HttpRemote> {
    let url = DeviceUrl::parse(url, settings.default_port)?;
    Ok(HttpRemote::new(url, settings.timeout())?)
}

/// Spinner on a terminal; fully silent when piped unless `-v` asked for op lines
fn progress_for(verbose: bool, file_logger: Arc<dyn Logger>) -> OpProgress {
    if verbose || std::io::stderr().is_terminal() {
        OpProgress::new(verbose, file_logger)
    } else {
        OpProgress::hidden(file_logger)
    }
}

fn run_mirror(
    args: &MirrorArgs,
    settings: &Settings,
    verbose: bool,
    file_logger: Arc<dyn Logger>,
) -> Result<()> {
    let remote_root = RemotePath::parse(&args.remote)?;
    let options = MirrorOptions {
        replace_existing: settings.replace_existing && !args.no_replace,
        sorted: settings.sorted || args.sorted,
        dry_run: args.dry_run,
    };

    let remote = connect(&args.url, settings)?;

    if options.dry_run {
        println!("DRY RUN MODE - nothing will be sent to the device");
        let plan = PlanLogger::new();
        mirror_tree(&remote, &args.local, &remote_root, &options, &plan)
            .context("Failed to enumerate source directory")?;
        for line in plan.lines() {
            println!("  {}", line);
        }
        println!("Total: {} operations", plan.op_count());
        return Ok(());
    }

    let progress = progress_for(verbose, file_logger);
    let result = mirror_tree(&remote, &args.local, &remote_root, &options, &progress);
    progress.finish_and_clear();
    let report = result.with_context(|| format!("Mirror onto {} failed", remote_root))?;

    println!();
    println!("=== Mirror Complete ===");
    println!("Directories created: {}", report.dirs_created);
    println!("Files uploaded: {}", report.files_uploaded);
    println!("Total size: {:.2} MB", report.bytes_uploaded as f64 / 1_048_576.0);
    finish(&report, args.report.as_deref(), verbose)
}

fn run_delete(
    args: &DeleteArgs,
    settings: &Settings,
    verbose: bool,
    file_logger: Arc<dyn Logger>,
) -> Result<()> {
    let root = RemotePath::parse(&args.remote)?;
    if root.is_root() {
        bail!("Refusing to delete the device root");
    }
    let remote = connect(&args.url, settings)?;

    if args.dry_run {
        println!("DRY RUN MODE - nothing will be removed");
        let snapshot = fetch_snapshot(&remote, &root)?;
        let plan = removal_plan(&snapshot);
        for op in &plan {
            println!("  {}", op);
        }
        println!("Total: {} operations", plan.len());
        return Ok(());
    }

    let progress = progress_for(verbose, file_logger);
    let result = delete_tree(&remote, &root, &progress);
    progress.finish_and_clear();
    let report = result.with_context(|| format!("Delete of {} failed", root))?;

    println!();
    println!("=== Delete Complete ===");
    println!("Files removed: {}", report.files_unlinked);
    println!("Directories removed: {}", report.dirs_removed);
    finish(&report, args.report.as_deref(), verbose)
}

fn run_display(args: &DisplayArgs, settings: &Settings) -> Result<()> {
    let root = RemotePath::parse(&args.remote)?;
    let remote = connect(&args.url, settings)?;
    let snapshot = fetch_snapshot(&remote, &root)?;
    for line in render(&snapshot) {
        println!("{}", line);
    }
    Ok(())
}

fn run_rename(args: &RenameArgs, settings: &Settings, file_logger: Arc<dyn Logger>) -> Result<()> {
    let path = RemotePath::parse(&args.remote)?;
    let remote = connect(&args.url, settings)?;
    match remote.rename(&path, &args.new_name) {
        Ok(()) => {
            file_logger.rename(&path, &args.new_name);
            println!("Renamed {} to {}", path, args.new_name);
            Ok(())
        }
        Err(e) => {
            file_logger.error("rename", &path, &e.to_string());
            Err(e.into())
        }
    }
}

/// Print failures, write the optional report, and fail if a branch was abandoned
fn finish(report: &OpReport, report_path: Option<&std::path::Path>, verbose: bool) -> Result<()> {
    let failures = report.failure_count();
    if failures > 0 {
        println!("\nErrors encountered: {}", failures);
        if verbose {
            for f in report.failures() {
                eprintln!("  - {:?} {}: {}", f.op, f.path, f.error.as_deref().unwrap_or(""));
            }
        }
    }
    if let Some(p) = report_path {
        report
            .write_jsonl(p)
            .with_context(|| format!("Failed to write report {}", p.display()))?;
    }
    if !report.is_complete() {
        for path in &report.aborted {
            eprintln!("  listing failed, branch abandoned: {}", path);
        }
        for path in &report.skipped {
            eprintln!("  left in place: {}", path);
        }
        bail!(
            "traversal incomplete: {} branch(es) could not be listed",
            report.aborted.len()
        );
    }
    Ok(())
}
