//! # revdiff CLI
//!
//! Command-line interface for the revdiff comparison engine.
//!
//! ## Usage
//! ```bash
//! # Initialize a repository
//! revdiff init
//!
//! # Snapshot a directory as a named ref
//! revdiff commit ./project --ref main -m "initial state"
//!
//! # Compare the latest commit against its parent
//! revdiff diff main
//!
//! # Compare a commit against a live directory
//! revdiff diff main ./project
//!
//! # Shared-storage statistics between two commits
//! revdiff diff main^ main --stats
//! ```

use clap::{Parser, Subcommand};
use colored::*;
use revdiff::{CancellationToken, CompareOptions, RefPair, Repo, Result, RevDiffError};
use std::path::PathBuf;

/// revdiff - compare revisions of a content-addressable snapshot store
#[derive(Parser)]
#[command(name = "revdiff")]
#[command(version)]
#[command(about = "Compare revisions and measure shared storage between snapshots")]
#[command(long_about = None)]
struct Cli {
    /// Repository directory (defaults to .revdiff)
    #[arg(short, long, global = true)]
    repo: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a repository
    Init,

    /// Snapshot a directory as a new commit on a ref
    Commit {
        /// Directory to snapshot
        path: PathBuf,

        /// Ref to advance
        #[arg(long = "ref", value_name = "NAME")]
        ref_name: String,

        /// Description message
        #[arg(short, long)]
        message: Option<String>,
    },

    /// Compare directory TARGETDIR against revision REV
    Diff {
        /// Revision references: REV, or REV TARGETDIR
        #[arg(required = true, num_args = 1..=2, value_name = "REV [TARGETDIR]")]
        refs: Vec<String>,

        /// Print various statistics
        #[arg(long)]
        stats: bool,

        /// Print filesystem diff
        #[arg(long = "fs-diff")]
        fs_diff: bool,
    },

    /// List refs
    Refs,
}

fn main() {
    let cli = Cli::parse();

    // Set up logging
    if cli.verbose {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .init();
    }

    // Disable colors if needed
    if std::env::var("NO_COLOR").is_ok() {
        colored::control::set_override(false);
    }

    if let Err(e) = run(cli) {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

/// Main command runner
fn run(cli: Cli) -> Result<()> {
    let repo_path = cli.repo.unwrap_or_else(|| PathBuf::from(".revdiff"));

    match cli.command {
        Commands::Init => cmd_init(repo_path),
        Commands::Commit {
            path,
            ref_name,
            message,
        } => cmd_commit(repo_path, path, ref_name, message),
        Commands::Diff {
            refs,
            stats,
            fs_diff,
        } => cmd_diff(repo_path, refs, stats, fs_diff),
        Commands::Refs => cmd_refs(repo_path),
    }
}

/// Initialize a repository
fn cmd_init(repo_path: PathBuf) -> Result<()> {
    let repo = Repo::init(&repo_path)?;
    println!(
        "{} Initialized repository at {}",
        "✓".green().bold(),
        repo.root().display().to_string().cyan()
    );
    Ok(())
}

/// Snapshot a directory as a commit
fn cmd_commit(
    repo_path: PathBuf,
    path: PathBuf,
    ref_name: String,
    message: Option<String>,
) -> Result<()> {
    let repo = open_repo(repo_path)?;
    let commit_id = repo.commit_directory(&path, &ref_name, message.clone())?;

    println!(
        "{} Committed {} as {}",
        "✓".green().bold(),
        path.display().to_string().cyan(),
        short(&commit_id).yellow().bold()
    );
    if let Some(msg) = &message {
        println!("  Message: {}", msg.cyan());
    }
    println!("  Ref: {}", ref_name.cyan());
    Ok(())
}

/// Compare two revisions
///
/// With one reference, compares the revision against its first parent.
/// With neither --stats nor --fs-diff, the filesystem diff is implied.
fn cmd_diff(repo_path: PathBuf, refs: Vec<String>, stats: bool, fs_diff: bool) -> Result<()> {
    let repo = open_repo(repo_path)?;
    let pair = RefPair::from_refs(&refs)?;
    let options = CompareOptions { stats, fs_diff };
    let cancel = CancellationToken::new();

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    revdiff::run_compare(&repo, &pair, options, &cancel, &mut out)
}

/// List refs with their commit targets
fn cmd_refs(repo_path: PathBuf) -> Result<()> {
    let repo = open_repo(repo_path)?;
    let refs = repo.refs()?;

    if refs.is_empty() {
        println!("{}", "No refs found.".yellow());
        return Ok(());
    }

    for (name, target) in refs {
        println!("{} {}", short(&target).yellow(), name.cyan());
    }
    Ok(())
}

// Helper functions

/// Abbreviate a checksum for display, tolerating hand-edited ref files
fn short(checksum: &str) -> &str {
    checksum.get(..8).unwrap_or(checksum)
}

/// Open an existing repository with a friendly error
fn open_repo(repo_path: PathBuf) -> Result<Repo> {
    Repo::open(&repo_path).map_err(|e| match e {
        RevDiffError::RepoNotInitialized(path) => RevDiffError::Usage(format!(
            "no repository at {:?}; run 'revdiff init' first",
            path
        )),
        other => other,
    })
}
