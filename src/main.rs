mod cfg;
mod descriptor;
mod engine;
mod error;
mod ui;

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::{Path, PathBuf};

use engine::SyncOptions;

/// Foldsync - one-way folder mirroring driven by .sync descriptors
#[derive(Parser)]
#[command(name = "foldsync")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Storage root for descriptors that use `name` (overrides the config file)
    #[arg(long, global = true, env = "FOLDSYNC_STORAGE_ROOT")]
    storage_root: Option<String>,

    /// Path to config file (defaults to ~/.foldsync/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a .sync descriptor in a directory
    Init {
        /// Directory to bootstrap (defaults to the current directory)
        dir: Option<PathBuf>,

        /// Storage entry name (defaults to the directory's basename)
        #[arg(long)]
        name: Option<String>,

        /// Explicit destination path (takes precedence over the name)
        #[arg(long)]
        target: Option<String>,

        /// Overwrite an existing descriptor
        #[arg(short, long)]
        force: bool,
    },

    /// Mirror a directory to its configured destination
    Run {
        /// Source directory, or its .sync file
        path: PathBuf,

        /// Report what would change without touching the destination
        #[arg(long)]
        dry_run: bool,
    },

    /// Show a descriptor and its resolved destination
    Show {
        /// Source directory, or its .sync file
        path: PathBuf,
    },

    /// Edit or view configuration
    Config {
        /// Open config in editor
        #[arg(long)]
        edit: bool,

        /// Show current configuration
        #[arg(long)]
        show: bool,

        /// Set the storage root (prompts when no value is given)
        #[arg(long, num_args = 0..=1, default_missing_value = "")]
        set_storage_root: Option<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    ui::init();

    let config_path = match cli.config {
        Some(path) => path,
        None => cfg::default_path()?,
    };

    let result = match cli.command {
        Commands::Init {
            dir,
            name,
            target,
            force,
        } => cmd_init(dir, name, target, force),
        Commands::Run { path, dry_run } => {
            cmd_run(&config_path, cli.storage_root, &path, dry_run, cli.verbose)
        }
        Commands::Show { path } => cmd_show(&config_path, cli.storage_root, &path),
        Commands::Config {
            edit,
            show,
            set_storage_root,
        } => cmd_config(&config_path, edit, show, set_storage_root),
    };

    if let Err(e) = result {
        ui::error(&format!("Error: {:#}", e));
        std::process::exit(1);
    }

    Ok(())
}

fn cmd_init(
    dir: Option<PathBuf>,
    name: Option<String>,
    target: Option<String>,
    force: bool,
) -> Result<()> {
    let dir = match dir {
        Some(dir) => dir,
        None => std::env::current_dir()?,
    };

    let path = descriptor::init(&dir, name.as_deref(), target.as_deref(), force)?;
    ui::success(&format!("Created {}", path.display()));
    if target.is_none() {
        ui::hint("Descriptors without a target resolve their name against the storage root");
        ui::hint("Set one with 'foldsync config --set-storage-root <path>'");
    }
    Ok(())
}

fn cmd_run(
    config_path: &Path,
    storage_root: Option<String>,
    path: &Path,
    dry_run: bool,
    verbose: bool,
) -> Result<()> {
    let (src_dir, desc_path) = descriptor::locate(path)?;
    let desc = descriptor::load(&desc_path)?;
    let root = resolve_storage_root(config_path, storage_root)?;
    let dst_dir = desc.resolve_target(root.as_deref())?;

    ui::info(&format!(
        "Syncing {} {} {}",
        src_dir.display(),
        "→".dimmed(),
        dst_dir.display()
    ));
    if verbose && !desc.ignore_exts.is_empty() {
        ui::info(&format!("Ignoring extensions: {}", desc.ignore_exts.join(", ")));
    }

    let opts = SyncOptions {
        ignore_exts: desc.ignore_exts.iter().cloned().collect(),
        dry_run,
        cancel: None,
    };

    let pb = ui::spinner("Syncing...");
    let outcome = engine::sync(&src_dir, &dst_dir, &opts);
    pb.finish_and_clear();

    match outcome {
        Ok(report) if report.is_clean() => {
            ui::success("Nothing to sync");
        }
        Ok(report) if dry_run => {
            ui::info(&format!(
                "Dry run: would copy {}, delete {}",
                report.copied, report.deleted
            ));
        }
        Ok(report) => {
            ui::success(&format!(
                "Folder synced (copied: {}, deleted: {})",
                report.copied, report.deleted
            ));
        }
        Err(failure) => {
            if !failure.partial.is_clean() {
                ui::warn(&format!(
                    "Aborted after copying {} and deleting {}",
                    failure.partial.copied, failure.partial.deleted
                ));
            }
            return Err(failure.into());
        }
    }

    Ok(())
}

fn cmd_show(config_path: &Path, storage_root: Option<String>, path: &Path) -> Result<()> {
    let (src_dir, desc_path) = descriptor::locate(path)?;
    let desc = descriptor::load(&desc_path)?;

    println!("{} {}", "Source:".bold(), src_dir.display());
    if let Some(name) = &desc.name {
        println!("{} {}", "Name:".bold(), name);
    }
    if let Some(target) = &desc.target {
        println!("{} {}", "Target:".bold(), target);
    }
    if !desc.ignore_exts.is_empty() {
        println!("{} {}", "Ignored:".bold(), desc.ignore_exts.join(", "));
    }

    let root = resolve_storage_root(config_path, storage_root)?;
    match desc.resolve_target(root.as_deref()) {
        Ok(dst) => println!("{} {}", "Resolves to:".bold(), dst.display()),
        Err(e) => ui::warn(&format!("Unresolvable destination: {}", e)),
    }

    Ok(())
}

fn cmd_config(
    config_path: &Path,
    edit: bool,
    show: bool,
    set_storage_root: Option<String>,
) -> Result<()> {
    if let Some(value) = set_storage_root {
        let mut config = cfg::load(config_path)?;
        let value = if value.is_empty() {
            ui::prompt_text("Storage root", config.storage_root.as_deref())
        } else {
            value
        };
        config.storage_root = Some(value);
        cfg::save(config_path, &config)?;
        ui::success("Storage root updated");
    } else if edit {
        cfg::edit(config_path)?;
        ui::success("Configuration edited");
    } else if show {
        let config = cfg::load(config_path)?;
        println!("{}", toml::to_string_pretty(&config)?);
    } else {
        ui::hint("Use --edit, --show, or --set-storage-root");
    }

    Ok(())
}

fn resolve_storage_root(config_path: &Path, flag: Option<String>) -> Result<Option<PathBuf>> {
    let raw = match flag.filter(|v| !v.is_empty()) {
        Some(value) => Some(value),
        None => cfg::load(config_path)?.storage_root,
    };
    Ok(raw.map(|root| PathBuf::from(shellexpand::tilde(&root).into_owned())))
}
