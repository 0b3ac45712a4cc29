use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use defpatch::{apply_batch, check_batch, load_from_path, PatchOutcome, PatchStatus};
use similar::{ChangeTag, TextDiff};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Parser)]
#[command(name = "defpatch")]
#[command(about = "Replace function definitions in an external project's source files", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply patch files to a workspace
    Apply {
        /// Path to workspace root (defaults to DEFPATCH_WORKSPACE or cwd)
        #[arg(short, long)]
        workspace: Option<PathBuf>,

        /// Specific patch file to apply (otherwise applies all in patches/)
        #[arg(short, long)]
        patches: Option<PathBuf>,

        /// Dry run - show what would be changed without modifying files
        #[arg(short = 'n', long)]
        dry_run: bool,

        /// Show unified diff of changes
        #[arg(short, long)]
        diff: bool,
    },

    /// Check which functions are currently locatable, without writing
    Status {
        /// Path to workspace root (defaults to DEFPATCH_WORKSPACE or cwd)
        #[arg(short, long)]
        workspace: Option<PathBuf>,

        /// Specific patch file to check
        #[arg(short, long)]
        patches: Option<PathBuf>,
    },

    /// List discovered patch files and their entries
    List {
        /// Path to workspace root (defaults to DEFPATCH_WORKSPACE or cwd)
        #[arg(short, long)]
        workspace: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Apply {
            workspace,
            patches,
            dry_run,
            diff,
        } => cmd_apply(workspace, patches, dry_run, diff),

        Commands::Status { workspace, patches } => cmd_status(workspace, patches),

        Commands::List { workspace } => cmd_list(workspace),
    }
}

/// Resolve the workspace the patch targets live under.
///
/// Priority order:
/// 1. Explicit --workspace flag
/// 2. DEFPATCH_WORKSPACE environment variable
/// 3. Current working directory
fn resolve_workspace(cli_workspace: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(path) = cli_workspace {
        return Ok(path.canonicalize()?);
    }

    if let Ok(env_path) = env::var("DEFPATCH_WORKSPACE") {
        let path = PathBuf::from(&env_path);
        if path.exists() {
            return Ok(path.canonicalize()?);
        }
        eprintln!(
            "{}",
            format!(
                "Warning: DEFPATCH_WORKSPACE is set but path doesn't exist: {}",
                env_path
            )
            .yellow()
        );
    }

    Ok(env::current_dir()?)
}

/// Discover all .toml patch files in a patches/ directory.
///
/// Discovery order:
/// 1. `<workspace>/patches` (allows keeping patch files alongside the target).
/// 2. `./patches` relative to the current working directory.
fn discover_patch_files(workspace: &Path) -> Result<Vec<PathBuf>> {
    let cwd_patches_dir = env::current_dir().ok().map(|cwd| cwd.join("patches"));
    let workspace_patches_dir = workspace.join("patches");

    let candidate_dirs: Vec<PathBuf> = std::iter::once(workspace_patches_dir)
        .chain(cwd_patches_dir)
        .collect();

    for patches_dir in candidate_dirs {
        if !patches_dir.exists() {
            continue;
        }

        let mut files = Vec::new();
        for entry in WalkDir::new(&patches_dir).max_depth(1) {
            let entry = entry?;
            if entry.file_type().is_file()
                && entry.path().extension().and_then(|s| s.to_str()) == Some("toml")
            {
                files.push(entry.path().to_path_buf());
            }
        }

        files.sort();

        if !files.is_empty() {
            return Ok(files);
        }
    }

    anyhow::bail!(
        "No .toml patch files found in either ./patches or {}/patches",
        workspace.display()
    )
}

fn patch_files_to_load(workspace: &Path, explicit: Option<PathBuf>) -> Result<Vec<PathBuf>> {
    match explicit {
        Some(path) => Ok(vec![path]),
        None => discover_patch_files(workspace),
    }
}

/// Show unified diff between original and modified content.
fn display_diff(file: &Path, original: &str, modified: &str) {
    println!(
        "\n{}",
        format!("--- {} (original)", file.display()).dimmed()
    );
    println!("{}", format!("+++ {} (patched)", file.display()).dimmed());

    let diff = TextDiff::from_lines(original, modified);

    for change in diff.iter_all_changes() {
        let sign = match change.tag() {
            ChangeTag::Delete => format!("-{}", change).red(),
            ChangeTag::Insert => format!("+{}", change).green(),
            ChangeTag::Equal => format!(" {}", change).normal(),
        };
        print!("{}", sign);
    }
}

fn report_outcome(outcome: &PatchOutcome, dry_run: bool) {
    match outcome.status {
        PatchStatus::Updated => {
            if dry_run {
                println!("{} would update: {}", "✓".green(), outcome);
            } else {
                println!("{} {}", "✓".green(), outcome);
            }
        }
        PatchStatus::NotFound => println!("{} {}", "⊙".yellow(), outcome),
        PatchStatus::FileMissing | PatchStatus::Unreadable | PatchStatus::Unwritable => {
            eprintln!("{} {}", "✗".red(), outcome)
        }
    }
}

fn cmd_apply(
    workspace: Option<PathBuf>,
    patches: Option<PathBuf>,
    dry_run: bool,
    show_diff: bool,
) -> Result<()> {
    let workspace = resolve_workspace(workspace)?;
    let patch_files = patch_files_to_load(&workspace, patches)?;

    println!("Workspace: {}", workspace.display());
    println!();

    let mut total_updated = 0;
    let mut total_not_found = 0;
    let mut total_failed = 0;

    for patch_file in patch_files {
        println!("Loading patches from {}...", patch_file.display());

        let config = load_from_path(&patch_file)?;
        let batch = config.into_batch(&workspace);

        // Capture file contents before applying, for diff output. Only the
        // files this batch touches are read.
        let mut file_contents_before: HashMap<PathBuf, String> = HashMap::new();
        if show_diff && !dry_run {
            for request in batch.requests() {
                if !file_contents_before.contains_key(&request.file) {
                    if let Ok(content) = fs::read_to_string(&request.file) {
                        file_contents_before.insert(request.file.clone(), content);
                    }
                }
            }
        }

        let outcomes = if dry_run {
            println!("{}", "  [DRY RUN - no files will be modified]".cyan());
            check_batch(&batch)
        } else {
            apply_batch(&batch)
        };

        let mut diffed: Vec<PathBuf> = Vec::new();
        for outcome in &outcomes {
            report_outcome(outcome, dry_run);
            match outcome.status {
                PatchStatus::Updated => {
                    total_updated += 1;
                    if show_diff && !dry_run && !diffed.contains(&outcome.file) {
                        if let Some(before) = file_contents_before.get(&outcome.file) {
                            if let Ok(after) = fs::read_to_string(&outcome.file) {
                                if before != &after {
                                    display_diff(&outcome.file, before, &after);
                                    diffed.push(outcome.file.clone());
                                }
                            }
                        }
                    }
                }
                PatchStatus::NotFound => total_not_found += 1,
                _ => total_failed += 1,
            }
        }

        println!();
    }

    println!("{}", "Summary:".bold());
    println!("  {} updated", format!("{}", total_updated).green());
    println!("  {} not found", format!("{}", total_not_found).yellow());
    println!("  {} failed", format!("{}", total_failed).red());

    // Individual outcomes never set the exit code; only a malformed config
    // or an unusable workspace aborts the run.
    Ok(())
}

fn cmd_status(workspace: Option<PathBuf>, patches: Option<PathBuf>) -> Result<()> {
    let workspace = resolve_workspace(workspace)?;
    let patch_files = patch_files_to_load(&workspace, patches)?;

    println!("{}", "Patch Status Report".bold());
    println!("Workspace: {}", workspace.display());
    println!();

    let mut locatable = Vec::new();
    let mut not_found = Vec::new();
    let mut unavailable = Vec::new();

    for patch_file in patch_files {
        let config = load_from_path(&patch_file)?;
        let batch = config.into_batch(&workspace);

        for outcome in check_batch(&batch) {
            match outcome.status {
                PatchStatus::Updated => locatable.push(outcome),
                PatchStatus::NotFound => not_found.push(outcome),
                _ => unavailable.push(outcome),
            }
        }
    }

    if !locatable.is_empty() {
        println!(
            "{} {} ({})",
            "✓".green(),
            "LOCATABLE".green().bold(),
            locatable.len()
        );
        for outcome in &locatable {
            println!("  - function {} in {}", outcome.function, outcome.file.display());
        }
        println!();
    }

    if !not_found.is_empty() {
        println!(
            "{} {} ({})",
            "⊙".yellow(),
            "NOT FOUND".yellow().bold(),
            not_found.len()
        );
        for outcome in &not_found {
            println!("  - function {} in {}", outcome.function, outcome.file.display());
        }
        println!();
    }

    if !unavailable.is_empty() {
        println!(
            "{} {} ({})",
            "✗".red(),
            "UNAVAILABLE".red().bold(),
            unavailable.len()
        );
        for outcome in &unavailable {
            println!("  - {}", outcome);
        }
        println!();
    }

    Ok(())
}

fn cmd_list(workspace: Option<PathBuf>) -> Result<()> {
    let workspace = resolve_workspace(workspace)?;
    let patch_files = discover_patch_files(&workspace)?;

    for patch_file in patch_files {
        let config = load_from_path(&patch_file)?;

        println!("{}", patch_file.display().to_string().bold());
        if !config.meta.name.is_empty() {
            println!("  name: {}", config.meta.name);
        }
        if let Some(description) = &config.meta.description {
            println!("  description: {}", description);
        }
        for entry in &config.patches {
            println!("  - {}: function {} in {}", entry.id, entry.function, entry.file);
        }
        println!();
    }

    Ok(())
}
