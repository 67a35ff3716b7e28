// Album Sync
// Command line front end: mark albums, preview the plan, mirror them onto the player

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use album_sync::core::{
    AppConfig, ItemStatus, Session, SessionConfig, SyncOutcome, CONFIG_FILE_NAME,
};
use album_sync::logging;
use album_sync::operations::{LocalBackend, Plan};
use album_sync::utilities::truncate_name;

/// Album names longer than this are shortened in listings
const MAX_NAME_LENGTH: usize = 30;

const PROGRESS_TEMPLATE: &str =
    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}";

#[derive(Parser)]
#[command(name = "album-sync")]
#[command(about = "Mirror selected album directories onto a player", long_about = None)]
struct Cli {
    /// Config file (defaults to ./album-sync.yaml, then built-in defaults)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Debug logging for album-sync itself
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List albums with their selection and destination state
    List {
        /// Only show selected albums
        #[arg(short, long)]
        selected: bool,
    },
    /// Mark albums for the destination
    Select {
        #[arg(required = true)]
        names: Vec<String>,
    },
    /// Unmark albums; they are removed from the destination on the next sync
    Deselect {
        #[arg(required = true)]
        names: Vec<String>,
    },
    /// Show what a sync would do without touching the destination
    Plan,
    /// Reconcile the destination with the selection
    Sync {
        /// Do not offer to retry after a failure; exit non-zero instead
        #[arg(long)]
        no_prompt: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let (config, base) = load_config(cli.config.as_deref())?;
    let settings = config.resolve(&AppConfig::default(), &base);
    logging::init(&settings.log_level, cli.verbose)?;

    let mut session = Session::open(settings).context("Failed to open sync session")?;

    match cli.command {
        Commands::List { selected } => list(&session, selected),
        Commands::Select { names } => {
            for name in &names {
                if !session.select(name)? {
                    println!("Already selected: {name}");
                }
            }
            session.save_selection()
        }
        Commands::Deselect { names } => {
            for name in &names {
                if !session.deselect(name) {
                    println!("Not selected: {name}");
                }
            }
            session.save_selection()
        }
        Commands::Plan => {
            print_plan(&session.plan());
            Ok(())
        }
        Commands::Sync { no_prompt } => sync(&mut session, no_prompt),
    }
}

/// Explicit config must exist; the implicit one is optional
fn load_config(explicit: Option<&Path>) -> Result<(SessionConfig, PathBuf)> {
    let cwd = std::env::current_dir().context("Failed to read current directory")?;

    match explicit {
        Some(path) => {
            let config = SessionConfig::load(path)?;
            let base = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .map(Path::to_path_buf)
                .unwrap_or(cwd);
            Ok((config, base))
        }
        None => Ok((SessionConfig::load_or_default(&cwd.join(CONFIG_FILE_NAME))?, cwd)),
    }
}

fn list(session: &Session, selected_only: bool) -> Result<()> {
    let mut shown = 0;

    for item in session.items() {
        let status = session.status(&item.name);
        let selected = matches!(status, ItemStatus::OnDestination | ItemStatus::PendingAdd);
        if selected_only && !selected {
            continue;
        }

        let marker = if selected { "@" } else { "_" };
        let state = match status {
            ItemStatus::OnDestination => "on player",
            ItemStatus::PendingAdd => "pending add",
            ItemStatus::PendingDelete => "pending delete",
            ItemStatus::NotSelected => "",
        };

        println!(
            "{} {:<width$} {}",
            marker,
            truncate_name(&item.name, MAX_NAME_LENGTH),
            state,
            width = MAX_NAME_LENGTH
        );
        shown += 1;
    }

    println!();
    println!(
        "{} shown, {} albums, {} selected, {} on player",
        shown,
        session.items().len(),
        session.selection().len(),
        session.record().len()
    );
    Ok(())
}

fn print_plan(plan: &Plan) {
    if plan.is_empty() {
        println!("✅ Player already matches the selection");
        return;
    }

    let summary = plan.summary();
    println!(
        "📊 {} to delete, {} to add, {} to update",
        summary.deletes, summary.adds, summary.updates
    );

    for name in plan.to_delete() {
        println!("   ❌ DELETE {name}");
    }
    for name in plan.to_add() {
        println!("   ➕ ADD    {name}");
    }
    for name in plan.to_update() {
        println!("   🔄 UPDATE {name}");
    }
}

fn sync(session: &mut Session, no_prompt: bool) -> Result<()> {
    let backend = LocalBackend::new(session.settings().mount_point.clone());

    loop {
        let pb = ProgressBar::new(0);
        pb.set_style(
            ProgressStyle::default_bar()
                .template(PROGRESS_TEMPLATE)?
                .progress_chars("#>-"),
        );
        pb.set_message("Planning...");

        let pending_save = session.has_unsaved_record();
        let outcome = session.sync(&backend, |progress| {
            pb.set_length(progress.total as u64);
            pb.set_position(progress.completed as u64);
            pb.set_message(format!("{} {}", progress.step.action.label(), progress.step.name));
        });

        if outcome.success() {
            if outcome.is_noop() {
                pb.finish_and_clear();
                if pending_save {
                    println!("✅ Sync record saved");
                } else {
                    println!("✅ Player already matches the selection");
                }
            } else {
                pb.finish_with_message("✅ Synchronization complete!");
                report(&outcome);
            }
            return Ok(());
        }

        pb.abandon_with_message("❌ Synchronization failed!");
        report(&outcome);

        if no_prompt || !confirm("Retry?")? {
            bail!(
                "sync incomplete: {} of {} steps done",
                outcome.completed,
                outcome.total
            );
        }
    }
}

fn report(outcome: &SyncOutcome) {
    println!();
    println!("📊 Results:");
    println!(
        "   Planned: {} delete, {} add, {} update",
        outcome.summary.deletes, outcome.summary.adds, outcome.summary.updates
    );
    println!("   Completed: {}/{}", outcome.completed, outcome.total);

    if let Some(failure) = &outcome.failure {
        match &failure.step {
            Some(step) => eprintln!(
                "   ⚠️  {} {}: {}",
                step.action.label(),
                step.name,
                failure.error
            ),
            None => eprintln!("   ⚠️  {}", failure.error),
        }
    }

    if let Some(e) = &outcome.save_error {
        eprintln!("   ⚠️  {e}");
        eprintln!("   ⚠️  The player and the sync record may now disagree");
    }
}

fn confirm(question: &str) -> Result<bool> {
    print!("{question} [y/N] ");
    io::stdout().flush()?;

    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim(), "y" | "Y" | "yes"))
}
