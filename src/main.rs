//! Convoy CLI - plan/apply deployment orchestration for monorepos
//!
//! Usage: convoy <COMMAND>
//!
//! Commands:
//!   plan    Detect changes, validate, and write a deployment plan
//!   apply   Deploy the planned artifacts and update the lock ledger
//!   list    Show discovered artifacts and their deployed versions
//!   tree    Show the dependency graph
//!   check   Validate workspace configuration
//!   init    Scaffold a convoy.yml in the current directory

use anyhow::Result;
use clap::{Parser, Subcommand};

use convoy::executor::{CancelToken, DEFAULT_CONCURRENCY};
use convoy::ui::Printer;

mod commands;

use commands::{ApplyArgs, PlanArgs};

/// Convoy - plan/apply deployment orchestration for monorepos
#[derive(Parser, Debug)]
#[command(name = "convoy")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Print captured step output for successful steps too
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Detect changes, validate affected artifacts, write a plan
    Plan {
        /// Only plan these artifacts (default: all)
        artifacts: Vec<String>,

        /// Deploy this exact commit, bypassing change detection
        #[arg(long, value_name = "COMMIT")]
        pin: Option<String>,

        /// Parallel validation jobs
        #[arg(long, default_value_t = DEFAULT_CONCURRENCY)]
        concurrency: usize,

        /// Plan pinned artifacts too
        #[arg(short, long)]
        force: bool,
    },

    /// Deploy the planned artifacts and update the lock ledger
    Apply {
        /// Do not auto-commit the updated lock ledger
        #[arg(long)]
        no_commit: bool,

        /// Parallel deployment jobs
        #[arg(long, default_value_t = DEFAULT_CONCURRENCY)]
        concurrency: usize,

        /// Deploy pinned plan entries without re-pinning them
        #[arg(short, long)]
        force: bool,
    },

    /// Show discovered artifacts and their deployed versions
    List {
        /// Machine-readable output
        #[arg(long)]
        json: bool,
    },

    /// Show the dependency graph
    Tree,

    /// Validate workspace configuration without running anything
    Check {
        /// Machine-readable output
        #[arg(long)]
        json: bool,
    },

    /// Scaffold a convoy.yml in the current directory
    Init {
        /// Overwrite an existing convoy.yml
        #[arg(short, long)]
        force: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let printer = Printer::new(cli.verbose);
    let root = std::env::current_dir()?;

    let cancel = CancelToken::new();
    {
        let cancel = cancel.clone();
        ctrlc::set_handler(move || cancel.cancel())?;
    }

    match cli.command {
        Commands::Plan {
            artifacts,
            pin,
            concurrency,
            force,
        } => {
            let args = PlanArgs {
                artifacts,
                pin,
                concurrency,
                force,
            };
            commands::cmd_plan(&root, &args, &cancel, &printer)
        }
        Commands::Apply {
            no_commit,
            concurrency,
            force,
        } => {
            let args = ApplyArgs {
                no_commit,
                concurrency,
                force,
            };
            commands::cmd_apply(&root, &args, &cancel, &printer)
        }
        Commands::List { json } => commands::cmd_list(&root, json, &printer),
        Commands::Tree => commands::cmd_tree(&root, &printer),
        Commands::Check { json } => commands::cmd_check(&root, json, &printer),
        Commands::Init { force } => commands::cmd_init(&root, force, &printer),
    }
}
