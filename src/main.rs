use std::io;
use std::path::PathBuf;
use std::process;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use colored::Colorize;

use trailmap::model::DashboardStats;
use trailmap::serve::{start_server, ServerContext};
use trailmap::{Config, Store};

#[derive(Parser, Debug)]
#[command(name = "trailmap")]
#[command(author, version, about = "Personal learning roadmap tracker")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the local API server
    Serve {
        /// Port to listen on (default from config, else 4400)
        #[arg(short, long)]
        port: Option<u16>,

        /// Data directory holding the JSON documents
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },

    /// Create the data directory and seed documents
    Init {
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },

    /// Snapshot every document into a timestamped backup directory
    Backup {
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },

    /// Show completion numbers per phase and overall
    Stats {
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate for (bash, zsh, fish, ...)
        shell: Shell,
    },
}

/// `--data-dir` wins, then the TRAILMAP_DATA_DIR env var, then `./data`.
fn resolve_data_dir(flag: Option<PathBuf>) -> PathBuf {
    flag.or_else(|| std::env::var("TRAILMAP_DATA_DIR").ok().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("data"))
}

fn main() {
    let cli = Cli::parse();
    let config = Config::load();

    let result = match cli.command {
        Command::Serve { port, data_dir } => {
            let store = Store::new(resolve_data_dir(data_dir))
                .with_backup_retain(config.backup.retain);
            let ctx = ServerContext {
                store,
                github_token: config.github.token.clone(),
            };
            let port = port.unwrap_or(config.server.port);
            start_server(port, ctx).map_err(|e| e.to_string())
        }

        Command::Init { data_dir } => {
            let dir = resolve_data_dir(data_dir);
            let store = Store::new(&dir);
            store.initialize().map_err(|e| e.to_string()).map(|()| {
                println!(
                    "{} initialized data directory at {}",
                    "✓".green().bold(),
                    dir.display()
                );
            })
        }

        Command::Backup { data_dir } => {
            let store = Store::new(resolve_data_dir(data_dir))
                .with_backup_retain(config.backup.retain);
            match store.backup() {
                Ok(path) => {
                    println!("{} backup written to {}", "✓".green().bold(), path.display());
                    Ok(())
                }
                Err(e) => Err(e.to_string()),
            }
        }

        Command::Stats { data_dir } => {
            let store = Store::new(resolve_data_dir(data_dir));
            show_stats(&store)
        }

        Command::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "trailmap", &mut io::stdout());
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("{} {}", "error:".red().bold(), e);
        process::exit(1);
    }
}

fn show_stats(store: &Store) -> Result<(), String> {
    let roadmap = store.read_roadmap().map_err(|e| e.to_string())?;
    let progress = store.read_progress().map_err(|e| e.to_string())?;
    let notes = store.read_notes().map_err(|e| e.to_string())?;
    let stats = DashboardStats::compute(&roadmap, &progress, &notes);

    println!("{}", "Learning progress".bold());
    println!(
        "  {} sections: {} completed, {} in progress, {} not started",
        stats.total_sections,
        stats.completed_sections.to_string().green(),
        stats.in_progress_sections.to_string().yellow(),
        stats.not_started_sections
    );
    println!("  overall: {}%", stats.overall_progress);
    println!("  notes: {}", stats.total_notes);

    if !stats.phase_progress.is_empty() {
        println!();
        for phase in &stats.phase_progress {
            println!(
                "  {:>3}%  {} ({}/{})",
                phase.progress,
                phase.title.bold(),
                phase.completed,
                phase.total
            );
        }
    }
    Ok(())
}
