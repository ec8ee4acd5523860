//! deskctl — operator CLI for the deskgrid allocation engine.
//!
//! Every command works against a data directory holding the redb store.
//!
//! ```text
//! deskctl --data-dir ./office seed directory.json
//! deskctl --data-dir ./office allocate --employee E1 --type private_office
//! deskctl --data-dir ./office simulate monday.json
//! ```

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

use commands::Context;

#[derive(Parser)]
#[command(
    name = "deskctl",
    about = "deskgrid — workspace allocation engine",
    version,
    propagate_version = true
)]
struct Cli {
    /// Directory holding the state store.
    #[arg(long, global = true, default_value = "./deskgrid-data")]
    data_dir: PathBuf,

    /// Path to deskgrid.toml (defaults apply when absent).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Load employees and workspaces from a JSON file.
    ///
    /// The file holds `{"employees": [...], "workspaces": [...]}`.
    Seed { file: PathBuf },

    /// List workspaces with their occupancy.
    Workspaces {
        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Allocate a workspace for one employee.
    Allocate(commands::allocate::AllocateArgs),

    /// Vacate an employee's seat.
    Release {
        #[arg(long)]
        workspace: String,
        #[arg(long)]
        employee: String,
    },

    /// Submit a batch of requests concurrently and report each outcome.
    Simulate {
        /// JSON array of workspace requests.
        file: PathBuf,
        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Put a workspace into or out of maintenance.
    Maintenance {
        workspace: String,
        /// Return the workspace to service.
        #[arg(long)]
        off: bool,
    },

    /// Place or lift an operator hold on a workspace.
    Hold {
        workspace: String,
        #[arg(long)]
        off: bool,
    },

    /// Record post-allocation feedback.
    Feedback(commands::feedback::FeedbackArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.json_logs)?;

    let ctx = Context::open(&cli.data_dir, cli.config.as_deref())?;

    match cli.command {
        Command::Seed { file } => commands::seed::seed(&ctx, &file),
        Command::Workspaces { format } => commands::workspaces::list(&ctx, &format),
        Command::Allocate(args) => commands::allocate::allocate(ctx, args),
        Command::Release {
            workspace,
            employee,
        } => commands::allocate::release(ctx, &workspace, &employee),
        Command::Simulate { file, format } => {
            commands::simulate::simulate(ctx, &file, &format).await
        }
        Command::Maintenance { workspace, off } => {
            commands::workspaces::set_maintenance(&ctx, &workspace, !off)
        }
        Command::Hold { workspace, off } => commands::workspaces::set_hold(&ctx, &workspace, !off),
        Command::Feedback(args) => commands::feedback::record(&ctx, args),
    }
}

fn init_tracing(json: bool) -> anyhow::Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new("info,deskctl=debug,deskgrid=debug"))?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
    Ok(())
}
