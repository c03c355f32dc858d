//! pgha unified CLI: the per-node `create`/`run`/`show`/`drop` surface
//! documented in spec.md §6. This binary wires the keeper, supervisor,
//! and pgctl crates together; it is not itself part of the FSM core.

mod commands;
mod error;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "pgha")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Data directory holding PGDATA and the keeper's state files.
    #[arg(long, global = true, default_value = "./pgdata")]
    pgdata: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a node.
    #[command(subcommand)]
    Create(CreateCommands),

    /// Run the keeper: supervises the local database and the FSM driver.
    Run,

    /// Enable the monitor for this node.
    Enable {
        #[command(subcommand)]
        target: EnableDisableTarget,
    },

    /// Disable the monitor for this node.
    Disable {
        #[command(subcommand)]
        target: EnableDisableTarget,
    },

    /// Remove a node from its formation.
    Drop {
        #[command(subcommand)]
        target: DropCommands,
    },

    /// Display information about a node.
    Show {
        #[command(subcommand)]
        target: ShowCommands,
    },

    /// Trigger a manual operation on the formation.
    Perform {
        #[command(subcommand)]
        target: PerformCommands,
    },

    /// Change a node's registration metadata.
    Set {
        #[command(subcommand)]
        target: SetCommands,
    },
}

#[derive(Subcommand)]
enum CreateCommands {
    /// Initialize a PostgreSQL node and register it with the monitor.
    Postgres {
        /// Formation to join.
        #[arg(long, default_value = "default")]
        formation: String,
        /// Hostname other nodes use to reach this one.
        #[arg(long, default_value = "127.0.0.1")]
        hostname: String,
        /// PostgreSQL port.
        #[arg(long, default_value = "5432")]
        pg_port: u16,
        /// Monitor connection string; omit to run standalone.
        #[arg(long)]
        monitor: Option<String>,
        /// Directory containing the `pg_ctl`/`initdb`/`postgres` binaries.
        #[arg(long, default_value = "/usr/lib/postgresql/16/bin")]
        pg_bin_dir: String,
    },

    /// Initialize the monitor's own node.
    Monitor {
        #[arg(long, default_value = "*")]
        listen_address: String,
        #[arg(long, default_value = "5433")]
        pg_port: u16,
    },
}

#[derive(Subcommand)]
enum EnableDisableTarget {
    Monitor,
}

#[derive(Subcommand)]
enum DropCommands {
    /// Drop this node from its formation.
    Node {
        /// Also remove PGDATA and the keeper's on-disk state.
        #[arg(long)]
        destroy: bool,
    },
}

#[derive(Subcommand)]
enum ShowCommands {
    /// Print this node's locally persisted FSM state.
    State,
    /// Print the connection URI for this node's database.
    Uri,
}

#[derive(Subcommand)]
enum PerformCommands {
    /// Force a failover within a group.
    Failover {
        #[arg(long, default_value = "default")]
        formation: String,
        #[arg(long, default_value = "0")]
        group: u64,
    },
}

#[derive(Subcommand)]
enum SetCommands {
    Node {
        #[command(subcommand)]
        field: SetNodeField,
    },
}

#[derive(Subcommand)]
enum SetNodeField {
    CandidatePriority { node_id: u64, priority: i32 },
    ReplicationQuorum { node_id: u64, quorum: bool },
}

fn main() -> std::process::ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();
    let pgdata = std::path::PathBuf::from(&cli.pgdata);

    let result = match cli.command {
        Commands::Create(CreateCommands::Postgres {
            formation,
            hostname,
            pg_port,
            monitor,
            pg_bin_dir,
        }) => commands::create::postgres(&pgdata, &formation, &hostname, pg_port, monitor.as_deref(), &pg_bin_dir),
        Commands::Create(CreateCommands::Monitor { listen_address, pg_port }) => {
            commands::create::monitor(&pgdata, &listen_address, pg_port)
        }
        Commands::Run => commands::run::run(&pgdata),
        Commands::Enable {
            target: EnableDisableTarget::Monitor,
        } => commands::monitor::enable(&pgdata),
        Commands::Disable {
            target: EnableDisableTarget::Monitor,
        } => commands::monitor::disable(&pgdata),
        Commands::Drop {
            target: DropCommands::Node { destroy },
        } => commands::drop::node(&pgdata, destroy),
        Commands::Show {
            target: ShowCommands::State,
        } => commands::show::state(&pgdata),
        Commands::Show {
            target: ShowCommands::Uri,
        } => commands::show::uri(&pgdata),
        Commands::Perform {
            target: PerformCommands::Failover { formation, group },
        } => commands::perform::failover(&formation, group),
        Commands::Set {
            target: SetCommands::Node { field },
        } => match field {
            SetNodeField::CandidatePriority { node_id, priority } => commands::set::candidate_priority(node_id, priority),
            SetNodeField::ReplicationQuorum { node_id, quorum } => commands::set::replication_quorum(node_id, quorum),
        },
    };

    match result {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(%err, "command failed");
            std::process::ExitCode::from(err.exit_code())
        }
    }
}
