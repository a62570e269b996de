//! Custos CLI - main entry point
//!
//! The custody backend and account directory are external services; local
//! runs wire the in-memory implementations.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use tracing::info;

use custos_core::{GovernanceConfig, Permission};
use custos_custody::{CustodyAccount, MockCustodyBackend, MockDirectory};
use custos_registry::{AdminPatch, NewAdmin};
use custos_rpc::{commands, AppContext};

#[derive(Parser)]
#[command(name = "custos")]
#[command(about = "Custos - quorum governance for custody accounts", long_about = None)]
struct Cli {
    /// Data directory path
    #[arg(short, long, default_value = "./data")]
    data: PathBuf,

    /// Optional JSON config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an administrator
    AdminCreate {
        email: String,
        first_name: String,
        last_name: String,
        /// Comma-separated permissions (e.g. VOTE,EXECUTE)
        #[arg(long, default_value = "VOTE")]
        permissions: String,
        /// Pre-existing signer address
        #[arg(long)]
        wallet_address: Option<String>,
        /// Generate a signing keypair and provision a custody signer entry
        #[arg(long)]
        generate_keypair: bool,
        /// Import a secret key (64 hex chars) instead of generating one
        #[arg(long)]
        secret_key: Option<String>,
    },

    /// Show an administrator
    AdminGet {
        id: String,
    },

    /// Update administrator fields
    AdminUpdate {
        id: String,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        first_name: Option<String>,
        #[arg(long)]
        last_name: Option<String>,
        #[arg(long)]
        wallet_address: Option<String>,
        /// Comma-separated permissions
        #[arg(long)]
        permissions: Option<String>,
        #[arg(long)]
        active: Option<bool>,
    },

    /// Delete an administrator
    AdminDelete {
        id: String,
    },

    /// List active administrators holding any of the given permissions
    AdminList {
        /// Comma-separated permissions (e.g. VOTE,EXECUTE)
        #[arg(long, default_value = "VOTE,EXECUTE")]
        permissions: String,
    },

    /// Open a pending transaction for an end-user
    Propose {
        user_email: String,
    },

    /// Vote on a pending transaction
    Vote {
        transaction_id: String,
        admin_id: String,
        /// approve or reject
        decision: String,
    },

    /// Execute an approved transaction
    Execute {
        transaction_id: String,
        admin_id: String,
    },

    /// Run the inactivity cleanup engine once and print the report
    CleanupRun,

    /// Show cleanup engine status
    CleanupStatus,

    /// Recompute and push the signer policy for one account
    Reconcile {
        user_email: String,
        wallet_address: String,
    },

    /// Run the schedulers until interrupted
    Serve,
}

fn parse_permissions(input: &str) -> anyhow::Result<Vec<Permission>> {
    input
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            Permission::from_str(s).map_err(|_| anyhow::anyhow!("unknown permission: {s}"))
        })
        .collect()
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();

    let config = match cli.config {
        Some(ref path) => GovernanceConfig::from_file(path)?,
        None => GovernanceConfig::default(),
    };

    let backend = Arc::new(MockCustodyBackend::new());
    let directory = Arc::new(MockDirectory::new());
    let ctx = AppContext::new(&cli.data, config, backend, directory)?;

    let result = run_command(&ctx, cli.command).await;

    if let Err(e) = result {
        eprintln!("{e}");
        std::process::exit(1);
    }

    Ok(())
}

async fn run_command(ctx: &AppContext, command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::AdminCreate {
            email,
            first_name,
            last_name,
            permissions,
            wallet_address,
            generate_keypair,
            secret_key,
        } => {
            let new = NewAdmin {
                email,
                first_name,
                last_name,
                wallet_address,
                permissions: parse_permissions(&permissions)?,
                generate_keypair,
                secret_key,
            };
            let admin = commands::create_admin(ctx, new).await?;
            print_json(&admin)
        }

        Commands::AdminGet { id } => print_json(&commands::get_admin(ctx, &id)?),

        Commands::AdminUpdate {
            id,
            email,
            first_name,
            last_name,
            wallet_address,
            permissions,
            active,
        } => {
            let patch = AdminPatch {
                email,
                first_name,
                last_name,
                wallet_address,
                permissions: permissions.as_deref().map(parse_permissions).transpose()?,
                is_active: active,
            };
            print_json(&commands::update_admin(ctx, &id, patch)?)
        }

        Commands::AdminDelete { id } => {
            commands::delete_admin(ctx, &id)?;
            println!("deleted {id}");
            Ok(())
        }

        Commands::AdminList { permissions } => {
            let permissions = parse_permissions(&permissions)?;
            print_json(&commands::list_admins_by_permissions(ctx, &permissions)?)
        }

        Commands::Propose { user_email } => {
            print_json(&commands::propose_transaction(ctx, &user_email)?)
        }

        Commands::Vote {
            transaction_id,
            admin_id,
            decision,
        } => print_json(&commands::vote(ctx, &transaction_id, &admin_id, &decision)?),

        Commands::Execute {
            transaction_id,
            admin_id,
        } => print_json(&commands::execute(ctx, &transaction_id, &admin_id)?),

        Commands::CleanupRun => print_json(&commands::cleanup_run(ctx).await?),

        Commands::CleanupStatus => print_json(&commands::cleanup_status(ctx)?),

        Commands::Reconcile {
            user_email,
            wallet_address,
        } => {
            let account = CustodyAccount::new(user_email, wallet_address);
            print_json(&commands::reconcile_account(ctx, &account).await?)
        }

        Commands::Serve => {
            ctx.cleanup.start();
            let sweeper = custos_sessions::spawn_sweeper(
                ctx.sessions.clone(),
                std::time::Duration::from_secs(60),
            );

            info!("Custos running; press Ctrl-C to stop");
            tokio::signal::ctrl_c().await?;

            ctx.cleanup.stop();
            sweeper.abort();
            info!("Shut down cleanly");
            Ok(())
        }
    }
}
