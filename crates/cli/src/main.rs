//! Forkful CLI - Database migrations, menu seeding, and operations.
//!
//! # Usage
//!
//! ```bash
//! # Run schema and session store migrations
//! forkful migrate
//!
//! # Load the menu from YAML, replacing what is there
//! forkful seed menu menu.yaml --replace
//!
//! # Move an order along
//! forkful orders advance 42 out_for_delivery
//!
//! # Goodwill credit of £5.00
//! forkful wallet credit customer@example.com 500
//! ```
//!
//! # Environment Variables
//!
//! - `FORKFUL_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

use forkful_core::OrderStatus;

mod commands;

#[derive(Parser)]
#[command(name = "forkful")]
#[command(author, version, about = "Forkful CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Load data from files
    Seed {
        #[command(subcommand)]
        target: SeedTarget,
    },
    /// Manage orders
    Orders {
        #[command(subcommand)]
        action: OrdersAction,
    },
    /// Manage customer wallets
    Wallet {
        #[command(subcommand)]
        action: WalletAction,
    },
}

#[derive(Subcommand)]
enum SeedTarget {
    /// Insert menu items from a YAML file
    Menu {
        /// Path to the YAML file
        file: String,

        /// Delete existing menu items first
        #[arg(long)]
        replace: bool,
    },
}

#[derive(Subcommand)]
enum OrdersAction {
    /// Set an order's status and notify the customer
    Advance {
        /// Order ID
        order_id: i32,

        /// New status (`confirmed`, `preparing`, `out_for_delivery`, `delivered`, `cancelled`)
        status: OrderStatus,
    },
}

#[derive(Subcommand)]
enum WalletAction {
    /// Credit a customer's wallet
    Credit {
        /// Customer email address
        email: String,

        /// Amount in pence
        amount: i64,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), commands::CliError> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Seed { target } => match target {
            SeedTarget::Menu { file, replace } => commands::seed::menu(&file, replace).await?,
        },
        Commands::Orders { action } => match action {
            OrdersAction::Advance { order_id, status } => {
                commands::orders::advance(order_id, status).await?;
            }
        },
        Commands::Wallet { action } => match action {
            WalletAction::Credit { email, amount } => {
                commands::wallet::credit(&email, amount).await?;
            }
        },
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parses_order_status() {
        let cli = Cli::try_parse_from(["forkful", "orders", "advance", "42", "out_for_delivery"]);
        assert!(matches!(
            cli.map(|c| c.command),
            Ok(Commands::Orders {
                action: OrdersAction::Advance {
                    order_id: 42,
                    status: OrderStatus::OutForDelivery,
                }
            })
        ));
    }

    #[test]
    fn test_rejects_unknown_status() {
        let cli = Cli::try_parse_from(["forkful", "orders", "advance", "42", "eaten"]);
        assert!(cli.is_err());
    }

    #[test]
    fn test_seed_replace_flag() {
        let cli = Cli::try_parse_from(["forkful", "seed", "menu", "menu.yaml", "--replace"]);
        assert!(matches!(
            cli.map(|c| c.command),
            Ok(Commands::Seed {
                target: SeedTarget::Menu { replace: true, .. }
            })
        ));
    }
}
