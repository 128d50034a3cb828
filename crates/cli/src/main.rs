//! Mercado CLI - browse the catalog, manage your cart and products.
//!
//! # Usage
//!
//! ```bash
//! # Sign in (token and email are kept in the session file)
//! mercado login -e ana@example.com -p secreto
//!
//! # Browse and buy
//! mercado products list
//! mercado cart add 3 --quantity 2
//! mercado cart checkout
//!
//! # Manage the catalog
//! mercado products create --name Shirt --price 10 --image-url u --stock 5 --description d
//! mercado products delete 3 --yes
//! ```
//!
//! # Environment Variables
//!
//! - `MERCADO_API_URL`, `MERCADO_CART_SERVICE_URL`, `MERCADO_SESSION_FILE` -
//!   see `mercado_client::config`
//! - `SENTRY_DSN` - Report failed commands to Sentry (optional)
//! - `SENTRY_ENVIRONMENT` - Sentry environment name (optional)
//! - `RUST_LOG` - Log filter (default: `mercado_client=info,mercado_cli=info`)

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::io::{self, Write};

use clap::{Parser, Subcommand};
use mercado_client::validation::RegistrationForm;
use mercado_client::{ClientConfig, Storefront};
use mercado_core::{Price, ProductId};
use secrecy::SecretString;
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod render;

use commands::CliError;
use commands::products::ProductFields;
use commands::profile::ProfileEdit;

#[derive(Parser)]
#[command(name = "mercado")]
#[command(author, version, about = "Mercado storefront CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in and remember the session
    Login {
        #[arg(short, long)]
        email: String,

        #[arg(short, long)]
        password: String,
    },
    /// Create an account
    Register {
        #[arg(long)]
        first_name: String,

        #[arg(long)]
        last_name: String,

        #[arg(short, long)]
        email: String,

        /// At least 6 characters
        #[arg(short, long)]
        password: String,

        #[arg(long)]
        address: String,

        /// `YYYY-MM-DD`
        #[arg(long)]
        birth_date: String,
    },
    /// Forget the stored session
    Logout,
    /// Show the signed-in user
    Whoami,
    /// Edit your profile
    Profile {
        #[command(subcommand)]
        action: ProfileAction,
    },
    /// Browse and manage products
    Products {
        #[command(subcommand)]
        action: ProductsAction,
    },
    /// Manage your cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// List your orders
    Orders,
}

#[derive(Subcommand)]
enum ProfileAction {
    /// Change name or address (you will be logged out afterwards)
    Update {
        #[arg(long)]
        first_name: Option<String>,

        #[arg(long)]
        last_name: Option<String>,

        #[arg(long)]
        address: Option<String>,
    },
}

#[derive(clap::Args)]
struct ProductArgs {
    #[arg(long)]
    name: Option<String>,

    /// Unit price, e.g. `19.99`
    #[arg(long)]
    price: Option<Price>,

    #[arg(long)]
    image_url: Option<String>,

    #[arg(long)]
    stock: Option<i32>,

    #[arg(long)]
    description: Option<String>,
}

impl From<ProductArgs> for ProductFields {
    fn from(args: ProductArgs) -> Self {
        Self {
            name: args.name,
            price: args.price,
            image_url: args.image_url,
            stock: args.stock,
            description: args.description,
        }
    }
}

#[derive(Subcommand)]
enum ProductsAction {
    /// List every product
    List,
    /// Show one product
    Show { id: ProductId },
    /// Create a product
    Create {
        #[command(flatten)]
        fields: ProductArgs,
    },
    /// Update a product; omitted fields keep their current values
    Update {
        id: ProductId,

        #[command(flatten)]
        fields: ProductArgs,
    },
    /// Delete a product
    Delete {
        id: ProductId,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
enum CartAction {
    /// Show the cart, its total and whether checkout is possible
    Show,
    /// Add a product
    Add {
        product_id: ProductId,

        #[arg(short, long, default_value_t = 1)]
        quantity: i32,
    },
    /// Remove a product
    Remove { product_id: ProductId },
    /// Set a product's quantity (0 removes it)
    Set {
        product_id: ProductId,

        #[arg(allow_negative_numbers = true)]
        quantity: i32,
    },
    /// Place an order for the cart
    Checkout,
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry() -> Option<sentry::ClientInitGuard> {
    let dsn = std::env::var("SENTRY_DSN")
        .ok()
        .filter(|v| !v.trim().is_empty())?;

    let guard = sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: std::env::var("SENTRY_ENVIRONMENT")
                .ok()
                .map(std::borrow::Cow::Owned),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::debug!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Loads .env too, so it must run before Sentry reads its variables
    let config = match ClientConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            let _ = writeln!(io::stderr(), "error: {e}");
            std::process::exit(1);
        }
    };

    let _sentry_guard = init_sentry();

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "mercado_client=info,mercado_cli=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    if let Err(e) = run(cli, config).await {
        tracing::debug!(error = ?e, "Command failed");
        if !matches!(e, CliError::NotLoggedIn | CliError::AccessDenied) {
            sentry::capture_error(&e);
        }
        let _ = writeln!(io::stderr(), "error: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli, config: ClientConfig) -> Result<(), CliError> {
    let mut storefront = Storefront::new(config)?;
    let mut out = io::stdout().lock();

    match cli.command {
        Commands::Login { email, password } => {
            let password = SecretString::from(password);
            commands::auth::login(&mut storefront, &mut out, &email, &password).await?;
        }
        Commands::Register {
            first_name,
            last_name,
            email,
            password,
            address,
            birth_date,
        } => {
            let form = RegistrationForm {
                first_name,
                last_name,
                email,
                password: SecretString::from(password),
                address,
                birth_date,
            };
            commands::auth::register(&mut storefront, &mut out, &form).await?;
        }
        Commands::Logout => commands::auth::logout(&mut storefront, &mut out)?,
        Commands::Whoami => commands::auth::whoami(&mut storefront, &mut out).await?,
        Commands::Profile { action } => match action {
            ProfileAction::Update {
                first_name,
                last_name,
                address,
            } => {
                let edit = ProfileEdit {
                    first_name,
                    last_name,
                    address,
                };
                commands::profile::update(&mut storefront, &mut out, edit).await?;
            }
        },
        Commands::Products { action } => match action {
            ProductsAction::List => commands::products::list(&mut storefront, &mut out).await?,
            ProductsAction::Show { id } => {
                commands::products::show(&mut storefront, &mut out, id).await?;
            }
            ProductsAction::Create { fields } => {
                commands::products::create(&mut storefront, &mut out, fields.into()).await?;
            }
            ProductsAction::Update { id, fields } => {
                commands::products::update(&mut storefront, &mut out, id, fields.into()).await?;
            }
            ProductsAction::Delete { id, yes } => {
                commands::products::delete(&mut storefront, &mut out, id, yes).await?;
            }
        },
        Commands::Cart { action } => match action {
            CartAction::Show => commands::cart::show(&mut storefront, &mut out).await?,
            CartAction::Add {
                product_id,
                quantity,
            } => {
                commands::cart::add(&mut storefront, &mut out, product_id, quantity).await?;
            }
            CartAction::Remove { product_id } => {
                commands::cart::remove(&mut storefront, &mut out, product_id).await?;
            }
            CartAction::Set {
                product_id,
                quantity,
            } => {
                commands::cart::set(&mut storefront, &mut out, product_id, quantity).await?;
            }
            CartAction::Checkout => commands::cart::checkout(&mut storefront, &mut out).await?,
        },
        Commands::Orders => commands::cart::orders(&mut storefront, &mut out).await?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_cart_set_accepts_zero_and_negative() {
        let cli = Cli::try_parse_from(["mercado", "cart", "set", "3", "-1"]);
        assert!(matches!(
            cli.map(|c| c.command),
            Ok(Commands::Cart {
                action: CartAction::Set { quantity: -1, .. }
            })
        ));
    }
}
