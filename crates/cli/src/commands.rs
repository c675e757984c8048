//! CLI commands

use anyhow::{Context, Result};
use clap::{Subcommand, ValueEnum};
use serde::Serialize;
use std::sync::Arc;
use stockroom_core::{FileSessionStore, Session, SessionStore, Settings, StateDir};
use stockroom_http::client::GatewayBuilder;
use stockroom_http::types::{LoginRequest, MovementKind, TransferRequest};
use stockroom_http::{ClientError, Gateway};
use tracing::{info, warn};

#[derive(Subcommand)]
pub enum Commands {
    /// Sign in and remember the session
    Login {
        #[arg(long)]
        email: String,

        #[arg(long, env = "STOCKROOM_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Sign out and forget the session
    Logout,

    /// Show the signed-in user
    Whoami,

    /// Product catalog
    Products {
        #[command(subcommand)]
        command: ProductCommands,
    },

    /// Batches (lots)
    Batches {
        #[command(subcommand)]
        command: BatchCommands,
    },

    /// Warehouses
    Warehouses {
        #[command(subcommand)]
        command: ListCommand,
    },

    /// Stock movements
    Movements {
        #[command(subcommand)]
        command: MovementCommands,
    },

    /// Dashboard users
    Users {
        #[command(subcommand)]
        command: ListCommand,
    },

    /// Roles
    Roles {
        #[command(subcommand)]
        command: ListCommand,
    },

    /// Settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
pub enum ProductCommands {
    /// List products
    List,
    /// Show one product
    Get { id: String },
}

#[derive(Subcommand)]
pub enum BatchCommands {
    /// List batches
    List {
        /// Only batches past their expiry date
        #[arg(long)]
        expired: bool,
    },
}

#[derive(Subcommand)]
pub enum ListCommand {
    /// List everything
    List,
}

#[derive(Subcommand)]
pub enum MovementCommands {
    /// List movements
    List {
        #[arg(long)]
        kind: Option<KindArg>,
    },

    /// Move stock between warehouses
    Transfer {
        #[arg(long)]
        product: String,
        #[arg(long)]
        from: String,
        #[arg(long)]
        to: String,
        #[arg(long)]
        quantity: f64,
        #[arg(long)]
        batch: Option<String>,
        #[arg(long)]
        note: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print the effective settings
    Show,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum KindArg {
    In,
    Out,
    Transfer,
    Adjustment,
}

impl From<KindArg> for MovementKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::In => Self::In,
            KindArg::Out => Self::Out,
            KindArg::Transfer => Self::Transfer,
            KindArg::Adjustment => Self::Adjustment,
        }
    }
}

impl Commands {
    pub async fn execute(self, settings: &Settings, state_dir: &StateDir) -> Result<()> {
        let store: Arc<dyn SessionStore> =
            Arc::new(FileSessionStore::new(state_dir.session_path()));

        let gateway = build_gateway(settings, Arc::clone(&store))?;

        match self {
            Self::Login { email, password } => {
                let session = gateway
                    .login(&LoginRequest { email, password })
                    .await
                    .map_err(describe)?;
                let session = Session {
                    cookies: gateway.saved_cookies(),
                    ..session
                };
                store.save(&session)?;
                info!(user = %session.user_id, "Signed in");
                println!("Signed in as {} <{}>", session.name, session.email);
            }
            Self::Logout => {
                if let Err(e) = gateway.logout().await {
                    warn!("Server side logout failed: {e}");
                }
                store.clear()?;
                println!("Signed out");
            }
            Self::Whoami => {
                let local = store.load()?;
                if local
                    .as_ref()
                    .is_some_and(|s| s.is_expired(chrono::Utc::now()))
                {
                    store.clear()?;
                    anyhow::bail!("Session expired, run `stockroom login` again");
                }
                let session = gateway.me().await.map_err(describe)?;
                print_json(&session)?;
            }
            Self::Products { command } => match command {
                ProductCommands::List => {
                    print_json(&gateway.products().list().await.map_err(describe)?)?;
                }
                ProductCommands::Get { id } => {
                    print_json(&gateway.products().get(&id).await.map_err(describe)?)?;
                }
            },
            Self::Batches {
                command: BatchCommands::List { expired },
            } => {
                let mut batches = gateway.batches().list().await.map_err(describe)?;
                if expired {
                    let today = chrono::Local::now().date_naive();
                    batches.retain(|b| b.is_expired(today));
                }
                print_json(&batches)?;
            }
            Self::Warehouses {
                command: ListCommand::List,
            } => print_json(&gateway.warehouses().list().await.map_err(describe)?)?,
            Self::Movements { command } => match command {
                MovementCommands::List { kind: None } => {
                    print_json(&gateway.movements().list().await.map_err(describe)?)?;
                }
                MovementCommands::List { kind: Some(kind) } => print_json(
                    &gateway
                        .movements()
                        .list_kind(kind.into())
                        .await
                        .map_err(describe)?,
                )?,
                MovementCommands::Transfer {
                    product,
                    from,
                    to,
                    quantity,
                    batch,
                    note,
                } => {
                    if from == to {
                        anyhow::bail!("Source and destination warehouse are the same");
                    }
                    let movement = gateway
                        .movements()
                        .transfer(&TransferRequest {
                            product_id: product,
                            batch_id: batch,
                            from_warehouse_id: from,
                            to_warehouse_id: to,
                            quantity,
                            note,
                        })
                        .await
                        .map_err(describe)?;
                    print_json(&movement)?;
                }
            },
            Self::Users {
                command: ListCommand::List,
            } => print_json(&gateway.users().list().await.map_err(describe)?)?,
            Self::Roles {
                command: ListCommand::List,
            } => print_json(&gateway.roles().list().await.map_err(describe)?)?,
            Self::Config {
                command: ConfigCommands::Show,
            } => print_json(settings)?,
        }

        remember_cookies(&gateway, store.as_ref())
    }
}

/// Keep the stored session in step with cookies the API rotated during the command
fn remember_cookies(gateway: &Gateway, store: &dyn SessionStore) -> Result<()> {
    if let Some(session) = store.load()? {
        let cookies = gateway.saved_cookies();
        if cookies != session.cookies {
            store.save(&Session { cookies, ..session })?;
        }
    }
    Ok(())
}

/// Gateway carrying the stored session's cookies; its session-expired hook forgets the session
fn build_gateway(settings: &Settings, store: Arc<dyn SessionStore>) -> Result<Gateway> {
    let cookies = store
        .load()?
        .map(|session| session.cookies)
        .unwrap_or_default();

    GatewayBuilder::from_settings(&settings.api)
        .cookies(cookies)
        .on_session_expired(move |login_route| {
            warn!(login_route, "Session expired, clearing stored session");
            if let Err(e) = store.clear() {
                warn!("Failed to clear stored session: {e}");
            }
        })
        .build()
        .context("Failed to build API client")
}

/// Turn gateway errors into messages for the terminal
fn describe(error: ClientError) -> anyhow::Error {
    match error {
        ClientError::SessionExpired => {
            anyhow::anyhow!("Session expired, run `stockroom login` again")
        }
        ClientError::Http { status, message } => anyhow::anyhow!("{message} (HTTP {status})"),
        other => anyhow::Error::new(other),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
