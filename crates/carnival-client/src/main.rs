//! # carnival-planner
//!
//! Console driver for a planning session against an in-process store.
//! Pass a post-checkout location (e.g. `/checkout-success?session_id=cs_1`)
//! as the first argument to simulate landing back from checkout.

use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use carnival_client::checkout::{CheckoutInitiator, HttpCheckoutCallable, LogNavigator};
use carnival_client::console::{self, ConsoleInput};
use carnival_client::identity::{IdentitySession, LocalIdentityProvider};
use carnival_client::paths::AppPaths;
use carnival_client::{demo, spawn_session, ClientConfig, SessionContext};
use carnival_shared::constants::APP_NAME;
use carnival_shared::routes::CheckoutRoute;
use carnival_shared::{FestivalId, UserId};
use carnival_store::MemoryStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // -----------------------------------------------------------------------
    // 1. Tracing and configuration
    // -----------------------------------------------------------------------
    carnival_client::init_tracing();
    info!("Starting {} v{}", APP_NAME, env!("CARGO_PKG_VERSION"));

    let config = Arc::new(ClientConfig::from_env());
    info!(?config, "Loaded configuration");

    match std::env::args().nth(1).as_deref().and_then(CheckoutRoute::from_location) {
        Some(CheckoutRoute::Success { session_id }) => {
            println!("Thanks for upgrading! Premium unlocks once payment is confirmed.");
            info!(?session_id, "Returned from checkout");
        }
        Some(CheckoutRoute::Cancelled) => println!("Checkout cancelled. No charge was made."),
        None => {}
    }

    // -----------------------------------------------------------------------
    // 2. Collaborators
    // -----------------------------------------------------------------------
    let store = MemoryStore::new();
    let provider = if config.demo_mode {
        demo::seed(&store, &AppPaths::new(config.app_namespace.clone())).await?;
        LocalIdentityProvider::signed_in(demo::demo_user())
    } else {
        LocalIdentityProvider::new(UserId::new(format!("local-{}", uuid::Uuid::new_v4())))
    };

    let checkout = Arc::new(CheckoutInitiator::new(
        Arc::new(HttpCheckoutCallable::new(config.checkout_endpoint.clone())),
        Arc::new(LogNavigator),
        config.clone(),
    ));

    let mut session = spawn_session(SessionContext {
        identity: IdentitySession::new(Arc::new(provider)),
        store: Arc::new(store),
        checkout,
        config: config.clone(),
    });

    if config.demo_mode {
        session
            .send(carnival_client::SessionCommand::Select {
                festival: FestivalId::new(demo::DEMO_FESTIVAL),
            })
            .await?;
    }

    // -----------------------------------------------------------------------
    // 3. Console loop
    // -----------------------------------------------------------------------
    println!("{}", console::HELP);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            Some(notification) = session.next_notification() => {
                println!("{}", console::render_notification(&notification));
            }
            line = lines.next_line() => {
                let Some(line) = line? else {
                    break;
                };
                match console::parse_line(&line) {
                    Ok(ConsoleInput::Session(cmd)) => session.send(cmd).await?,
                    Ok(ConsoleInput::Show) => {
                        let view = session.inspect().await?;
                        println!("{}", console::render_view(&view));
                    }
                    Ok(ConsoleInput::Catalog) => println!("{}", console::render_catalog()),
                    Ok(ConsoleInput::Countdown) => {
                        let today = chrono::Local::now().date_naive();
                        println!("{}", console::render_countdown(today));
                    }
                    Ok(ConsoleInput::Help) => println!("{}", console::HELP),
                    Ok(ConsoleInput::Quit) => break,
                    Err(msg) if msg.is_empty() => {}
                    Err(msg) => println!("{msg}"),
                }
            }
            _ = tokio::signal::ctrl_c() => {
                warn!("Interrupted");
                break;
            }
        }
    }

    session.shutdown().await?;
    info!("Goodbye");
    Ok(())
}
