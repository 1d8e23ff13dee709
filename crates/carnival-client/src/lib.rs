//! # carnival-client
//!
//! Planning-session core of the carnival planner: identity, entitlement,
//! active plan selection, live plan sync, list editors and checkout, tied
//! together by a single session task.

pub mod checkout;
pub mod config;
pub mod console;
pub mod demo;
pub mod directory;
pub mod editors;
pub mod entitlement;
pub mod error;
pub mod events;
pub mod identity;
pub mod paths;
pub mod selector;
pub mod session;
pub mod state;
pub mod sync;

pub use config::ClientConfig;
pub use error::{AuthError, CheckoutError, EditError, SessionError, SyncError};
pub use events::{SessionCommand, SessionNotification, UserAlert};
pub use session::{spawn_session, SessionContext, SessionHandle};
pub use state::SessionView;

use tracing_subscriber::{fmt, EnvFilter};

/// Install the global tracing subscriber. `RUST_LOG` overrides the default
/// filter. Output goes to stderr so it does not mix with console output.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("carnival_client=debug,carnival_store=info,warn"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}
