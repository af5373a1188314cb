//! Tracing initialization

use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Install the global tracing subscriber. Safe to call more than once; later
/// calls are ignored.
pub fn init_logging() {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(true)
        .finish();

    // A second initialization (e.g. across tests) is not an error
    let _ = tracing::subscriber::set_global_default(subscriber);
}
