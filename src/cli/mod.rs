//! # CLI Module
//!
//! Operator commands for the homebase backend. They share one
//! [`AppState`](crate::api::AppState) with
//! the HTTP layer, so a token connected from the terminal is the same record the
//! website reads.
//!
//! ## Commands
//!
//! - [`serve`] - runs the HTTP API
//! - [`connect`] - opens the provider's consent page and waits for the callback
//! - [`status`] - prints a table of every integration's token state
//! - [`refresh`] - refreshes a token now, regardless of its expiry
//! - [`disconnect`] - forgets the stored token pair
//!
//! ## Usage
//!
//! ```bash
//! homebase connect spotify        # authorize the music integration
//! homebase status                 # check both integrations
//! homebase refresh strava         # rotate the fitness token now
//! homebase --user guest status    # act for another account
//! ```
//!
//! Failures print with the `error!` macro and exit with status 1.

mod connect;
mod serve;
mod tokens;

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

pub use connect::connect;
pub use serve::serve;
pub use tokens::{disconnect, refresh, status};

fn spinner(message: String) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(100));
    if let Ok(style) = ProgressStyle::with_template("{spinner:.blue} {msg}") {
        pb.set_style(style.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"));
    }
    pb
}
