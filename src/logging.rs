//! Tracing subscriber setup
//!
//! Logs go to stderr so stdout stays free for CSV output. The filter is read
//! from `RUST_LOG` and defaults to `info`.

use tracing_subscriber::EnvFilter;

/// Install the global subscriber
///
/// Safe to call more than once; only the first call takes effect.
pub fn init(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_thread_names(true);

    let _ = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
}
