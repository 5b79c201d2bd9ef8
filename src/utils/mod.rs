pub mod build_info;

use std::sync::Once;

static TRACING_INIT: Once = Once::new();

const DEFAULT_DIRECTIVE: &str = "ledger_tree=info";

/// Initializes the global tracing subscriber, logging to stderr.
///
/// `RUST_LOG` directives are honoured; `ledger_tree=info` is added when the
/// environment does not mention the crate.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, EnvFilter};

        let mut filter = EnvFilter::from_default_env();
        let mentions_crate = std::env::var("RUST_LOG")
            .map(|value| value.contains("ledger_tree"))
            .unwrap_or(false);
        if !mentions_crate {
            if let Ok(directive) = DEFAULT_DIRECTIVE.parse() {
                filter = filter.add_directive(directive);
            }
        }

        let _ = fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init();
    });
}
