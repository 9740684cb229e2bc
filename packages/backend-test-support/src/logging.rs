//! One-time tracing setup for tests.
//!
//! Level precedence: `TEST_LOG`, then `RUST_LOG`, then quiet (`warn`, with
//! sqlx and sea-orm at `error` so migrations do not flood output).

use once_cell::sync::OnceCell;
use tracing_subscriber::{fmt, EnvFilter};

static INITIALIZED: OnceCell<()> = OnceCell::new();

const QUIET: &str = "warn,sqlx=error,sea_orm=error";

fn filter() -> EnvFilter {
    std::env::var("TEST_LOG")
        .or_else(|_| std::env::var("RUST_LOG"))
        .map(EnvFilter::new)
        .unwrap_or_else(|_| EnvFilter::new(QUIET))
}

/// Idempotent; safe to call from every test and from `#[ctor]` hooks.
pub fn init() {
    INITIALIZED.get_or_init(|| {
        fmt()
            .with_env_filter(filter())
            .with_test_writer()
            .without_time()
            .with_target(false)
            .try_init()
            .ok();
    });
}
