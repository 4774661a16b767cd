//! Test helpers for `resource-harness` integration tests.

pub mod assertable;
pub mod error;
mod harness;
pub mod prelude;
mod seeded_data;

pub use assert_matches::assert_matches;
pub use harness::*;
pub use seeded_data::*;


/// Installs an `env_logger` logger that writes through the test output capture.
///
/// Safe to call from every test: only the first call installs the logger.
/// Set `RUST_LOG=resource_harness=debug` to see traversal steps.
pub fn init_test_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}
