//! Test harness utilities.

use tracing_subscriber::EnvFilter;

/// Send log output from the bus crates to the test writer.
///
/// Safe to call from every test; only the first call installs a subscriber.
///
/// # Example
///
/// ```rust,ignore
/// use herald_test::init_test_logging;
///
/// #[test]
/// fn my_test() {
///     init_test_logging();
///     // ... test code
/// }
/// ```
pub fn init_test_logging() {
    init_test_logging_with("herald_bus=trace,herald_props=trace");
}

/// Like [`init_test_logging`] with a custom filter.
pub fn init_test_logging_with(filter: &str) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_test_writer()
        .try_init();
}
