use tracing_subscriber::EnvFilter;

/// Installs a test-writer subscriber once per test binary. Set `RUST_LOG` to see differ spans.
pub fn init() {
	let _ = tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).with_test_writer().try_init();
}
