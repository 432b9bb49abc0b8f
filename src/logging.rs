/// Initializes tracing for the interpreter binary.
/// The level comes from RUST_LOG (e.g. RUST_LOG=kusmala=debug); nothing is
/// logged when it is unset.
pub fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();
}

/// Initializes tracing for tests: once per process, everything at trace
/// level, routed through the test writer so it is captured.
#[cfg(test)]
pub fn init_test_logging() {
    static TRACING_INIT: std::sync::Once = std::sync::Once::new();
    TRACING_INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter("trace")
            .with_test_writer()
            .try_init()
            .ok();
    });
}
