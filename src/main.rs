//! `taskw-sandbox` entry point

fn main() {
    // Initialize structured logging with env-based filter
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .try_init();

    let code = {
        // Sandboxes still alive when the command returns are removed here.
        let _teardown = taskw_fixture::teardown::install();
        taskw_fixture::cli::run()
    };
    std::process::exit(code);
}
