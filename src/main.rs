use anyhow::Result;
use safe_shortener::{config, server};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let config = config::load_from_env()?;
    init_tracing(&config.log_level, &config.log_format);
    config.print_summary();

    server::run(config).await
}

/// Installs the global subscriber; `level` takes `RUST_LOG` directive syntax.
fn init_tracing(level: &str, format: &str) {
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));

    let subscriber_builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    if format == "json" {
        subscriber_builder.json().init();
    } else {
        subscriber_builder.init();
    }
}
