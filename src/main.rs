use tracing_subscriber::{EnvFilter, fmt};
use tracing::info;

use tenderguard::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Init logging
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))?;
    fmt().with_env_filter(filter).init();

    let config = Config::from_env();
    let rust_log = std::env::var("RUST_LOG").unwrap_or_else(|_| "<unset>".to_string());
    info!(
        target: "startup",
        "tenderguard starting: RUST_LOG='{}', http_port={}, users_file={:?}, allow_plaintext={}, session_ttl_secs={}",
        rust_log, config.http_port, config.users_file, config.allow_plaintext_passwords, config.session_ttl_secs
    );

    tenderguard::server::run(config).await
}
