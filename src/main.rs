/// Triple Fun persistence server
///
/// Serves translations and site data on one port and image uploads on
/// another, storing everything as files under the public directory.

use anyhow::Context;
use std::env;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use triple_fun_api::{server, AppContext, ServerConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env before the filter reads RUST_LOG
    dotenv::dotenv().ok();

    // Initialize logging
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "triple_fun_api=debug,tower_http=debug".into());
    let json_logs = env::var("TRIPLE_FUN_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    // Print banner
    print_banner();

    // Load configuration
    let config = ServerConfig::from_env().context("failed to load configuration")?;

    // Create application context
    let ctx = AppContext::new(config)
        .await
        .context("failed to initialise storage")?;

    // Start servers
    server::serve(ctx).await.context("server terminated")?;

    Ok(())
}

fn print_banner() {
    println!(
        r#"
  _____     _       _        _____
 |_   _| __(_)_ __ | | ___  |  ___|   _ _ __
   | || '__| | '_ \| |/ _ \ | |_ | | | | '_ \
   | || |  | | |_) | |  __/ |  _|| |_| | | | |
   |_||_|  |_| .__/|_|\___| |_|   \__,_|_| |_|
             |_|
        Translation & Upload Server v{}
        "#,
        env!("CARGO_PKG_VERSION")
    );
}
