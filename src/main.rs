//! MyReads - headless session bootstrap
//!
//! Loads configuration, fetches the library and logs what is on each shelf.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use myreads::{config::AppConfig, App};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let config = AppConfig::load()?;

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("myreads={}", config.logging.level).into());

    let registry = tracing_subscriber::registry().with(filter);
    if config.logging.format == "json" {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    tracing::info!("Starting MyReads v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Books API at {}", config.api.url);

    let app = App::new(config).await?;
    tracing::info!("Theme: {}", app.theme().as_str());

    app.start().await;

    let library = app.library();
    if let Some(error) = &library.error {
        tracing::error!("Could not load the library: {}", error);
        anyhow::bail!("library unavailable: {}", error);
    }

    for (shelf, books) in app.shelves() {
        tracing::info!("{} ({})", shelf.display_name(), books.len());
        for book in books {
            match book.authors_line() {
                Some(authors) => tracing::info!("  {} by {}", book.title, authors),
                None => tracing::info!("  {}", book.title),
            }
        }
    }

    Ok(())
}
