//! Trailhead - Trail Hiking Backend Core
//!
//! Bootstrap entry point: initializes logging, loads configuration, opens
//! the database (running any pending migrations) and installs the built-in
//! achievement catalog.

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use trailhead::achievements::install_default_achievements;
use trailhead::storage::{config, Database};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Trailhead v{}", env!("CARGO_PKG_VERSION"));

    let config = config::load_config().context("Failed to load configuration")?;
    let db_path = config.database_path();

    let db = Database::open(&db_path)
        .with_context(|| format!("Failed to open database at {}", db_path.display()))?;
    tracing::info!("Database ready at {}", db_path.display());

    let installed = install_default_achievements(db.connection())
        .context("Failed to install achievement catalog")?;
    if installed > 0 {
        tracing::info!("Added {} achievement definitions", installed);
    }

    let (paths, users, journeys): (i64, i64, i64) = {
        let conn = db.connection();
        (
            conn.query_row("SELECT COUNT(*) FROM paths", [], |r| r.get(0))?,
            conn.query_row("SELECT COUNT(*) FROM users", [], |r| r.get(0))?,
            conn.query_row("SELECT COUNT(*) FROM journeys", [], |r| r.get(0))?,
        )
    };
    tracing::info!(paths, users, journeys, "Store initialized");

    Ok(())
}
