use error_stack::Report;
use sqlx::migrate::Migrator;
use tokio::time::Instant;
use tracing::info;

use super::{Error, Result};
use crate::App;

static MIGRATOR: Migrator = sqlx::migrate!();

/// Applies every migration under `migrations/` that the database has
/// not seen yet. Ran by the binaries before the first request is
/// served; already-applied migrations are skipped.
#[tracing::instrument(skip_all, name = "migrations.run_pending")]
pub async fn run_pending(app: &App) -> Result<()> {
  let now = Instant::now();
  info!("Performing database migrations... (this may take a while)");

  let mut conn = app.primary_db.get().await?;
  MIGRATOR
    .run(&mut *conn)
    .await
    .map_err(|e| Report::new(Error::Migrate(e)))?;

  let elapsed = now.elapsed();
  info!("Successfully performed database migrations! took {elapsed:.2?}");

  Ok(())
}
