use error_stack::Report;
use thiserror::Error;

/// Database related errors
#[derive(Debug, Error)]
pub enum Error {
  /// An error caused by an invalid Postgres connection
  /// url for either the primary or the replica pool.
  #[error("invalid connection url")]
  InvalidUrl,
  /// An error caused by an [`sqlx`] error.
  #[error("received a pool error: {0}")]
  Internal(sqlx::Error),
  /// The database pool (primary) is currently in read mode
  /// (most likely due to maintenance) and should not perform
  /// any writes.
  #[error("database is currently in read mode")]
  Readonly,
  /// Either the primary or replica database pools do not
  /// have reliable connection to transact to the database.
  #[error("unhealthy database pool")]
  UnhealthyPool,
  /// A unique constraint rejected the statement. The pause
  /// lifecycle leans on this for its one-running-pause guard,
  /// and the unique columns (emails, team and pause type names)
  /// surface it on racy duplicate inserts.
  #[error("unique constraint violation")]
  UniqueViolation,
  /// A foreign key constraint rejected the statement, e.g.
  /// deleting a pause type that existing records reference.
  #[error("foreign key constraint violation")]
  ForeignKeyViolation,
  /// Failed to run pending database migrations.
  #[error("migration error: {0}")]
  Migrate(sqlx::migrate::MigrateError),
}

/// Converts from a generic [sqlx] result into a [database compatible error](Error).
pub trait ErrorExt<T> {
  fn into_db_error(self) -> Result<T>;
}

impl<T> ErrorExt<T> for std::result::Result<T, sqlx::Error> {
  fn into_db_error(self) -> Result<T> {
    self.map_err(|e| match &e {
      sqlx::Error::Database(err) if err.message().ends_with("read-only transaction") => {
        Report::new(e).change_context(Error::Readonly)
      }
      sqlx::Error::Database(err)
        if matches!(err.kind(), sqlx::error::ErrorKind::UniqueViolation) =>
      {
        Report::new(e).change_context(Error::UniqueViolation)
      }
      sqlx::Error::Database(err)
        if matches!(err.kind(), sqlx::error::ErrorKind::ForeignKeyViolation) =>
      {
        Report::new(e).change_context(Error::ForeignKeyViolation)
      }
      _ => Report::new(Error::Internal(e)),
    })
  }
}

/// Lazily typed [`std::result::Result`] but the error generic
/// is filled up with [a database error](Error).
pub type Result<T> = error_stack::Result<T, Error>;

/// This trait deals with `error_stack::Report<Error>` because it is
/// annoying to dig through a report every time a caller only wants
/// to know which kind of database failure it is looking at.
pub trait ErrorExt2 {
  fn is_unhealthy(&self) -> bool;
  fn is_readonly(&self) -> bool;
  fn is_unique_violation(&self) -> bool;
  fn is_foreign_key_violation(&self) -> bool;
}

impl ErrorExt2 for error_stack::Report<Error> {
  fn is_unhealthy(&self) -> bool {
    self
      .downcast_ref::<Error>()
      .map(|v| matches!(v, Error::UnhealthyPool))
      .unwrap_or_default()
  }

  fn is_readonly(&self) -> bool {
    self
      .downcast_ref::<Error>()
      .map(|v| matches!(v, Error::Readonly))
      .unwrap_or_default()
  }

  fn is_unique_violation(&self) -> bool {
    self
      .downcast_ref::<Error>()
      .map(|v| matches!(v, Error::UniqueViolation))
      .unwrap_or_default()
  }

  fn is_foreign_key_violation(&self) -> bool {
    self
      .downcast_ref::<Error>()
      .map(|v| matches!(v, Error::ForeignKeyViolation))
      .unwrap_or_default()
  }
}
