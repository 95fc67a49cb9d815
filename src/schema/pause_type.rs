use chrono::NaiveDateTime;
use serde::Serialize;
use sqlx::FromRow;

use crate::{
  database::{Connection, ErrorExt, Result},
  types::id::{marker::PauseTypeMarker, Id},
};

/// Catalog entry describing one category of pause and, optionally,
/// how long a single pause of that category may last.
#[derive(Debug, Clone, FromRow, Serialize, PartialEq, Eq)]
pub struct PauseType {
  pub id: Id<PauseTypeMarker>,
  pub created_at: NaiveDateTime,
  pub updated_at: Option<NaiveDateTime>,
  pub name: String,
  pub description: Option<String>,
  pub max_duration_mins: Option<i32>,
  pub active: bool,
}

/// Partial update for a pause type. The doubled options distinguish
/// "leave as is" (outer `None`) from "set to NULL" (`Some(None)`).
#[derive(Debug, Default)]
pub struct UpdatePauseType<'a> {
  pub name: Option<&'a str>,
  pub description: Option<Option<&'a str>>,
  pub max_duration_mins: Option<Option<i32>>,
  pub active: Option<bool>,
}

impl PauseType {
  #[tracing::instrument(skip(conn))]
  pub async fn by_id(conn: &mut Connection, id: Id<PauseTypeMarker>) -> Result<Option<Self>> {
    sqlx::query_as::<_, Self>(r#"SELECT * FROM "pause_types" WHERE id = $1"#)
      .bind(id)
      .fetch_optional(conn)
      .await
      .into_db_error()
  }

  #[tracing::instrument(skip(conn))]
  pub async fn by_name(conn: &mut Connection, name: &str) -> Result<Option<Self>> {
    sqlx::query_as::<_, Self>(r#"SELECT * FROM "pause_types" WHERE name = $1"#)
      .bind(name)
      .fetch_optional(conn)
      .await
      .into_db_error()
  }

  /// Types an attendant may actually start a pause with.
  #[tracing::instrument(skip(conn))]
  pub async fn list_active(conn: &mut Connection) -> Result<Vec<Self>> {
    sqlx::query_as::<_, Self>(r#"SELECT * FROM "pause_types" WHERE active ORDER BY name ASC"#)
      .fetch_all(conn)
      .await
      .into_db_error()
  }

  /// Full catalog, including deactivated types. Admin surface only.
  #[tracing::instrument(skip(conn))]
  pub async fn list_all(conn: &mut Connection) -> Result<Vec<Self>> {
    sqlx::query_as::<_, Self>(r#"SELECT * FROM "pause_types" ORDER BY name ASC"#)
      .fetch_all(conn)
      .await
      .into_db_error()
  }

  #[tracing::instrument(skip(conn))]
  pub async fn insert(
    conn: &mut Connection,
    name: &str,
    description: Option<&str>,
    max_duration_mins: Option<i32>,
  ) -> Result<Self> {
    sqlx::query_as::<_, Self>(
      r#"INSERT INTO "pause_types" (name, description, max_duration_mins, active)
         VALUES ($1, $2, $3, true)
         RETURNING *"#,
    )
    .bind(name)
    .bind(description)
    .bind(max_duration_mins)
    .fetch_one(conn)
    .await
    .into_db_error()
  }

  #[tracing::instrument(skip(conn, update))]
  pub async fn update(
    conn: &mut Connection,
    id: Id<PauseTypeMarker>,
    update: UpdatePauseType<'_>,
  ) -> Result<Option<Self>> {
    let mut query = sqlx::QueryBuilder::new(r#"UPDATE "pause_types" SET updated_at = now()"#);
    if let Some(name) = update.name {
      query.push(", name = ");
      query.push_bind(name);
    }
    if let Some(description) = update.description {
      query.push(", description = ");
      query.push_bind(description);
    }
    if let Some(max_duration_mins) = update.max_duration_mins {
      query.push(", max_duration_mins = ");
      query.push_bind(max_duration_mins);
    }
    if let Some(active) = update.active {
      query.push(", active = ");
      query.push_bind(active);
    }
    query.push(" WHERE id = ");
    query.push_bind(id);
    query.push(" RETURNING *");

    query
      .build_query_as::<Self>()
      .fetch_optional(conn)
      .await
      .into_db_error()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::database::ErrorExt2;
  use crate::schema::{InsertUser, PauseRecord, User};
  use crate::types::Role;

  #[tokio::test]
  #[ignore = "requires DATABASE_URL pointing at a migrated Postgres database"]
  async fn referenced_types_cannot_be_deleted() {
    const EMAIL: &str = "type-restrict-test@pausa.test";

    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let pool = sqlx::PgPool::connect(&url).await.unwrap();
    let mut conn = pool.acquire().await.unwrap();

    sqlx::query(r#"DELETE FROM "users" WHERE email = $1"#)
      .bind(EMAIL)
      .execute(&mut *conn)
      .await
      .unwrap();

    let ptype = match PauseType::by_name(&mut conn, "type-restrict-test").await.unwrap() {
      Some(existing) => existing,
      None => PauseType::insert(&mut conn, "type-restrict-test", None, Some(10))
        .await
        .unwrap(),
    };

    let user = User::insert(
      &mut conn,
      InsertUser {
        name: "Referencer",
        email: EMAIL,
        password_hash: "irrelevant",
        role: Role::Attendant,
        team_id: None,
        active: true,
      },
    )
    .await
    .unwrap();

    let now = chrono::Utc::now().naive_utc();
    PauseRecord::start(&mut conn, user.id, ptype.id, now, None)
      .await
      .unwrap();

    let error = sqlx::query(r#"DELETE FROM "pause_types" WHERE id = $1"#)
      .bind(ptype.id)
      .execute(&mut *conn)
      .await
      .into_db_error()
      .unwrap_err();
    assert!(error.is_foreign_key_violation());

    // cascades the pause record away, which unblocks the type
    sqlx::query(r#"DELETE FROM "users" WHERE id = $1"#)
      .bind(user.id)
      .execute(&mut *conn)
      .await
      .unwrap();
    sqlx::query(r#"DELETE FROM "pause_types" WHERE id = $1"#)
      .bind(ptype.id)
      .execute(&mut *conn)
      .await
      .unwrap();
  }
}
