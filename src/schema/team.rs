use chrono::NaiveDateTime;
use serde::Serialize;
use sqlx::FromRow;

use crate::{
  database::{Connection, ErrorExt, Result},
  types::id::{marker::TeamMarker, Id},
};

#[derive(Debug, Clone, FromRow, Serialize, PartialEq, Eq)]
pub struct Team {
  pub id: Id<TeamMarker>,
  pub created_at: NaiveDateTime,
  pub updated_at: Option<NaiveDateTime>,
  pub name: String,
  pub description: Option<String>,
}

impl Team {
  #[tracing::instrument(skip(conn))]
  pub async fn by_id(conn: &mut Connection, id: Id<TeamMarker>) -> Result<Option<Self>> {
    sqlx::query_as::<_, Self>(r#"SELECT * FROM "teams" WHERE id = $1"#)
      .bind(id)
      .fetch_optional(conn)
      .await
      .into_db_error()
  }

  #[tracing::instrument(skip(conn))]
  pub async fn by_name(conn: &mut Connection, name: &str) -> Result<Option<Self>> {
    sqlx::query_as::<_, Self>(r#"SELECT * FROM "teams" WHERE name = $1"#)
      .bind(name)
      .fetch_optional(conn)
      .await
      .into_db_error()
  }

  #[tracing::instrument(skip(conn))]
  pub async fn list(conn: &mut Connection) -> Result<Vec<Self>> {
    sqlx::query_as::<_, Self>(r#"SELECT * FROM "teams" ORDER BY name ASC"#)
      .fetch_all(conn)
      .await
      .into_db_error()
  }

  #[tracing::instrument(skip(conn))]
  pub async fn insert(
    conn: &mut Connection,
    name: &str,
    description: Option<&str>,
  ) -> Result<Self> {
    sqlx::query_as::<_, Self>(
      r#"INSERT INTO "teams" (name, description)
         VALUES ($1, $2)
         RETURNING *"#,
    )
    .bind(name)
    .bind(description)
    .fetch_one(conn)
    .await
    .into_db_error()
  }

  #[tracing::instrument(skip(conn))]
  pub async fn update(
    conn: &mut Connection,
    id: Id<TeamMarker>,
    name: Option<&str>,
    description: Option<Option<&str>>,
  ) -> Result<Option<Self>> {
    let mut query = sqlx::QueryBuilder::new(r#"UPDATE "teams" SET updated_at = now()"#);
    if let Some(name) = name {
      query.push(", name = ");
      query.push_bind(name);
    }
    if let Some(description) = description {
      query.push(", description = ");
      query.push_bind(description);
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

  /// Deletes the team. Members are kept; their `team_id` becomes NULL
  /// through the foreign key rule.
  #[tracing::instrument(skip(conn))]
  pub async fn delete(conn: &mut Connection, id: Id<TeamMarker>) -> Result<bool> {
    let result = sqlx::query(r#"DELETE FROM "teams" WHERE id = $1"#)
      .bind(id)
      .execute(conn)
      .await
      .into_db_error()?;

    Ok(result.rows_affected() > 0)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::schema::{InsertUser, User};
  use crate::types::Role;

  #[tokio::test]
  #[ignore = "requires DATABASE_URL pointing at a migrated Postgres database"]
  async fn deleting_a_team_keeps_its_members() {
    const EMAIL: &str = "team-delete-test@pausa.test";

    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let pool = sqlx::PgPool::connect(&url).await.unwrap();
    let mut conn = pool.acquire().await.unwrap();

    sqlx::query(r#"DELETE FROM "users" WHERE email = $1"#)
      .bind(EMAIL)
      .execute(&mut *conn)
      .await
      .unwrap();
    sqlx::query(r#"DELETE FROM "teams" WHERE name = $1"#)
      .bind("team-delete-test")
      .execute(&mut *conn)
      .await
      .unwrap();

    let team = Team::insert(&mut conn, "team-delete-test", None).await.unwrap();
    let user = User::insert(
      &mut conn,
      InsertUser {
        name: "Orphaned",
        email: EMAIL,
        password_hash: "irrelevant",
        role: Role::Attendant,
        team_id: Some(team.id),
        active: true,
      },
    )
    .await
    .unwrap();

    assert!(Team::delete(&mut conn, team.id).await.unwrap());

    let reloaded = User::by_id(&mut conn, user.id).await.unwrap().unwrap();
    assert_eq!(None, reloaded.team_id);

    sqlx::query(r#"DELETE FROM "users" WHERE id = $1"#)
      .bind(user.id)
      .execute(&mut *conn)
      .await
      .unwrap();
  }
}
