use chrono::NaiveDateTime;
use serde::Serialize;
use sqlx::FromRow;

use crate::{
  database::{Connection, ErrorExt, Result},
  types::{
    self,
    id::{
      marker::{TeamMarker, UserMarker},
      Id,
    },
    Role,
  },
};

/// Full user row. Carries the password hash, so it never derives
/// [`Serialize`]; anything leaving the server goes through
/// [`UserView`] instead.
#[derive(Debug, Clone, FromRow, PartialEq, Eq)]
pub struct User {
  pub id: Id<UserMarker>,
  pub created_at: NaiveDateTime,
  pub updated_at: Option<NaiveDateTime>,
  pub name: String,
  pub email: String,
  pub password_hash: String,
  pub role: Role,
  pub active: bool,
  pub team_id: Option<Id<TeamMarker>>,
}

/// User projection for API responses: no password hash, team name
/// resolved.
#[derive(Debug, Clone, FromRow, Serialize, PartialEq, Eq)]
pub struct UserView {
  pub id: Id<UserMarker>,
  pub created_at: NaiveDateTime,
  pub updated_at: Option<NaiveDateTime>,
  pub name: String,
  pub email: String,
  pub role: Role,
  pub active: bool,
  pub team_id: Option<Id<TeamMarker>>,
  pub team_name: Option<String>,
}

#[derive(Debug)]
pub struct InsertUser<'a> {
  pub name: &'a str,
  pub email: &'a str,
  pub password_hash: &'a str,
  pub role: Role,
  pub team_id: Option<Id<TeamMarker>>,
  pub active: bool,
}

/// Partial update for a user. `team_id` doubles its option so that
/// "leave as is" (outer `None`) and "unassign" (`Some(None)`) stay
/// distinguishable.
#[derive(Debug, Default)]
pub struct UpdateUser<'a> {
  pub name: Option<&'a str>,
  pub email: Option<&'a str>,
  pub password_hash: Option<String>,
  pub role: Option<Role>,
  pub team_id: Option<Option<Id<TeamMarker>>>,
  pub active: Option<bool>,
}

const VIEW_SELECT: &str = r#"SELECT u.id, u.created_at, u.updated_at, u.name, u.email,
         u.role, u.active, u.team_id, t.name AS team_name
  FROM "users" u
  LEFT JOIN "teams" t ON t.id = u.team_id"#;

impl User {
  #[tracing::instrument(skip(conn, id), fields(id = "<hidden>"))]
  pub async fn by_id(conn: &mut Connection, id: Id<UserMarker>) -> Result<Option<Self>> {
    sqlx::query_as::<_, Self>(r#"SELECT * FROM "users" WHERE id = $1"#)
      .bind(id)
      .fetch_optional(conn)
      .await
      .into_db_error()
  }

  #[tracing::instrument(skip(conn, condition), fields(condition = "<hidden>"))]
  pub async fn by_email(conn: &mut Connection, condition: &str) -> Result<Option<Self>> {
    sqlx::query_as::<_, Self>(r#"SELECT * FROM "users" WHERE email = $1"#)
      .bind(condition)
      .fetch_optional(conn)
      .await
      .into_db_error()
  }

  #[tracing::instrument(skip(conn, insert))]
  pub async fn insert(conn: &mut Connection, insert: InsertUser<'_>) -> Result<Self> {
    sqlx::query_as::<_, Self>(
      r#"INSERT INTO "users" (name, email, password_hash, role, team_id, active)
         VALUES ($1, $2, $3, $4, $5, $6)
         RETURNING *"#,
    )
    .bind(insert.name)
    .bind(insert.email)
    .bind(insert.password_hash)
    .bind(insert.role)
    .bind(insert.team_id)
    .bind(insert.active)
    .fetch_one(conn)
    .await
    .into_db_error()
  }

  #[tracing::instrument(skip(conn, update))]
  pub async fn update(
    conn: &mut Connection,
    id: Id<UserMarker>,
    update: UpdateUser<'_>,
  ) -> Result<Option<Self>> {
    let mut query = sqlx::QueryBuilder::new(r#"UPDATE "users" SET updated_at = now()"#);
    if let Some(name) = update.name {
      query.push(", name = ");
      query.push_bind(name);
    }
    if let Some(email) = update.email {
      query.push(", email = ");
      query.push_bind(email);
    }
    if let Some(password_hash) = update.password_hash {
      query.push(", password_hash = ");
      query.push_bind(password_hash);
    }
    if let Some(role) = update.role {
      query.push(", role = ");
      query.push_bind(role);
    }
    if let Some(team_id) = update.team_id {
      query.push(", team_id = ");
      query.push_bind(team_id);
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

  /// Soft delete: the row survives (history stays reachable), the
  /// account stops authenticating.
  #[tracing::instrument(skip(conn))]
  pub async fn deactivate(conn: &mut Connection, id: Id<UserMarker>) -> Result<Option<Self>> {
    sqlx::query_as::<_, Self>(
      r#"UPDATE "users" SET active = false, updated_at = now()
         WHERE id = $1
         RETURNING *"#,
    )
    .bind(id)
    .fetch_optional(conn)
    .await
    .into_db_error()
  }

  #[tracing::instrument(skip(conn))]
  pub async fn list(conn: &mut Connection) -> Result<Vec<UserView>> {
    let query = format!("{VIEW_SELECT} ORDER BY u.name ASC");
    sqlx::query_as::<_, UserView>(&query)
      .fetch_all(conn)
      .await
      .into_db_error()
  }

  #[tracing::instrument(skip(conn, id), fields(id = "<hidden>"))]
  pub async fn view_by_id(conn: &mut Connection, id: Id<UserMarker>) -> Result<Option<UserView>> {
    let query = format!("{VIEW_SELECT} WHERE u.id = $1");
    sqlx::query_as::<_, UserView>(&query)
      .bind(id)
      .fetch_optional(conn)
      .await
      .into_db_error()
  }

  /// Active attendants of one team, the population a supervisor
  /// watches over.
  #[tracing::instrument(skip(conn))]
  pub async fn team_attendants(
    conn: &mut Connection,
    team_id: Id<TeamMarker>,
  ) -> Result<Vec<UserView>> {
    let query = format!(
      "{VIEW_SELECT} WHERE u.team_id = $1 AND u.role = 'attendant' AND u.active ORDER BY u.name ASC"
    );
    sqlx::query_as::<_, UserView>(&query)
      .bind(team_id)
      .fetch_all(conn)
      .await
      .into_db_error()
  }
}

impl User {
  /// Ordered capability check: admin implies supervisor implies
  /// attendant.
  pub fn require_role(&self, min: Role) -> std::result::Result<(), types::Error> {
    if self.role >= min {
      Ok(())
    } else {
      Err(types::Error::forbidden(format!(
        "Access denied: {min} permission required"
      )))
    }
  }

  /// Ownership-style check, independent of the role order: the target
  /// itself, any admin, or a supervisor sharing the target's team.
  pub fn can_access(&self, target: &User) -> bool {
    if self.id == target.id || self.role == Role::Admin {
      return true;
    }

    self.role == Role::Supervisor && self.team_id.is_some() && self.team_id == target.team_id
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn user(id: u64, role: Role, team: Option<u64>) -> User {
    let created_at = chrono::NaiveDate::from_ymd_opt(2025, 4, 23)
      .unwrap()
      .and_hms_opt(9, 0, 0)
      .unwrap();

    User {
      id: Id::new(id),
      created_at,
      updated_at: None,
      name: format!("user-{id}"),
      email: format!("user-{id}@pausa.test"),
      password_hash: "irrelevant".into(),
      role,
      active: true,
      team_id: team.map(Id::new),
    }
  }

  #[test]
  fn test_require_role_follows_the_order() {
    let attendant = user(1, Role::Attendant, Some(1));
    let supervisor = user(2, Role::Supervisor, Some(1));
    let admin = user(3, Role::Admin, None);

    assert!(attendant.require_role(Role::Attendant).is_ok());
    assert!(attendant.require_role(Role::Supervisor).is_err());
    assert!(attendant.require_role(Role::Admin).is_err());

    assert!(supervisor.require_role(Role::Attendant).is_ok());
    assert!(supervisor.require_role(Role::Supervisor).is_ok());
    assert!(supervisor.require_role(Role::Admin).is_err());

    assert!(admin.require_role(Role::Attendant).is_ok());
    assert!(admin.require_role(Role::Supervisor).is_ok());
    assert!(admin.require_role(Role::Admin).is_ok());
  }

  #[test]
  fn test_can_access_self() {
    let attendant = user(1, Role::Attendant, Some(1));
    assert!(attendant.can_access(&attendant));

    let stranger = user(2, Role::Attendant, Some(1));
    assert!(!attendant.can_access(&stranger));
  }

  #[test]
  fn test_can_access_same_team_supervision() {
    let supervisor = user(1, Role::Supervisor, Some(1));
    let same_team = user(2, Role::Attendant, Some(1));
    let other_team = user(3, Role::Attendant, Some(2));
    let teamless = user(4, Role::Attendant, None);

    assert!(supervisor.can_access(&same_team));
    assert!(!supervisor.can_access(&other_team));
    assert!(!supervisor.can_access(&teamless));

    // a supervisor without a team supervises nobody
    let floating = user(5, Role::Supervisor, None);
    assert!(!floating.can_access(&teamless));
  }

  #[test]
  fn test_can_access_admin_ignores_teams() {
    let admin = user(1, Role::Admin, None);
    let anyone = user(2, Role::Attendant, Some(7));
    assert!(admin.can_access(&anyone));
  }
}
