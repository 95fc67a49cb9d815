use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Postgres, QueryBuilder};

use crate::{
  database::{Connection, ErrorExt, Result},
  types::id::{
    marker::{PauseRecordMarker, PauseTypeMarker, TeamMarker, UserMarker},
    Id,
  },
};

/// Appended to notes written by someone other than the pause's owner.
const SUPERVISOR_TAG: &str = "(ended by supervisor)";

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "pause_status", rename_all = "snake_case")]
pub enum PauseStatus {
  Running,
  Finished,
  Cancelled,
}

/// One break session. Born `running`; the only transitions out of it
/// are `finished` (stamps `end_time` and `duration_mins`) and
/// `cancelled` (stamps `end_time` only). Both are terminal, and rows
/// are never physically deleted by any API operation.
#[derive(Debug, Clone, FromRow, Serialize, PartialEq)]
pub struct PauseRecord {
  pub id: Id<PauseRecordMarker>,
  pub created_at: NaiveDateTime,
  pub updated_at: Option<NaiveDateTime>,
  pub user_id: Id<UserMarker>,
  pub pause_type_id: Id<PauseTypeMarker>,
  pub start_time: NaiveDateTime,
  pub end_time: Option<NaiveDateTime>,
  pub duration_mins: Option<i32>,
  pub status: PauseStatus,
  pub notes: Option<String>,
}

/// Optional filters shared by the history and team report listings.
/// Date bounds are inclusive calendar days.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct PauseFilter {
  pub start_date: Option<NaiveDate>,
  pub end_date: Option<NaiveDate>,
  pub pause_type_id: Option<Id<PauseTypeMarker>>,
  pub status: Option<PauseStatus>,
}

/// History row: the record plus its pause type, for the owner's own
/// listing.
#[derive(Debug, Clone, FromRow, Serialize, PartialEq)]
pub struct HistoryEntry {
  #[sqlx(flatten)]
  #[serde(flatten)]
  pub record: PauseRecord,
  pub pause_type_name: String,
  pub pause_type_description: Option<String>,
}

/// Team-scoped row: the record plus who paused and what kind of pause
/// it is. Used by the supervisor report and, annotated, by the active
/// pause view.
#[derive(Debug, Clone, FromRow, Serialize, PartialEq)]
pub struct TeamPauseRow {
  #[sqlx(flatten)]
  #[serde(flatten)]
  pub record: PauseRecord,
  pub user_name: String,
  pub user_email: String,
  pub pause_type_name: String,
  pub max_duration_mins: Option<i32>,
}

/// A running pause as the supervisor dashboard sees it. The elapsed
/// time and the overtime flag depend on "now", so they are computed
/// on every read and never stored.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ActivePause {
  #[serde(flatten)]
  pub row: TeamPauseRow,
  pub current_duration_mins: i32,
  pub is_overtime: bool,
}

/// Whole minutes between two timestamps, truncated (a 119 second
/// pause is 1 minute, not 2). Callers guarantee `end >= start`.
pub fn duration_mins(start: NaiveDateTime, end: NaiveDateTime) -> i32 {
  (end - start).num_minutes() as i32
}

/// A pause runs over when its type caps the duration and the elapsed
/// time strictly exceeds the cap. An uncapped type never runs over.
pub fn is_overtime(elapsed_mins: i32, max_duration_mins: Option<i32>) -> bool {
  max_duration_mins.map_or(false, |max| elapsed_mins > max)
}

/// Joins incoming notes onto whatever the record already holds,
/// newline-separated. Notes from someone other than the owner get the
/// supervisor tag. Empty or absent input keeps the original verbatim.
fn append_notes(
  existing: Option<&str>,
  incoming: Option<&str>,
  by_supervisor: bool,
) -> Option<String> {
  let incoming = match incoming {
    Some(n) if !n.is_empty() => n,
    _ => return existing.map(ToOwned::to_owned),
  };

  let tagged = if by_supervisor {
    format!("{incoming} {SUPERVISOR_TAG}")
  } else {
    incoming.to_string()
  };

  match existing {
    Some(old) => Some(format!("{old}\n{tagged}")),
    None => Some(tagged),
  }
}

impl PauseRecord {
  /// Minutes this pause has been running as of `now`.
  pub fn elapsed_mins(&self, now: NaiveDateTime) -> i32 {
    duration_mins(self.start_time, now)
  }

  #[tracing::instrument(skip(conn))]
  pub async fn by_id(conn: &mut Connection, id: Id<PauseRecordMarker>) -> Result<Option<Self>> {
    sqlx::query_as::<_, Self>(r#"SELECT * FROM "pause_records" WHERE id = $1"#)
      .bind(id)
      .fetch_optional(conn)
      .await
      .into_db_error()
  }

  #[tracing::instrument(skip(conn))]
  pub async fn running_for_user(
    conn: &mut Connection,
    user_id: Id<UserMarker>,
  ) -> Result<Option<Self>> {
    sqlx::query_as::<_, Self>(
      r#"SELECT * FROM "pause_records" WHERE user_id = $1 AND status = 'running'"#,
    )
    .bind(user_id)
    .fetch_optional(conn)
    .await
    .into_db_error()
  }

  /// Opens a pause. There is deliberately no pre-check for an already
  /// running pause here: the partial unique index on
  /// `(user_id) WHERE status = 'running'` is the only authority, so
  /// two concurrent starts cannot both pass. Callers translate the
  /// resulting unique violation into a conflict response.
  #[tracing::instrument(skip(conn, notes))]
  pub async fn start(
    conn: &mut Connection,
    user_id: Id<UserMarker>,
    pause_type_id: Id<PauseTypeMarker>,
    start_time: NaiveDateTime,
    notes: Option<&str>,
  ) -> Result<Self> {
    sqlx::query_as::<_, Self>(
      r#"INSERT INTO "pause_records" (user_id, pause_type_id, start_time, status, notes)
         VALUES ($1, $2, $3, 'running', $4)
         RETURNING *"#,
    )
    .bind(user_id)
    .bind(pause_type_id)
    .bind(start_time)
    .bind(notes)
    .fetch_one(conn)
    .await
    .into_db_error()
  }

  /// Closes the pause as finished. The `status = 'running'` guard in
  /// the statement makes the update atomic: `Ok(None)` means the row
  /// was no longer running by the time the update landed (already
  /// finished, cancelled, or raced by another actor), and the caller
  /// reports an invalid state instead of double-finishing.
  #[tracing::instrument(skip(conn, notes))]
  pub async fn finish(
    &self,
    conn: &mut Connection,
    end_time: NaiveDateTime,
    notes: Option<&str>,
    by_supervisor: bool,
  ) -> Result<Option<Self>> {
    let duration = duration_mins(self.start_time, end_time);
    let notes = append_notes(self.notes.as_deref(), notes, by_supervisor);

    sqlx::query_as::<_, Self>(
      r#"UPDATE "pause_records"
         SET end_time = $2, duration_mins = $3, status = 'finished', notes = $4, updated_at = now()
         WHERE id = $1 AND status = 'running'
         RETURNING *"#,
    )
    .bind(self.id)
    .bind(end_time)
    .bind(duration)
    .bind(notes)
    .fetch_optional(conn)
    .await
    .into_db_error()
  }

  /// Closes the pause as cancelled: same guard and notes rules as
  /// [`PauseRecord::finish`], but no duration is recorded.
  #[tracing::instrument(skip(conn, notes))]
  pub async fn cancel(
    &self,
    conn: &mut Connection,
    end_time: NaiveDateTime,
    notes: Option<&str>,
    by_supervisor: bool,
  ) -> Result<Option<Self>> {
    let notes = append_notes(self.notes.as_deref(), notes, by_supervisor);

    sqlx::query_as::<_, Self>(
      r#"UPDATE "pause_records"
         SET end_time = $2, status = 'cancelled', notes = $3, updated_at = now()
         WHERE id = $1 AND status = 'running'
         RETURNING *"#,
    )
    .bind(self.id)
    .bind(end_time)
    .bind(notes)
    .fetch_optional(conn)
    .await
    .into_db_error()
  }

  /// The caller's own pause history, newest first.
  #[tracing::instrument(skip(conn, filter))]
  pub async fn history(
    conn: &mut Connection,
    user_id: Id<UserMarker>,
    filter: &PauseFilter,
  ) -> Result<Vec<HistoryEntry>> {
    let mut query = QueryBuilder::new(
      r#"SELECT r.*, t.name AS pause_type_name, t.description AS pause_type_description
         FROM "pause_records" r
         INNER JOIN "pause_types" t ON t.id = r.pause_type_id
         WHERE r.user_id = "#,
    );
    query.push_bind(user_id);
    push_filters(&mut query, filter);
    query.push(" ORDER BY r.start_time DESC");

    query
      .build_query_as::<HistoryEntry>()
      .fetch_all(conn)
      .await
      .into_db_error()
  }

  /// Running pauses of one team's active attendants, oldest first so
  /// the longest-running pause surfaces on top of the supervisor's
  /// dashboard.
  #[tracing::instrument(skip(conn))]
  pub async fn team_active(
    conn: &mut Connection,
    team_id: Id<TeamMarker>,
  ) -> Result<Vec<TeamPauseRow>> {
    sqlx::query_as::<_, TeamPauseRow>(
      r#"SELECT r.*, u.name AS user_name, u.email AS user_email,
                t.name AS pause_type_name, t.max_duration_mins
         FROM "pause_records" r
         INNER JOIN "users" u ON u.id = r.user_id
         INNER JOIN "pause_types" t ON t.id = r.pause_type_id
         WHERE r.status = 'running' AND u.team_id = $1
           AND u.role = 'attendant' AND u.active
         ORDER BY r.start_time ASC"#,
    )
    .bind(team_id)
    .fetch_all(conn)
    .await
    .into_db_error()
  }

  /// Filtered pause history of one team's active attendants, newest
  /// first.
  #[tracing::instrument(skip(conn, filter))]
  pub async fn team_report(
    conn: &mut Connection,
    team_id: Id<TeamMarker>,
    filter: &PauseFilter,
  ) -> Result<Vec<TeamPauseRow>> {
    let mut query = QueryBuilder::new(
      r#"SELECT r.*, u.name AS user_name, u.email AS user_email,
                t.name AS pause_type_name, t.max_duration_mins
         FROM "pause_records" r
         INNER JOIN "users" u ON u.id = r.user_id
         INNER JOIN "pause_types" t ON t.id = r.pause_type_id
         WHERE u.role = 'attendant' AND u.active AND u.team_id = "#,
    );
    query.push_bind(team_id);
    push_filters(&mut query, filter);
    query.push(" ORDER BY r.start_time DESC");

    query
      .build_query_as::<TeamPauseRow>()
      .fetch_all(conn)
      .await
      .into_db_error()
  }
}

impl TeamPauseRow {
  pub fn annotate(self, now: NaiveDateTime) -> ActivePause {
    let current_duration_mins = self.record.elapsed_mins(now);
    let is_overtime = is_overtime(current_duration_mins, self.max_duration_mins);

    ActivePause {
      row: self,
      current_duration_mins,
      is_overtime,
    }
  }
}

fn push_filters(query: &mut QueryBuilder<'_, Postgres>, filter: &PauseFilter) {
  if let Some(start) = filter.start_date {
    query.push(" AND r.start_time >= ");
    query.push_bind(start.and_time(NaiveTime::MIN));
  }
  if let Some(end) = filter.end_date {
    // inclusive: anything before the following midnight belongs to
    // the requested end day
    if let Some(upper) = end.succ_opt() {
      query.push(" AND r.start_time < ");
      query.push_bind(upper.and_time(NaiveTime::MIN));
    }
  }
  if let Some(pause_type_id) = filter.pause_type_id {
    query.push(" AND r.pause_type_id = ");
    query.push_bind(pause_type_id);
  }
  if let Some(status) = filter.status {
    query.push(" AND r.status = ");
    query.push_bind(status);
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::Duration;

  fn at(secs: i64) -> NaiveDateTime {
    let base = NaiveDate::from_ymd_opt(2025, 4, 23)
      .unwrap()
      .and_hms_opt(9, 0, 0)
      .unwrap();
    base + Duration::seconds(secs)
  }

  #[test]
  fn test_duration_truncates_to_whole_minutes() {
    assert_eq!(0, duration_mins(at(0), at(59)));
    assert_eq!(1, duration_mins(at(0), at(60)));
    assert_eq!(1, duration_mins(at(0), at(119)));
    assert_eq!(2, duration_mins(at(0), at(120)));
    assert_eq!(61, duration_mins(at(0), at(61 * 60)));
  }

  #[test]
  fn test_overtime_requires_a_cap() {
    assert!(!is_overtime(600, None));
    assert!(!is_overtime(59, Some(60)));
    assert!(!is_overtime(60, Some(60)));
    assert!(is_overtime(61, Some(60)));
  }

  // "Almoço" caps at 60 minutes; checked 61 minutes after the start
  // the pause must already count as overtime.
  #[test]
  fn test_overtime_lunch_scenario() {
    let record = running_record(at(0), None);
    let now = at(61 * 60);

    assert_eq!(61, record.elapsed_mins(now));
    assert!(is_overtime(record.elapsed_mins(now), Some(60)));
  }

  #[test]
  fn test_append_notes_keeps_original_when_absent() {
    assert_eq!(None, append_notes(None, None, false));
    assert_eq!(
      Some("kept".to_string()),
      append_notes(Some("kept"), None, true)
    );
    assert_eq!(
      Some("kept".to_string()),
      append_notes(Some("kept"), Some(""), false)
    );
  }

  #[test]
  fn test_append_notes_joins_with_newline() {
    assert_eq!(
      Some("old\nnew".to_string()),
      append_notes(Some("old"), Some("new"), false)
    );
    assert_eq!(
      Some("fresh".to_string()),
      append_notes(None, Some("fresh"), false)
    );
  }

  #[test]
  fn test_append_notes_tags_supervisors() {
    assert_eq!(
      Some(format!("back to work {SUPERVISOR_TAG}")),
      append_notes(None, Some("back to work"), true)
    );
    assert_eq!(
      Some(format!("own note\nback to work {SUPERVISOR_TAG}")),
      append_notes(Some("own note"), Some("back to work"), true)
    );
  }

  #[test]
  fn test_annotate_computes_elapsed_and_overtime() {
    let row = TeamPauseRow {
      record: running_record(at(0), None),
      user_name: "Maria".into(),
      user_email: "maria@pausa.test".into(),
      pause_type_name: "Almoço".into(),
      max_duration_mins: Some(60),
    };

    let shown = row.clone().annotate(at(59 * 60));
    assert_eq!(59, shown.current_duration_mins);
    assert!(!shown.is_overtime);

    let shown = row.annotate(at(61 * 60));
    assert_eq!(61, shown.current_duration_mins);
    assert!(shown.is_overtime);
  }

  fn running_record(start_time: NaiveDateTime, notes: Option<&str>) -> PauseRecord {
    PauseRecord {
      id: Id::new(1),
      created_at: start_time,
      updated_at: None,
      user_id: Id::new(1),
      pause_type_id: Id::new(1),
      start_time,
      end_time: None,
      duration_mins: None,
      status: PauseStatus::Running,
      notes: notes.map(ToOwned::to_owned),
    }
  }

  #[tokio::test]
  #[ignore = "requires DATABASE_URL pointing at a migrated Postgres database"]
  async fn concurrent_starts_yield_a_single_running_record() {
    use crate::database::ErrorExt2;
    use crate::schema::{InsertUser, PauseType, User};
    use crate::types::Role;

    const EMAIL: &str = "start-race-test@pausa.test";

    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let pool = sqlx::PgPool::connect(&url).await.unwrap();

    let mut conn = pool.acquire().await.unwrap();
    sqlx::query(r#"DELETE FROM "users" WHERE email = $1"#)
      .bind(EMAIL)
      .execute(&mut *conn)
      .await
      .unwrap();

    let user = User::insert(
      &mut conn,
      InsertUser {
        name: "Racer",
        email: EMAIL,
        password_hash: "irrelevant",
        role: Role::Attendant,
        team_id: None,
        active: true,
      },
    )
    .await
    .unwrap();

    let ptype = match PauseType::by_name(&mut conn, "start-race-test").await.unwrap() {
      Some(existing) => existing,
      None => PauseType::insert(&mut conn, "start-race-test", None, Some(15))
        .await
        .unwrap(),
    };
    drop(conn);

    let mut first = pool.acquire().await.unwrap();
    let mut second = pool.acquire().await.unwrap();
    let now = chrono::Utc::now().naive_utc();
    let (left, right) = tokio::join!(
      PauseRecord::start(&mut first, user.id, ptype.id, now, None),
      PauseRecord::start(&mut second, user.id, ptype.id, now, None),
    );

    let successes = [&left, &right].iter().filter(|r| r.is_ok()).count();
    assert_eq!(1, successes, "exactly one concurrent start must win");

    let loser = if left.is_err() {
      left.unwrap_err()
    } else {
      right.unwrap_err()
    };
    assert!(loser.is_unique_violation());

    // the cascade from the user delete removes the record as well
    let mut conn = pool.acquire().await.unwrap();
    sqlx::query(r#"DELETE FROM "users" WHERE id = $1"#)
      .bind(user.id)
      .execute(&mut *conn)
      .await
      .unwrap();
  }
}
