use actix_web::{
  web::{self, Json, Path, Query},
  HttpResponse,
};
use chrono::Utc;

use crate::{
  database::ErrorExt2,
  http::{Actor, Error},
  schema::{ActivePause, PauseFilter, PauseRecord, PauseType, TeamPauseRow, User, UserView},
  types::{
    form::pauses::end,
    form::supervisor::pause_type,
    id::{marker::PauseRecordMarker, Id},
    Error as ErrorType, Role,
  },
  App,
};

use super::pauses::{close_pause, CloseAction};

#[tracing::instrument(skip_all)]
pub async fn team_members(app: web::Data<App>, actor: Actor) -> Result<HttpResponse, Error> {
  let user = actor.authenticated()?;
  user.require_role(Role::Supervisor)?;

  let members: Vec<UserView> = match user.team_id {
    Some(team_id) => {
      let mut conn = app.db_read().await?;
      User::team_attendants(&mut conn, team_id).await?
    }
    // a supervisor without a team watches over nobody
    None => Vec::new(),
  };

  Ok(HttpResponse::Ok().json(members))
}

#[tracing::instrument(skip_all)]
pub async fn end_pause(
  app: web::Data<App>,
  actor: Actor,
  path: Path<Id<PauseRecordMarker>>,
  form: Json<end::Request>,
) -> Result<HttpResponse, Error> {
  let user = actor.authenticated()?;
  user.require_role(Role::Supervisor)?;
  form.validate()?;

  close_pause(&app, &user, *path, form.notes.as_deref(), CloseAction::Finish).await
}

#[tracing::instrument(skip_all)]
pub async fn active_pauses(app: web::Data<App>, actor: Actor) -> Result<HttpResponse, Error> {
  let user = actor.authenticated()?;
  user.require_role(Role::Supervisor)?;

  let pauses: Vec<ActivePause> = match user.team_id {
    Some(team_id) => {
      let mut conn = app.db_read().await?;
      let rows = PauseRecord::team_active(&mut conn, team_id).await?;

      // "now" moves independently of any write, so the elapsed time
      // and the overtime flag are computed per response
      let now = Utc::now().naive_utc();
      rows.into_iter().map(|row| row.annotate(now)).collect()
    }
    None => Vec::new(),
  };

  Ok(HttpResponse::Ok().json(pauses))
}

#[tracing::instrument(skip_all)]
pub async fn create_pause_type(
  app: web::Data<App>,
  actor: Actor,
  form: Json<pause_type::Request>,
) -> Result<HttpResponse, Error> {
  let user = actor.authenticated()?;
  user.require_role(Role::Supervisor)?;
  form.validate()?;

  let mut conn = app.db_write().await?;
  if PauseType::by_name(&mut conn, &form.name).await?.is_some() {
    return Err(Error::new(ErrorType::conflict(
      "A pause type with this name already exists",
    )));
  }

  let inserted = PauseType::insert(
    &mut conn,
    &form.name,
    form.description.as_deref(),
    form.max_duration_mins,
  )
  .await;

  match inserted {
    Ok(pause_type) => Ok(HttpResponse::Created().json(pause_type)),
    Err(report) if report.is_unique_violation() => Err(Error::from_report(
      ErrorType::conflict("A pause type with this name already exists"),
      report,
    )),
    Err(report) => Err(report.into()),
  }
}

#[tracing::instrument(skip_all)]
pub async fn team_report(
  app: web::Data<App>,
  actor: Actor,
  filter: Query<PauseFilter>,
) -> Result<HttpResponse, Error> {
  let user = actor.authenticated()?;
  user.require_role(Role::Supervisor)?;

  let rows: Vec<TeamPauseRow> = match user.team_id {
    Some(team_id) => {
      let mut conn = app.db_read().await?;
      PauseRecord::team_report(&mut conn, team_id, &filter).await?
    }
    None => Vec::new(),
  };

  Ok(HttpResponse::Ok().json(rows))
}
