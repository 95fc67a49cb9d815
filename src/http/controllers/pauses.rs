use actix_web::{
  web::{self, Json, Path, Query},
  HttpResponse,
};
use chrono::Utc;

use crate::{
  database::ErrorExt2,
  http::{Actor, Error},
  schema::{PauseFilter, PauseRecord, PauseStatus, PauseType, User},
  types::{
    form::pauses::{end, start},
    id::{marker::PauseRecordMarker, Id},
    Error as ErrorType,
  },
  App,
};

/// How a running pause gets closed. Finish stamps a duration,
/// cancel does not; everything else (guards, authorization, notes)
/// is shared.
#[derive(Debug, Clone, Copy)]
pub(super) enum CloseAction {
  Finish,
  Cancel,
}

#[tracing::instrument(skip_all)]
pub async fn types(app: web::Data<App>, actor: Actor) -> Result<HttpResponse, Error> {
  actor.authenticated()?;

  let mut conn = app.db_read().await?;
  let types = PauseType::list_active(&mut conn).await?;

  Ok(HttpResponse::Ok().json(types))
}

#[tracing::instrument(skip_all)]
pub async fn start(
  app: web::Data<App>,
  actor: Actor,
  form: Json<start::Request>,
) -> Result<HttpResponse, Error> {
  let user = actor.authenticated()?;
  form.validate()?;

  let mut conn = app.db_write().await?;

  let pause_type = PauseType::by_id(&mut conn, form.pause_type_id).await?;
  let Some(pause_type) = pause_type.filter(|t| t.active) else {
    return Err(Error::new(ErrorType::not_found(
      "Pause type not found or inactive",
    )));
  };

  let now = Utc::now().naive_utc();
  match PauseRecord::start(&mut conn, user.id, pause_type.id, now, form.notes.as_deref()).await {
    Ok(record) => Ok(HttpResponse::Created().json(record)),
    Err(report) if report.is_unique_violation() => {
      // the partial unique index tells us a pause is already running;
      // fetch it so the client can show which one
      let active = PauseRecord::running_for_user(&mut conn, user.id).await?;
      Err(Error::from_report(
        ErrorType::duplicate_running_pause(active),
        report,
      ))
    }
    Err(report) => Err(report.into()),
  }
}

#[tracing::instrument(skip_all)]
pub async fn end(
  app: web::Data<App>,
  actor: Actor,
  path: Path<Id<PauseRecordMarker>>,
  form: Json<end::Request>,
) -> Result<HttpResponse, Error> {
  let user = actor.authenticated()?;
  form.validate()?;
  close_pause(&app, &user, *path, form.notes.as_deref(), CloseAction::Finish).await
}

#[tracing::instrument(skip_all)]
pub async fn cancel(
  app: web::Data<App>,
  actor: Actor,
  path: Path<Id<PauseRecordMarker>>,
  form: Json<end::Request>,
) -> Result<HttpResponse, Error> {
  let user = actor.authenticated()?;
  form.validate()?;
  close_pause(&app, &user, *path, form.notes.as_deref(), CloseAction::Cancel).await
}

#[tracing::instrument(skip_all)]
pub async fn history(
  app: web::Data<App>,
  actor: Actor,
  filter: Query<PauseFilter>,
) -> Result<HttpResponse, Error> {
  let user = actor.authenticated()?;

  let mut conn = app.db_read().await?;
  let entries = PauseRecord::history(&mut conn, user.id, &filter).await?;

  Ok(HttpResponse::Ok().json(entries))
}

/// Shared by the self-service end/cancel routes and the supervisor's
/// force-end: load, authorize (owner, admin, or supervisor of the
/// owner's team), guard the state, then run the conditional update.
pub(super) async fn close_pause(
  app: &App,
  actor: &User,
  record_id: Id<PauseRecordMarker>,
  notes: Option<&str>,
  action: CloseAction,
) -> Result<HttpResponse, Error> {
  let mut conn = app.db_write().await?;

  let Some(record) = PauseRecord::by_id(&mut conn, record_id).await? else {
    return Err(Error::new(ErrorType::not_found("Pause record not found")));
  };

  let by_supervisor = record.user_id != actor.id;
  if by_supervisor {
    let Some(owner) = User::by_id(&mut conn, record.user_id).await? else {
      return Err(Error::new(ErrorType::not_found("Pause owner not found")));
    };
    if !actor.can_access(&owner) {
      return Err(Error::new(ErrorType::forbidden(
        "You are not allowed to close pauses of attendants outside your team",
      )));
    }
  }

  if record.status != PauseStatus::Running {
    return Err(Error::new(ErrorType::invalid_state(
      "This pause has already been finished or cancelled",
    )));
  }

  let now = Utc::now().naive_utc();
  let updated = match action {
    CloseAction::Finish => record.finish(&mut conn, now, notes, by_supervisor).await?,
    CloseAction::Cancel => record.cancel(&mut conn, now, notes, by_supervisor).await?,
  };

  match updated {
    Some(record) => Ok(HttpResponse::Ok().json(record)),
    // someone else closed it between our load and the update
    None => Err(Error::new(ErrorType::invalid_state(
      "This pause has already been finished or cancelled",
    ))),
  }
}
