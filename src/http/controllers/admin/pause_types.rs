use actix_web::{
  web::{self, Json, Path},
  HttpResponse,
};

use crate::{
  database::ErrorExt2,
  http::{Actor, Error},
  schema::{PauseType, UpdatePauseType},
  types::{
    form::admin::pause_types,
    id::{marker::PauseTypeMarker, Id},
    Error as ErrorType, Role,
  },
  App,
};

#[tracing::instrument(skip_all)]
pub async fn list(app: web::Data<App>, actor: Actor) -> Result<HttpResponse, Error> {
  let user = actor.authenticated()?;
  user.require_role(Role::Admin)?;

  let mut conn = app.db_read().await?;
  let types = PauseType::list_all(&mut conn).await?;

  Ok(HttpResponse::Ok().json(types))
}

#[tracing::instrument(skip_all)]
pub async fn update(
  app: web::Data<App>,
  actor: Actor,
  path: Path<Id<PauseTypeMarker>>,
  form: Json<pause_types::Update>,
) -> Result<HttpResponse, Error> {
  let user = actor.authenticated()?;
  user.require_role(Role::Admin)?;
  form.validate()?;

  let mut conn = app.db_write().await?;
  let Some(existing) = PauseType::by_id(&mut conn, *path).await? else {
    return Err(Error::new(ErrorType::not_found("Pause type not found")));
  };

  if let Some(name) = form.name.as_deref() {
    if name != existing.name && PauseType::by_name(&mut conn, name).await?.is_some() {
      return Err(Error::new(ErrorType::conflict(
        "A pause type with this name already exists",
      )));
    }
  }

  let updated = PauseType::update(
    &mut conn,
    existing.id,
    UpdatePauseType {
      name: form.name.as_deref(),
      description: form.description.as_ref().map(|d| d.as_deref()),
      max_duration_mins: form.max_duration_mins,
      active: form.active,
    },
  )
  .await;

  match updated {
    Ok(Some(pause_type)) => Ok(HttpResponse::Ok().json(pause_type)),
    Ok(None) => Err(Error::new(ErrorType::not_found("Pause type not found"))),
    Err(report) if report.is_unique_violation() => Err(Error::from_report(
      ErrorType::conflict("A pause type with this name already exists"),
      report,
    )),
    Err(report) => Err(report.into()),
  }
}
