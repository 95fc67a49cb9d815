use actix_web::{
  web::{self, Json, Path},
  HttpResponse,
};
use serde_json::json;

use crate::{
  database::ErrorExt2,
  http::{Actor, Error},
  schema::Team,
  types::{
    form::admin::teams,
    id::{marker::TeamMarker, Id},
    Error as ErrorType, Role,
  },
  App,
};

#[tracing::instrument(skip_all)]
pub async fn list(app: web::Data<App>, actor: Actor) -> Result<HttpResponse, Error> {
  let user = actor.authenticated()?;
  user.require_role(Role::Admin)?;

  let mut conn = app.db_read().await?;
  let teams = Team::list(&mut conn).await?;

  Ok(HttpResponse::Ok().json(teams))
}

#[tracing::instrument(skip_all)]
pub async fn create(
  app: web::Data<App>,
  actor: Actor,
  form: Json<teams::Create>,
) -> Result<HttpResponse, Error> {
  let user = actor.authenticated()?;
  user.require_role(Role::Admin)?;
  form.validate()?;

  let mut conn = app.db_write().await?;
  if Team::by_name(&mut conn, &form.name).await?.is_some() {
    return Err(Error::new(ErrorType::conflict(
      "A team with this name already exists",
    )));
  }

  match Team::insert(&mut conn, &form.name, form.description.as_deref()).await {
    Ok(team) => Ok(HttpResponse::Created().json(team)),
    Err(report) if report.is_unique_violation() => Err(Error::from_report(
      ErrorType::conflict("A team with this name already exists"),
      report,
    )),
    Err(report) => Err(report.into()),
  }
}

#[tracing::instrument(skip_all)]
pub async fn update(
  app: web::Data<App>,
  actor: Actor,
  path: Path<Id<TeamMarker>>,
  form: Json<teams::Update>,
) -> Result<HttpResponse, Error> {
  let user = actor.authenticated()?;
  user.require_role(Role::Admin)?;
  form.validate()?;

  let mut conn = app.db_write().await?;
  let Some(existing) = Team::by_id(&mut conn, *path).await? else {
    return Err(Error::new(ErrorType::not_found("Team not found")));
  };

  if let Some(name) = form.name.as_deref() {
    if name != existing.name && Team::by_name(&mut conn, name).await?.is_some() {
      return Err(Error::new(ErrorType::conflict(
        "A team with this name already exists",
      )));
    }
  }

  let updated = Team::update(
    &mut conn,
    existing.id,
    form.name.as_deref(),
    form.description.as_ref().map(|d| d.as_deref()),
  )
  .await;

  match updated {
    Ok(Some(team)) => Ok(HttpResponse::Ok().json(team)),
    Ok(None) => Err(Error::new(ErrorType::not_found("Team not found"))),
    Err(report) if report.is_unique_violation() => Err(Error::from_report(
      ErrorType::conflict("A team with this name already exists"),
      report,
    )),
    Err(report) => Err(report.into()),
  }
}

/// Members survive a team deletion; the schema nulls their `team_id`
/// instead of cascading.
#[tracing::instrument(skip_all)]
pub async fn delete(
  app: web::Data<App>,
  actor: Actor,
  path: Path<Id<TeamMarker>>,
) -> Result<HttpResponse, Error> {
  let user = actor.authenticated()?;
  user.require_role(Role::Admin)?;

  let mut conn = app.db_write().await?;
  if Team::delete(&mut conn, *path).await? {
    Ok(HttpResponse::Ok().json(json!({ "message": "Team deleted" })))
  } else {
    Err(Error::new(ErrorType::not_found("Team not found")))
  }
}
