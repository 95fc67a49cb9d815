use actix_web::{
  web::{self, Json, Path},
  HttpResponse,
};
use serde_json::json;

use crate::{
  database::ErrorExt2,
  http::{Actor, Error},
  schema::{InsertUser, UpdateUser, User},
  types::{
    form::admin::users,
    id::{marker::UserMarker, Id},
    Error as ErrorType, Role,
  },
  util::password,
  App,
};

#[tracing::instrument(skip_all)]
pub async fn list(app: web::Data<App>, actor: Actor) -> Result<HttpResponse, Error> {
  let user = actor.authenticated()?;
  user.require_role(Role::Admin)?;

  let mut conn = app.db_read().await?;
  let users = User::list(&mut conn).await?;

  Ok(HttpResponse::Ok().json(users))
}

#[tracing::instrument(skip_all)]
pub async fn create(
  app: web::Data<App>,
  actor: Actor,
  form: Json<users::Create>,
) -> Result<HttpResponse, Error> {
  let user = actor.authenticated()?;
  user.require_role(Role::Admin)?;
  form.validate()?;

  let mut conn = app.db_write().await?;
  if User::by_email(&mut conn, &form.email).await?.is_some() {
    return Err(Error::new(ErrorType::conflict("Email is already in use")));
  }

  let attempt = form.password.clone();
  let password_hash = tokio::task::spawn_blocking(move || password::hash(attempt.as_str()))
    .await
    .map_err(|e| Error::from_context(ErrorType::Internal, e))?
    .map_err(|report| Error::from_report(ErrorType::Internal, report))?;

  let created = super::super::insert_user_handling_duplicates(
    &mut conn,
    InsertUser {
      name: &form.name,
      email: &form.email,
      password_hash: &password_hash,
      role: form.role.unwrap_or(Role::Attendant),
      team_id: form.team_id,
      active: form.active.unwrap_or(true),
    },
  )
  .await?;

  let Some(view) = User::view_by_id(&mut conn, created.id).await? else {
    return Err(Error::new(ErrorType::not_found("User not found")));
  };

  Ok(HttpResponse::Created().json(view))
}

#[tracing::instrument(skip_all)]
pub async fn update(
  app: web::Data<App>,
  actor: Actor,
  path: Path<Id<UserMarker>>,
  form: Json<users::Update>,
) -> Result<HttpResponse, Error> {
  let user = actor.authenticated()?;
  user.require_role(Role::Admin)?;
  form.validate()?;

  let mut conn = app.db_write().await?;
  let Some(existing) = User::by_id(&mut conn, *path).await? else {
    return Err(Error::new(ErrorType::not_found("User not found")));
  };

  if let Some(email) = form.email.as_deref() {
    if email != existing.email && User::by_email(&mut conn, email).await?.is_some() {
      return Err(Error::new(ErrorType::conflict(
        "Email is already in use by another user",
      )));
    }
  }

  let password_hash = match form.password.clone() {
    Some(attempt) => Some(
      tokio::task::spawn_blocking(move || password::hash(attempt.as_str()))
        .await
        .map_err(|e| Error::from_context(ErrorType::Internal, e))?
        .map_err(|report| Error::from_report(ErrorType::Internal, report))?,
    ),
    None => None,
  };

  let updated = User::update(
    &mut conn,
    existing.id,
    UpdateUser {
      name: form.name.as_deref(),
      email: form.email.as_deref(),
      password_hash,
      role: form.role,
      team_id: form.team_id,
      active: form.active,
    },
  )
  .await;

  match updated {
    Ok(Some(updated)) => match User::view_by_id(&mut conn, updated.id).await? {
      Some(view) => Ok(HttpResponse::Ok().json(view)),
      None => Err(Error::new(ErrorType::not_found("User not found"))),
    },
    Ok(None) => Err(Error::new(ErrorType::not_found("User not found"))),
    Err(report) if report.is_unique_violation() => Err(Error::from_report(
      ErrorType::conflict("Email is already in use by another user"),
      report,
    )),
    Err(report) => Err(report.into()),
  }
}

/// DELETE deactivates. Rows stay so that pause history keeps its
/// owner; genuine removal happens out-of-band and cascades the
/// records with it.
#[tracing::instrument(skip_all)]
pub async fn delete(
  app: web::Data<App>,
  actor: Actor,
  path: Path<Id<UserMarker>>,
) -> Result<HttpResponse, Error> {
  let user = actor.authenticated()?;
  user.require_role(Role::Admin)?;

  let mut conn = app.db_write().await?;
  match User::deactivate(&mut conn, *path).await? {
    Some(..) => Ok(HttpResponse::Ok().json(json!({ "message": "User deactivated" }))),
    None => Err(Error::new(ErrorType::not_found("User not found"))),
  }
}
