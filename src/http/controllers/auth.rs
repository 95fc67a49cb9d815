use actix_web::{
  web::{self, Json},
  HttpResponse,
};
use chrono::Utc;

use crate::{
  http::{Actor, Error, Jwt},
  schema::{InsertUser, User},
  types::{form::auth::login, form::auth::register, Error as ErrorType, Role},
  util::password,
  App,
};

#[tracing::instrument(skip_all)]
pub async fn login(app: web::Data<App>, form: Json<login::Request>) -> Result<HttpResponse, Error> {
  form.validate()?;

  // We need to get the latest info as soon as possible
  let mut conn = app.db_read_prefer_primary().await?;

  let Some(user) = User::by_email(&mut conn, &form.email).await? else {
    return Err(Error::new(ErrorType::unauthenticated("Invalid credentials")));
  };

  let attempt = form.password.clone();
  let password_hash = user.password_hash.clone();
  let matched =
    tokio::task::spawn_blocking(move || password::verify(attempt.as_bytes(), &password_hash))
      .await
      .map_err(|e| Error::from_context(ErrorType::Internal, e))?
      .map_err(|report| Error::from_report(ErrorType::Internal, report))?;

  if !matched {
    return Err(Error::new(ErrorType::unauthenticated("Invalid credentials")));
  }

  if !user.active {
    return Err(Error::new(ErrorType::unauthenticated(
      "Account is deactivated. Contact an administrator",
    )));
  }

  let token = Jwt::issue(&user, &app.config.auth, Utc::now())
    .map_err(|report| Error::from_report(ErrorType::Internal, report))?;

  let Some(view) = User::view_by_id(&mut conn, user.id).await? else {
    return Err(Error::new(ErrorType::unauthenticated("Invalid credentials")));
  };

  Ok(HttpResponse::Ok().json(login::Response {
    token: token.into(),
    user: view,
  }))
}

#[tracing::instrument(skip_all)]
pub async fn register(
  app: web::Data<App>,
  actor: Actor,
  form: Json<register::Request>,
) -> Result<HttpResponse, Error> {
  let creator = actor.authenticated()?;
  creator.require_role(Role::Supervisor)?;
  form.validate()?;

  let role = form.role();
  if creator.role == Role::Supervisor {
    if role != Role::Attendant {
      return Err(Error::new(ErrorType::forbidden(
        "Supervisors may only create attendants",
      )));
    }
    if form.team_id != creator.team_id {
      return Err(Error::new(ErrorType::forbidden(
        "Supervisors may only add users to their own team",
      )));
    }
  }

  let mut conn = app.db_write().await?;
  if User::by_email(&mut conn, &form.email).await?.is_some() {
    return Err(Error::new(ErrorType::conflict("Email is already in use")));
  }

  let password = form.password.clone();
  let password_hash = tokio::task::spawn_blocking(move || password::hash(password.as_str()))
    .await
    .map_err(|e| Error::from_context(ErrorType::Internal, e))?
    .map_err(|report| Error::from_report(ErrorType::Internal, report))?;

  let user = super::insert_user_handling_duplicates(
    &mut conn,
    InsertUser {
      name: &form.name,
      email: &form.email,
      password_hash: &password_hash,
      role,
      team_id: form.team_id,
      active: true,
    },
  )
  .await?;

  let Some(view) = User::view_by_id(&mut conn, user.id).await? else {
    return Err(Error::new(ErrorType::not_found("User not found")));
  };

  Ok(HttpResponse::Created().json(view))
}

#[tracing::instrument(skip_all)]
pub async fn profile(app: web::Data<App>, actor: Actor) -> Result<HttpResponse, Error> {
  let user = actor.authenticated()?;

  let mut conn = app.db_read_prefer_primary().await?;
  let Some(view) = User::view_by_id(&mut conn, user.id).await? else {
    return Err(Error::new(ErrorType::not_found("User not found")));
  };

  Ok(HttpResponse::Ok().json(view))
}
