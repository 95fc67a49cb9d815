use actix_web::web;

use crate::database::{Connection, ErrorExt2};
use crate::http::Error;
use crate::schema::{InsertUser, User};
use crate::types::Error as ErrorType;

pub mod admin;
pub mod auth;
pub mod pauses;
pub mod supervisor;

/// Inserting users races against the unique email column no matter
/// how carefully the handler pre-checks, so the violation itself is
/// translated here and the pre-check stays a fast path for the
/// common case.
pub(crate) async fn insert_user_handling_duplicates(
  conn: &mut Connection,
  insert: InsertUser<'_>,
) -> Result<User, Error> {
  match User::insert(conn, insert).await {
    Ok(user) => Ok(user),
    Err(report) if report.is_unique_violation() => Err(Error::from_report(
      ErrorType::conflict("Email is already in use"),
      report,
    )),
    Err(report) => Err(report.into()),
  }
}

pub fn configure(cfg: &mut web::ServiceConfig) {
  cfg.service(
    web::scope("/auth")
      .route("/login", web::post().to(auth::login))
      .route("/register", web::post().to(auth::register))
      .route("/profile", web::get().to(auth::profile)),
  );
  cfg.service(
    web::scope("/pauses")
      .route("/types", web::get().to(pauses::types))
      .route("/start", web::post().to(pauses::start))
      .route("/end/{id}", web::post().to(pauses::end))
      .route("/cancel/{id}", web::post().to(pauses::cancel))
      .route("/history", web::get().to(pauses::history)),
  );
  cfg.service(
    web::scope("/supervisor")
      .route("/team-members", web::get().to(supervisor::team_members))
      .route("/end-pause/{id}", web::post().to(supervisor::end_pause))
      .route("/active-pauses", web::get().to(supervisor::active_pauses))
      .route("/pause-types", web::post().to(supervisor::create_pause_type))
      .route("/team-report", web::get().to(supervisor::team_report)),
  );
  cfg.service(
    web::scope("/admin")
      .service(
        web::scope("/users")
          .route("", web::get().to(admin::users::list))
          .route("", web::post().to(admin::users::create))
          .route("/{id}", web::put().to(admin::users::update))
          .route("/{id}", web::delete().to(admin::users::delete)),
      )
      .service(
        web::scope("/teams")
          .route("", web::get().to(admin::teams::list))
          .route("", web::post().to(admin::teams::create))
          .route("/{id}", web::put().to(admin::teams::update))
          .route("/{id}", web::delete().to(admin::teams::delete)),
      )
      .service(
        web::scope("/pause-types")
          .route("", web::get().to(admin::pause_types::list))
          .route("/{id}", web::put().to(admin::pause_types::update)),
      ),
  );
}
