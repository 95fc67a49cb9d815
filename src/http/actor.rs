use actix_web::{http::header, web, FromRequest};
use futures::future::{ready, LocalBoxFuture};
use thiserror::Error;

use crate::{schema::User, App};

use super::{Error, Jwt};

/// Who is knocking. Missing, invalid or expired tokens, unknown
/// users, and deactivated accounts all collapse into `Anonymous`;
/// protected routes turn that into a 401 via
/// [`Actor::authenticated`].
#[derive(Debug)]
pub enum Actor {
  Anonymous,
  User(User),
}

impl Actor {
  pub fn authenticated(self) -> Result<User, Error> {
    #[derive(Debug, Error)]
    #[error("Attempt to access an authenticated route")]
    struct Unauthorized;
    match self {
      Self::User(n) => Ok(n),
      Self::Anonymous => Err(Error::from_context(
        crate::types::Error::unauthenticated("Authentication required"),
        Unauthorized,
      )),
    }
  }
}

impl FromRequest for Actor {
  type Error = Error;
  type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

  fn from_request(
    req: &actix_web::HttpRequest,
    _payload: &mut actix_web::dev::Payload,
  ) -> Self::Future {
    let token = req
      .headers()
      .get(header::AUTHORIZATION)
      .and_then(|v| v.to_str().ok())
      .and_then(|v| v.strip_prefix("Bearer "));

    if let Some(token) = token {
      let Some(app) = req.app_data::<web::Data<App>>() else {
        #[derive(Debug, Error)]
        #[error("The web app has no available configuration")]
        struct NoConfig;
        return Box::pin(ready(Err(Error::from_context(
          crate::types::Error::Internal,
          NoConfig,
        ))));
      };

      let app = app.clone();
      let token = token.to_string();
      Box::pin(async move {
        let Ok(jwt) = Jwt::decode(&token, &app.config.auth) else {
          return Ok(Actor::Anonymous);
        };

        let mut conn = app.db_read_prefer_primary().await?;
        match User::by_id(&mut conn, jwt.sub).await? {
          Some(user) if user.active => Ok(Actor::User(user)),
          _ => Ok(Actor::Anonymous),
        }
      })
    } else {
      Box::pin(ready(Ok(Actor::Anonymous)))
    }
  }
}
