use chrono::{DateTime, Utc};
use error_stack::{Result, ResultExt};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
  config,
  schema::User,
  types::{
    id::{
      marker::{TeamMarker, UserMarker},
      Id,
    },
    Role,
  },
};

/// Claims carried by every bearer token. The role and team claims are
/// a convenience snapshot for the client; authorization always
/// re-reads the user row, so stale claims cannot widen access.
#[derive(Debug, Serialize, Deserialize)]
pub struct Jwt {
  pub sub: Id<UserMarker>,
  pub email: String,
  pub role: Role,
  pub team_id: Option<Id<TeamMarker>>,
  pub name: String,
  pub iat: i64,
  pub exp: i64,
}

#[derive(Debug, Error)]
#[error("Failed to issue JWT")]
pub struct EncodeJwtError;

#[derive(Debug, Error)]
#[error("Failed to decode JWT")]
pub struct DecodeJwtError;

impl Jwt {
  #[tracing::instrument(skip_all)]
  pub fn issue(
    user: &User,
    auth: &config::Auth,
    now: DateTime<Utc>,
  ) -> Result<String, EncodeJwtError> {
    let issued_at = now.timestamp();
    let claims = Self {
      sub: user.id,
      email: user.email.clone(),
      role: user.role,
      team_id: user.team_id,
      name: user.name.clone(),
      iat: issued_at,
      exp: issued_at + auth.token_expiry_secs.get() as i64,
    };

    let header = Header::new(Algorithm::HS512);
    let key = EncodingKey::from_secret(auth.jwt_secret.value().as_bytes());
    jsonwebtoken::encode(&header, &claims, &key).change_context(EncodeJwtError)
  }

  #[tracing::instrument(skip_all)]
  pub fn decode(token: &str, auth: &config::Auth) -> Result<Self, DecodeJwtError> {
    let key = DecodingKey::from_secret(auth.jwt_secret.value().as_bytes());
    let validation = Validation::new(Algorithm::HS512);

    jsonwebtoken::decode::<Self>(token, &key, &validation)
      .change_context(DecodeJwtError)
      .map(|data| data.claims)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::num::NonZeroU64;

  fn auth_config(expiry_secs: u64) -> config::Auth {
    serde_json::from_value(serde_json::json!({
      "jwt_secret": "an-adequately-long-test-secret",
      "token_expiry_secs": expiry_secs,
    }))
    .unwrap()
  }

  fn user() -> User {
    let created_at = chrono::NaiveDate::from_ymd_opt(2025, 4, 23)
      .unwrap()
      .and_hms_opt(9, 0, 0)
      .unwrap();

    User {
      id: Id::new(42),
      created_at,
      updated_at: None,
      name: "Maria Souza".into(),
      email: "maria@pausa.test".into(),
      password_hash: "irrelevant".into(),
      role: Role::Supervisor,
      active: true,
      team_id: Some(Id::new(7)),
    }
  }

  #[test]
  fn test_round_trip_preserves_claims() {
    let auth = auth_config(3600);
    let token = Jwt::issue(&user(), &auth, Utc::now()).unwrap();
    let claims = Jwt::decode(&token, &auth).unwrap();

    assert_eq!(Id::new(42), claims.sub);
    assert_eq!("maria@pausa.test", claims.email);
    assert_eq!(Role::Supervisor, claims.role);
    assert_eq!(Some(Id::new(7)), claims.team_id);
    assert_eq!("Maria Souza", claims.name);
    assert_eq!(claims.iat + 3600, claims.exp);
  }

  #[test]
  fn test_expired_tokens_are_rejected() {
    let auth = auth_config(120);
    // issued far enough in the past to sail past the default leeway
    let issued = Utc::now() - chrono::Duration::seconds(600);
    let token = Jwt::issue(&user(), &auth, issued).unwrap();

    assert!(Jwt::decode(&token, &auth).is_err());
  }

  #[test]
  fn test_tampered_tokens_are_rejected() {
    let auth = auth_config(3600);
    let other = config::Auth {
      jwt_secret: "a-different-but-long-secret".into(),
      token_expiry_secs: NonZeroU64::new(3600).unwrap(),
    };

    let token = Jwt::issue(&user(), &other, Utc::now()).unwrap();
    assert!(Jwt::decode(&token, &auth).is_err());
  }
}
