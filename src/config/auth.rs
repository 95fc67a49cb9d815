use serde::Deserialize;
use std::num::NonZeroU64;

use crate::util::Sensitive;

#[derive(Debug, Deserialize)]
pub struct Auth {
  /// Symmetric key used to sign and verify JSON Web Tokens.
  ///
  /// **Environment variables**:
  /// - `PAUSA_AUTH_JWT_SECRET` or `JWT_SECRET`
  pub jwt_secret: Sensitive<String>,
  /// How long an issued token stays valid, in seconds.
  ///
  /// **Environment variables**:
  /// - `PAUSA_AUTH_TOKEN_EXPIRY_SECS`
  #[serde(default = "Auth::default_token_expiry_secs")]
  pub token_expiry_secs: NonZeroU64,
}

impl Auth {
  /// 24 hours, matching the expiry the frontends were built around.
  const DEFAULT_TOKEN_EXPIRY_SECS: u64 = 24 * 60 * 60;

  pub(crate) const MIN_JWT_SECRET_LEN: usize = 12;

  // Required by serde
  const fn default_token_expiry_secs() -> NonZeroU64 {
    match NonZeroU64::new(Self::DEFAULT_TOKEN_EXPIRY_SECS) {
      Some(n) => n,
      None => panic!("DEFAULT_TOKEN_EXPIRY_SECS is accidentally set to 0"),
    }
  }
}
