use error_stack::{Report, Result, ResultExt};
use serde::Deserialize;
use std::net::{IpAddr, Ipv4Addr};
use std::num::NonZeroUsize;

use super::ParseError;
use crate::util::figment::FigmentErrorAttachable;

#[derive(Debug, Deserialize)]
pub struct Server {
  /// Address the HTTP server binds to.
  ///
  /// **Environment variables**:
  /// - `PAUSA_IP`
  #[serde(default = "Server::default_ip")]
  pub ip: IpAddr,
  /// Port the HTTP server binds to.
  ///
  /// **Environment variables**:
  /// - `PAUSA_PORT`
  #[serde(default = "Server::default_port")]
  pub port: u16,
  /// Amount of actix worker threads serving requests.
  ///
  /// **Environment variables**:
  /// - `PAUSA_WORKERS`
  #[serde(default = "Server::default_workers")]
  pub workers: NonZeroUsize,
  pub db: super::Database,
  pub auth: super::Auth,
}

impl Server {
  pub fn load() -> Result<Self, ParseError> {
    dotenvy::dotenv().ok();

    let config = Self::figment()
      .extract::<Self>()
      .map_err(|e| Report::new(ParseError).attach_figment_error(e))?;

    config.validate()?;

    Ok(config)
  }
}

impl Server {
  const DEFAULT_CONFIG_FILE: &'static str = "pausa.toml";
  const DEFAULT_PORT: u16 = 3000;
  const DEFAULT_WORKERS: usize = 2;

  /// Creates a default [`figment::Figment`] object to load server
  /// configuration. This function is there for implementing
  /// [`Server::load`] and testing.
  pub(crate) fn figment() -> figment::Figment {
    use figment::{
      providers::{Env, Format, Toml},
      Figment,
    };

    Figment::new()
      .merge(Toml::file(Self::DEFAULT_CONFIG_FILE))
      // One big con about figment (env provider to be specific) especially
      // these fields with underscore in it.
      .merge(Env::prefixed("PAUSA_").map(|v| match v.as_str() {
        "DB_PRIMARY_MIN_IDLE" => "db.primary.min_idle".into(),
        "DB_PRIMARY_POOL_SIZE" => "db.primary.pool_size".into(),

        "DB_REPLICA_MIN_IDLE" => "db.replica.min_idle".into(),
        "DB_REPLICA_POOL_SIZE" => "db.replica.pool_size".into(),

        "DB_ENFORCE_TLS" => "db.enforce_tls".into(),
        "DB_TIMEOUT_SECS" => "db.timeout_secs".into(),

        "AUTH_JWT_SECRET" => "auth.jwt_secret".into(),
        "AUTH_TOKEN_EXPIRY_SECS" => "auth.token_expiry_secs".into(),

        _ => v.as_str().replace('_', ".").into(),
      }))
      // Environment variable aliases
      .merge(Env::raw().map(|v| match v.as_str() {
        "DATABASE_URL" => "db.primary.url".into(),
        "JWT_SECRET" => "auth.jwt_secret".into(),
        _ => v.into(),
      }))
  }

  fn validate(&self) -> Result<(), ParseError> {
    if self.auth.jwt_secret.len() < super::Auth::MIN_JWT_SECRET_LEN {
      return Err(Report::new(ParseError).attach_printable(format!(
        "auth.jwt_secret must be at least {} characters long",
        super::Auth::MIN_JWT_SECRET_LEN
      )));
    }

    validate_postgres_url(&self.db.primary.url, "db.primary.url")?;
    if let Some(replica) = self.db.replica.as_ref() {
      validate_postgres_url(&replica.url, "db.replica.url")?;
    }

    Ok(())
  }

  const fn default_ip() -> IpAddr {
    IpAddr::V4(Ipv4Addr::LOCALHOST)
  }

  const fn default_port() -> u16 {
    Self::DEFAULT_PORT
  }

  // Required by serde
  const fn default_workers() -> NonZeroUsize {
    match NonZeroUsize::new(Self::DEFAULT_WORKERS) {
      Some(n) => n,
      None => panic!("DEFAULT_WORKERS is accidentally set to 0"),
    }
  }
}

fn validate_postgres_url(value: &str, key: &str) -> Result<(), ParseError> {
  let url = url::Url::parse(value)
    .change_context(ParseError)
    .attach_printable_lazy(|| format!("{key} is not a valid connection URL"))?;

  if !matches!(url.scheme(), "postgres" | "postgresql") {
    return Err(
      Report::new(ParseError)
        .attach_printable(format!("{key} must use the postgres:// scheme")),
    );
  }

  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;
  use figment::Jail;
  use std::num::{NonZeroU32, NonZeroU64};

  #[test]
  fn env_aliases() {
    Jail::expect_with(|jail| {
      jail.set_env("DATABASE_URL", "postgres://localhost/pausa");
      jail.set_env("JWT_SECRET", "not-much-of-a-secret");

      jail.set_env("PAUSA_DB_PRIMARY_MIN_IDLE", "100");
      jail.set_env("PAUSA_DB_PRIMARY_POOL_SIZE", "100");

      jail.set_env("PAUSA_DB_REPLICA_URL", "postgres://replica.local/pausa");
      jail.set_env("PAUSA_DB_REPLICA_MIN_IDLE", "589");
      jail.set_env("PAUSA_DB_REPLICA_POOL_SIZE", "589");

      jail.set_env("PAUSA_DB_ENFORCE_TLS", "false");
      jail.set_env("PAUSA_DB_TIMEOUT_SECS", "3030");

      jail.set_env("PAUSA_AUTH_TOKEN_EXPIRY_SECS", "7200");

      let config: Server = Server::figment().extract()?;
      assert_eq!(config.db.primary.url.value(), "postgres://localhost/pausa");
      assert_eq!(
        config.db.primary.min_idle.unwrap(),
        NonZeroU32::new(100).unwrap()
      );
      assert_eq!(config.db.primary.pool_size, NonZeroU32::new(100).unwrap());
      assert_eq!(
        config.db.replica.as_ref().unwrap().min_idle.unwrap(),
        NonZeroU32::new(589).unwrap()
      );
      assert_eq!(
        config.db.replica.as_ref().unwrap().pool_size,
        NonZeroU32::new(589).unwrap()
      );

      assert_eq!(config.db.enforce_tls, false);
      assert_eq!(config.db.timeout_secs, NonZeroU64::new(3030).unwrap());

      assert_eq!(config.auth.jwt_secret.value(), "not-much-of-a-secret");
      assert_eq!(
        config.auth.token_expiry_secs,
        NonZeroU64::new(7200).unwrap()
      );
      assert!(config.validate().is_ok());

      Ok(())
    });
  }

  #[test]
  fn rejects_short_jwt_secrets() {
    Jail::expect_with(|jail| {
      jail.set_env("DATABASE_URL", "postgres://localhost/pausa");
      jail.set_env("JWT_SECRET", "short");

      let config: Server = Server::figment().extract()?;
      assert!(config.validate().is_err());

      Ok(())
    });
  }

  #[test]
  fn rejects_non_postgres_urls() {
    Jail::expect_with(|jail| {
      jail.set_env("DATABASE_URL", "mysql://localhost/pausa");
      jail.set_env("JWT_SECRET", "not-much-of-a-secret");

      let config: Server = Server::figment().extract()?;
      assert!(config.validate().is_err());

      Ok(())
    });
  }
}
