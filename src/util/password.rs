use argon2::password_hash::{rand_core::OsRng, SaltString};
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use error_stack::{Result, ResultExt};
use once_cell::sync::Lazy;
use thiserror::Error;

static CONTEXT: Lazy<Argon2<'static>> = Lazy::new(|| {
  Argon2::new(
    argon2::Algorithm::Argon2id,
    argon2::Version::V0x13,
    argon2::Params::DEFAULT,
  )
});

#[derive(Debug, Error)]
#[error("Failed to generate password hash")]
pub struct HashPasswordError;

pub fn hash(password: impl AsRef<[u8]>) -> Result<String, HashPasswordError> {
  let salt = SaltString::generate(&mut OsRng);
  let password_hash = CONTEXT
    .hash_password(password.as_ref(), &salt)
    .change_context(HashPasswordError)?;

  Ok(password_hash.to_string())
}

#[derive(Debug, Error)]
#[error("Failed to verify password")]
pub struct VerifyPasswordError;

pub fn verify(password: &[u8], hash: &str) -> Result<bool, VerifyPasswordError> {
  let hash = PasswordHash::new(hash)
    .change_context(VerifyPasswordError)
    .attach_printable("could not parse password hash")?;

  match CONTEXT.verify_password(password, &hash) {
    Ok(..) => Ok(true),
    Err(argon2::password_hash::Error::Password) => Ok(false),
    Err(error) => Err(error).change_context(VerifyPasswordError),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_hash_then_verify() {
    let hash = hash("correct horse battery staple").unwrap();
    assert!(verify(b"correct horse battery staple", &hash).unwrap());
    assert!(!verify(b"correct horse battery", &hash).unwrap());
  }

  #[test]
  fn test_verify_rejects_garbage_hashes() {
    assert!(verify(b"whatever", "not-a-phc-string").is_err());
  }
}
