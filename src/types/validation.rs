use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::{borrow::Cow, collections::BTreeMap};

static EMAIL_REGEX: Lazy<Regex> = Lazy::new(|| {
  Regex::new(r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9-]+(?:\.[a-zA-Z0-9-]+)*$")
    .expect("compile email regex")
});

pub const NAME_MAX: usize = 120;
pub const NOTES_MAX: usize = 1000;
pub const PASSWORD_MIN: usize = 8;
pub const PASSWORD_MAX: usize = 128;

pub fn is_valid_email(email: &str) -> bool {
  EMAIL_REGEX.is_match(email) && email.len() <= 254
}

pub fn is_valid_password(pass: &str) -> bool {
  let len = pass.len();
  (PASSWORD_MIN..=PASSWORD_MAX).contains(&len)
}

pub fn is_valid_name(name: &str) -> bool {
  let trimmed = name.trim();
  !trimmed.is_empty() && trimmed.len() == name.len() && name.len() <= NAME_MAX
}

/// Per-field validation messages collected while checking a request
/// form. Serialized into the `fields` object of an
/// [`InvalidFormBody`](super::Error::InvalidFormBody) response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<Cow<'static, str>, Vec<Cow<'static, str>>>);

impl FieldErrors {
  #[must_use]
  pub fn new() -> Self {
    Self::default()
  }

  pub fn push(
    &mut self,
    field: impl Into<Cow<'static, str>>,
    message: impl Into<Cow<'static, str>>,
  ) {
    self.0.entry(field.into()).or_default().push(message.into());
  }

  #[must_use]
  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }

  /// Finishes a validation pass: `Ok(())` when no message was pushed,
  /// otherwise the collected messages as an `InvalidFormBody` error.
  pub fn into_result(self) -> Result<(), super::Error> {
    if self.is_empty() {
      Ok(())
    } else {
      Err(super::Error::InvalidFormBody(self))
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_is_valid_email() {
    assert!(is_valid_email("gush@gmail.com"));
    assert!(is_valid_email("first.last@example.com.br"));
    assert!(!is_valid_email("nada_neutho"));
    assert!(!is_valid_email("@example.com"));
  }

  #[test]
  fn test_is_valid_name() {
    assert!(is_valid_name("Maria Souza"));
    assert!(!is_valid_name(""));
    assert!(!is_valid_name("   "));
    assert!(!is_valid_name(" padded "));
    assert!(!is_valid_name(&"x".repeat(NAME_MAX + 1)));
  }

  #[test]
  fn test_field_errors_into_result() {
    assert!(FieldErrors::new().into_result().is_ok());

    let mut errors = FieldErrors::new();
    errors.push("email", "Invalid e-mail address");
    errors.push("email", "This e-mail address exists");
    let error = errors.clone().into_result().unwrap_err();
    assert_eq!(error, super::super::Error::InvalidFormBody(errors));
  }
}
