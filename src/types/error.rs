use serde::ser::SerializeMap;
use std::borrow::Cow;
use thiserror::Error;

use super::validation::FieldErrors;
use crate::schema::PauseRecord;

/// Public error taxonomy of the HTTP API.
///
/// Every handler failure is converted into one of these kinds before
/// it leaves the server; the HTTP status mapping lives in
/// [`crate::http::error`]. Serialization always produces a
/// `{"message": ...}` envelope, with variant-specific extras
/// (`active_pause`, `fields`) where the client needs them.
#[derive(Debug, Error, PartialEq)]
pub enum Error {
  #[error("{0}")]
  Unauthenticated(Cow<'static, str>),
  #[error("{0}")]
  Forbidden(Cow<'static, str>),
  #[error("{0}")]
  NotFound(Cow<'static, str>),
  #[error("{message}")]
  Conflict {
    message: Cow<'static, str>,
    /// Set when the conflict is the caller's own running pause; the
    /// client renders it instead of issuing a second lookup.
    active_pause: Option<Box<PauseRecord>>,
  },
  #[error("{0}")]
  InvalidState(Cow<'static, str>),
  #[error("Invalid form body")]
  InvalidFormBody(FieldErrors),
  #[error("Server is currently in read-only mode")]
  ReadonlyMode,
  #[error("Internal server error")]
  Internal,
}

impl Error {
  #[must_use]
  pub fn unauthenticated(message: impl Into<Cow<'static, str>>) -> Self {
    Self::Unauthenticated(message.into())
  }

  #[must_use]
  pub fn forbidden(message: impl Into<Cow<'static, str>>) -> Self {
    Self::Forbidden(message.into())
  }

  #[must_use]
  pub fn not_found(message: impl Into<Cow<'static, str>>) -> Self {
    Self::NotFound(message.into())
  }

  #[must_use]
  pub fn conflict(message: impl Into<Cow<'static, str>>) -> Self {
    Self::Conflict {
      message: message.into(),
      active_pause: None,
    }
  }

  #[must_use]
  pub fn duplicate_running_pause(active_pause: Option<PauseRecord>) -> Self {
    Self::Conflict {
      message: Cow::Borrowed("You already have a pause in progress"),
      active_pause: active_pause.map(Box::new),
    }
  }

  #[must_use]
  pub fn invalid_state(message: impl Into<Cow<'static, str>>) -> Self {
    Self::InvalidState(message.into())
  }
}

impl serde::Serialize for Error {
  fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
  where
    S: serde::Serializer,
  {
    let mut map = serializer.serialize_map(None)?;
    map.serialize_entry("message", &self.to_string())?;
    match self {
      Self::Conflict {
        active_pause: Some(record),
        ..
      } => {
        map.serialize_entry("active_pause", record)?;
      }
      Self::InvalidFormBody(fields) => {
        map.serialize_entry("fields", fields)?;
      }
      _ => {}
    }
    map.end()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_envelope_has_message() {
    let value = serde_json::to_value(Error::not_found("Pause record not found")).unwrap();
    assert_eq!(
      value,
      serde_json::json!({ "message": "Pause record not found" })
    );
  }

  #[test]
  fn test_invalid_form_body_carries_fields() {
    let mut fields = crate::types::validation::FieldErrors::new();
    fields.push("email", "Invalid e-mail address");

    let value = serde_json::to_value(Error::InvalidFormBody(fields)).unwrap();
    assert_eq!(
      value,
      serde_json::json!({
        "message": "Invalid form body",
        "fields": { "email": ["Invalid e-mail address"] },
      })
    );
  }

  #[test]
  fn test_conflict_without_record_has_no_extra_key() {
    let value = serde_json::to_value(Error::conflict("A team with this name already exists"))
      .unwrap();
    assert_eq!(
      value,
      serde_json::json!({ "message": "A team with this name already exists" })
    );
  }
}
