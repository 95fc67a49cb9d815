use serde::Deserialize;

use crate::{
  types::{
    form::double_option,
    id::{marker::TeamMarker, Id},
    validation::{is_valid_email, is_valid_name, is_valid_password, FieldErrors},
    Error, Role,
  },
  util::Sensitive,
};

#[derive(Debug, Deserialize)]
pub struct Create {
  pub name: String,
  pub email: String,
  pub password: Sensitive<String>,
  /// Defaults to attendant when omitted.
  pub role: Option<Role>,
  pub team_id: Option<Id<TeamMarker>>,
  /// Defaults to active when omitted.
  pub active: Option<bool>,
}

impl Create {
  pub fn validate(&self) -> Result<(), Error> {
    let mut fields = FieldErrors::new();
    if !is_valid_name(&self.name) {
      fields.push("name", "Invalid name");
    }
    if !is_valid_email(&self.email) {
      fields.push("email", "Invalid e-mail address");
    }
    if !is_valid_password(&self.password) {
      fields.push("password", "Password length is out of bounds");
    }
    fields.into_result()
  }
}

/// Every field is optional; only what the admin actually sent gets
/// written. `team_id: null` unassigns, a missing `team_id` leaves the
/// assignment alone.
#[derive(Debug, Default, Deserialize)]
pub struct Update {
  pub name: Option<String>,
  pub email: Option<String>,
  pub password: Option<Sensitive<String>>,
  pub role: Option<Role>,
  #[serde(default, deserialize_with = "double_option")]
  pub team_id: Option<Option<Id<TeamMarker>>>,
  pub active: Option<bool>,
}

impl Update {
  pub fn validate(&self) -> Result<(), Error> {
    let mut fields = FieldErrors::new();
    if matches!(self.name.as_deref(), Some(name) if !is_valid_name(name)) {
      fields.push("name", "Invalid name");
    }
    if matches!(self.email.as_deref(), Some(email) if !is_valid_email(email)) {
      fields.push("email", "Invalid e-mail address");
    }
    if matches!(self.password.as_deref(), Some(pass) if !is_valid_password(pass)) {
      fields.push("password", "Password length is out of bounds");
    }
    fields.into_result()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_update_distinguishes_null_from_absent() {
    let form: Update = serde_json::from_str(r#"{"name": "Maria"}"#).unwrap();
    assert_eq!(None, form.team_id);

    let form: Update = serde_json::from_str(r#"{"team_id": null}"#).unwrap();
    assert_eq!(Some(None), form.team_id);

    let form: Update = serde_json::from_str(r#"{"team_id": "7"}"#).unwrap();
    assert_eq!(Some(Some(Id::new(7))), form.team_id);
  }

  #[test]
  fn test_update_validates_only_present_fields() {
    assert!(Update::default().validate().is_ok());

    let form = Update {
      email: Some("broken".into()),
      ..Update::default()
    };
    assert!(form.validate().is_err());
  }
}
