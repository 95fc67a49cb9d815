use serde::Deserialize;

use crate::{
  types::{
    id::{marker::TeamMarker, Id},
    validation::{is_valid_email, is_valid_name, is_valid_password, FieldErrors},
    Error, Role,
  },
  util::Sensitive,
};

/// Creation of a user by an already-authenticated supervisor or
/// admin; there is no anonymous sign-up.
#[derive(Debug, Deserialize)]
pub struct Request {
  pub name: String,
  pub email: String,
  pub password: Sensitive<String>,
  /// Defaults to attendant when omitted.
  pub role: Option<Role>,
  pub team_id: Option<Id<TeamMarker>>,
}

impl Request {
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

  pub fn role(&self) -> Role {
    self.role.unwrap_or(Role::Attendant)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn form(name: &str, email: &str, password: &str) -> Request {
    Request {
      name: name.to_string(),
      email: email.to_string(),
      password: password.into(),
      role: None,
      team_id: None,
    }
  }

  #[test]
  fn test_password_bounds() {
    assert!(form("Maria", "maria@pausa.test", "1234567").validate().is_err());
    assert!(form("Maria", "maria@pausa.test", "12345678").validate().is_ok());
    assert!(form("Maria", "maria@pausa.test", &"x".repeat(129))
      .validate()
      .is_err());
  }

  #[test]
  fn test_name_and_email() {
    assert!(form("", "maria@pausa.test", "long enough").validate().is_err());
    assert!(form("Maria", "nope", "long enough").validate().is_err());
  }

  #[test]
  fn test_role_defaults_to_attendant() {
    assert_eq!(Role::Attendant, form("Maria", "maria@pausa.test", "x").role());
  }
}
