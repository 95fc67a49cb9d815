use serde::{Deserialize, Serialize};

use crate::{
  schema::UserView,
  types::{
    validation::{is_valid_email, FieldErrors},
    Error,
  },
  util::Sensitive,
};

#[derive(Debug, Deserialize, Serialize)]
pub struct Request {
  pub email: Sensitive<String>,
  pub password: Sensitive<String>,
}

impl Request {
  pub fn validate(&self) -> Result<(), Error> {
    let mut fields = FieldErrors::new();
    if !is_valid_email(&self.email) {
      fields.push("email", "Invalid e-mail address");
    }
    if self.password.is_empty() {
      fields.push("password", "Password must not be empty");
    }
    fields.into_result()
  }
}

#[derive(Debug, Serialize)]
pub struct Response {
  pub token: Sensitive<String>,
  pub user: UserView,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_rejects_broken_credentials() {
    let form = Request {
      email: "not-an-email".into(),
      password: "hunter2".to_string().into(),
    };
    assert!(form.validate().is_err());

    let form = Request {
      email: "maria@pausa.test".into(),
      password: String::new().into(),
    };
    assert!(form.validate().is_err());

    let form = Request {
      email: "maria@pausa.test".into(),
      password: "hunter2".to_string().into(),
    };
    assert!(form.validate().is_ok());
  }
}
