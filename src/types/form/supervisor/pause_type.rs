use serde::Deserialize;

use crate::types::{
  validation::{is_valid_name, FieldErrors},
  Error,
};

#[derive(Debug, Deserialize)]
pub struct Request {
  pub name: String,
  pub description: Option<String>,
  pub max_duration_mins: Option<i32>,
}

impl Request {
  pub fn validate(&self) -> Result<(), Error> {
    let mut fields = FieldErrors::new();
    if !is_valid_name(&self.name) {
      fields.push("name", "Invalid name");
    }
    if matches!(self.max_duration_mins, Some(n) if n <= 0) {
      fields.push("max_duration_mins", "Maximum duration must be positive");
    }
    fields.into_result()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_max_duration_must_be_positive() {
    let form = Request {
      name: "Almoço".into(),
      description: None,
      max_duration_mins: Some(0),
    };
    assert!(form.validate().is_err());

    let form = Request {
      name: "Almoço".into(),
      description: None,
      max_duration_mins: Some(60),
    };
    assert!(form.validate().is_ok());

    // uncapped types are allowed
    let form = Request {
      name: "Reunião".into(),
      description: None,
      max_duration_mins: None,
    };
    assert!(form.validate().is_ok());
  }
}
