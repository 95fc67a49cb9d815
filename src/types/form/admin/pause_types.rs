use serde::Deserialize;

use crate::types::{
  form::double_option,
  validation::{is_valid_name, FieldErrors},
  Error,
};

/// Admins may rename, re-describe, re-cap or (de)activate a catalog
/// entry; creation belongs to the supervisor surface and deletion is
/// not offered at all (existing records restrict it).
#[derive(Debug, Default, Deserialize)]
pub struct Update {
  pub name: Option<String>,
  #[serde(default, deserialize_with = "double_option")]
  pub description: Option<Option<String>>,
  #[serde(default, deserialize_with = "double_option")]
  pub max_duration_mins: Option<Option<i32>>,
  pub active: Option<bool>,
}

impl Update {
  pub fn validate(&self) -> Result<(), Error> {
    let mut fields = FieldErrors::new();
    if matches!(self.name.as_deref(), Some(name) if !is_valid_name(name)) {
      fields.push("name", "Invalid name");
    }
    if matches!(self.max_duration_mins, Some(Some(n)) if n <= 0) {
      fields.push("max_duration_mins", "Maximum duration must be positive");
    }
    fields.into_result()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_unsetting_the_cap_is_allowed() {
    let form: Update = serde_json::from_str(r#"{"max_duration_mins": null}"#).unwrap();
    assert_eq!(Some(None), form.max_duration_mins);
    assert!(form.validate().is_ok());

    let form: Update = serde_json::from_str(r#"{"max_duration_mins": 0}"#).unwrap();
    assert!(form.validate().is_err());
  }
}
