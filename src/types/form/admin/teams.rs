use serde::Deserialize;

use crate::types::{
  form::double_option,
  validation::{is_valid_name, FieldErrors},
  Error,
};

#[derive(Debug, Deserialize)]
pub struct Create {
  pub name: String,
  pub description: Option<String>,
}

impl Create {
  pub fn validate(&self) -> Result<(), Error> {
    let mut fields = FieldErrors::new();
    if !is_valid_name(&self.name) {
      fields.push("name", "Invalid name");
    }
    fields.into_result()
  }
}

#[derive(Debug, Default, Deserialize)]
pub struct Update {
  pub name: Option<String>,
  #[serde(default, deserialize_with = "double_option")]
  pub description: Option<Option<String>>,
}

impl Update {
  pub fn validate(&self) -> Result<(), Error> {
    let mut fields = FieldErrors::new();
    if matches!(self.name.as_deref(), Some(name) if !is_valid_name(name)) {
      fields.push("name", "Invalid name");
    }
    fields.into_result()
  }
}
