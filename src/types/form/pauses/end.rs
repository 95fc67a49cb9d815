use serde::Deserialize;

use crate::types::{
  validation::{FieldErrors, NOTES_MAX},
  Error,
};

/// Body shared by the self-service end/cancel routes and the
/// supervisor's force-end route.
#[derive(Debug, Default, Deserialize)]
pub struct Request {
  pub notes: Option<String>,
}

impl Request {
  pub fn validate(&self) -> Result<(), Error> {
    let mut fields = FieldErrors::new();
    if let Some(notes) = self.notes.as_deref() {
      if notes.len() > NOTES_MAX {
        fields.push("notes", "Notes are too long");
      }
    }
    fields.into_result()
  }
}
