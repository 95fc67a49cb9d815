use serde::Deserialize;

use crate::types::{
  id::{marker::PauseTypeMarker, Id},
  validation::{FieldErrors, NOTES_MAX},
  Error,
};

#[derive(Debug, Deserialize)]
pub struct Request {
  pub pause_type_id: Id<PauseTypeMarker>,
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

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_caps_note_length() {
    let form = Request {
      pause_type_id: Id::new(1),
      notes: Some("coffee with the team".into()),
    };
    assert!(form.validate().is_ok());

    let form = Request {
      pause_type_id: Id::new(1),
      notes: Some("x".repeat(NOTES_MAX + 1)),
    };
    assert!(form.validate().is_err());
  }
}
