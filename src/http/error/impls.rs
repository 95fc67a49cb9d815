use actix_web::{body::BoxBody, http::StatusCode, HttpResponse};
use error_stack::Report;

use super::Error;
use crate::{database, types::Error as ErrorType};

impl actix_web::ResponseError for Error {
  fn status_code(&self) -> StatusCode {
    match self.as_type() {
      ErrorType::Unauthenticated(..) => StatusCode::UNAUTHORIZED,
      ErrorType::Forbidden(..) => StatusCode::FORBIDDEN,
      ErrorType::NotFound(..) => StatusCode::NOT_FOUND,
      // the web client expects plain 400s for business conflicts and
      // invalid transitions, matching invalid form input
      ErrorType::Conflict { .. } => StatusCode::BAD_REQUEST,
      ErrorType::InvalidState(..) => StatusCode::BAD_REQUEST,
      ErrorType::InvalidFormBody(..) => StatusCode::BAD_REQUEST,
      ErrorType::ReadonlyMode => StatusCode::SERVICE_UNAVAILABLE,
      ErrorType::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }

  fn error_response(&self) -> HttpResponse<BoxBody> {
    if matches!(self.as_type(), ErrorType::Internal) {
      tracing::error!(error = %self, "unexpected failure while handling a request");
    }
    HttpResponse::build(self.status_code()).json(self.as_type())
  }
}

impl From<ErrorType> for Error {
  fn from(value: ErrorType) -> Self {
    Error::new(value)
  }
}

impl From<Report<database::Error>> for Error {
  fn from(value: Report<database::Error>) -> Self {
    match value.current_context() {
      database::Error::Readonly => Error::from_report(ErrorType::ReadonlyMode, value),
      _ => Error::from_report(ErrorType::Internal, value),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use actix_web::ResponseError;

  #[test]
  fn test_status_codes_follow_the_taxonomy() {
    let cases = [
      (
        Error::new(ErrorType::unauthenticated("Authentication required")),
        StatusCode::UNAUTHORIZED,
      ),
      (
        Error::new(ErrorType::forbidden("Access denied")),
        StatusCode::FORBIDDEN,
      ),
      (
        Error::new(ErrorType::not_found("Pause record not found")),
        StatusCode::NOT_FOUND,
      ),
      (
        Error::new(ErrorType::duplicate_running_pause(None)),
        StatusCode::BAD_REQUEST,
      ),
      (
        Error::new(ErrorType::invalid_state("Already finished")),
        StatusCode::BAD_REQUEST,
      ),
      (Error::new(ErrorType::Internal), StatusCode::INTERNAL_SERVER_ERROR),
    ];

    for (error, expected) in cases {
      assert_eq!(expected, error.status_code());
    }
  }
}
