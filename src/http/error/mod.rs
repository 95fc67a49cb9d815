use error_stack::{Context, Report};
use tracing_error::SpanTrace;

use crate::types;

mod impls;

pub type Result<T> = std::result::Result<T, Error>;

/// Opaque head of every report carried by [`Error`]. Erasing the
/// concrete context behind it lets one wrapper type hold reports of
/// any origin without resorting to unsafe casts.
#[derive(Debug, thiserror::Error)]
#[error("request handler failed")]
struct HandlerFailure;

/// A failed request: the public [taxonomy kind](types::Error) sent to
/// the client, plus the full report and the span trace kept for the
/// server logs.
pub struct Error {
  error_type: types::Error,
  report: Report<HandlerFailure>,
  trace: SpanTrace,
}

impl Error {
  #[must_use]
  pub fn new(error_type: types::Error) -> Self {
    Self {
      error_type,
      report: Report::new(HandlerFailure),
      trace: SpanTrace::capture(),
    }
  }

  #[must_use]
  pub fn from_context(error_type: types::Error, context: impl Context) -> Self {
    Self {
      error_type,
      report: Report::new(context).change_context(HandlerFailure),
      trace: SpanTrace::capture(),
    }
  }

  #[must_use]
  pub fn from_report(error_type: types::Error, report: Report<impl Context>) -> Self {
    Self {
      error_type,
      report: report.change_context(HandlerFailure),
      trace: SpanTrace::capture(),
    }
  }
}

impl Error {
  #[must_use]
  pub fn as_type(&self) -> &types::Error {
    &self.error_type
  }

  #[must_use]
  pub fn change_type(mut self, error_type: types::Error) -> Self {
    self.error_type = error_type;
    self
  }

  #[must_use]
  pub fn downcast_ref<F: Context>(&self) -> Option<&F> {
    self.report.downcast_ref::<F>()
  }
}

impl std::fmt::Debug for Error {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Error")
      .field("type", &self.error_type)
      .field("report", &self.report)
      .field("trace", &self.trace)
      .finish()
  }
}

impl std::fmt::Display for Error {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}: ", &self.error_type)?;
    writeln!(f, "{:?}", self.report)?;
    std::fmt::Display::fmt(&self.trace, f)
  }
}
