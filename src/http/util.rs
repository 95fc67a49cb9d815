use actix_web::body::MessageBody;
use actix_web::dev::{ServiceRequest, ServiceResponse};
use actix_web::http::header;
use actix_web::middleware::ErrorHandlerResponse;
use actix_web::HttpResponse;
use tracing::Span;
use tracing_actix_web::{DefaultRootSpanBuilder, RootSpanBuilder};

/// Root span builder that logs request spans at DEBUG instead of
/// INFO, so routine traffic stays out of production logs while the
/// span is still there for error reports to attach to.
pub struct QuieterRootSpanBuilder;

impl RootSpanBuilder for QuieterRootSpanBuilder {
  fn on_request_start(request: &ServiceRequest) -> Span {
    tracing_actix_web::root_span!(level = tracing::Level::DEBUG, request)
  }

  fn on_request_end<B: MessageBody>(
    span: Span,
    outcome: &Result<ServiceResponse<B>, actix_web::Error>,
  ) {
    DefaultRootSpanBuilder::on_request_end(span, outcome);
  }
}

/// Normalizes error responses produced outside our handlers (routing
/// misses, extractor failures, panics caught by actix) to the same
/// `{"message": ...}` envelope the taxonomy errors use. Responses
/// that are already JSON pass through untouched.
pub fn handle_actix_web_error<B>(
  res: ServiceResponse<B>,
) -> actix_web::Result<ErrorHandlerResponse<B>> {
  let is_json = res
    .headers()
    .get(header::CONTENT_TYPE)
    .map(|v| v.as_bytes().starts_with(b"application/json"))
    .unwrap_or(false);

  if is_json {
    return Ok(ErrorHandlerResponse::Response(res.map_into_left_body()));
  }

  let (req, res) = res.into_parts();
  let status = res.status();
  let body = serde_json::json!({
    "message": status.canonical_reason().unwrap_or("Unknown error"),
  });

  let res = HttpResponse::build(status).json(body);
  Ok(ErrorHandlerResponse::Response(
    ServiceResponse::new(req, res).map_into_right_body(),
  ))
}
