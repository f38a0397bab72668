//! Error pages rendered with the request context.
//!
//! ```rust,no_run
//! use actix_web::{App, web};
//! use tera_context::{RequestContextMiddleware, TemplateEnv, actix::handlers};
//!
//! let env = TemplateEnv::builder("templates/**/*").build().unwrap();
//! let app = App::new()
//!   .wrap(handlers::error_pages())
//!   .wrap(RequestContextMiddleware::new(env))
//!   .default_service(web::to(handlers::not_found));
//! ```

use crate::actix::find_context;
use actix_web::{
  HttpRequest, HttpResponse,
  dev::ServiceResponse,
  http::{
    StatusCode,
    header::{self, ContentType, HeaderValue},
  },
  middleware::{ErrorHandlerResponse, ErrorHandlers},
};

pub const NOT_FOUND_TEMPLATE: &str = "404.html";
pub const SERVER_ERROR_TEMPLATE: &str = "500.html";

/// Default service for unmatched routes.
///
/// Renders `404.html` when the env has it, otherwise answers with
/// `NOT FOUND: <path>` as plain text.
pub async fn not_found(req: HttpRequest) -> HttpResponse {
  log::debug!("No route for {} {}", req.method(), req.path());

  if let Some(body) = render_error_page(&req, NOT_FOUND_TEMPLATE) {
    return HttpResponse::NotFound().content_type(ContentType::html()).body(body);
  }

  HttpResponse::NotFound()
    .content_type(ContentType::plaintext())
    .body(format!("NOT FOUND: {}", req.path()))
}

/// `ErrorHandlers` hook that swaps a 500 body for the rendered `500.html`.
///
/// The original response is passed through untouched when the page cannot be
/// rendered.
pub fn server_error<B>(res: ServiceResponse<B>) -> actix_web::Result<ErrorHandlerResponse<B>> {
  let Some(body) = render_error_page(res.request(), SERVER_ERROR_TEMPLATE) else {
    return Ok(ErrorHandlerResponse::Response(res.map_into_left_body()));
  };

  let (req, res) = res.into_parts();
  let mut res = res.set_body(body);
  res
    .headers_mut()
    .insert(header::CONTENT_TYPE, HeaderValue::from_static("text/html; charset=utf-8"));

  let res = ServiceResponse::new(req, res).map_into_boxed_body().map_into_right_body();
  Ok(ErrorHandlerResponse::Response(res))
}

/// An `ErrorHandlers` middleware with [`server_error`] registered for 500.
pub fn error_pages<B: 'static>() -> ErrorHandlers<B> {
  ErrorHandlers::new().handler(StatusCode::INTERNAL_SERVER_ERROR, server_error)
}

fn render_error_page(req: &HttpRequest, template: &str) -> Option<String> {
  let context = find_context(req)?;
  if !context.env().has_template(template) {
    return None;
  }

  match context.render_to_string(template) {
    Ok(body) => Some(body),
    Err(e) => {
      log::error!("Failed to render {}: {}", template, e);
      None
    }
  }
}
