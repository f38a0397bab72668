use crate::core::app::{Template, TemplateEnv};
use crate::core::context::RequestContext;
use crate::core::processors::{CurrentUser, RequestInfo};
use crate::error::ContextError;
use actix_web::{
  FromRequest, HttpMessage, HttpRequest, HttpResponse, Responder, ResponseError,
  body::BoxBody,
  dev::Payload,
  http::{StatusCode, header::ContentType},
  web,
};
use futures_util::future::{Ready, ready};
use std::path::Path;

pub mod handlers;
mod middleware;

pub use middleware::{RequestContextMiddleware, RequestContextService};

impl Responder for Template {
  type Body = BoxBody;

  fn respond_to(self, _req: &HttpRequest) -> HttpResponse<Self::Body> {
    match self.env.render_with_context(&self.template_name, self.context) {
      Ok(body) => HttpResponse::Ok()
        .content_type(content_type_for(&self.template_name))
        .body(body),
      Err(e) => {
        log::error!("Template rendering error: {:?}", e);
        HttpResponse::from_error(e)
      }
    }
  }
}

/// Picks the response content type from the template's file extension.
fn content_type_for(template_name: &str) -> ContentType {
  match Path::new(template_name).extension().and_then(|ext| ext.to_str()) {
    Some("txt") => ContentType::plaintext(),
    Some("xml") => ContentType::xml(),
    Some("json") => ContentType::json(),
    _ => ContentType::html(),
  }
}

impl FromRequest for RequestContext {
  type Error = actix_web::Error;
  type Future = Ready<Result<Self, Self::Error>>;

  fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
    let context = req.extensions().get::<RequestContext>().cloned();
    ready(context.ok_or_else(|| {
      log::error!("RequestContext requested for {} but none was attached", req.path());
      ContextError::MissingContext.into()
    }))
  }
}

impl ResponseError for ContextError {
  fn status_code(&self) -> StatusCode {
    StatusCode::INTERNAL_SERVER_ERROR
  }
}

/// Snapshots the parts of `req` that context processors may read.
///
/// The user comes from a [`CurrentUser`] in the request extensions, when an
/// upstream middleware put one there.
pub fn request_info(req: &HttpRequest) -> RequestInfo {
  let user = req.extensions().get::<CurrentUser>().cloned().unwrap_or_default();
  RequestInfo::new(req.method().as_str(), req.path())
    .with_query(req.query_string())
    .with_user(user)
}

/// The context attached by the middleware, or one built on the spot from a
/// `web::Data<TemplateEnv>` when the middleware is not installed.
pub(crate) fn find_context(req: &HttpRequest) -> Option<RequestContext> {
  if let Some(context) = req.extensions().get::<RequestContext>() {
    return Some(context.clone());
  }

  let env = req.app_data::<web::Data<TemplateEnv>>()?;
  match env.context_for(&request_info(req)) {
    Ok(context) => Some(context),
    Err(e) => {
      log::error!("Failed to build fallback request context: {}", e);
      None
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use actix_web::App;
  use actix_web::test::{self as actix_test, TestRequest};

  fn env() -> TemplateEnv {
    TemplateEnv::builder("/does/not/exist/*.html")
      .add_raw_template("hello.txt", "Hello, {{ name }}!")
      .add_raw_template("hello.html", "Hello, {{ name }}!")
      .build()
      .unwrap()
  }

  #[test]
  fn test_request_info_reads_method_path_query_and_user() {
    let req = TestRequest::post().uri("/a/b/?x=1").to_http_request();
    req.extensions_mut().insert(CurrentUser::authenticated("carol"));

    let info = request_info(&req);

    assert_eq!(info.method, "POST");
    assert_eq!(info.path, "/a/b/");
    assert_eq!(info.query_string, "x=1");
    assert_eq!(info.user, CurrentUser::authenticated("carol"));
  }

  #[test]
  fn test_request_info_defaults_to_anonymous() {
    let req = TestRequest::get().to_http_request();
    assert!(request_info(&req).user.is_anonymous);
  }

  #[actix_rt::test]
  async fn test_extractor_fails_without_middleware() {
    let req = TestRequest::get().to_http_request();

    let err = RequestContext::extract(&req).await.unwrap_err();

    assert_eq!(err.as_response_error().status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(err.to_string().contains("RequestContextMiddleware"));
  }

  async fn render_hello(env: web::Data<TemplateEnv>, name: web::Path<String>) -> Template {
    let mut context = tera::Context::new();
    context.insert("name", "Responder");
    env.render(&name, context)
  }

  async fn get(uri: &str) -> actix_web::dev::ServiceResponse {
    let app = actix_test::init_service(
      App::new()
        .app_data(web::Data::new(env()))
        .route("/{name}", web::get().to(render_hello)),
    )
    .await;
    actix_test::call_service(&app, TestRequest::get().uri(uri).to_request()).await
  }

  fn content_type(resp: &actix_web::dev::ServiceResponse) -> String {
    resp.headers().get("content-type").unwrap().to_str().unwrap().to_string()
  }

  #[actix_rt::test]
  async fn test_template_responder_renders_html() {
    let resp = get("/hello.html").await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(content_type(&resp).contains("text/html"));

    let body = actix_test::read_body(resp).await;
    assert_eq!(body, "Hello, Responder!");
  }

  #[actix_rt::test]
  async fn test_template_responder_uses_extension_for_content_type() {
    let resp = get("/hello.txt").await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(content_type(&resp).contains("text/plain"));
  }

  #[actix_rt::test]
  async fn test_template_responder_reports_missing_template_as_server_error() {
    let resp = get("/missing.html").await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body = actix_test::read_body(resp).await;
    assert!(std::str::from_utf8(&body).unwrap().contains("missing.html"));
  }

  #[test]
  fn test_content_type_for() {
    assert_eq!(content_type_for("a/b.txt").0.essence_str(), "text/plain");
    assert_eq!(content_type_for("feed.xml").0.essence_str(), "text/xml");
    assert_eq!(content_type_for("page.html").0.essence_str(), "text/html");
    assert_eq!(content_type_for("no_extension").0.essence_str(), "text/html");
  }

  #[test]
  fn test_find_context_falls_back_to_app_data() {
    let req = TestRequest::get()
      .uri("/fallback/")
      .app_data(web::Data::new(env()))
      .to_http_request();

    let context = find_context(&req).unwrap();
    assert_eq!(context.get("request").unwrap()["path"], "/fallback/");
  }

  #[test]
  fn test_find_context_none_without_env() {
    let req = TestRequest::get().to_http_request();
    assert!(find_context(&req).is_none());
  }
}
