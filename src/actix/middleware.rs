use crate::actix::request_info;
use crate::core::app::TemplateEnv;
use crate::error::Result;
use actix_web::{
  Error, HttpMessage, HttpRequest,
  dev::{Service, ServiceRequest, ServiceResponse, Transform},
};
use futures_util::future::{self, LocalBoxFuture};
use std::{rc::Rc, task::Poll};

/// Attaches a [`RequestContext`] to every request before it reaches a handler.
///
/// ```rust,no_run
/// use actix_web::App;
/// use tera_context::{RequestContextMiddleware, TemplateEnv};
///
/// let env = TemplateEnv::builder("templates/**/*").build().unwrap();
/// let app = App::new().wrap(RequestContextMiddleware::new(env));
/// ```
///
/// [`RequestContext`]: crate::RequestContext
#[derive(Debug, Clone)]
pub struct RequestContextMiddleware {
  env: TemplateEnv,
}

impl RequestContextMiddleware {
  pub fn new(env: TemplateEnv) -> Self {
    Self { env }
  }

  pub fn env(&self) -> &TemplateEnv {
    &self.env
  }

  /// Runs the env's context processors for `req` and stores the result in its
  /// extensions, replacing any context already there.
  pub fn process_request(&self, req: &HttpRequest) -> Result<()> {
    let info = request_info(req);
    let context = self.env.context_for(&info)?;
    req.extensions_mut().insert(context);
    log::trace!("Attached request context for {} {}", info.method, info.path);
    Ok(())
  }
}

impl<S, B> Transform<S, ServiceRequest> for RequestContextMiddleware
where
  S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
  B: 'static,
{
  type Response = ServiceResponse<B>;
  type Error = Error;
  type Transform = RequestContextService<S>;
  type InitError = ();
  type Future = future::Ready<Result<Self::Transform, Self::InitError>>;

  fn new_transform(&self, service: S) -> Self::Future {
    future::ok(RequestContextService {
      service: Rc::new(service),
      hook: self.clone(),
    })
  }
}

pub struct RequestContextService<S> {
  service: Rc<S>,
  hook: RequestContextMiddleware,
}

impl<S, B> Service<ServiceRequest> for RequestContextService<S>
where
  S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
  B: 'static,
{
  type Response = ServiceResponse<B>;
  type Error = Error;
  type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

  fn poll_ready(&self, cx: &mut std::task::Context<'_>) -> Poll<Result<(), Self::Error>> {
    self.service.poll_ready(cx)
  }

  fn call(&self, req: ServiceRequest) -> Self::Future {
    if let Err(e) = self.hook.process_request(req.request()) {
      log::error!("Failed to attach request context: {}", e);
      return Box::pin(future::err(e.into()));
    }

    let service = Rc::clone(&self.service);
    Box::pin(async move { service.call(req).await })
  }
}
