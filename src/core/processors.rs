//! Context processors derive default template variables from the request.
//!
//! A processor receives a [`RequestInfo`] snapshot rather than the framework's
//! request type, which keeps this module independent of Actix. The Actix layer
//! builds the snapshot in [`crate::actix::request_info`].

use crate::error::{ContextError, Result};

use serde::Serialize;
use std::sync::Arc;
use tera::Context;

/// The user a request is made on behalf of.
///
/// Authentication middleware that runs before [`RequestContextMiddleware`]
/// can insert one of these into the request extensions. Requests without one
/// are treated as anonymous.
///
/// [`RequestContextMiddleware`]: crate::actix::RequestContextMiddleware
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CurrentUser {
  pub username: String,
  pub is_anonymous: bool,
  pub is_authenticated: bool,
}

impl CurrentUser {
  pub fn anonymous() -> Self {
    Self {
      username: String::new(),
      is_anonymous: true,
      is_authenticated: false,
    }
  }

  pub fn authenticated<S: Into<String>>(username: S) -> Self {
    Self {
      username: username.into(),
      is_anonymous: false,
      is_authenticated: true,
    }
  }
}

impl Default for CurrentUser {
  fn default() -> Self {
    Self::anonymous()
  }
}

/// A framework-agnostic view of the parts of a request processors may read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequestInfo {
  pub method: String,
  pub path: String,
  pub query_string: String,
  pub user: CurrentUser,
}

impl RequestInfo {
  pub fn new<M: Into<String>, P: Into<String>>(method: M, path: P) -> Self {
    Self {
      method: method.into(),
      path: path.into(),
      query_string: String::new(),
      user: CurrentUser::anonymous(),
    }
  }

  pub fn with_query<Q: Into<String>>(mut self, query_string: Q) -> Self {
    self.query_string = query_string.into();
    self
  }

  pub fn with_user(mut self, user: CurrentUser) -> Self {
    self.user = user;
    self
  }
}

/// Adds request-derived variables to a rendering context.
///
/// Implemented for any `Fn(&RequestInfo, &mut Context) -> Result<()>`, so most
/// processors are plain functions or closures.
pub trait ContextProcessor: Send + Sync + 'static {
  fn process(&self, info: &RequestInfo, context: &mut Context) -> Result<()>;
}

impl<F> ContextProcessor for F
where
  F: Fn(&RequestInfo, &mut Context) -> Result<()> + Send + Sync + 'static,
{
  fn process(&self, info: &RequestInfo, context: &mut Context) -> Result<()> {
    self(info, context)
  }
}

pub(crate) type SharedProcessor = Arc<dyn ContextProcessor>;

/// Inserts `user`, falling back to an anonymous user.
pub fn auth(info: &RequestInfo, context: &mut Context) -> Result<()> {
  context.insert("user", &info.user);
  Ok(())
}

#[derive(Serialize)]
struct RequestVars<'a> {
  method: &'a str,
  path: &'a str,
  query_string: &'a str,
}

/// Inserts `request` with the method, path and query string.
pub fn request(info: &RequestInfo, context: &mut Context) -> Result<()> {
  context.insert(
    "request",
    &RequestVars {
      method: &info.method,
      path: &info.path,
      query_string: &info.query_string,
    },
  );
  Ok(())
}

/// The processors every new builder starts with.
pub(crate) fn default_processors() -> Vec<SharedProcessor> {
  let auth: SharedProcessor = Arc::new(auth);
  let request: SharedProcessor = Arc::new(request);
  vec![auth, request]
}

/// Runs `processors` in order against a fresh context.
pub(crate) fn run_all(processors: &[SharedProcessor], info: &RequestInfo) -> Result<Context> {
  let mut context = Context::new();
  for processor in processors {
    processor.process(info, &mut context).map_err(|e| match e {
      ContextError::Processor(_) => e,
      other => ContextError::Processor(other.to_string()),
    })?;
  }
  Ok(context)
}
