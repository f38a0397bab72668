use crate::core::app::{Template, TemplateEnv};
use crate::error::Result;

use serde::Serialize;
use std::fmt;
use tera::{Context, Value};

/// The rendering context attached to a single request.
///
/// Holds the variables produced by the env's context processors, plus whatever
/// the view adds. It keeps a handle to the [`TemplateEnv`] so views can render
/// straight from it:
///
/// ```rust,no_run
/// use actix_web::Responder;
/// use tera_context::RequestContext;
///
/// async fn greet(ctx: RequestContext) -> impl Responder {
///   ctx.with("name", "World").render("greet.html")
/// }
/// ```
#[derive(Clone)]
pub struct RequestContext {
  env: TemplateEnv,
  context: Context,
}

impl fmt::Debug for RequestContext {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("RequestContext").field("context", &self.context).finish()
  }
}

impl RequestContext {
  pub(crate) fn new(env: TemplateEnv, context: Context) -> Self {
    Self { env, context }
  }

  pub fn env(&self) -> &TemplateEnv {
    &self.env
  }

  pub fn context(&self) -> &Context {
    &self.context
  }

  pub fn into_context(self) -> Context {
    self.context
  }

  pub fn get(&self, key: &str) -> Option<&Value> {
    self.context.get(key)
  }

  pub fn contains_key(&self, key: &str) -> bool {
    self.context.contains_key(key)
  }

  /// Adds or overwrites a variable.
  pub fn insert<S: Into<String>, T: Serialize + ?Sized>(&mut self, key: S, value: &T) {
    self.context.insert(key, value);
  }

  /// Chaining form of [`insert`](Self::insert).
  pub fn with<S: Into<String>, T: Serialize>(mut self, key: S, value: T) -> Self {
    self.context.insert(key, &value);
    self
  }

  /// Merges `other` into this context. Keys from `other` win.
  pub fn extend(&mut self, other: Context) {
    self.context.extend(other);
  }

  /// Renders `tpl` now, layering globals, request defaults and view variables.
  pub fn render_to_string(&self, tpl: &str) -> Result<String> {
    self.env.render_with_context(tpl, self.context.clone())
  }

  /// Creates a deferred render of `tpl` with this context.
  pub fn render(self, tpl: &str) -> Template {
    Template {
      env: self.env,
      template_name: tpl.to_string(),
      context: self.context,
    }
  }

  /// Like [`render`](Self::render), with `extra` merged in for this render only.
  pub fn render_with(&self, tpl: &str, extra: Context) -> Template {
    let mut context = self.context.clone();
    context.extend(extra);
    Template {
      env: self.env.clone(),
      template_name: tpl.to_string(),
      context,
    }
  }
}
