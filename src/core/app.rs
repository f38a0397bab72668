use crate::core::context::RequestContext;
use crate::core::processors::{self, ContextProcessor, RequestInfo, SharedProcessor};
use crate::error::{ContextError, Result};

use parking_lot::RwLock;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tera::{Context, Tera};

#[cfg(feature = "devel")]
use crate::core::reload::TemplateReloader;

/// A framework-agnostic representation of a template to be rendered.
///
/// Created by [`TemplateEnv::render`] or [`RequestContext::render`]. The Actix
/// layer implements `Responder` for it, so rendering is deferred until the
/// response is built.
pub struct Template {
  pub(crate) env: TemplateEnv,
  pub(crate) template_name: String,
  pub(crate) context: Context,
}

impl Template {
  pub fn name(&self) -> &str {
    &self.template_name
  }

  pub fn context(&self) -> &Context {
    &self.context
  }

  /// Renders the template right away instead of waiting for a response.
  pub fn render_to_string(&self) -> Result<String> {
    self.env.render_with_context(&self.template_name, self.context.clone())
  }
}

/// The shared template environment, designed to be cloned into every worker.
///
/// It holds the Tera engine, the global variables available to every template
/// and the context processors run for every request. Create one with
/// [`TemplateEnv::builder`].
#[derive(Clone)]
pub struct TemplateEnv {
  /// Wrapped for thread-safe access and mutability (for reloads).
  pub(crate) tera: Arc<RwLock<Tera>>,
  pub(crate) global_context: Arc<Context>,
  pub(crate) processors: Arc<Vec<SharedProcessor>>,
  /// Keeps the file watcher alive for as long as any clone of the env exists.
  #[cfg(feature = "devel")]
  _reloader: Option<Arc<TemplateReloader>>,
}

impl fmt::Debug for TemplateEnv {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("TemplateEnv")
      .field("tera", &self.tera)
      .field("global_context", &self.global_context)
      .field("processors", &self.processors.len())
      .finish()
  }
}

impl TemplateEnv {
  /// Creates a new `TemplateEnvBuilder` to configure and build a `TemplateEnv`.
  ///
  /// # Arguments
  ///
  /// * `templates_glob` - A glob pattern (e.g., "templates/**/*.html") for Tera to find templates.
  pub fn builder(templates_glob: &str) -> TemplateEnvBuilder {
    TemplateEnvBuilder::new(templates_glob)
  }

  /// Builds the request-scoped context for `info` by running every processor in order.
  pub fn context_for(&self, info: &RequestInfo) -> Result<RequestContext> {
    let context = processors::run_all(&self.processors, info)?;
    Ok(RequestContext::new(self.clone(), context))
  }

  /// Returns whether a template with this name is loaded.
  pub fn has_template(&self, tpl: &str) -> bool {
    self.tera.read().get_template_names().any(|name| name == tpl)
  }

  /// Takes a template name and a user-provided context, merges it over the
  /// globals, and renders the template to a string.
  pub(crate) fn render_with_context(&self, tpl: &str, user_context: Context) -> Result<String> {
    let tera = self.tera.read();

    let mut final_context = (*self.global_context).clone();
    // User values overwrite the globals.
    final_context.extend(user_context);

    let body = tera.render(tpl, &final_context).map_err(ContextError::Tera)?;
    log::debug!("Rendered template {}", tpl);

    Ok(body)
  }

  /// Renders `tpl` with `context` layered over the globals.
  pub fn render_to_string(&self, tpl: &str, context: Context) -> Result<String> {
    self.render_with_context(tpl, context)
  }

  /// Creates a deferred render. No request defaults are applied.
  pub fn render(&self, tpl: &str, context: Context) -> Template {
    Template {
      env: self.clone(),
      template_name: tpl.to_string(),
      context,
    }
  }
}

/// A builder for creating a configured `TemplateEnv` instance.
pub struct TemplateEnvBuilder {
  templates_glob: String,
  globals: Context,
  processors: Vec<SharedProcessor>,
  raw_templates: Vec<(String, String)>,
  // Run against the Tera instance before it is shared.
  tera_configurator: Option<Box<dyn FnOnce(&mut Tera)>>,
  #[cfg(feature = "devel")]
  auto_reload: bool,
}

impl TemplateEnvBuilder {
  pub(crate) fn new(templates_glob: &str) -> Self {
    Self {
      templates_glob: templates_glob.to_string(),
      globals: Context::new(),
      processors: processors::default_processors(),
      raw_templates: Vec::new(),
      tera_configurator: None,
      #[cfg(feature = "devel")]
      auto_reload: false,
    }
  }

  /// Adds a global variable that will be available to all templates.
  ///
  /// Request defaults and view variables with the same key take precedence.
  pub fn add_global<S: Into<String>, T: Serialize>(mut self, key: S, value: T) -> Self {
    self.globals.insert(key, &value);
    self
  }

  /// Appends a context processor. Processors run in the order they were added,
  /// after the built-in `auth` and `request` processors.
  pub fn add_processor<P: ContextProcessor>(mut self, processor: P) -> Self {
    self.processors.push(Arc::new(processor));
    self
  }

  /// Removes every processor, including the built-in ones.
  pub fn clear_processors(mut self) -> Self {
    self.processors.clear();
    self
  }

  /// Adds a template from a string.
  ///
  /// Raw templates survive template reloads. A template file with the same
  /// name takes precedence, and a raw template cannot extend a file template.
  pub fn add_raw_template<N: Into<String>, C: Into<String>>(mut self, name: N, content: C) -> Self {
    self.raw_templates.push((name.into(), content.into()));
    self
  }

  /// Provides a closure to run for advanced configuration of the `Tera` instance.
  ///
  /// This is the place to register custom functions, filters or testers before
  /// the environment is finalized. Templates added here are dropped by a
  /// reload; use [`add_raw_template`](Self::add_raw_template) instead.
  pub fn configure_tera<F>(mut self, configurator: F) -> Self
  where
    F: FnOnce(&mut Tera) + 'static,
  {
    self.tera_configurator = Some(Box::new(configurator));
    self
  }

  /// Reloads templates from disk whenever they change.
  ///
  /// Defaults to `false`.
  #[cfg(feature = "devel")]
  pub fn auto_reload(mut self, enabled: bool) -> Self {
    self.auto_reload = enabled;
    self
  }

  /// Consumes the builder to construct the final `TemplateEnv`.
  ///
  /// A glob that matches no files is not an error; rendering an unknown
  /// template is.
  pub fn build(self) -> Result<TemplateEnv> {
    let mut tera = Tera::new(&self.templates_glob)?;

    if let Some(configurator) = self.tera_configurator {
      configurator(&mut tera);
    }

    // Merged through `extend` so `full_reload` keeps them.
    if !self.raw_templates.is_empty() {
      let mut raw = Tera::default();
      raw.add_raw_templates(self.raw_templates)?;
      tera.extend(&raw)?;
    }

    log::debug!(
      "Loaded {} templates from {}",
      tera.get_template_names().count(),
      self.templates_glob
    );

    let tera = Arc::new(RwLock::new(tera));

    Ok(TemplateEnv {
      #[cfg(feature = "devel")]
      _reloader: if self.auto_reload {
        let reloader = TemplateReloader::start(Arc::clone(&tera), &self.templates_glob)?;
        Some(Arc::new(reloader))
      } else {
        None
      },
      tera,
      global_context: Arc::new(self.globals),
      processors: Arc::new(self.processors),
    })
  }
}
