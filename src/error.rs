use thiserror::Error;

/// A specialized `Result` type for `tera-context` operations.
pub type Result<T, E = ContextError> = std::result::Result<T, E>;

/// The primary error type for all `tera-context` operations.
#[derive(Debug, Error)]
pub enum ContextError {
  /// An error originating from the `tera` templating engine.
  #[error("Tera rendering error: {0}")]
  Tera(#[from] tera::Error),

  /// A context processor refused to build the request context.
  #[error("Context processor error: {0}")]
  Processor(String),

  /// A handler asked for the request context but the middleware never attached one.
  #[error("No request context attached; is RequestContextMiddleware installed?")]
  MissingContext,

  /// An error from the file watcher, only available with the `devel` feature.
  #[cfg(feature = "devel")]
  #[error("File watcher error: {0}")]
  Watcher(#[from] notify::Error),
}
