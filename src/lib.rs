//! # tera-context
//!
//! Request-scoped Tera rendering contexts for Actix Web.
//!
//! ## Features
//!
//! - **Request context middleware:** every request gets a [`RequestContext`]
//!   holding request-derived defaults such as `user` and `request`.
//! - **Context processors:** plug in functions that derive more variables
//!   from the request.
//! - **Render from the request:** extract the context in a handler, add
//!   variables and render a template as the response.
//! - **Test request factory:** [`test::RequestFactory`] builds requests that
//!   carry the same context the middleware would attach.
//! - **Template reloading (`devel` feature):** templates are reloaded from
//!   disk when they change.
//!
//! ## Quickstart
//!
//! ```rust,no_run
//! use actix_web::{App, HttpServer, Responder, web};
//! use tera_context::{RequestContext, RequestContextMiddleware, TemplateEnv, actix::handlers};
//!
//! async fn index(ctx: RequestContext) -> impl Responder {
//!   ctx.with("page_title", "Welcome").render("index.html")
//! }
//!
//! #[actix_web::main]
//! async fn main() -> std::io::Result<()> {
//!   let env = TemplateEnv::builder("templates/**/*")
//!     .add_global("site_name", "My Site")
//!     .build()
//!     .expect("Failed to load templates");
//!
//!   HttpServer::new(move || {
//!     App::new()
//!       .wrap(handlers::error_pages())
//!       .wrap(RequestContextMiddleware::new(env.clone()))
//!       .route("/", web::get().to(index))
//!       .default_service(web::to(handlers::not_found))
//!   })
//!   .bind(("127.0.0.1", 3000))?
//!   .run()
//!   .await
//! }
//! ```

pub mod actix;
pub mod core;
pub mod error;

pub use crate::actix::RequestContextMiddleware;
pub use crate::core::app::{Template, TemplateEnv, TemplateEnvBuilder};
pub use crate::core::context::RequestContext;
pub use crate::core::processors::{ContextProcessor, CurrentUser, RequestInfo};
pub use crate::error::{ContextError, Result};
