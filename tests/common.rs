#![allow(dead_code)]

use actix_web::{HttpResponse, Responder, error, web};
use std::fs;
use tempfile::{TempDir, tempdir};
use tera_context::{RequestContext, TemplateEnv};

const TEMPLATES: &[(&str, &str)] = &[
  ("simple/plain.txt", "Hello, World!"),
  ("simple/context.txt", "a = {{ a }}; b = {{ b }}"),
  (
    "simple/req_context.txt",
    "user.is_anonymous() => {% if user.is_anonymous %}True{% else %}False{% endif %}",
  ),
  ("404.html", "NOT FOUND: {{ request.path | safe }}"),
  ("500.html", "ERROR OCCURRED."),
];

// Writes the test templates into a temp dir and builds an env over them.
// The dir is returned so it outlives the env.
pub fn setup_env() -> (TemplateEnv, TempDir) {
  let temp_dir = tempdir().unwrap();
  for (name, content) in TEMPLATES {
    let path = temp_dir.path().join(name);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
  }
  let glob_path = temp_dir.path().join("**").join("*").to_str().unwrap().to_string();

  let env = TemplateEnv::builder(&glob_path).build().unwrap();
  (env, temp_dir)
}

pub async fn plain(ctx: RequestContext) -> impl Responder {
  ctx.render("simple/plain.txt")
}

pub async fn context(ctx: RequestContext) -> impl Responder {
  ctx.with("a", 1).with("b", 2).render("simple/context.txt")
}

pub async fn req_context(ctx: RequestContext) -> impl Responder {
  ctx.render("simple/req_context.txt")
}

pub async fn missing_template(ctx: RequestContext) -> impl Responder {
  ctx.render("simple/missing.txt")
}

pub async fn server_error() -> actix_web::Result<HttpResponse> {
  Err(error::ErrorInternalServerError("view failed"))
}

pub fn simple_routes(cfg: &mut web::ServiceConfig) {
  cfg.service(
    web::scope("/simple")
      .route("/plain/", web::get().to(plain))
      .route("/context/", web::get().to(context))
      .route("/req_context/", web::get().to(req_context))
      .route("/error/", web::get().to(server_error))
      .route("/missing/", web::get().to(missing_template)),
  );
}
