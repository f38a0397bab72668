use crate::error::{ContextError, Result};
use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};
use parking_lot::RwLock;
use std::path::Path;
use std::sync::Arc;
use tera::Tera;

/// Watches the template directory and reloads Tera when a template changes.
///
/// The watcher runs on its own thread. Dropping the reloader drops the watcher,
/// which stops it.
#[derive(Debug)]
pub(crate) struct TemplateReloader {
  _watcher: RecommendedWatcher,
}

impl TemplateReloader {
  pub(crate) fn start(tera: Arc<RwLock<Tera>>, template_glob: &str) -> Result<Self> {
    let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
      let event = match res {
        Ok(event) => event,
        Err(e) => {
          log::error!("File watch error: {:?}", e);
          return;
        }
      };

      if !(event.kind.is_modify() || event.kind.is_create() || event.kind.is_remove()) {
        return;
      }

      if event.paths.iter().any(|path| is_template(path)) {
        log::info!("Template change detected: {:?}", event.paths);
        if let Err(e) = tera.write().full_reload() {
          log::error!("Failed to reload templates: {}", e);
        }
      }
    })?;

    let watch_path = base_path_from_glob(template_glob);
    if !Path::new(watch_path).exists() {
      return Err(ContextError::Watcher(notify::Error::path_not_found().add_path(watch_path.into())));
    }
    log::debug!("Watching template path: {}", watch_path);
    watcher
      .watch(Path::new(watch_path), RecursiveMode::Recursive)
      .map_err(ContextError::Watcher)?;

    Ok(Self { _watcher: watcher })
  }
}

fn is_template(path: &Path) -> bool {
  matches!(
    path.extension().and_then(|s| s.to_str()),
    Some("html") | Some("htm") | Some("tera") | Some("jinja") | Some("txt") | Some("xml")
  )
}

/// Extracts the non-glob base path from a glob pattern.
///
/// `notify` cannot watch a glob, so this finds the deepest parent directory
/// that contains no glob characters.
fn base_path_from_glob(glob: &str) -> &str {
  if let Some(first_glob_char_index) = glob.find(['*', '?', '{', '[']) {
    let before_glob = &glob[..first_glob_char_index];
    match before_glob.rfind('/') {
      Some(0) => "/",
      Some(last_separator_index) => &glob[..last_separator_index],
      None => ".",
    }
  } else {
    let path = Path::new(glob);
    if path.is_dir() {
      glob
    } else {
      path.parent().and_then(|p| p.to_str()).filter(|p| !p.is_empty()).unwrap_or(".")
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::fs;
  use std::time::Duration;
  use tempfile::tempdir;

  #[test]
  fn test_base_path_from_glob() {
    assert_eq!(base_path_from_glob("templates/**/*.html"), "templates");
    assert_eq!(base_path_from_glob("/srv/app/templates/*.html"), "/srv/app/templates");
    assert_eq!(base_path_from_glob("*.html"), ".");
    assert_eq!(base_path_from_glob("/*.html"), "/");
    assert_eq!(base_path_from_glob("index.html"), ".");
  }

  #[test]
  fn test_is_template() {
    assert!(is_template(Path::new("a/b/index.html")));
    assert!(is_template(Path::new("plain.txt")));
    assert!(!is_template(Path::new("style.css")));
    assert!(!is_template(Path::new("README")));
  }

  #[test]
  fn test_start_fails_for_missing_directory() {
    let tera = Arc::new(RwLock::new(Tera::default()));
    let err = TemplateReloader::start(tera, "/definitely/not/here/*.html").unwrap_err();
    assert!(matches!(err, ContextError::Watcher(_)));
  }

  #[tokio::test]
  async fn test_template_change_triggers_reload() {
    let temp_dir = tempdir().unwrap();
    let template_path = temp_dir.path().join("index.html");
    fs::write(&template_path, "before").unwrap();
    let glob_path = temp_dir.path().join("*.html").to_str().unwrap().to_string();

    let tera = Arc::new(RwLock::new(Tera::new(&glob_path).unwrap()));
    let _reloader = TemplateReloader::start(Arc::clone(&tera), &glob_path).unwrap();

    fs::write(&template_path, "after").unwrap();

    let mut rendered = String::new();
    for _ in 0..40 {
      tokio::time::sleep(Duration::from_millis(50)).await;
      rendered = tera.read().render("index.html", &tera::Context::new()).unwrap();
      if rendered == "after" {
        break;
      }
    }
    assert_eq!(rendered, "after");
  }
}
