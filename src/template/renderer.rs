use std::io::ErrorKind;
use std::path::PathBuf;

use handlebars::Handlebars;
use serde_json::{Map, Value};

use super::types::{RenderError, RenderResult};
use crate::config::TemplateConfig;

/// Renders named templates from a fixed directory
#[derive(Debug, Clone)]
pub struct TemplateRenderer {
    dir: PathBuf,
    extension: String,
    strict: bool,
}

impl TemplateRenderer {
    pub fn new(config: &TemplateConfig) -> Self {
        Self {
            dir: PathBuf::from(&config.dir),
            extension: config.extension.trim_start_matches('.').to_string(),
            strict: config.strict,
        }
    }

    /// Map a template name to its file, refusing anything that could leave `dir`.
    pub fn resolve(&self, name: &str) -> RenderResult<PathBuf> {
        if !is_safe_name(name) {
            return Err(RenderError::InvalidName(name.to_string()));
        }
        Ok(self.dir.join(format!("{}.{}", name, self.extension)))
    }

    /// Load, compile and render `name` with `variables`.
    #[tracing::instrument(name = "template.render", skip(self, variables), fields(template = %name))]
    pub async fn render(&self, name: &str, variables: &Map<String, Value>) -> RenderResult<String> {
        let path = self.resolve(name)?;

        let source = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => RenderError::NotFound(name.to_string()),
                _ => RenderError::Read {
                    name: name.to_string(),
                    source: e,
                },
            })?;

        let mut registry = Handlebars::new();
        registry.set_strict_mode(self.strict);

        let html = registry
            .render_template(&source, variables)
            .map_err(|e| RenderError::Render {
                name: name.to_string(),
                source: e,
            })?;

        tracing::debug!(path = %path.display(), bytes = html.len(), "Template rendered");
        Ok(html)
    }
}

/// Template names are plain file stems: no separators, no parent references,
/// no hidden files.
fn is_safe_name(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('.')
        && !name.contains("..")
        && !name.contains(['/', '\\', '\0'])
        && !name.contains(':')
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn renderer_with(files: &[(&str, &str)]) -> (TempDir, TemplateRenderer) {
        let dir = tempfile::tempdir().unwrap();
        for (name, body) in files {
            std::fs::write(dir.path().join(name), body).unwrap();
        }
        let renderer = TemplateRenderer::new(&TemplateConfig {
            dir: dir.path().to_string_lossy().into_owned(),
            ..Default::default()
        });
        (dir, renderer)
    }

    fn vars(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("variables must be an object"),
        }
    }

    #[tokio::test]
    async fn test_render_interpolates_variables() {
        let (_dir, renderer) = renderer_with(&[("welcome.hbs", "<p>Hello, {{name}}!</p>")]);

        let html = renderer
            .render("welcome", &vars(json!({ "name": "Ada" })))
            .await
            .unwrap();

        assert_eq!(html, "<p>Hello, Ada!</p>");
        assert!(!html.contains("{{name}}"));
    }

    #[tokio::test]
    async fn test_render_is_deterministic() {
        let (_dir, renderer) = renderer_with(&[(
            "order.hbs",
            "{{#each items}}<li>{{this}}</li>{{/each}} total {{total}}",
        )]);
        let variables = vars(json!({ "items": ["a", "b"], "total": 2 }));

        let first = renderer.render("order", &variables).await.unwrap();
        let second = renderer.render("order", &variables).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first, "<li>a</li><li>b</li> total 2");
    }

    #[tokio::test]
    async fn test_render_escapes_html() {
        let (_dir, renderer) = renderer_with(&[("raw.hbs", "{{value}}|{{{value}}}")]);

        let html = renderer
            .render("raw", &vars(json!({ "value": "<b>" })))
            .await
            .unwrap();
        assert_eq!(html, "&lt;b&gt;|<b>");
    }

    #[tokio::test]
    async fn test_missing_template() {
        let (_dir, renderer) = renderer_with(&[]);

        let err = renderer.render("missing", &Map::new()).await.unwrap_err();
        assert!(matches!(err, RenderError::NotFound(ref name) if name == "missing"));
        assert_eq!(err.to_string(), "template \"missing\" not found");
    }

    #[tokio::test]
    async fn test_malformed_template() {
        let (_dir, renderer) = renderer_with(&[("broken.hbs", "{{#if name}}unclosed")]);

        let err = renderer.render("broken", &Map::new()).await.unwrap_err();
        assert!(matches!(err, RenderError::Render { .. }));
    }

    #[tokio::test]
    async fn test_missing_variable_renders_empty() {
        let (_dir, renderer) = renderer_with(&[("welcome.hbs", "Hi {{name}}.")]);

        let html = renderer.render("welcome", &Map::new()).await.unwrap();
        assert_eq!(html, "Hi .");
    }

    #[tokio::test]
    async fn test_strict_mode_rejects_missing_variable() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("welcome.hbs"), "Hi {{name}}.").unwrap();
        let renderer = TemplateRenderer::new(&TemplateConfig {
            dir: dir.path().to_string_lossy().into_owned(),
            strict: true,
            ..Default::default()
        });

        let err = renderer.render("welcome", &Map::new()).await.unwrap_err();
        assert!(matches!(err, RenderError::Render { .. }));
    }

    #[tokio::test]
    async fn test_path_traversal_rejected() {
        let (dir, renderer) = renderer_with(&[]);
        std::fs::write(dir.path().join("secret.hbs"), "top secret").unwrap();

        for name in ["../secret", "..", "a/b", "a\\b", "/etc/passwd", ".hidden", "", "c:evil"] {
            let err = renderer.render(name, &Map::new()).await.unwrap_err();
            assert!(
                matches!(err, RenderError::InvalidName(_)),
                "{name:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_resolve_uses_extension() {
        let renderer = TemplateRenderer::new(&TemplateConfig {
            dir: "templates".to_string(),
            extension: ".html".to_string(),
            strict: false,
        });
        assert_eq!(
            renderer.resolve("welcome").unwrap(),
            PathBuf::from("templates").join("welcome.html")
        );
    }
}
