//! File-backed Handlebars templates.
//!
//! A template name maps to `{dir}/{name}.{extension}`. The file is read and
//! compiled on every render; nothing is cached.
//!
//! # Example
//!
//! ```ignore
//! let renderer = TemplateRenderer::new(&settings.templates);
//!
//! // templates/welcome.hbs: <h1>Hello {{name}}</h1>
//! let variables = json!({ "name": "Ada" });
//! let html = renderer.render("welcome", variables.as_object().unwrap()).await?;
//! ```

mod renderer;
mod types;

pub use renderer::TemplateRenderer;
pub use types::{RenderError, RenderResult};
