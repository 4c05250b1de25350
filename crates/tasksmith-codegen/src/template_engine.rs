//! Template engine for wrapper generation using Handlebars.
//!
//! Provides a wrapper around Handlebars with the built-in templates for
//! the generated package pre-registered. Output is Rust and TOML, so HTML
//! escaping is disabled.
//!
//! # Examples
//!
//! ```
//! use tasksmith_codegen::template_engine::TemplateEngine;
//! use serde_json::json;
//!
//! let engine = TemplateEngine::new().unwrap();
//! let rendered = engine
//!     .render("manifest", &json!({"crate_name": "ops", "dependencies_toml": ""}))
//!     .unwrap();
//! assert!(rendered.contains("name = \"ops\""));
//! ```

use handlebars::{Handlebars, handlebars_helper};
use serde::Serialize;
use tasksmith_core::{Error, Result};

/// Name of the generated `Cargo.toml` template.
pub const MANIFEST_TEMPLATE: &str = "manifest";
/// Name of the per-source-file template.
pub const TASK_FILE_TEMPLATE: &str = "task_file";
/// Name of the registry/dispatch template.
pub const REGISTRY_TEMPLATE: &str = "registry";
/// Name of the entrypoint template.
pub const MAIN_TEMPLATE: &str = "main";
/// Name of the starter task file template.
pub const SCAFFOLD_TEMPLATE: &str = "scaffold";

handlebars_helper!(snake: |value: str| value.trim_start_matches("r#").replace('-', "_"));
handlebars_helper!(pad: |value: str, width: u64| {
    let width = usize::try_from(width).unwrap_or(usize::MAX);
    format!("{value:<width$}")
});

/// Template engine for code generation.
///
/// Templates are compiled once at construction; rendering borrows the
/// engine immutably, so one engine serves every package of a run.
#[derive(Debug)]
pub struct TemplateEngine<'a> {
    handlebars: Handlebars<'a>,
}

impl<'a> TemplateEngine<'a> {
    /// Creates a new template engine with the built-in templates.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Template`] if a built-in template fails to compile.
    pub fn new() -> Result<Self> {
        let mut handlebars = Handlebars::new();

        // Strict mode: fail on missing variables
        handlebars.set_strict_mode(true);
        handlebars.register_escape_fn(handlebars::no_escape);
        handlebars.register_helper("snake", Box::new(snake));
        handlebars.register_helper("pad", Box::new(pad));

        Self::register_package_templates(&mut handlebars)?;

        Ok(Self { handlebars })
    }

    fn register_package_templates(handlebars: &mut Handlebars<'a>) -> Result<()> {
        let templates = [
            (MANIFEST_TEMPLATE, include_str!("../templates/manifest.toml.hbs")),
            (TASK_FILE_TEMPLATE, include_str!("../templates/task_file.rs.hbs")),
            (REGISTRY_TEMPLATE, include_str!("../templates/registry.rs.hbs")),
            (MAIN_TEMPLATE, include_str!("../templates/main.rs.hbs")),
            (SCAFFOLD_TEMPLATE, include_str!("../templates/scaffold.rs.hbs")),
        ];

        for (name, source) in templates {
            handlebars
                .register_template_string(name, source)
                .map_err(|e| Error::Template {
                    message: format!("failed to register template '{name}': {e}"),
                })?;
        }

        Ok(())
    }

    /// Renders a template with the given context.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Template`] if the template is unknown, the context
    /// cannot be serialized, or a referenced variable is missing.
    pub fn render<T: Serialize>(&self, template_name: &str, context: &T) -> Result<String> {
        self.handlebars
            .render(template_name, context)
            .map_err(|e| Error::Template {
                message: format!("rendering '{template_name}' failed: {e}"),
            })
    }

    /// Registers an additional template.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Template`] if the template string is invalid.
    ///
    /// # Examples
    ///
    /// ```
    /// use tasksmith_codegen::template_engine::TemplateEngine;
    ///
    /// let mut engine = TemplateEngine::new().unwrap();
    /// engine.register_template_string("custom", "// {{name}}").unwrap();
    /// ```
    pub fn register_template_string(&mut self, name: &str, template: &str) -> Result<()> {
        self.handlebars
            .register_template_string(name, template)
            .map_err(|e| Error::Template {
                message: format!("failed to register template '{name}': {e}"),
            })
    }
}
