//! Wrapper crate generator.
//!
//! Turns a [`PackageCatalog`] into the files of a standalone cargo crate:
//!
//! - `Cargo.toml`: manifest with an empty `[workspace]` table
//! - `src/main.rs`: argument parsing, help and dispatch
//! - `src/tasks/mod.rs`: the task registry
//! - `src/tasks/<module>.rs`: one per original file, the stripped source
//!   followed by a shim per task function

use crate::call::{render_body, rust_literal};
use crate::template_engine::{
    MAIN_TEMPLATE, MANIFEST_TEMPLATE, REGISTRY_TEMPLATE, SCAFFOLD_TEMPLATE, TASK_FILE_TEMPLATE,
    TemplateEngine,
};
use crate::types::{
    FlagContext, GeneratedCode, GeneratedFile, MainContext, ManifestContext, RegistryContext,
    RenderJob, ScaffoldContext, ShimContext, TaskContext, TaskFileContext,
};
use serde::Serialize;
use tasksmith_core::{
    ContextConvention, Error, FlagKind, FlagSpec, FunctionRecord, PackageCatalog, Result,
};

/// Options that shape the generated manifest.
#[derive(Debug, Clone, Default)]
pub struct GenerateOptions {
    /// Extra dependencies; entries replace the built-in ones by name
    pub dependencies: toml::Table,
}

impl GenerateOptions {
    /// Creates options with the given extra dependencies.
    #[must_use]
    pub fn new(dependencies: toml::Table) -> Self {
        Self { dependencies }
    }
}

fn flag_variant(kind: FlagKind) -> &'static str {
    match kind {
        FlagKind::String => "String",
        FlagKind::Bool => "Bool",
        FlagKind::Int => "Int",
        FlagKind::Float => "Float",
        FlagKind::Duration => "Duration",
    }
}

fn uses_token(catalog: &PackageCatalog) -> bool {
    catalog.uses_context(ContextConvention::Standard)
        || catalog.uses_context(ContextConvention::Custom)
}

/// Builds the `[dependencies]` table of the generated manifest.
///
/// # Errors
///
/// Returns [`Error::Template`] if the table cannot be serialized.
pub fn dependencies_toml(catalog: &PackageCatalog, options: &GenerateOptions) -> Result<String> {
    let mut serde = toml::Table::new();
    serde.insert("version".into(), "1".into());
    serde.insert("features".into(), toml::Value::Array(vec!["derive".into()]));

    let mut deps = toml::Table::new();
    deps.insert("serde".into(), toml::Value::Table(serde));
    deps.insert("serde_json".into(), "1".into());
    if uses_token(catalog) {
        deps.insert("tokio-util".into(), "0.7".into());
    }
    for (name, spec) in &options.dependencies {
        deps.insert(name.clone(), spec.clone());
    }

    let mut doc = toml::Table::new();
    doc.insert("dependencies".into(), toml::Value::Table(deps));
    toml::to_string(&doc).map_err(|e| Error::Template {
        message: format!("failed to serialize dependencies: {e}"),
    })
}

fn flag_context(flag: &FlagSpec) -> FlagContext {
    FlagContext {
        name_literal: rust_literal(&flag.name),
        env_literal: rust_literal(&flag.env_var()),
        kind: flag_variant(flag.kind).to_string(),
        description_literal: rust_literal(flag.description.as_deref().unwrap_or_default()),
    }
}

fn task_context(module: &str, record: &FunctionRecord) -> TaskContext {
    TaskContext {
        module: module.to_string(),
        name: record.name.clone(),
        command: record.command.clone(),
        synopsis: record.synopsis.clone(),
        command_literal: rust_literal(&record.command),
        synopsis_literal: rust_literal(&record.synopsis),
        description_literal: rust_literal(&record.description),
        source_literal: rust_literal(&record.source),
        signature_literal: rust_literal(&record.signature.to_string()),
        default: record.default,
        flags: record.flags.iter().map(flag_context).collect(),
    }
}

/// Turns a file stem into a function identifier.
///
/// ```
/// use tasksmith_codegen::generator::function_ident;
///
/// assert_eq!(function_ident("deploy-prod"), "deploy_prod");
/// assert_eq!(function_ident("2fa"), "task_2fa");
/// ```
#[must_use]
pub fn function_ident(stem: &str) -> String {
    let ident: String = stem
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect();
    let ident = ident.trim_matches('_');
    if ident.is_empty()
        || ident.starts_with(|c: char| c.is_ascii_digit())
        || matches!(ident, "self" | "super" | "crate")
    {
        format!("task_{ident}")
    } else if is_keyword(ident) {
        format!("r#{ident}")
    } else {
        ident.to_string()
    }
}

fn is_keyword(ident: &str) -> bool {
    matches!(
        ident,
        "as" | "async" | "await" | "break" | "const" | "continue" | "dyn" | "else" | "enum"
            | "extern" | "fn" | "for" | "if" | "impl" | "in" | "let" | "loop" | "match" | "mod"
            | "move" | "mut" | "pub" | "ref" | "return" | "static" | "struct" | "trait"
            | "type" | "unsafe" | "use" | "where" | "while" | "yield" | "gen" | "try"
    )
}

fn job<T: Serialize>(template: &str, context: &T) -> Result<RenderJob> {
    let context = serde_json::to_value(context).map_err(|e| Error::Template {
        message: format!("failed to serialize context for '{template}': {e}"),
    })?;
    Ok(RenderJob {
        template: template.to_string(),
        context,
    })
}

/// Generator for wrapper crates.
#[derive(Debug)]
pub struct PackageGenerator<'a> {
    engine: TemplateEngine<'a>,
}

impl PackageGenerator<'_> {
    /// Creates a generator with the built-in templates.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Template`] if template registration fails.
    pub fn new() -> Result<Self> {
        Ok(Self {
            engine: TemplateEngine::new()?,
        })
    }

    /// Plans every file of the wrapper crate without rendering.
    ///
    /// Paths are relative to the crate root.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Template`] if a context cannot be serialized.
    pub fn jobs(
        &self,
        catalog: &PackageCatalog,
        options: &GenerateOptions,
    ) -> Result<Vec<(String, RenderJob)>> {
        let mut jobs = Vec::with_capacity(catalog.files.len() + 3);

        jobs.push((
            "Cargo.toml".to_string(),
            job(
                MANIFEST_TEMPLATE,
                &ManifestContext {
                    crate_name: catalog.crate_name().to_string(),
                    dependencies_toml: dependencies_toml(catalog, options)?,
                },
            )?,
        ));

        jobs.push((
            "src/main.rs".to_string(),
            job(
                MAIN_TEMPLATE,
                &MainContext {
                    binary_literal: rust_literal(catalog.crate_name()),
                    name_width: catalog.max_name_len,
                    uses_context: uses_token(catalog),
                },
            )?,
        ));

        let mut tasks = Vec::with_capacity(catalog.functions.len());
        for file in &catalog.files {
            let functions: Vec<_> = catalog
                .functions
                .iter()
                .filter(|f| f.file == file.file_name)
                .collect();

            let shims = functions
                .iter()
                .map(|f| ShimContext {
                    name: f.name.clone(),
                    body: render_body(f),
                })
                .collect();
            tasks.extend(functions.iter().map(|f| task_context(&file.module, f)));

            jobs.push((
                format!("src/tasks/{}.rs", file.module),
                job(
                    TASK_FILE_TEMPLATE,
                    &TaskFileContext {
                        file_name: file.file_name.clone(),
                        source: file.source.clone(),
                        shims,
                    },
                )?,
            ));
        }

        jobs.push((
            "src/tasks/mod.rs".to_string(),
            job(
                REGISTRY_TEMPLATE,
                &RegistryContext {
                    binary_name: catalog.binary_name.clone(),
                    modules: catalog.files.iter().map(|f| f.module.clone()).collect(),
                    tasks,
                    name_width: catalog.max_name_len,
                },
            )?,
        ));

        tracing::debug!(
            package = %catalog.name,
            files = jobs.len(),
            "planned wrapper crate"
        );
        Ok(jobs)
    }

    /// Plans a starter task file named after `stem`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Template`] if the context cannot be serialized.
    pub fn scaffold(&self, build_tag: &str, binary: &str, stem: &str) -> Result<RenderJob> {
        let function = function_ident(stem);
        let command = function.trim_start_matches("r#").replace('_', "-");
        job(
            SCAFFOLD_TEMPLATE,
            &ScaffoldContext {
                build_tag: build_tag.to_string(),
                binary: binary.to_string(),
                synopsis: format!("Runs the {command} task."),
                function,
                command,
            },
        )
    }

    /// Renders one planned file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Template`] if rendering fails.
    pub fn render(&self, job: &RenderJob) -> Result<String> {
        self.engine.render(&job.template, &job.context)
    }

    /// Generates every file of the wrapper crate.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Template`] if planning or rendering fails.
    pub fn generate(
        &self,
        catalog: &PackageCatalog,
        options: &GenerateOptions,
    ) -> Result<GeneratedCode> {
        tracing::info!(
            package = %catalog.name,
            binary = %catalog.binary_name,
            "generating wrapper crate"
        );

        let mut code = GeneratedCode::new();
        for (path, job) in self.jobs(catalog, options)? {
            let content = self.render(&job)?;
            tracing::debug!("Generated {path}");
            code.add_file(GeneratedFile { path, content });
        }

        tracing::info!(
            "Successfully generated {} files for {}",
            code.file_count(),
            catalog.binary_name
        );
        Ok(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tasksmith_core::{ArgumentShape, ReturnShape, Signature, SourceFile};

    fn catalog() -> PackageCatalog {
        let mut catalog = PackageCatalog::new("ops", "/tmp/ops");
        let mut record = FunctionRecord::new(
            "ops",
            "build_all",
            Signature {
                argument: ArgumentShape::NoArgument,
                context: ContextConvention::None,
                returns: ReturnShape::Error,
            },
        );
        record.file = "build.rs".to_string();
        record.synopsis = "Builds \"everything\".".to_string();
        record.default = true;
        record.flags.push(FlagSpec {
            name: "release".to_string(),
            env: None,
            kind: FlagKind::Bool,
            description: Some("optimized".to_string()),
        });
        catalog.max_name_len = record.command.len();
        catalog.functions.push(record);
        catalog.files.push(SourceFile {
            file_name: "build.rs".to_string(),
            module: "build".to_string(),
            path: "/tmp/ops/build.rs".into(),
            source: "pub fn build_all() -> Result<(), String> { Ok(()) }\n".to_string(),
        });
        catalog
    }

    #[test]
    fn test_generates_expected_file_set() {
        let generator = PackageGenerator::new().unwrap();
        let code = generator
            .generate(&catalog(), &GenerateOptions::default())
            .unwrap();

        let paths: Vec<_> = code.files.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(
            paths,
            vec!["Cargo.toml", "src/main.rs", "src/tasks/build.rs", "src/tasks/mod.rs"]
        );
    }

    #[test]
    fn test_registry_entries() {
        let generator = PackageGenerator::new().unwrap();
        let code = generator
            .generate(&catalog(), &GenerateOptions::default())
            .unwrap();
        let registry = &code.get("src/tasks/mod.rs").unwrap().content;

        assert!(registry.contains("mod build;"));
        assert!(registry.contains("pub(crate) use self::build::*;"));
        assert!(registry.contains("name: \"build-all\","));
        assert!(registry.contains("synopsis: \"Builds \\\"everything\\\".\","));
        assert!(registry.contains("default: true,"));
        assert!(registry.contains("kind: crate::FlagKind::Bool,"));
        assert!(registry.contains("env: \"TASKSMITH_FLAG_RELEASE\","));
        assert!(registry.contains("run: build::__tasksmith_build_all,"));
        assert!(registry.contains("//! build-all  Builds \"everything\"."));
    }

    #[test]
    fn test_task_file_has_source_and_shim() {
        let generator = PackageGenerator::new().unwrap();
        let code = generator
            .generate(&catalog(), &GenerateOptions::default())
            .unwrap();
        let file = &code.get("src/tasks/build.rs").unwrap().content;

        assert!(file.contains("\nuse super::*;\n"));
        assert!(file.contains("pub fn build_all() -> Result<(), String> { Ok(()) }"));
        assert!(file.contains(
            "pub(crate) fn __tasksmith_build_all(inv: &mut crate::Invocation) -> crate::Outcome {"
        ));
        assert!(file.contains("    build_all().map_err(|e| e.to_string())?;"));
    }

    #[test]
    fn test_main_without_context_has_no_token() {
        let generator = PackageGenerator::new().unwrap();
        let code = generator
            .generate(&catalog(), &GenerateOptions::default())
            .unwrap();
        let main = &code.get("src/main.rs").unwrap().content;

        assert!(main.contains("const BINARY: &str = \"ops\";"));
        assert!(main.contains("const NAME_WIDTH: usize = 9;"));
        assert!(!main.contains("CancellationToken"));
    }

    #[test]
    fn test_dependencies_include_user_overrides() {
        let mut catalog = catalog();
        catalog.functions[0].signature.context = ContextConvention::Standard;

        let mut extra = toml::Table::new();
        extra.insert("anyhow".into(), "1".into());
        extra.insert("serde_json".into(), "1.0.100".into());

        let deps = dependencies_toml(&catalog, &GenerateOptions::new(extra)).unwrap();
        let parsed: toml::Table = toml::from_str(&deps).unwrap();
        let table = parsed["dependencies"].as_table().unwrap();

        assert_eq!(table["anyhow"].as_str(), Some("1"));
        assert_eq!(table["serde_json"].as_str(), Some("1.0.100"));
        assert_eq!(table["tokio-util"].as_str(), Some("0.7"));
        assert!(table["serde"].is_table());
    }

    #[test]
    fn test_jobs_render_lazily() {
        let generator = PackageGenerator::new().unwrap();
        let jobs = generator
            .jobs(&catalog(), &GenerateOptions::default())
            .unwrap();
        assert_eq!(jobs.len(), 4);

        let (path, job) = &jobs[0];
        assert_eq!(path, "Cargo.toml");
        let manifest = generator.render(job).unwrap();
        assert!(manifest.contains("name = \"ops\""));
        assert!(manifest.contains("[workspace]"));
    }

    #[test]
    fn test_function_ident_edge_cases() {
        assert_eq!(function_ident("Deploy.Prod"), "deploy_prod");
        assert_eq!(function_ident("--"), "task_");
        assert_eq!(function_ident("self"), "task_self");
        assert_eq!(function_ident("match"), "r#match");
    }

    #[test]
    fn test_scaffold_renders_tagged_task() {
        let generator = PackageGenerator::new().unwrap();
        let job = generator.scaffold("tasksmith", "ops", "deploy-prod").unwrap();
        let text = generator.render(&job).unwrap();

        assert!(text.starts_with("#![cfg(tasksmith)]\n"));
        assert!(text.contains("/// Runs the deploy-prod task."));
        assert!(text.contains("`tasksmith run ops deploy-prod`"));
        assert!(text.contains("pub fn deploy_prod() -> Result<(), Box<dyn std::error::Error>> {"));
    }
}
