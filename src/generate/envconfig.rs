//! Environment-config generator.
//!
//! Consumes `@envconfig` annotations and keeps three artifacts in sync with
//! the summary:
//!
//! * a generated source file with one loader function per annotated struct
//!   plus a constructor-registration entry point,
//! * the persistent `.env` file, merged key-by-key (existing values win),
//! * a usage document listing the full merged key set, rewritten wholesale.
//!
//! When a build discovers no matching annotation, a previously generated
//! target file is deleted so no stale artifact survives the summary.

use super::dotenv;
use super::{DeclFailure, DeclFailures, GenerateError};
use crate::annotate::{AnnotateContext, Annotator};
use crate::descriptor::ProjectSettings;
use crate::scan::{Decl, Field, TagError, TagMap};
use std::path::PathBuf;
use tracing::{debug, info};

const DEFAULT_TARGET: &str = "envconfig_annotated.rs";
const HELP_URL: &str = "https://docs.rs/tagforge";

/// A derived environment key for one struct field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedField {
    pub key: String,
    pub default: String,
    pub required: bool,
}

/// Derive the environment key set entry for `field` under `prefix`.
///
/// The key is `PREFIX_NAME` with the uppercased field name, unless the
/// structured tag carries an explicit `env:"NAME"` override.
pub fn create_field(prefix: &str, field: &Field) -> Result<GeneratedField, TagError> {
    let tags = TagMap::parse(&field.struct_tag)?;
    let name = match tags.get("env") {
        Some(override_name) => override_name.to_string(),
        None => field.name().to_uppercase(),
    };
    Ok(GeneratedField {
        key: format!("{prefix}_{name}"),
        default: tags.get("default").unwrap_or_default().to_string(),
        required: tags.get_bool("required"),
    })
}

/// One successfully rendered declaration.
#[derive(Debug)]
struct RenderedDecl {
    type_name: String,
    module: String,
    prefix: String,
    ctor_name: String,
    loader_fn: String,
    fields: Vec<GeneratedField>,
}

pub struct EnvconfigAnnotator {
    tag: String,
    target: Option<PathBuf>,
    dotenv: Option<PathBuf>,
    usage_doc: Option<PathBuf>,
}

impl Default for EnvconfigAnnotator {
    fn default() -> Self {
        Self {
            tag: "@envconfig".to_string(),
            target: None,
            dotenv: None,
            usage_doc: None,
        }
    }
}

impl EnvconfigAnnotator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consume a custom tag instead of `@envconfig`.
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = tag.into();
        self
    }

    pub fn with_target(mut self, target: impl Into<PathBuf>) -> Self {
        self.target = Some(target.into());
        self
    }

    pub fn with_dotenv(mut self, path: impl Into<PathBuf>) -> Self {
        self.dotenv = Some(path.into());
        self
    }

    pub fn with_usage_doc(mut self, path: impl Into<PathBuf>) -> Self {
        self.usage_doc = Some(path.into());
        self
    }

    fn resolve_target(&self, settings: &ProjectSettings) -> PathBuf {
        self.target
            .clone()
            .unwrap_or_else(|| settings.dest_dir.join(DEFAULT_TARGET))
    }

    fn resolve_dotenv(&self, settings: &ProjectSettings) -> PathBuf {
        self.dotenv.clone().unwrap_or_else(|| settings.env_file.clone())
    }

    fn resolve_usage_doc(&self, settings: &ProjectSettings) -> PathBuf {
        self.usage_doc
            .clone()
            .unwrap_or_else(|| settings.usage_doc.clone())
    }

    fn render_decl(&self, tag_param: &str, decl: &Decl) -> Result<RenderedDecl, DeclFailure> {
        let fail = |message: String| DeclFailure {
            decl: decl.name.clone(),
            location: decl.location(),
            message,
        };

        let params = TagMap::parse(tag_param)
            .map_err(|err| fail(format!("malformed annotation parameter: {err}")))?;
        let prefix = params
            .get("prefix")
            .map(str::to_string)
            .unwrap_or_else(|| decl.name.to_uppercase());
        let ctor_name = params.get("ctor_name").unwrap_or_default().to_string();

        let mut fields = Vec::with_capacity(decl.fields.len());
        for field in &decl.fields {
            let generated = create_field(&prefix, field).map_err(|err| DeclFailure {
                decl: decl.name.clone(),
                location: format!("{}:{}", decl.file.path.display(), field.line),
                message: format!("malformed structured tag on field '{}': {err}", field.name()),
            })?;
            if fields.iter().any(|f: &GeneratedField| f.key == generated.key) {
                return Err(DeclFailure {
                    decl: decl.name.clone(),
                    location: format!("{}:{}", decl.file.path.display(), field.line),
                    message: format!("duplicate derived key '{}'", generated.key),
                });
            }
            fields.push(generated);
        }

        Ok(RenderedDecl {
            type_name: decl.name.clone(),
            module: decl.file.module.clone(),
            prefix,
            ctor_name,
            loader_fn: format!("load_{}", snake_case(&decl.name)),
            fields,
        })
    }

    fn render_source(&self, decls: &[RenderedDecl]) -> String {
        let mut out = String::new();
        out.push_str("// Code generated by tagforge. DO NOT EDIT.\n");
        out.push_str("//\n");
        out.push_str("// TagName:\n");
        out.push_str(&format!("//   {}\n", self.tag));
        out.push_str("//\n");
        out.push_str("// Help:\n");
        out.push_str(&format!("//   {HELP_URL}\n"));
        out.push('\n');
        out.push_str("use crate::envload::{self, CtorRegistry};\n");
        out.push('\n');
        out.push_str("pub fn register(registry: &mut CtorRegistry) {\n");
        for decl in decls {
            out.push_str(&format!(
                "    registry.insert(\"{}\", {});\n",
                decl.ctor_name, decl.loader_fn
            ));
        }
        out.push_str("}\n");
        for decl in decls {
            out.push('\n');
            out.push_str(&format!(
                "/// Load environment variables into a new instance of {}.\n",
                decl.type_name
            ));
            out.push_str(&format!(
                "pub fn {}() -> envload::Result<{}::{}> {{\n",
                decl.loader_fn, decl.module, decl.type_name
            ));
            out.push_str(&format!("    envload::process(\"{}\")\n", decl.prefix));
            out.push_str("}\n");
        }
        out
    }

    fn render_usage_doc(
        &self,
        derived: &[GeneratedField],
        file_only: &[(String, String)],
    ) -> String {
        let mut out = String::new();
        out.push_str("<!-- Generated by tagforge. DO NOT EDIT. -->\n\n");
        out.push_str("# Configuration\n\n");
        out.push_str("| Key | Default | Required |\n");
        out.push_str("|-----|---------|:--------:|\n");
        for field in derived {
            out.push_str(&format!(
                "| {} | {} | {} |\n",
                field.key,
                field.default,
                if field.required { "yes" } else { "" }
            ));
        }
        for (key, value) in file_only {
            out.push_str(&format!("| {key} | {value} |  |\n"));
        }
        out
    }
}

impl Annotator for EnvconfigAnnotator {
    fn tag_name(&self) -> &str {
        &self.tag
    }

    fn target(&self, settings: &ProjectSettings) -> Option<PathBuf> {
        Some(self.resolve_target(settings))
    }

    fn annotate(&self, ctx: &mut AnnotateContext<'_>) -> Result<(), GenerateError> {
        let target = self.resolve_target(ctx.settings);

        if ctx.annots.is_empty() {
            if target.exists() {
                std::fs::remove_file(&target)
                    .map_err(|err| GenerateError::io(&target, err))?;
                info!("Remove {}", target.display());
            } else {
                debug!(tag = %self.tag, "No annotation and no stale target, nothing to do");
            }
            return Ok(());
        }

        let mut rendered = Vec::new();
        let mut failures = Vec::new();
        for annot in &ctx.annots {
            let decl = ctx.summary.decl(annot.decl);
            match self.render_decl(&annot.tag_param, decl) {
                Ok(render) => rendered.push(render),
                Err(failure) => failures.push(failure),
            }
        }

        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent).map_err(|err| GenerateError::io(parent, err))?;
        }
        std::fs::write(&target, self.render_source(&rendered))
            .map_err(|err| GenerateError::io(&target, err))?;
        info!("Generate {} to {}", self.tag, target.display());

        let derived: Vec<GeneratedField> = rendered
            .iter()
            .flat_map(|d| d.fields.iter().cloned())
            .collect();
        let derived_pairs: Vec<(String, String)> = derived
            .iter()
            .map(|f| (f.key.clone(), f.default.clone()))
            .collect();

        let dotenv_path = self.resolve_dotenv(ctx.settings);
        let added = dotenv::merge(&dotenv_path, &derived_pairs, ctx.config)
            .map_err(|err| GenerateError::io(&dotenv_path, err))?;
        if !added.is_empty() {
            // Exactly the set of newly added keys, in derivation order.
            info!(
                "New keys added in '{}': {}",
                dotenv_path.display(),
                added.join(" ")
            );
            // Compatibility shim for tools reading std::env directly.
            for key in &added {
                if let Some(value) = ctx.config.get(key) {
                    std::env::set_var(key, value);
                }
            }
        }

        let file_only: Vec<(String, String)> = ctx
            .config
            .iter()
            .filter(|(key, _)| !derived.iter().any(|f| &f.key == key))
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let usage_doc = self.resolve_usage_doc(ctx.settings);
        std::fs::write(&usage_doc, self.render_usage_doc(&derived, &file_only))
            .map_err(|err| GenerateError::io(&usage_doc, err))?;
        info!("Generate '{}'", usage_doc.display());

        if failures.is_empty() {
            Ok(())
        } else {
            Err(GenerateError::Declarations(DeclFailures(failures)))
        }
    }
}

/// `SomeSample` -> `some_sample`, `DBConfig` -> `db_config`.
fn snake_case(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() + 4);
    for (i, &ch) in chars.iter().enumerate() {
        if ch.is_uppercase() {
            let prev_lower = i > 0 && chars[i - 1].is_lowercase();
            let next_lower = chars.get(i + 1).is_some_and(|c| c.is_lowercase());
            if i > 0 && (prev_lower || next_lower) {
                out.push('_');
            }
            out.extend(ch.to_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}
