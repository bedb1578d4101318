//! Prompt Catalog Loader — reads declarative YAML prompt definitions from a
//! directory into a deterministically ordered list.
//!
//! One bad file never fails the catalog: it is logged and skipped. A missing
//! directory yields an empty catalog; the caller decides whether zero prompts
//! is fatal.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use serde::Deserialize;
use tracing::warn;

/// A versioned, named prompt template plus optional output schema, defining
/// one independent query against the model backend.
#[derive(Debug, Clone)]
pub struct PromptDefinition {
    pub prompt_id: String,
    pub name: String,
    pub version: i64,
    pub template: String,
    /// Optional JSON Schema describing the expected output object.
    pub schema: Option<serde_json::Value>,
}

/// Raw on-disk form of one catalog file. The template is either inline
/// (`template`) or referenced (`template_file`, relative to the catalog dir).
#[derive(Debug, Deserialize)]
struct PromptFile {
    prompt_id: String,
    name: String,
    version: i64,
    template: Option<String>,
    template_file: Option<String>,
    schema: Option<serde_json::Value>,
}

/// Loads all YAML prompt files from a directory.
///
/// Ordering is deterministic: `*.yml` files sorted lexicographically by
/// filename, then `*.yaml` files sorted the same way.
pub fn load_catalog(directory: &Path) -> Vec<PromptDefinition> {
    let mut prompts = Vec::new();
    if !directory.exists() {
        return prompts;
    }

    let mut files = files_with_extension(directory, "yml");
    files.extend(files_with_extension(directory, "yaml"));

    for file in files {
        match load_prompt_file(directory, &file) {
            Ok(prompt) => prompts.push(prompt),
            Err(e) => warn!("Skipping prompt file {}: {e:#}", file.display()),
        }
    }
    prompts
}

/// Regular files in `directory` with the given extension, sorted by filename.
fn files_with_extension(directory: &Path, ext: &str) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = match fs::read_dir(directory) {
        Ok(entries) => entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.is_file() && p.extension().is_some_and(|x| x == ext))
            .collect(),
        Err(e) => {
            warn!("Failed to read prompt directory {}: {e}", directory.display());
            Vec::new()
        }
    };
    files.sort();
    files
}

fn load_prompt_file(directory: &Path, path: &Path) -> Result<PromptDefinition> {
    let text = fs::read_to_string(path)?;
    let value: serde_yaml::Value = serde_yaml::from_str(&text)?;
    if !value.is_mapping() {
        bail!("top-level value must be a mapping");
    }
    let raw: PromptFile = serde_yaml::from_value(value)?;

    // An external template_file takes precedence over any inline template.
    let template = if let Some(rel) = &raw.template_file {
        let template_path = directory.join(rel);
        fs::read_to_string(&template_path)
            .with_context(|| format!("referenced template file '{rel}' cannot be read"))?
    } else {
        raw.template
            .ok_or_else(|| anyhow!("missing required key 'template'"))?
    };

    Ok(PromptDefinition {
        prompt_id: raw.prompt_id,
        name: raw.name,
        version: raw.version,
        template,
        schema: raw.schema,
    })
}
