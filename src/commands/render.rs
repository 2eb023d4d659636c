//! # Render Command Implementation
//!
//! This module implements the `render` subcommand, which reads static
//! manifest files, runs them through the engine and prints the result.
//!
//! ## Functionality
//!
//! - **Sources**: Every PATH (file or directory) becomes one file source,
//!   in the order given on the command line
//! - **Filtering**: `--kind` keeps matching kinds, `--exclude-kind` drops them
//! - **Labelling**: `--label key=value` sets a label on every output object
//! - **Output**: YAML multi-document stream (default) or a JSON array
//!
//! This command is read-only.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context as _, Result};
use clap::{Args, ValueEnum};
use serde_json::Value;

use manifest_engine::codec::{self, Format};
use manifest_engine::context::Context;
use manifest_engine::engine::{Engine, EngineBuilder, RenderOptions};
use manifest_engine::filesystem::{FileSystem, OsFS};
use manifest_engine::object::Object;
use manifest_engine::pipeline::{chain, mutator, not, or, selector, MutatorRef, SelectorRef};
use manifest_engine::source::{FileSource, Location};

/// Render manifests from files and directories
#[derive(Args, Debug)]
pub struct RenderArgs {
    /// Manifest files or directories; directories are searched recursively
    /// for `.yaml`, `.yml` and `.json` files.
    #[arg(value_name = "PATH", required = true)]
    pub paths: Vec<PathBuf>,

    /// Read all paths concurrently. Output order is unchanged.
    #[arg(long)]
    pub concurrent: bool,

    /// Only keep objects of this kind (repeatable).
    #[arg(short, long = "kind", value_name = "KIND")]
    pub kinds: Vec<String>,

    /// Drop objects of this kind (repeatable).
    #[arg(long = "exclude-kind", value_name = "KIND")]
    pub exclude_kinds: Vec<String>,

    /// Set `metadata.labels.KEY` to VALUE on every object (repeatable).
    #[arg(short, long = "label", value_name = "KEY=VALUE", value_parser = parse_label)]
    pub labels: Vec<(String, String)>,

    /// Output format.
    #[arg(
        short,
        long,
        value_enum,
        default_value = "yaml",
        env = "MANIFEST_ENGINE_OUTPUT"
    )]
    pub output: OutputFormat,
}

/// Output encodings
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum OutputFormat {
    /// `---`-separated YAML documents
    #[default]
    Yaml,
    /// A pretty-printed JSON array
    Json,
}

impl From<OutputFormat> for Format {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Yaml => Format::Yaml,
            OutputFormat::Json => Format::Json,
        }
    }
}

fn parse_label(raw: &str) -> std::result::Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected KEY=VALUE, got '{}'", raw)),
    }
}

/// Build a file source for a host path.
///
/// Directories become the filesystem root; files are read relative to their
/// parent directory.
fn file_source(path: &Path) -> Result<FileSource> {
    if !path.exists() {
        anyhow::bail!("Path not found: {}", path.display());
    }

    let name = path.display().to_string();
    let (root, location) = if path.is_dir() {
        (path.to_path_buf(), PathBuf::from("."))
    } else {
        let parent = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let file_name = path
            .file_name()
            .map(PathBuf::from)
            .ok_or_else(|| anyhow::anyhow!("Invalid path: {}", path.display()))?;
        (parent, file_name)
    };

    let fs: Arc<dyn FileSystem> = Arc::new(OsFS::new(root));
    Ok(FileSource::new(name, fs, Location::Path(location))?)
}

fn kind_selector(kinds: &[String]) -> SelectorRef {
    or(kinds
        .iter()
        .map(|kind| {
            let kind = kind.clone();
            selector(move |_, o: &Object| Ok(o.kind() == kind))
        })
        .collect())
}

fn label_mutator(labels: &[(String, String)]) -> MutatorRef {
    chain(
        labels
            .iter()
            .map(|(key, value)| {
                let key = key.clone();
                let value = value.clone();
                mutator(move |_, mut o: Object| {
                    o.set_path(
                        &["metadata", "labels", key.as_str()],
                        Value::String(value.clone()),
                    );
                    Ok(o)
                })
            })
            .collect(),
    )
}

fn build_engine(args: &RenderArgs) -> Result<Engine> {
    let mut builder: EngineBuilder = Engine::builder().concurrent(args.concurrent);
    for path in &args.paths {
        builder = builder.source(file_source(path)?);
    }
    if !args.kinds.is_empty() {
        builder = builder.selector(kind_selector(&args.kinds));
    }
    if !args.exclude_kinds.is_empty() {
        builder = builder.selector(not(kind_selector(&args.exclude_kinds)));
    }
    if !args.labels.is_empty() {
        builder = builder.mutator(label_mutator(&args.labels));
    }
    Ok(builder.build()?)
}

/// Execute the `render` command.
pub fn execute(args: RenderArgs) -> Result<()> {
    let engine = build_engine(&args)?;
    let objects = engine
        .render(&Context::new(), &RenderOptions::new())
        .context("Render failed")?;

    let text = codec::encode(&objects, args.output.into())?;
    let mut stdout = std::io::stdout().lock();
    stdout.write_all(text.as_bytes())?;
    stdout.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use manifest_engine::pipeline::{Mutator, Selector};

    #[test]
    fn test_parse_label() {
        assert_eq!(
            parse_label("team=core").unwrap(),
            ("team".to_string(), "core".to_string())
        );
        assert_eq!(
            parse_label("note=a=b").unwrap(),
            ("note".to_string(), "a=b".to_string())
        );
        assert_eq!(parse_label("empty=").unwrap().1, "");
        assert!(parse_label("novalue").is_err());
        assert!(parse_label("=x").is_err());
    }

    #[test]
    fn test_kind_selector_matches_any() {
        let ctx = Context::new();
        let sel = kind_selector(&["Service".to_string(), "Deployment".to_string()]);
        let svc = Object::from_value(serde_json::json!({"kind": "Service"})).unwrap();
        let cm = Object::from_value(serde_json::json!({"kind": "ConfigMap"})).unwrap();
        assert!(sel.select(&ctx, &svc).unwrap());
        assert!(!sel.select(&ctx, &cm).unwrap());
    }

    #[test]
    fn test_label_mutator_applies_all_labels() {
        let labels = vec![
            ("team".to_string(), "core".to_string()),
            ("tier".to_string(), "web".to_string()),
        ];
        let obj = Object::from_value(serde_json::json!({"kind": "Service"})).unwrap();
        let out = label_mutator(&labels).mutate(&Context::new(), obj).unwrap();
        assert_eq!(
            out.get_path(&["metadata", "labels"]),
            Some(&serde_json::json!({"team": "core", "tier": "web"}))
        );
    }
}
