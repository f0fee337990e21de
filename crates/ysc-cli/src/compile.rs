//! # Compile Subcommand
//!
//! `ysc compile <TREE>` compiles a schema tree and writes the JSON Schema
//! document to `--out` or stdout. Flags override the configuration file.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use ysc_compiler::{compile, write_document, CompileOptions, ConfigPolicy, Encoding, Layout, SchemaDraft};

use crate::config::load_config;
use crate::{load_unit, EXIT_COMPILE_ERROR, EXIT_OK};

/// Arguments for `ysc compile`.
#[derive(Args, Debug)]
pub struct CompileArgs {
    /// Parsed schema tree (JSON, or YAML for `.yaml`/`.yml` files).
    pub tree: PathBuf,

    /// Module to compile, by name or prefix. All modules when omitted.
    #[arg(long)]
    pub root: Option<String>,

    /// Write the document here instead of stdout.
    #[arg(short, long)]
    pub out: Option<PathBuf>,

    /// Omit non-configuration (`config false`) nodes.
    #[arg(long)]
    pub config_only: bool,

    /// Rewrite `prefix:name` property keys to `name`.
    #[arg(long)]
    pub strip_namespaces: bool,

    /// JSON Schema draft: draft-07, 2019-09, 2020-12, or a draft URI.
    #[arg(long)]
    pub draft: Option<SchemaDraft>,

    /// Encode values as RFC 7951 JSON (64-bit numbers as strings).
    #[arg(long)]
    pub rfc7951: bool,

    /// Reject `config true` below a `config false` ancestor.
    #[arg(long)]
    pub strict_config: bool,

    /// Separate data nodes and rpcs/actions into `data` and `operations`.
    #[arg(long)]
    pub split: bool,

    /// Document title. Defaults to the compiled module names.
    #[arg(long)]
    pub title: Option<String>,

    /// Leave out `description` annotations.
    #[arg(long)]
    pub no_annotations: bool,
}

impl CompileArgs {
    /// Apply the flags that were given on top of `options`.
    pub fn apply(&self, options: &mut CompileOptions) {
        if self.config_only {
            options.config_only = true;
        }
        if self.strip_namespaces {
            options.strip_namespaces = true;
        }
        if let Some(draft) = self.draft {
            options.draft = draft;
        }
        if self.rfc7951 {
            options.encoding = Encoding::Rfc7951;
        }
        if self.strict_config {
            options.config_policy = ConfigPolicy::Strict;
        }
        if self.split {
            options.layout = Layout::Split;
        }
        if let Some(title) = &self.title {
            options.title = Some(title.clone());
        }
        if self.no_annotations {
            options.annotate = false;
        }
    }
}

/// Execute the compile subcommand.
pub fn run_compile(args: &CompileArgs, config_path: Option<&Path>) -> Result<u8> {
    let config = load_config(config_path)?;
    let mut options = config.options;
    args.apply(&mut options);
    let root = args.root.as_deref().or(config.root.as_deref());

    let unit = load_unit(&args.tree)?;
    let document = match compile(&unit, root, &options) {
        Ok(document) => document,
        Err(e) => {
            tracing::error!(tree = %args.tree.display(), "compilation failed: {e}");
            return Ok(EXIT_COMPILE_ERROR);
        }
    };

    match &args.out {
        Some(path) => {
            let file = File::create(path).with_context(|| format!("failed to create output file: {}", path.display()))?;
            write_document(&document, BufWriter::new(file))
                .with_context(|| format!("failed to write schema: {}", path.display()))?;
            tracing::info!(out = %path.display(), title = %document.title, "wrote schema");
        }
        None => {
            let stdout = std::io::stdout();
            let mut lock = stdout.lock();
            write_document(&document, &mut lock).context("failed to write schema to stdout")?;
            lock.flush().context("failed to flush stdout")?;
        }
    }
    Ok(EXIT_OK)
}
