//! Command-line interface for the converter.
//!
//! The schema goes to stdout unless `--output` is given; progress and
//! status messages go to stderr.

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::codelist::{DisabledResolver, GenericodeFileResolver, ResolverChain, XRepositoryResolver};
use crate::config::{ConvertOptions, EmitOptions, HttpConfig, ParseOptions, XREPOSITORY_URL};
use crate::converter::convert_document;
use crate::error::Result;
use crate::header::HasHeader;
use crate::loader::DocumentSource;
use crate::model::render_tree;
use crate::parser::parse_document;
use crate::version::FimVersion;

/// Convert FIM XDatenfelder documents into JSON Schema.
#[derive(Parser)]
#[command(name = "ozg-xdatenfelder")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Convert a FIM document to JSON Schema.
    Convert {
        /// FIM XML file, URL or inline XML
        input: String,

        /// Write the schema to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Force the XDatenfelder version (1 or 2) instead of detecting it
        #[arg(long, value_name = "VERSION")]
        fim_version: Option<FimVersion>,

        /// Local genericode file, as URI=PATH or PATH (uses the file's canonical URI)
        #[arg(long = "codelist", value_name = "URI=PATH", value_parser = parse_code_list_arg)]
        code_lists: Vec<CodeListArg>,

        /// Do not query the code-list registry
        #[arg(long)]
        offline: bool,

        /// Base URL of the XRepository code-list registry
        #[arg(long, value_name = "URL", default_value = XREPOSITORY_URL)]
        registry_url: String,

        /// Inline repeated elements instead of collecting them under $defs
        #[arg(long)]
        inline_defs: bool,

        /// Write compact JSON instead of pretty-printed JSON
        #[arg(long)]
        compact: bool,
    },

    /// Print the parsed element tree of a FIM document.
    Inspect {
        /// FIM XML file, URL or inline XML
        input: String,

        /// Force the XDatenfelder version (1 or 2) instead of detecting it
        #[arg(long, value_name = "VERSION")]
        fim_version: Option<FimVersion>,
    },
}

/// A `--codelist` argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeListArg {
    /// Explicit URI; `None` means "read it from the file".
    pub uri: Option<String>,
    pub path: PathBuf,
}

fn parse_code_list_arg(value: &str) -> std::result::Result<CodeListArg, String> {
    match value.split_once('=') {
        Some((uri, path)) if !uri.is_empty() && !path.is_empty() => Ok(CodeListArg {
            uri: Some(uri.to_string()),
            path: PathBuf::from(path),
        }),
        Some(_) => Err(format!("expected URI=PATH, got '{value}'")),
        None if value.is_empty() => Err("code list path must not be empty".to_string()),
        None => Ok(CodeListArg {
            uri: None,
            path: PathBuf::from(value),
        }),
    }
}

/// Run the CLI.
pub fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Convert {
            input,
            output,
            fim_version,
            code_lists,
            offline,
            registry_url,
            inline_defs,
            compact,
        } => {
            let options = ConvertOptions {
                parse: ParseOptions {
                    version: fim_version,
                },
                emit: EmitOptions {
                    deduplicate: !inline_defs,
                },
                http: HttpConfig::default(),
            };
            let resolver = build_resolver(&code_lists, offline, &registry_url, &options.http)?;
            convert_command(&input, output.as_deref(), &options, &resolver, compact)
        }
        Commands::Inspect { input, fim_version } => inspect_command(
            &input,
            &ParseOptions {
                version: fim_version,
            },
        ),
    }
}

/// Local files first, then the registry (unless offline).
fn build_resolver(
    code_lists: &[CodeListArg],
    offline: bool,
    registry_url: &str,
    http: &HttpConfig,
) -> Result<ResolverChain> {
    let mut local = GenericodeFileResolver::new();
    for arg in code_lists {
        match &arg.uri {
            Some(uri) => local.insert(uri.clone(), arg.path.clone()),
            None => {
                local.register_file(&arg.path)?;
            }
        }
    }

    let mut chain = ResolverChain::new();
    if !local.is_empty() {
        chain = chain.with(local);
    }
    if offline {
        chain = chain.with(DisabledResolver);
    } else {
        chain = chain.with(XRepositoryResolver::new(http)?.with_base_url(registry_url));
    }
    Ok(chain)
}

fn spinner() -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    #[allow(clippy::expect_used)] // Static template string that is guaranteed to be valid
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .expect("valid template"),
    );
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

/// Execute the convert command.
fn convert_command(
    input: &str,
    output: Option<&Path>,
    options: &ConvertOptions,
    resolver: &ResolverChain,
    compact: bool,
) -> Result<()> {
    let pb = spinner();

    pb.set_message("Loading FIM document...");
    let xml = match DocumentSource::detect(input).load(&options.http) {
        Ok(xml) => xml,
        Err(e) => {
            pb.finish_and_clear();
            return Err(e);
        }
    };

    pb.set_message("Parsing element tree...");
    let document = match parse_document(&xml, &options.parse) {
        Ok(document) => document,
        Err(e) => {
            pb.finish_and_clear();
            return Err(e);
        }
    };

    pb.set_message("Resolving code lists and emitting schema...");
    let schema = convert_document(&document, &options.emit, resolver);
    pb.finish_and_clear();

    let json = if compact {
        serde_json::to_string(&schema)?
    } else {
        serde_json::to_string_pretty(&schema)?
    };

    eprintln!(
        "{} {} ({}, {} fields)",
        style("Converted").bold(),
        style(document.id()).cyan(),
        document.version,
        document.fields().count()
    );

    match output {
        Some(path) => {
            fs::write(path, json + "\n")?;
            eprintln!("{} {}", style("Saved to:").green().bold(), path.display());
        }
        None => println!("{json}"),
    }

    Ok(())
}

/// Execute the inspect command.
fn inspect_command(input: &str, options: &ParseOptions) -> Result<()> {
    let xml = DocumentSource::detect(input).load(&HttpConfig::default())?;
    let document = parse_document(&xml, options)?;

    println!("{}", render_tree(&document));
    println!();
    println!(
        "  Sections: {}",
        style(document.structures.len()).green()
    );
    println!("  Fields: {}", style(document.fields().count()).green());

    Ok(())
}
