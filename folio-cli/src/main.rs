//! A command line tool for inspecting, rewriting and merging PDF files.

use anyhow::{Context as _, bail};
use clap::{Parser, Subcommand};
use folio::{Document, LoadOptions, ParseOptions, ParseSpeed, WriteOptions};
use log::info;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "folio")]
#[command(version)]
#[command(about = "Inspect, rewrite and merge PDF files", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show information about a document
    Info {
        /// Input PDF file
        #[arg(value_name = "FILE")]
        input: PathBuf,
    },

    /// Parse a document and write it out again
    Rewrite {
        /// Input PDF file
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Output PDF file
        #[arg(value_name = "OUTPUT")]
        output: PathBuf,

        /// Pack objects into compressed object streams
        #[arg(long)]
        object_streams: bool,

        /// Fail on the first broken object instead of skipping it
        #[arg(long)]
        strict: bool,

        /// Drop objects that are no longer referenced
        #[arg(long)]
        prune: bool,
    },

    /// Concatenate the pages of several documents
    Merge {
        /// Output PDF file
        #[arg(value_name = "OUTPUT")]
        output: PathBuf,

        /// Input PDF files
        #[arg(value_name = "INPUTS", required = true)]
        inputs: Vec<PathBuf>,

        /// Pack objects into compressed object streams
        #[arg(long)]
        object_streams: bool,
    },
}

fn load(path: &Path, options: &LoadOptions) -> anyhow::Result<Document> {
    let data = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;

    Document::load_with(&data, options)
        .with_context(|| format!("failed to parse {}", path.display()))
}

fn save(doc: &mut Document, path: &Path, object_streams: bool) -> anyhow::Result<()> {
    let bytes = doc
        .save(WriteOptions {
            use_object_streams: object_streams,
            ..WriteOptions::default()
        })
        .context("failed to serialize document")?;

    fs::write(path, &bytes).with_context(|| format!("failed to write {}", path.display()))?;
    info!("wrote {} bytes to {}", bytes.len(), path.display());

    Ok(())
}

fn show_info(input: &Path) -> anyhow::Result<()> {
    let doc = load(input, &LoadOptions::default())?;
    let metadata = doc.metadata();

    println!("Version:  {}", doc.version());
    println!("Objects:  {}", doc.context().len());
    println!("Pages:    {}", doc.page_count());

    let fields = [
        ("Title", &metadata.title),
        ("Author", &metadata.author),
        ("Subject", &metadata.subject),
        ("Keywords", &metadata.keywords),
        ("Creator", &metadata.creator),
        ("Producer", &metadata.producer),
    ];

    for (label, value) in fields {
        if let Some(value) = value {
            println!("{:<10}{value}", format!("{label}:"));
        }
    }

    if let Some(date) = metadata.creation_date {
        println!("Created:  {}", date.to_pdf_string());
    }

    if let Some(date) = metadata.modification_date {
        println!("Modified: {}", date.to_pdf_string());
    }

    Ok(())
}

fn rewrite(
    input: &Path,
    output: &Path,
    object_streams: bool,
    strict: bool,
    prune: bool,
) -> anyhow::Result<()> {
    let options = LoadOptions {
        parse: ParseOptions {
            throw_on_invalid_object: strict,
            parse_speed: if strict {
                ParseSpeed::Fastest
            } else {
                ParseSpeed::default()
            },
            ..ParseOptions::default()
        },
    };

    let mut doc = load(input, &options)?;

    if prune {
        info!("pruned {} objects", doc.prune());
    }

    save(&mut doc, output, object_streams)
}

fn merge(output: &Path, inputs: &[PathBuf], object_streams: bool) -> anyhow::Result<()> {
    if inputs.is_empty() {
        bail!("no input files given");
    }

    let mut merged = Document::create();

    for input in inputs {
        let doc = load(input, &LoadOptions::default())?;
        let indices = (0..doc.page_count()).collect::<Vec<_>>();

        merged
            .copy_pages_from(&doc, &indices)
            .with_context(|| format!("failed to copy pages from {}", input.display()))?;
        info!("copied {} pages from {}", indices.len(), input.display());
    }

    save(&mut merged, output, object_streams)
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let cli = Cli::parse();

    match cli.command {
        Command::Info { input } => show_info(&input),
        Command::Rewrite {
            input,
            output,
            object_streams,
            strict,
            prune,
        } => rewrite(&input, &output, object_streams, strict, prune),
        Command::Merge {
            output,
            inputs,
            object_streams,
        } => merge(&output, &inputs, object_streams),
    }
}
