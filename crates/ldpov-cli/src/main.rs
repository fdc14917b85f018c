//! ldpov CLI - LDraw models to POV-Ray scenes
//!
//! Reads a model document (JSON) and writes a scene file plus the include
//! files it needs.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use ldpov_ir::{ColorTable, Document};
use ldpov_scene::{
    classify, declaration_name, primitive_file_name, stage_resources, synthesize, write_materials,
    PovRenderer, PrimitiveRegistry, RenderConfig, SceneWriter, Synthesis,
};
use log::info;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "ldpov")]
#[command(about = "Convert LDraw brick models to POV-Ray scenes", long_about = None)]
struct Cli {
    /// Log progress (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a model document to a scene file
    Render {
        /// Input model document (.json)
        input: PathBuf,
        /// Output scene (.pov)
        output: PathBuf,
        /// Render configuration (.toml)
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Primitive manifest, overriding the configuration
        #[arg(short, long)]
        manifest: Option<PathBuf>,
        /// Do not write include files next to the scene
        #[arg(long)]
        no_resources: bool,
    },
    /// Write the materials include for a document's colors
    Materials {
        /// Input model document (.json)
        input: PathBuf,
        /// Output include (.inc)
        output: PathBuf,
    },
    /// Print the declaration synthesized for a primitive name
    Primitive {
        /// Primitive file name, e.g. 4-8cylo.dat
        name: String,
    },
    /// Display information about a model document
    Info {
        /// Path to the model document
        file: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { "info" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    match cli.command {
        Commands::Render {
            input,
            output,
            config,
            manifest,
            no_resources,
        } => {
            render(&input, &output, config.as_deref(), manifest, no_resources)?;
        }
        Commands::Materials { input, output } => {
            let doc = read_document(&input)?;
            let file = File::create(&output)
                .with_context(|| format!("cannot create {}", output.display()))?;
            write_materials(&doc, BufWriter::new(file))?;
            println!("Wrote {} materials to {}", doc.colors.len(), output.display());
        }
        Commands::Primitive { name } => {
            show_primitive(&name)?;
        }
        Commands::Info { file } => {
            show_info(&file)?;
        }
    }

    Ok(())
}

fn read_document(path: &Path) -> Result<Document> {
    let json =
        fs::read_to_string(path).with_context(|| format!("cannot read {}", path.display()))?;
    let doc = Document::from_json(&json)
        .with_context(|| format!("invalid model document {}", path.display()))?;
    Ok(doc)
}

fn render(
    input: &Path,
    output: &Path,
    config: Option<&Path>,
    manifest: Option<PathBuf>,
    no_resources: bool,
) -> Result<()> {
    let doc = read_document(input)?;
    let mut config = match config {
        Some(path) => RenderConfig::load(path)
            .with_context(|| format!("cannot load configuration {}", path.display()))?,
        None => RenderConfig::default(),
    };
    if manifest.is_some() {
        config.primitives_manifest = manifest;
    }

    if !no_resources {
        let dir = output
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        let staged = stage_resources(dir, &config, &doc)?;
        info!("Header: {}", staged.header.display());
        info!("Materials: {}", staged.materials.display());
    }

    let file =
        File::create(output).with_context(|| format!("cannot create {}", output.display()))?;
    let mut renderer = PovRenderer::new(BufWriter::new(file), config)?;
    renderer.start_render()?;
    let report = renderer.add_model(&doc.model, &doc, &doc)?;
    let generated = renderer.registry().generated_count();
    renderer.finish()?;

    println!("Rendered {} to {}", input.display(), output.display());
    println!("  Instances: {}", doc.model.len());
    println!("  Triangles: {}", report.triangles);
    println!("  Objects: {}", report.objects);
    println!("  Generated primitives: {}", generated);
    if report.warnings() > 0 {
        println!("  Warnings: {}", report.warnings());
        if report.singular() {
            println!("    Singular placements: {}", report.singular_transforms);
        }
        if report.missing_parts > 0 {
            println!("    Missing parts: {}", report.missing_parts);
        }
        if report.cycles > 0 {
            println!("    Self-referencing parts: {}", report.cycles);
        }
        if report.unknown_colors > 0 {
            println!("    Unknown colors: {}", report.unknown_colors);
        }
    }

    Ok(())
}

fn show_primitive(name: &str) -> Result<()> {
    let file_name = primitive_file_name(name);
    let mut registry = PrimitiveRegistry::new();
    let stdout = io::stdout();
    let mut writer = SceneWriter::new(stdout.lock());

    match synthesize(&file_name, &mut registry, &mut writer)? {
        Synthesis::Generated => {
            writer.flush()?;
            Ok(())
        }
        Synthesis::NotProcedural => {
            anyhow::bail!("{} is not a procedural primitive name", name)
        }
        Synthesis::Rejected => {
            anyhow::bail!(
                "{} ({:?}) cannot be generated as {}",
                name,
                classify(&file_name),
                declaration_name(&file_name)
            )
        }
        Synthesis::AlreadyAvailable => Ok(()),
    }
}

fn show_info(file: &Path) -> Result<()> {
    let doc = read_document(file)?;

    println!("Model document: {}", file.display());
    println!("  Version: {}", doc.version);
    println!("  Colors: {}", doc.all_colors().len());
    println!("  Parts: {}", doc.parts.len());
    println!("  Instances: {}", doc.model.len());

    if !doc.model.is_empty() {
        println!("\nModel:");
        let mut out = io::stdout().lock();
        for (i, instance) in doc.model.iter().enumerate() {
            let color = u32::from(instance.color);
            let color_name = doc
                .color(color)
                .map(|c| c.name.as_str())
                .unwrap_or("unknown");
            writeln!(
                out,
                "  {}: {} (color {} {})",
                i + 1,
                instance.part,
                color,
                color_name
            )?;
        }
    }

    Ok(())
}
