//! gptdoc - insert generated Markdown into documents
//!
//! A CLI tool that asks chat and image generation services for content and
//! inserts the result into a Markdown or Word document.

#![deny(unsafe_code)]

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands, CompletionArgs, DocumentArgs, OutputFormat};
use gptdoc::assembly::{AssemblyEngine, AssemblyOptions, BlockLog, DocumentSink};
use gptdoc::config::GenerationConfig;
use gptdoc::document_model::{Body, ElementId};
use gptdoc::generation::{image_backend, OpenAiChat, UreqTransport};
use gptdoc::selection::{BodySelection, SelectedRange, SelectionProvider};
use gptdoc::workflow::{self, Completion, PlacedImage};
use gptdoc::{docx_exporter, markdown_exporter, markdown_loader};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main entry point for the gptdoc CLI application
fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {:?}", e);
        std::process::exit(1);
    }
}

/// Run the CLI application
fn run() -> Result<()> {
    let cli = Cli::parse();

    let mut logger = env_logger::Builder::from_default_env();
    if cli.verbose {
        logger.filter_level(log::LevelFilter::Info);
    }
    logger.init();

    match cli.command {
        Commands::Insert {
            text,
            dry_run,
            document,
        } => handle_insert_command(&text, dry_run, &document),

        Commands::Generate {
            prompt,
            completion,
            document,
        } => handle_generate_command(cli.config.as_deref(), &prompt, &completion, &document),

        Commands::Rewrite {
            prompt,
            completion,
            document,
        } => handle_rewrite_command(cli.config.as_deref(), &prompt, &completion, &document),

        Commands::Image {
            caption,
            quality,
            image_output,
            document,
        } => handle_image_command(
            cli.config.as_deref(),
            &caption,
            quality,
            image_output,
            &document,
        ),
    }
}

/// Handle the insert command
fn handle_insert_command(text_path: &Path, dry_run: bool, args: &DocumentArgs) -> Result<()> {
    let text = std::fs::read_to_string(text_path)
        .with_context(|| format!("Failed to read {}", text_path.display()))?;
    let mut body = load_document(args)?;
    let selection = capture_selection(&body, args)?;
    let engine = AssemblyEngine::new(assembly_options(args));

    if dry_run {
        let anchor = selection
            .parent_anchor()
            .and_then(|id| body.position(id));
        let mut log = BlockLog::with_sentinel(body.sentinel_index());
        let report = engine
            .run(&text, anchor.as_ref(), &mut log)
            .unwrap_or_else(|never| match never {});

        println!(
            "Would insert {} blocks at indices {}..{}:",
            report.blocks_inserted(),
            report.start,
            report.end
        );
        for (index, block) in log.entries() {
            println!("  [{}] {:?}", index, block);
        }
        return Ok(());
    }

    let anchor = selection.parent_anchor();
    let report = engine
        .run(&text, anchor.as_ref(), &mut body)
        .with_context(|| format!("Failed to insert {}", text_path.display()))?;
    println!("✓ Inserted {} blocks", report.blocks_inserted());

    write_document(&body, &[], args)
}

/// Handle the generate command
fn handle_generate_command(
    config_path: Option<&Path>,
    prompt: &str,
    completion: &CompletionArgs,
    args: &DocumentArgs,
) -> Result<()> {
    let config = load_config(config_path)?;
    let transport = http_transport(&config);
    let chat = OpenAiChat::new(&transport, &config);
    let mut body = load_document(args)?;

    let report = workflow::generate_text_from_prompt(
        &chat,
        &mut body,
        prompt,
        completion_of(completion),
        assembly_options(args),
    )
    .context("Failed to generate text from prompt")?;
    println!("✓ Inserted {} blocks", report.blocks_inserted());

    write_document(&body, &[], args)
}

/// Handle the rewrite command
fn handle_rewrite_command(
    config_path: Option<&Path>,
    prompt: &str,
    completion: &CompletionArgs,
    args: &DocumentArgs,
) -> Result<()> {
    let config = load_config(config_path)?;
    let transport = http_transport(&config);
    let chat = OpenAiChat::new(&transport, &config);
    let mut body = load_document(args)?;
    let selection = capture_selection(&body, args)?;

    let report = workflow::generate_text_from_selection(
        &chat,
        &selection,
        &mut body,
        prompt,
        completion_of(completion),
        assembly_options(args),
    )
    .context("Failed to generate text from selection")?;

    match report {
        Some(report) => println!("✓ Inserted {} blocks", report.blocks_inserted()),
        None => {
            println!("Nothing selected, document left unchanged");
            return Ok(());
        }
    }

    write_document(&body, &[], args)
}

/// Handle the image command
fn handle_image_command(
    config_path: Option<&Path>,
    caption: &str,
    quality: gptdoc::generation::ImageQuality,
    image_output: Option<PathBuf>,
    args: &DocumentArgs,
) -> Result<()> {
    let config = load_config(config_path)?;
    let transport = http_transport(&config);
    let chat = OpenAiChat::new(&transport, &config);
    let backend = image_backend(quality, &transport, &config);
    let body = load_document(args)?;
    let selection = capture_selection(&body, args)?;

    let Some(placed) =
        workflow::generate_image_from_selection(&chat, backend.as_ref(), &config, &selection, caption)
            .context("Failed to generate image from selection")?
    else {
        println!("Nothing selected, no image generated");
        return Ok(());
    };

    let image_path = image_output.unwrap_or_else(|| PathBuf::from(&placed.image.file_name));
    std::fs::write(&image_path, &placed.image.bytes)
        .with_context(|| format!("Failed to write {}", image_path.display()))?;
    match placed.image.dimensions() {
        Some((width, height)) => println!(
            "✓ Wrote {}x{} image to {}",
            width,
            height,
            image_path.display()
        ),
        None => println!("✓ Wrote image to {}", image_path.display()),
    }

    if args.output.is_some() {
        write_document(&body, &[placed], args)?;
    }
    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<GenerationConfig> {
    GenerationConfig::resolve(path).context("Failed to load configuration")
}

fn http_transport(config: &GenerationConfig) -> UreqTransport {
    UreqTransport::new(Duration::from_secs(config.request_timeout_secs))
}

fn completion_of(args: &CompletionArgs) -> Completion<'_> {
    Completion {
        model: &args.model,
        creativity: args.creativity,
    }
}

fn assembly_options(args: &DocumentArgs) -> AssemblyOptions {
    if args.corrected {
        AssemblyOptions::corrected()
    } else {
        AssemblyOptions::default()
    }
}

/// Load the document named on the command line, or start an empty one
fn load_document(args: &DocumentArgs) -> Result<Body> {
    match &args.document {
        Some(path) => markdown_loader::load_body(path)
            .with_context(|| format!("Failed to load document {}", path.display())),
        None => Ok(Body::new()),
    }
}

fn capture_selection(body: &Body, args: &DocumentArgs) -> Result<BodySelection> {
    let ranges = args
        .selection
        .iter()
        .map(|spec| spec.resolve(body))
        .collect::<Result<Vec<SelectedRange>, _>>()
        .context("Failed to resolve selection")?;
    BodySelection::capture(body, &ranges).context("Failed to capture selection")
}

/// Write the document to `--output`, or print it as Markdown
fn write_document(body: &Body, images: &[PlacedImage<ElementId>], args: &DocumentArgs) -> Result<()> {
    log::info!(
        "Document has {} elements, {} words, {} tables",
        body.len(),
        body.word_count(),
        body.table_count()
    );

    let Some(output) = &args.output else {
        print!("{}", markdown_exporter::render_markdown(body, images));
        return Ok(());
    };

    match args.format.unwrap_or_else(|| format_for(output)) {
        OutputFormat::Docx => docx_exporter::to_docx(body, images, output)
            .with_context(|| format!("Failed to export DOCX to {}", output.display()))?,
        OutputFormat::Markdown => markdown_exporter::to_markdown(body, images, output)
            .with_context(|| format!("Failed to export markdown to {}", output.display()))?,
    }
    println!("✓ Wrote {}", output.display());
    Ok(())
}

/// Determine the output format from the file extension
fn format_for(output: &Path) -> OutputFormat {
    match output.extension().and_then(|ext| ext.to_str()) {
        Some("md") | Some("markdown") => OutputFormat::Markdown,
        _ => OutputFormat::Docx,
    }
}
