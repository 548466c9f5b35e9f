//! Command-line interface definitions for gptdoc

use clap::{Args, Parser, Subcommand, ValueEnum};
use gptdoc::generation::{Creativity, ImageQuality};
use gptdoc::selection::SelectionSpec;
use std::path::PathBuf;

/// Output format for the updated document
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Microsoft Word DOCX format
    Docx,
    /// Markdown text
    Markdown,
}

/// CLI structure for the gptdoc application
#[derive(Parser)]
#[command(name = "gptdoc")]
#[command(version)]
#[command(about = "Insert generated Markdown into documents", long_about = None)]
pub struct Cli {
    /// Configuration file (gptdoc.toml); environment variables override it
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Options shared by every command that updates a document
#[derive(Args, Debug, Clone)]
pub struct DocumentArgs {
    /// Markdown document to load (an empty document when omitted)
    #[arg(short, long, value_name = "PATH")]
    pub document: Option<PathBuf>,

    /// Where to write the result (printed as Markdown when omitted)
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Output format (inferred from the output extension when omitted)
    #[arg(short, long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Selected ranges: INDEX, INDEX:START-END or INDEX@ROW,COL
    #[arg(short, long = "select", value_name = "SPEC")]
    pub selection: Vec<SelectionSpec>,

    /// Count heading levels by leading '#' and keep lines that close a table
    #[arg(long)]
    pub corrected: bool,
}

/// Model options for text generation
#[derive(Args, Debug, Clone)]
pub struct CompletionArgs {
    /// How adventurous the completion should be
    #[arg(short, long, value_enum, default_value = "medium")]
    pub creativity: Creativity,

    /// Chat model to use
    #[arg(short, long, default_value = "gpt-3.5-turbo")]
    pub model: String,
}

/// Available subcommands for gptdoc
#[derive(Subcommand)]
pub enum Commands {
    /// Insert a Markdown text file into the document without any service calls
    Insert {
        /// File holding the Markdown text to insert
        #[arg(short, long, value_name = "PATH")]
        text: PathBuf,

        /// Print the blocks that would be inserted instead of writing anything
        #[arg(long)]
        dry_run: bool,

        #[command(flatten)]
        document: DocumentArgs,
    },

    /// Generate text from a prompt and append it to the document
    Generate {
        /// Prompt sent to the chat model
        prompt: String,

        #[command(flatten)]
        completion: CompletionArgs,

        #[command(flatten)]
        document: DocumentArgs,
    },

    /// Generate text from a prompt plus the selection and insert it after the selection
    Rewrite {
        /// Instruction placed before the selected text
        prompt: String,

        #[command(flatten)]
        completion: CompletionArgs,

        #[command(flatten)]
        document: DocumentArgs,
    },

    /// Generate an image illustrating the selection
    Image {
        /// Style caption appended to the generated image prompt
        caption: String,

        /// Image quality (low, mid or high)
        #[arg(short, long, value_enum, default_value = "mid")]
        quality: ImageQuality,

        /// Where to write the image file (defaults to the name the service returns)
        #[arg(long, value_name = "PATH")]
        image_output: Option<PathBuf>,

        #[command(flatten)]
        document: DocumentArgs,
    },
}
