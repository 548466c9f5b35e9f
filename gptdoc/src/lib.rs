//! gptdoc - generated Markdown into structured documents
//!
//! Converts Markdown-flavoured text from a chat model into headings, list
//! items, paragraphs and tables, and inserts them into a document at a
//! cursor that starts after an anchor block (or in front of the trailing
//! sentinel paragraph).

#![deny(unsafe_code)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]

pub mod assembly;
pub mod config;
pub mod document_model;
pub mod generation;
pub mod selection;
pub mod workflow;

// Loading and exporting documents
pub mod docx_exporter;
pub mod markdown_exporter;
pub mod markdown_loader;
