//! Markdown exporter for document bodies
//!
//! Writes a [`Body`] back out as Markdown:
//! - Headings as ATX `#` lines
//! - Consecutive list items as one tight list
//! - Tables in pipe syntax with the first row as header
//! - Generated images embedded as data URLs (base64 encoded)

use crate::document_model::{Body, Element, ElementId, ElementKind, Glyph};
use crate::generation::GeneratedImage;
use crate::workflow::PlacedImage;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::fs;
use std::io::Write;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during markdown export
#[derive(Error, Debug)]
pub enum MarkdownExportError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Export a body to a markdown file
///
/// # Parameters
/// * `body` - The document to export
/// * `images` - Generated images to embed after their anchors
/// * `output_path` - Path where the markdown file will be written
///
/// # Returns
/// * `Ok(())` - Successfully exported to markdown
/// * `Err(MarkdownExportError)` - Error during export
pub fn to_markdown(
    body: &Body,
    images: &[PlacedImage<ElementId>],
    output_path: &Path,
) -> Result<(), MarkdownExportError> {
    let output = render_markdown(body, images);

    if let Some(parent) = output_path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut file = fs::File::create(output_path)?;
    file.write_all(output.as_bytes())?;

    log::info!("Wrote markdown to: {}", output_path.display());
    Ok(())
}

/// Render a body as markdown text
///
/// Empty paragraphs, the sentinel included, produce no output.
pub fn render_markdown(body: &Body, images: &[PlacedImage<ElementId>]) -> String {
    let mut output = String::new();
    let mut list_number = 0;

    for element in body.elements() {
        match &element.kind {
            ElementKind::ListItem { text, glyph } => {
                let marker = match glyph {
                    Glyph::Bullet => "-".to_string(),
                    Glyph::Number => {
                        list_number += 1;
                        format!("{}.", list_number)
                    }
                };
                output.push_str(&format!("{} {}\n", marker, text));
            }
            kind => {
                end_list(&mut output, &mut list_number);
                write_block(&mut output, kind);
            }
        }

        let attached: Vec<&GeneratedImage> = images
            .iter()
            .filter(|placed| placed.anchor == Some(element.id))
            .map(|placed| &placed.image)
            .collect();
        if !attached.is_empty() {
            end_list(&mut output, &mut list_number);
            for image in attached {
                write_image(&mut output, image);
            }
        }
    }
    end_list(&mut output, &mut list_number);

    for placed in images {
        if !is_anchored(body.elements(), placed) {
            write_image(&mut output, &placed.image);
        }
    }

    output
}

fn is_anchored(elements: &[Element], placed: &PlacedImage<ElementId>) -> bool {
    placed
        .anchor
        .is_some_and(|id| elements.iter().any(|element| element.id == id))
}

/// Close a running list with a blank line
fn end_list(output: &mut String, list_number: &mut usize) {
    if output.ends_with('\n') && !output.ends_with("\n\n") {
        output.push('\n');
    }
    *list_number = 0;
}

fn write_block(output: &mut String, kind: &ElementKind) {
    match kind {
        ElementKind::Paragraph {
            text,
            heading: Some(level),
        } => {
            output.push_str(&format!("{} {}\n\n", "#".repeat(*level), text));
        }
        ElementKind::Paragraph {
            text,
            heading: None,
        } => {
            if !text.is_empty() {
                output.push_str(text);
                output.push_str("\n\n");
            }
        }
        ElementKind::Table { rows } => write_table(output, rows),
        ElementKind::ListItem { .. } => {}
    }
}

/// Write a table as a markdown pipe table
fn write_table(output: &mut String, rows: &[Vec<String>]) {
    let Some((header, body_rows)) = rows.split_first() else {
        return;
    };

    write_table_row(output, header);

    output.push('|');
    for _ in header {
        output.push_str(" --- |");
    }
    output.push('\n');

    for row in body_rows {
        write_table_row(output, row);
    }
    output.push('\n');
}

fn write_table_row(output: &mut String, cells: &[String]) {
    output.push('|');
    for cell in cells {
        output.push_str(&format!(" {} |", cell.replace('|', "\\|")));
    }
    output.push('\n');
}

/// Embed an image as a data URL
fn write_image(output: &mut String, image: &GeneratedImage) {
    let data_url = format!(
        "data:{};base64,{}",
        image.mime_type,
        STANDARD.encode(&image.bytes)
    );
    output.push_str(&format!("![{}]({})\n\n", image.file_name, data_url));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markdown_loader::parse_body;

    #[test]
    fn test_render_blocks() {
        let mut body = Body::new();
        body.append(ElementKind::heading(2, "Summary"));
        body.append(ElementKind::bullet("one"));
        body.append(ElementKind::bullet("two"));
        body.append(ElementKind::paragraph("Closing words"));
        body.append(ElementKind::Table {
            rows: vec![
                vec!["A".to_string(), "B".to_string()],
                vec!["1".to_string(), "2".to_string()],
            ],
        });

        let expected = "## Summary\n\n- one\n- two\n\nClosing words\n\n| A | B |\n| --- | --- |\n| 1 | 2 |\n\n";
        assert_eq!(render_markdown(&body, &[]), expected);
    }

    #[test]
    fn test_numbered_items_count_up() {
        let mut body = Body::new();
        for text in ["first", "second"] {
            body.append(ElementKind::ListItem {
                text: text.to_string(),
                glyph: Glyph::Number,
            });
        }
        assert_eq!(render_markdown(&body, &[]), "1. first\n2. second\n\n");
    }

    #[test]
    fn test_image_follows_anchor() {
        let mut body = Body::new();
        let id = body.append(ElementKind::paragraph("Lighthouse"));
        body.append(ElementKind::paragraph("After"));
        let images = [PlacedImage {
            image: GeneratedImage {
                bytes: b"png".to_vec(),
                mime_type: "image/png".to_string(),
                file_name: "v1_txt2img_0.png".to_string(),
            },
            anchor: Some(id),
        }];

        let output = render_markdown(&body, &images);
        assert_eq!(
            output,
            "Lighthouse\n\n![v1_txt2img_0.png](data:image/png;base64,cG5n)\n\nAfter\n\n"
        );
    }

    #[test]
    fn test_output_reloads_to_same_elements() {
        let mut body = Body::new();
        body.append(ElementKind::heading(1, "Title"));
        body.append(ElementKind::bullet("item"));
        body.append(ElementKind::paragraph("Text"));
        body.append(ElementKind::Table {
            rows: vec![vec!["Name".to_string()], vec!["Alice".to_string()]],
        });

        let reloaded = parse_body(&render_markdown(&body, &[]));
        let kinds = |body: &Body| -> Vec<ElementKind> {
            body.elements().iter().map(|e| e.kind.clone()).collect()
        };
        assert_eq!(kinds(&reloaded), kinds(&body));
    }

    #[test]
    fn test_to_markdown_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.md");
        let mut body = Body::new();
        body.append(ElementKind::paragraph("Hello"));
        to_markdown(&body, &[], &path).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "Hello\n\n");
    }
}
