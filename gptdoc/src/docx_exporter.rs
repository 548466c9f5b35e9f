//! DOCX export using the docx-rs library
//!
//! Builds a Word document from scratch: headings get built-in styles,
//! list items use bullet or decimal numbering, and the first row of every
//! table is bold. Generated images are placed after their anchor element.

use crate::document_model::{Body, ElementId, ElementKind, Glyph, MAX_HEADING_LEVEL};
use crate::generation::GeneratedImage;
use crate::workflow::PlacedImage;
use docx_rs::{
    AbstractNumbering, AlignmentType, Docx, IndentLevel, Level, LevelJc, LevelText,
    NumberFormat, Numbering, NumberingId, Paragraph, Pic, Run, SpecialIndentType, Start, Style,
    StyleType, Table, TableCell, TableRow,
};
use std::fs::File;
use std::io::{Seek, Write};
use std::path::Path;
use thiserror::Error;

/// EMUs (English Metric Units) per pixel at 96 DPI
const EMUS_PER_PIXEL: u32 = 9525;

/// Edge length of embedded generated images, in pixels
const IMAGE_EDGE_PIXELS: u32 = 300;

const BULLET_NUMBERING: usize = 1;
const DECIMAL_NUMBERING: usize = 2;

/// Errors that can occur during export
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Format error: {0}")]
    Format(String),
}

/// Export a body to a .docx file
///
/// # Parameters
/// * `body` - Document to export
/// * `images` - Generated images to place after their anchors
/// * `output_path` - Path where the .docx file will be written
///
/// # Returns
/// * `Ok(())` - Successfully exported to DOCX format
/// * `Err(ExportError)` - Error during export
pub fn to_docx(
    body: &Body,
    images: &[PlacedImage<ElementId>],
    output_path: &Path,
) -> Result<(), ExportError> {
    if let Some(parent) = output_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    log::info!("Writing DOCX to: {}", output_path.display());
    let file = File::create(output_path)?;
    write_docx(body, images, file)?;

    log::info!(
        "Successfully wrote DOCX with {} elements and {} images",
        body.len(),
        images.len()
    );
    Ok(())
}

/// Build the document and pack it into `writer`
pub fn write_docx<W: Write + Seek>(
    body: &Body,
    images: &[PlacedImage<ElementId>],
    writer: W,
) -> Result<(), ExportError> {
    let mut docx = add_list_numbering(add_heading_styles(Docx::new()));

    for element in body.elements() {
        docx = append_element(docx, &element.kind);
        for placed in images.iter().filter(|p| p.anchor == Some(element.id)) {
            docx = docx.add_paragraph(image_paragraph(&placed.image));
        }
    }

    // Images whose anchor is gone or missing go at the end
    for placed in images {
        let anchored = placed.anchor.is_some_and(|id| body.find(id).is_some());
        if !anchored {
            log::warn!("Image {} has no anchor in the document", placed.image.file_name);
            docx = docx.add_paragraph(image_paragraph(&placed.image));
        }
    }

    docx.build()
        .pack(writer)
        .map_err(|e| ExportError::Format(format!("Failed to write DOCX: {}", e)))?;
    Ok(())
}

/// Add heading styles to the document
fn add_heading_styles(mut docx: Docx) -> Docx {
    let heading_sizes: [usize; MAX_HEADING_LEVEL] = [16, 14, 13, 12, 11, 10];

    for (level, size) in heading_sizes.into_iter().enumerate() {
        let style_id = heading_style_id(level + 1);
        let style = Style::new(&style_id, StyleType::Paragraph)
            .name(&style_id)
            .bold()
            .size(size * 2); // docx-rs uses half-points
        docx = docx.add_style(style);
    }

    docx
}

fn heading_style_id(level: usize) -> String {
    format!("Heading{}", level.clamp(1, MAX_HEADING_LEVEL))
}

fn add_list_numbering(docx: Docx) -> Docx {
    let bullet = Level::new(
        0,
        Start::new(1),
        NumberFormat::new("bullet"),
        LevelText::new("•"),
        LevelJc::new("left"),
    )
    .indent(Some(720), Some(SpecialIndentType::Hanging(360)), None, None);

    let decimal = Level::new(
        0,
        Start::new(1),
        NumberFormat::new("decimal"),
        LevelText::new("%1."),
        LevelJc::new("left"),
    )
    .indent(Some(720), Some(SpecialIndentType::Hanging(360)), None, None);

    docx.add_abstract_numbering(AbstractNumbering::new(BULLET_NUMBERING).add_level(bullet))
        .add_abstract_numbering(AbstractNumbering::new(DECIMAL_NUMBERING).add_level(decimal))
        .add_numbering(Numbering::new(BULLET_NUMBERING, BULLET_NUMBERING))
        .add_numbering(Numbering::new(DECIMAL_NUMBERING, DECIMAL_NUMBERING))
}

fn append_element(docx: Docx, kind: &ElementKind) -> Docx {
    match kind {
        ElementKind::Paragraph {
            text,
            heading: Some(level),
        } => docx.add_paragraph(
            Paragraph::new()
                .style(&heading_style_id(*level))
                .add_run(Run::new().add_text(text)),
        ),
        ElementKind::Paragraph {
            text,
            heading: None,
        } => docx.add_paragraph(Paragraph::new().add_run(Run::new().add_text(text))),
        ElementKind::ListItem { text, glyph } => {
            let numbering = match glyph {
                Glyph::Bullet => BULLET_NUMBERING,
                Glyph::Number => DECIMAL_NUMBERING,
            };
            docx.add_paragraph(
                Paragraph::new()
                    .numbering(NumberingId::new(numbering), IndentLevel::new(0))
                    .add_run(Run::new().add_text(text)),
            )
        }
        ElementKind::Table { rows } => docx.add_table(create_table(rows)),
    }
}

/// Create a DOCX table whose first row is bold
fn create_table(rows: &[Vec<String>]) -> Table {
    let table_rows = rows
        .iter()
        .enumerate()
        .map(|(row_idx, cells)| {
            let is_header = row_idx == 0;
            TableRow::new(
                cells
                    .iter()
                    .map(|text| create_table_cell(text, is_header))
                    .collect(),
            )
        })
        .collect();

    Table::new(table_rows)
}

fn create_table_cell(text: &str, bold: bool) -> TableCell {
    let mut run = Run::new().add_text(text);
    if bold {
        run = run.bold();
    }
    TableCell::new().add_paragraph(Paragraph::new().add_run(run))
}

/// Centered paragraph holding an image scaled to a fixed width
///
/// Unrecognizable image data is replaced by a placeholder paragraph.
fn image_paragraph(image: &GeneratedImage) -> Paragraph {
    let Some((w, h)) = image.dimensions().filter(|(w, h)| *w > 0 && *h > 0) else {
        log::warn!("Skipping unreadable image {}", image.file_name);
        return Paragraph::new()
            .add_run(Run::new().add_text(format!("[Image error: {}]", image.file_name)));
    };

    let width = IMAGE_EDGE_PIXELS * EMUS_PER_PIXEL;
    let height = (width as f64 * h as f64 / w as f64) as u32;

    let pic = Pic::new(&image.bytes).size(width, height);
    Paragraph::new()
        .align(AlignmentType::Center)
        .add_run(Run::new().add_image(pic))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn sample_body() -> Body {
        let mut body = Body::new();
        body.append(ElementKind::heading(1, "Report"));
        body.append(ElementKind::paragraph("Intro text"));
        body.append(ElementKind::bullet("first"));
        body.append(ElementKind::Table {
            rows: vec![
                vec!["Name".to_string(), "Age".to_string()],
                vec!["Alice".to_string(), "30".to_string()],
            ],
        });
        body
    }

    #[test]
    fn test_heading_style_ids() {
        assert_eq!(heading_style_id(1), "Heading1");
        assert_eq!(heading_style_id(6), "Heading6");
        assert_eq!(heading_style_id(9), "Heading6");
        assert_eq!(heading_style_id(0), "Heading1");
    }

    #[test]
    fn test_write_docx_produces_zip() {
        let mut buffer = Cursor::new(Vec::new());
        write_docx(&sample_body(), &[], &mut buffer).unwrap();
        let bytes = buffer.into_inner();
        assert!(bytes.len() > 100);
        assert_eq!(&bytes[..2], b"PK");
    }

    #[test]
    fn test_to_docx_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("report.docx");
        to_docx(&sample_body(), &[], &path).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_unreadable_image_becomes_placeholder() {
        let mut body = Body::new();
        let id = body.append(ElementKind::paragraph("A lighthouse"));
        let images = [PlacedImage {
            image: GeneratedImage {
                bytes: vec![1, 2, 3],
                mime_type: "image/png".to_string(),
                file_name: "broken.png".to_string(),
            },
            anchor: Some(id),
        }];
        let mut buffer = Cursor::new(Vec::new());
        write_docx(&body, &images, &mut buffer).unwrap();
        assert_eq!(&buffer.into_inner()[..2], b"PK");
    }
}
