//! Load an existing Markdown file into a [`Body`]
//!
//! Converts pulldown-cmark's event stream into top-level elements. Inline
//! formatting is flattened to plain text and nested lists are flattened to
//! a single level, which is all the document model can represent.

use crate::document_model::{Body, ElementKind, Glyph};
use pulldown_cmark::{Event, Options, Tag, TagEnd};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur while loading a document
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Failed to read {path}: {source}", path = .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Read and parse a Markdown file
///
/// # Parameters
/// * `path` - Markdown file to load
///
/// # Returns
/// * `Ok(Body)` - Parsed document, ending with the sentinel paragraph
/// * `Err(LoadError)` - The file could not be read
pub fn load_body(path: &Path) -> Result<Body, LoadError> {
    let content = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let body = parse_body(&content);
    log::info!(
        "Loaded {} elements from {}",
        body.len() - 1,
        path.display()
    );
    Ok(body)
}

/// Parse Markdown text into a body
pub fn parse_body(content: &str) -> Body {
    let mut loader = BodyLoader::new();
    for event in pulldown_cmark::Parser::new_ext(content, Options::ENABLE_TABLES) {
        loader.process_event(event);
    }
    loader.body
}

/// Context for building a list
struct ListContext {
    glyph: Glyph,
}

/// Event-stream state
struct BodyLoader {
    body: Body,
    /// Text collected for the block currently open
    text: String,
    /// Stack of open lists (innermost last)
    list_stack: Vec<ListContext>,
    /// Whether a list item's text is still waiting to be emitted
    item_open: bool,
    /// Rows of the table currently open
    table_rows: Option<Vec<Vec<String>>>,
    /// Cells of the table row currently open
    current_row: Vec<String>,
}

impl BodyLoader {
    fn new() -> Self {
        Self {
            body: Body::new(),
            text: String::new(),
            list_stack: Vec::new(),
            item_open: false,
            table_rows: None,
            current_row: Vec::new(),
        }
    }

    fn process_event(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.handle_start_tag(tag),
            Event::End(tag_end) => self.handle_end_tag(tag_end),
            Event::Text(text) | Event::Code(text) => self.text.push_str(&text),
            Event::SoftBreak => self.text.push(' '),
            Event::HardBreak => self.text.push('\n'),
            _ => {}
        }
    }

    fn handle_start_tag(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Paragraph | Tag::Heading { .. } | Tag::TableCell => {
                if !self.item_open {
                    self.text.clear();
                }
            }
            Tag::CodeBlock(_) => self.text.clear(),
            Tag::List(start) => {
                // Text of a parent item comes before its nested items
                self.flush_item();
                self.list_stack.push(ListContext {
                    glyph: if start.is_some() {
                        Glyph::Number
                    } else {
                        Glyph::Bullet
                    },
                });
            }
            Tag::Item => {
                self.flush_item();
                self.text.clear();
                self.item_open = true;
            }
            Tag::Table(_) => {
                self.table_rows = Some(Vec::new());
            }
            Tag::TableHead | Tag::TableRow => {
                self.current_row.clear();
            }
            _ => {}
        }
    }

    fn handle_end_tag(&mut self, tag_end: TagEnd) {
        match tag_end {
            TagEnd::Heading(level) => {
                let text = std::mem::take(&mut self.text);
                self.body.append(ElementKind::heading(level as usize, text.trim()));
            }
            TagEnd::Paragraph => {
                if self.item_open {
                    // Loose list items wrap their text in paragraphs
                    self.text.push(' ');
                } else {
                    let text = std::mem::take(&mut self.text);
                    self.body.append(ElementKind::paragraph(text.trim()));
                }
            }
            TagEnd::CodeBlock => {
                let text = std::mem::take(&mut self.text);
                for line in text.trim_end_matches('\n').split('\n') {
                    self.body.append(ElementKind::paragraph(line));
                }
            }
            TagEnd::Item => self.flush_item(),
            TagEnd::List(_) => {
                self.list_stack.pop();
            }
            TagEnd::TableCell => {
                let text = std::mem::take(&mut self.text);
                self.current_row.push(text.trim().to_string());
            }
            TagEnd::TableHead | TagEnd::TableRow => {
                let row = std::mem::take(&mut self.current_row);
                if let Some(rows) = self.table_rows.as_mut() {
                    rows.push(row);
                }
            }
            TagEnd::Table => {
                if let Some(rows) = self.table_rows.take() {
                    if rows.first().is_some_and(|row| !row.is_empty()) {
                        self.body.append(ElementKind::Table { rows });
                    }
                }
            }
            _ => {}
        }
    }

    /// Emit the pending list item, if any
    fn flush_item(&mut self) {
        if !self.item_open {
            return;
        }
        self.item_open = false;
        let text = std::mem::take(&mut self.text);
        let glyph = self
            .list_stack
            .last()
            .map_or(Glyph::Bullet, |list| list.glyph);
        self.body.append(ElementKind::ListItem {
            text: text.trim().to_string(),
            glyph,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(body: &Body) -> Vec<ElementKind> {
        body.elements().iter().map(|e| e.kind.clone()).collect()
    }

    #[test]
    fn test_headings_and_paragraphs() {
        let body = parse_body("# Title\n\nSome *emphasis* and `code`.\n\n## Sub\n");
        assert_eq!(
            kinds(&body),
            vec![
                ElementKind::heading(1, "Title"),
                ElementKind::paragraph("Some emphasis and code."),
                ElementKind::heading(2, "Sub"),
                ElementKind::paragraph(""),
            ]
        );
    }

    #[test]
    fn test_lists_are_flattened() {
        let body = parse_body("- one\n- two\n  - nested\n\n1. first\n");
        assert_eq!(
            kinds(&body),
            vec![
                ElementKind::bullet("one"),
                ElementKind::bullet("two"),
                ElementKind::bullet("nested"),
                ElementKind::ListItem {
                    text: "first".to_string(),
                    glyph: Glyph::Number
                },
                ElementKind::paragraph(""),
            ]
        );
    }

    #[test]
    fn test_table() {
        let body = parse_body("| A | B |\n|---|---|\n| 1 | 2 |\n");
        assert_eq!(
            body.elements()[0].kind,
            ElementKind::Table {
                rows: vec![
                    vec!["A".to_string(), "B".to_string()],
                    vec!["1".to_string(), "2".to_string()]
                ]
            }
        );
    }

    #[test]
    fn test_empty_document_is_only_sentinel() {
        let body = parse_body("");
        assert!(body.is_empty());
        assert_eq!(body.len(), 1);
    }

    #[test]
    fn test_load_missing_file() {
        let result = load_body(Path::new("/definitely/not/here.md"));
        assert!(matches!(result, Err(LoadError::Io { .. })));
    }
}
