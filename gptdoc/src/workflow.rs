//! End-to-end generation workflows
//!
//! Each workflow asks a generative service for content and hands the result
//! to the assembly engine (text) or back to the caller (images).

use crate::assembly::{AssemblyEngine, AssemblyOptions, AssemblyReport, DocumentSink};
use crate::config::GenerationConfig;
use crate::generation::{
    image_prompt_request, ChatRequest, Creativity, GeneratedImage, GenerationError,
    ImageGenerationService, TextGenerationService,
};
use crate::selection::SelectionProvider;
use thiserror::Error;

/// Errors raised by a workflow
#[derive(Error, Debug)]
pub enum WorkflowError<E> {
    #[error(transparent)]
    Generation(#[from] GenerationError),

    #[error("Document update failed: {0}")]
    Sink(#[source] E),
}

/// Model and temperature for a completion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Completion<'a> {
    pub model: &'a str,
    pub creativity: Creativity,
}

impl Completion<'_> {
    fn request(&self, prompt: &str) -> ChatRequest {
        ChatRequest::from_prompt(self.model, prompt, self.creativity)
    }
}

/// An image generated for a selection, with the block it belongs after
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacedImage<A> {
    pub image: GeneratedImage,
    pub anchor: Option<A>,
}

/// Generate text from `prompt` and insert it in front of the sentinel
///
/// # Parameters
/// * `service` - Chat completion backend
/// * `sink` - Target document
/// * `prompt` - User prompt
/// * `completion` - Model and creativity
/// * `options` - Assembly behaviour
///
/// # Returns
/// * `Ok(AssemblyReport)` - Where the blocks were inserted
/// * `Err(WorkflowError)` - Generation or insertion failure
pub fn generate_text_from_prompt<S>(
    service: &dyn TextGenerationService,
    sink: &mut S,
    prompt: &str,
    completion: Completion<'_>,
    options: AssemblyOptions,
) -> Result<AssemblyReport, WorkflowError<S::Error>>
where
    S: DocumentSink + ?Sized,
{
    let text = service.complete(&completion.request(prompt))?;
    log::info!("Generated {} chars from prompt", text.chars().count());

    AssemblyEngine::new(options)
        .run(&text, None, sink)
        .map_err(WorkflowError::Sink)
}

/// Rewrite or extend the current selection
///
/// Does nothing and returns `Ok(None)` when the selection holds no text.
/// Otherwise the selected text is appended to `prompt` on its own line and
/// the completion is inserted right after the selection's parent block.
pub fn generate_text_from_selection<S, P>(
    service: &dyn TextGenerationService,
    selection: &P,
    sink: &mut S,
    prompt: &str,
    completion: Completion<'_>,
    options: AssemblyOptions,
) -> Result<Option<AssemblyReport>, WorkflowError<S::Error>>
where
    S: DocumentSink + ?Sized,
    P: SelectionProvider<Anchor = S::Anchor> + ?Sized,
{
    let Some(selected) = selection.selected_text() else {
        log::info!("Nothing selected, skipping generation");
        return Ok(None);
    };

    let prompt = format!("{}\n{}", prompt, selected);
    let text = service.complete(&completion.request(&prompt))?;
    log::info!("Generated {} chars from selection", text.chars().count());

    let anchor = selection.parent_anchor();
    AssemblyEngine::new(options)
        .run(&text, anchor.as_ref(), sink)
        .map(Some)
        .map_err(WorkflowError::Sink)
}

/// Illustrate the current selection
///
/// Does nothing and returns `Ok(None)` when the selection holds no text.
/// The text service first turns the selection into an image prompt, which
/// the image service then renders together with `caption`.
pub fn generate_image_from_selection<P>(
    text_service: &dyn TextGenerationService,
    image_service: &dyn ImageGenerationService,
    config: &GenerationConfig,
    selection: &P,
    caption: &str,
) -> Result<Option<PlacedImage<P::Anchor>>, GenerationError>
where
    P: SelectionProvider + ?Sized,
{
    let Some(selected) = selection.selected_text() else {
        log::info!("Nothing selected, skipping image generation");
        return Ok(None);
    };

    let prompt = text_service.complete(&image_prompt_request(config, Some(&selected)))?;
    log::info!("Image prompt: {}", prompt);

    let image = image_service.generate(&prompt, caption)?;
    log::info!(
        "Generated {} ({} bytes)",
        image.file_name,
        image.bytes.len()
    );

    Ok(Some(PlacedImage {
        image,
        anchor: selection.parent_anchor(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document_model::{Body, ElementKind, SinkError};
    use crate::selection::{BodySelection, ElementRef, SelectedRange};
    use std::cell::RefCell;

    /// Returns a fixed reply and records each request
    struct CannedText {
        reply: String,
        requests: RefCell<Vec<ChatRequest>>,
    }

    impl CannedText {
        fn new(reply: &str) -> Self {
            Self {
                reply: reply.to_string(),
                requests: RefCell::new(Vec::new()),
            }
        }
    }

    impl TextGenerationService for CannedText {
        fn complete(&self, request: &ChatRequest) -> Result<String, GenerationError> {
            self.requests.borrow_mut().push(request.clone());
            Ok(self.reply.clone())
        }
    }

    struct CannedImage {
        calls: RefCell<Vec<(String, String)>>,
    }

    impl ImageGenerationService for CannedImage {
        fn generate(&self, prompt: &str, caption: &str) -> Result<GeneratedImage, GenerationError> {
            self.calls
                .borrow_mut()
                .push((prompt.to_string(), caption.to_string()));
            Ok(GeneratedImage {
                bytes: vec![0x89, b'P', b'N', b'G'],
                mime_type: "image/png".to_string(),
                file_name: "v1_txt2img_0.png".to_string(),
            })
        }
    }

    const COMPLETION: Completion<'static> = Completion {
        model: "gpt-3.5-turbo",
        creativity: Creativity::Medium,
    };

    #[test]
    fn test_prompt_output_goes_before_sentinel() {
        let service = CannedText::new("# Title\nHello");
        let mut body = Body::new();
        body.append(ElementKind::paragraph("Existing"));

        let report = generate_text_from_prompt(
            &service,
            &mut body,
            "Write",
            COMPLETION,
            AssemblyOptions::default(),
        )
        .unwrap();

        assert_eq!(report.start, 1);
        assert_eq!(report.blocks_inserted(), 2);
        assert_eq!(body.len(), 4);
        assert_eq!(body.get(1).unwrap().kind, ElementKind::heading(1, "Title"));
        assert_eq!(body.get(3).unwrap().kind, ElementKind::paragraph(""));
        assert_eq!(service.requests.borrow()[0].temperature, 0.5);
    }

    #[test]
    fn test_selection_output_follows_parent() {
        let service = CannedText::new("* a\n* b");
        let mut body = Body::new();
        let first = body.append(ElementKind::paragraph("First"));
        body.append(ElementKind::paragraph("Second"));
        let selection =
            BodySelection::capture(&body, &[SelectedRange::whole(ElementRef::Element(first))])
                .unwrap();

        let report = generate_text_from_selection(
            &service,
            &selection,
            &mut body,
            "Summarize:",
            COMPLETION,
            AssemblyOptions::default(),
        )
        .unwrap()
        .unwrap();

        assert_eq!(report.start, 1);
        assert_eq!(body.get(1).unwrap().kind, ElementKind::bullet("a"));
        assert_eq!(body.get(2).unwrap().kind, ElementKind::bullet("b"));
        assert_eq!(body.get(3).unwrap().kind, ElementKind::paragraph("Second"));
        assert_eq!(
            service.requests.borrow()[0].messages[0].content,
            "Summarize:\nFirst\n"
        );
    }

    #[test]
    fn test_empty_selection_is_noop() {
        let service = CannedText::new("unused");
        let mut body = Body::new();
        let selection = BodySelection::capture(&body, &[]).unwrap();

        let result = generate_text_from_selection(
            &service,
            &selection,
            &mut body,
            "Summarize:",
            COMPLETION,
            AssemblyOptions::default(),
        )
        .unwrap();

        assert!(result.is_none());
        assert!(service.requests.borrow().is_empty());
        assert_eq!(body.len(), 1);
    }

    #[test]
    fn test_sink_failure_is_reported() {
        let service = CannedText::new("####### Too deep");
        let mut body = Body::new();
        let result = generate_text_from_prompt(
            &service,
            &mut body,
            "Write",
            COMPLETION,
            AssemblyOptions::default(),
        );
        assert!(matches!(
            result,
            Err(WorkflowError::Sink(SinkError::HeadingLevelOutOfRange { level: 7, .. }))
        ));
    }

    #[test]
    fn test_image_from_selection() {
        let text = CannedText::new("The prompt is: a lighthouse at night");
        let image = CannedImage {
            calls: RefCell::new(Vec::new()),
        };
        let mut body = Body::new();
        let id = body.append(ElementKind::paragraph("A lighthouse"));
        let selection =
            BodySelection::capture(&body, &[SelectedRange::whole(ElementRef::Element(id))])
                .unwrap();

        let placed = generate_image_from_selection(
            &text,
            &image,
            &GenerationConfig::default(),
            &selection,
            "Watercolor",
        )
        .unwrap()
        .unwrap();

        assert_eq!(placed.anchor, Some(id));
        assert_eq!(placed.image.file_name, "v1_txt2img_0.png");
        assert_eq!(
            image.calls.borrow()[0],
            (
                "The prompt is: a lighthouse at night".to_string(),
                "Watercolor".to_string()
            )
        );
        let request = &text.requests.borrow()[0];
        assert_eq!(request.max_tokens, Some(120));
        assert_eq!(request.messages[1].content, "A lighthouse\n");
    }

    #[test]
    fn test_image_without_selection_is_noop() {
        let text = CannedText::new("unused");
        let image = CannedImage {
            calls: RefCell::new(Vec::new()),
        };
        let body = Body::new();
        let selection = BodySelection::capture(&body, &[]).unwrap();

        let placed = generate_image_from_selection(
            &text,
            &image,
            &GenerationConfig::default(),
            &selection,
            "Watercolor",
        )
        .unwrap();

        assert!(placed.is_none());
        assert!(image.calls.borrow().is_empty());
    }
}
