//! Generative service clients
//!
//! Request construction, authentication and response unwrapping for the
//! text and image services. The network itself sits behind [`Transport`]
//! so the clients can be exercised without it.

mod error;
mod image;
mod text;
mod transport;

pub use error::GenerationError;
pub use image::{
    image_backend, GeneratedImage, ImageGenerationService, ImageQuality, StableDiffusion,
    UrlImageGenerator, NEGATIVE_PROMPT,
};
pub use text::{
    image_prompt_request, ChatMessage, ChatRequest, Creativity, OpenAiChat,
    TextGenerationService, IMAGE_PROMPT_FALLBACK,
};
pub use transport::{HttpResponse, Transport, UreqTransport};
