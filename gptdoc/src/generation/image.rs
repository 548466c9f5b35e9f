//! Image generation backends
//!
//! Two backends are selected by [`ImageQuality`]: `Low` uses a generator
//! that answers with an image URL which is then fetched, `Mid` and `High`
//! use a generator that answers with base64-encoded image data.

use super::error::GenerationError;
use super::transport::Transport;
use crate::config::GenerationConfig;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};

const URL_SERVICE: &str = "OpenAI images";
const PAYLOAD_SERVICE: &str = "Stability";

/// Negative prompt sent with every payload-based request
pub const NEGATIVE_PROMPT: &str = "lowres, bad anatomy, bad hands, text, error, missing fingers, extra digit, fewer digits, cropped, worst quality, low quality, normal quality, jpeg artifacts, signature, watermark, username, blurry";

/// Requested image quality tier
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum ImageQuality {
    Low,
    #[default]
    Mid,
    High,
}

/// A generated image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedImage {
    pub bytes: Vec<u8>,
    pub mime_type: String,
    pub file_name: String,
}

impl GeneratedImage {
    /// Pixel dimensions, if the data is a recognizable image
    pub fn dimensions(&self) -> Option<(usize, usize)> {
        imagesize::blob_size(&self.bytes)
            .ok()
            .map(|size| (size.width, size.height))
    }
}

/// Anything that can render an image from a prompt and caption
pub trait ImageGenerationService {
    fn generate(&self, prompt: &str, caption: &str) -> Result<GeneratedImage, GenerationError>;
}

/// Pick the backend for `quality`
pub fn image_backend<'a, T: Transport + 'a>(
    quality: ImageQuality,
    transport: T,
    config: &GenerationConfig,
) -> Box<dyn ImageGenerationService + 'a> {
    match quality {
        ImageQuality::Low => Box::new(UrlImageGenerator::new(transport, config)),
        ImageQuality::Mid => Box::new(StableDiffusion::new(transport, config, false)),
        ImageQuality::High => Box::new(StableDiffusion::new(transport, config, true)),
    }
}

#[derive(Serialize)]
struct UrlImageRequest {
    model: &'static str,
    prompt: String,
    size: &'static str,
    response_format: &'static str,
}

#[derive(Deserialize)]
struct UrlImageResponse {
    data: Vec<UrlImageData>,
}

#[derive(Deserialize)]
struct UrlImageData {
    url: String,
}

/// Low-tier generator: returns a URL, which is then downloaded
#[derive(Debug, Clone)]
pub struct UrlImageGenerator<T> {
    transport: T,
    api_key: Option<String>,
    base_url: String,
}

impl<T: Transport> UrlImageGenerator<T> {
    pub fn new(transport: T, config: &GenerationConfig) -> Self {
        Self {
            transport,
            api_key: config.openai_api_key.clone(),
            base_url: config.openai_base_url.trim_end_matches('/').to_string(),
        }
    }
}

impl<T: Transport> ImageGenerationService for UrlImageGenerator<T> {
    fn generate(&self, prompt: &str, caption: &str) -> Result<GeneratedImage, GenerationError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(GenerationError::MissingCredential {
                service: URL_SERVICE,
            })?;

        let request = UrlImageRequest {
            model: "image-alpha-001",
            prompt: format!("{} {}", prompt, caption),
            size: "512x512",
            response_format: "url",
        };
        let body = encode(URL_SERVICE, &request)?;
        log::debug!("Image request: {}", body);

        let url = format!("{}/images/generations", self.base_url);
        let response = self.transport.post_json(&url, api_key, &body)?;
        if !response.is_success() {
            return Err(GenerationError::from_status(URL_SERVICE, &response));
        }
        let parsed: UrlImageResponse = decode(URL_SERVICE, &response.body)?;
        let image_url = parsed
            .data
            .into_iter()
            .next()
            .map(|data| data.url)
            .ok_or_else(|| GenerationError::ResponseShape {
                service: URL_SERVICE,
                detail: "response has no data".to_string(),
            })?;

        log::info!("Downloading generated image from {}", image_url);
        let download = self.transport.get(&image_url)?;
        if !download.is_success() {
            return Err(GenerationError::from_status(URL_SERVICE, &download));
        }

        Ok(GeneratedImage {
            bytes: download.body,
            mime_type: "image/png".to_string(),
            file_name: "image.png".to_string(),
        })
    }
}

#[derive(Debug, Serialize)]
struct TextPrompt {
    text: String,
    weight: f64,
}

#[derive(Debug, Serialize)]
struct PayloadImageRequest {
    text_prompts: Vec<TextPrompt>,
    cfg_scale: u32,
    clip_guidance_preset: &'static str,
    height: u32,
    width: u32,
    samples: u32,
    steps: u32,
    sampler: &'static str,
    seed: u64,
}

#[derive(Deserialize)]
struct PayloadImageResponse {
    artifacts: Vec<Artifact>,
}

#[derive(Deserialize)]
struct Artifact {
    base64: String,
}

/// Mid/high-tier generator: returns base64 image data inline
#[derive(Debug, Clone)]
pub struct StableDiffusion<T> {
    transport: T,
    api_key: Option<String>,
    base_url: String,
    high_quality: bool,
}

impl<T: Transport> StableDiffusion<T> {
    pub fn new(transport: T, config: &GenerationConfig, high_quality: bool) -> Self {
        Self {
            transport,
            api_key: config.stability_api_key.clone(),
            base_url: config.stability_base_url.trim_end_matches('/').to_string(),
            high_quality,
        }
    }

    fn engine_id(&self) -> &'static str {
        if self.high_quality {
            "stable-diffusion-xl-1024-v1-0"
        } else {
            "stable-diffusion-xl-beta-v2-2-2"
        }
    }

    /// Square edge length in pixels
    pub fn size(&self) -> u32 {
        if self.high_quality {
            1024
        } else {
            512
        }
    }
}

impl<T: Transport> ImageGenerationService for StableDiffusion<T> {
    fn generate(&self, prompt: &str, caption: &str) -> Result<GeneratedImage, GenerationError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(GenerationError::MissingCredential {
                service: PAYLOAD_SERVICE,
            })?;

        let request = PayloadImageRequest {
            text_prompts: vec![
                TextPrompt {
                    text: format!("{} , {}", prompt, caption),
                    weight: 0.9,
                },
                TextPrompt {
                    text: NEGATIVE_PROMPT.to_string(),
                    weight: -1.0,
                },
            ],
            cfg_scale: 20,
            clip_guidance_preset: "FAST_BLUE",
            height: self.size(),
            width: self.size(),
            samples: 1,
            steps: 50,
            sampler: "K_EULER_ANCESTRAL",
            seed: 0,
        };
        let body = encode(PAYLOAD_SERVICE, &request)?;
        log::debug!("Image request: {}", body);

        let url = format!(
            "{}/v1/generation/{}/text-to-image",
            self.base_url,
            self.engine_id()
        );
        let response = self.transport.post_json(&url, api_key, &body)?;
        if !response.is_success() {
            return Err(GenerationError::from_status(PAYLOAD_SERVICE, &response));
        }
        let parsed: PayloadImageResponse = decode(PAYLOAD_SERVICE, &response.body)?;

        // Every artifact is decoded; the last one is returned
        let mut image = None;
        for (i, artifact) in parsed.artifacts.iter().enumerate() {
            let bytes = STANDARD.decode(artifact.base64.trim())?;
            image = Some(GeneratedImage {
                bytes,
                mime_type: "image/png".to_string(),
                file_name: format!("v1_txt2img_{}.png", i),
            });
        }

        image.ok_or_else(|| GenerationError::ResponseShape {
            service: PAYLOAD_SERVICE,
            detail: "response has no artifacts".to_string(),
        })
    }
}

fn encode<R: Serialize>(
    service: &'static str,
    request: &R,
) -> Result<serde_json::Value, GenerationError> {
    serde_json::to_value(request).map_err(|e| GenerationError::ResponseShape {
        service,
        detail: format!("request could not be encoded: {}", e),
    })
}

fn decode<R: for<'de> Deserialize<'de>>(
    service: &'static str,
    body: &[u8],
) -> Result<R, GenerationError> {
    serde_json::from_slice(body).map_err(|e| GenerationError::ResponseShape {
        service,
        detail: e.to_string(),
    })
}
