use super::{CaptionService, ImageSynthesisService};
use crate::{Error, Result};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

#[derive(Clone)]
pub struct MockCaptionClient {
    responses: Arc<Mutex<Vec<String>>>,
    prompts: Arc<Mutex<Vec<String>>>,
    should_fail: bool,
}

impl MockCaptionClient {
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(Vec::new())),
            prompts: Arc::new(Mutex::new(Vec::new())),
            should_fail: false,
        }
    }

    pub fn with_caption_response(self, response: String) -> Self {
        self.responses.lock().unwrap().push(response);
        self
    }

    pub fn with_failure(mut self, should_fail: bool) -> Self {
        self.should_fail = should_fail;
        self
    }

    pub fn get_call_count(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    pub fn get_prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

impl Default for MockCaptionClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CaptionService for MockCaptionClient {
    async fn generate_caption(&self, prompt: &str) -> Result<String> {
        let count = {
            let mut prompts = self.prompts.lock().unwrap();
            prompts.push(prompt.to_string());
            prompts.len()
        };

        if self.should_fail {
            return Err(Error::AiProvider("Mock caption failure".to_string()));
        }

        let responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            Ok(format!("mock caption for {}", prompt))
        } else {
            let index = (count - 1) % responses.len();
            Ok(responses[index].clone())
        }
    }
}

#[derive(Clone)]
pub struct MockImageSynthesisClient {
    responses: Arc<Mutex<Vec<Vec<Vec<u8>>>>>,
    call_count: Arc<Mutex<usize>>,
    should_fail: bool,
}

impl MockImageSynthesisClient {
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(Vec::new())),
            call_count: Arc::new(Mutex::new(0)),
            should_fail: false,
        }
    }

    pub fn with_image_response(self, response: Vec<u8>) -> Self {
        self.responses.lock().unwrap().push(vec![response]);
        self
    }

    /// Queues one response carrying several samples.
    pub fn with_samples_response(self, samples: Vec<Vec<u8>>) -> Self {
        self.responses.lock().unwrap().push(samples);
        self
    }

    pub fn with_failure(mut self, should_fail: bool) -> Self {
        self.should_fail = should_fail;
        self
    }

    pub fn get_call_count(&self) -> usize {
        *self.call_count.lock().unwrap()
    }
}

impl Default for MockImageSynthesisClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ImageSynthesisService for MockImageSynthesisClient {
    async fn synthesize(&self, _prompt: &str) -> Result<Vec<Vec<u8>>> {
        let count = {
            let mut count = self.call_count.lock().unwrap();
            *count += 1;
            *count
        };

        if self.should_fail {
            return Err(Error::AiProvider(
                "Non-200 response: mock image failure".to_string(),
            ));
        }

        let responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            Ok(vec![placeholder_png()?])
        } else {
            let index = (count - 1) % responses.len();
            Ok(responses[index].clone())
        }
    }
}

/// 1x1 opaque grey PNG used when no response was queued.
fn placeholder_png() -> Result<Vec<u8>> {
    let pixel = ::image::RgbaImage::from_pixel(1, 1, ::image::Rgba([128, 128, 128, 255]));
    let mut bytes = Vec::new();
    pixel.write_to(
        &mut std::io::Cursor::new(&mut bytes),
        ::image::ImageFormat::Png,
    )?;
    Ok(bytes)
}
