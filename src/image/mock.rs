use super::CompositorService;
use crate::{Error, Result};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

/// Records every compose call and echoes a recognisable payload back.
#[derive(Clone)]
pub struct MockCompositor {
    calls: Arc<Mutex<Vec<(String, Vec<u8>)>>>,
    should_fail: Arc<Mutex<bool>>,
}

impl MockCompositor {
    pub fn new() -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            should_fail: Arc::new(Mutex::new(false)),
        }
    }

    pub fn with_failure(self, should_fail: bool) -> Self {
        *self.should_fail.lock().unwrap() = should_fail;
        self
    }

    pub fn get_call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Captions and image buffers received so far, in call order.
    pub fn get_calls(&self) -> Vec<(String, Vec<u8>)> {
        self.calls.lock().unwrap().clone()
    }
}

impl Default for MockCompositor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CompositorService for MockCompositor {
    async fn compose(&self, caption: &str, image: &[u8]) -> Result<Vec<u8>> {
        self.calls
            .lock()
            .unwrap()
            .push((caption.to_string(), image.to_vec()));

        if *self.should_fail.lock().unwrap() {
            return Err(Error::Image(::image::ImageError::IoError(
                std::io::Error::other("Mock failure"),
            )));
        }

        let mut output = b"composite:".to_vec();
        output.extend_from_slice(caption.as_bytes());
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_compositor_records_calls() {
        let compositor = MockCompositor::new();

        let output = compositor.compose("hello", &[1, 2, 3]).await.unwrap();

        assert_eq!(output, b"composite:hello".to_vec());
        assert_eq!(
            compositor.get_calls(),
            vec![("hello".to_string(), vec![1, 2, 3])]
        );
    }

    #[tokio::test]
    async fn test_mock_compositor_failure() {
        let compositor = MockCompositor::new().with_failure(true);

        assert!(compositor.compose("hello", &[]).await.is_err());
        assert_eq!(compositor.get_call_count(), 1);
    }
}
