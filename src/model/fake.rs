//! Fake model for tests.
//!
//! Returns a canned reply and records every call so tests can check what
//! reached the model boundary, and whether anything did at all.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use super::{GenerativeModel, InlineImage, ModelError};

#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub prompt: String,
    pub image: Option<InlineImage>,
}

#[derive(Debug)]
pub struct FakeModel {
    reply: Result<String, ModelError>,
    calls: AtomicUsize,
    last_call: Mutex<Option<RecordedCall>>,
}

impl FakeModel {
    /// A model that always answers with `text`
    pub fn replying(text: &str) -> Self {
        Self {
            reply: Ok(text.to_string()),
            calls: AtomicUsize::new(0),
            last_call: Mutex::new(None),
        }
    }

    /// A model whose every call fails with `error`
    pub fn failing(error: ModelError) -> Self {
        Self {
            reply: Err(error),
            calls: AtomicUsize::new(0),
            last_call: Mutex::new(None),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_call(&self) -> Option<RecordedCall> {
        self.last_call.lock().unwrap().clone()
    }
}

#[async_trait]
impl GenerativeModel for FakeModel {
    async fn generate(
        &self,
        prompt: &str,
        image: Option<&InlineImage>,
    ) -> Result<String, ModelError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_call.lock().unwrap() = Some(RecordedCall {
            prompt: prompt.to_string(),
            image: image.cloned(),
        });
        self.reply.clone()
    }

    fn text_model(&self) -> &str {
        "fake-text"
    }

    fn vision_model(&self) -> &str {
        "fake-vision"
    }
}
