use async_trait::async_trait;
use parking_lot::Mutex;
use reportqa_kernel::error::ProviderError;
use reportqa_kernel::rag::CompletionModel;

/// A completion model answering from predefined responses.
///
/// Responses are keyed by prompt substring and tried in insertion order.
/// Every prompt received is recorded for later assertions.
pub struct ScriptedModel {
    responses: Mutex<Vec<(String, String)>>,
    fallback_response: String,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedModel {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(Vec::new()),
            fallback_response: "Not found in documents.".to_string(),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Answer `response` whenever the prompt contains `prompt_key`.
    pub fn add_response(&self, prompt_key: &str, response: &str) {
        self.responses
            .lock()
            .push((prompt_key.to_string(), response.to_string()));
    }

    pub fn set_fallback_response(&mut self, response: &str) {
        self.fallback_response = response.to_string();
    }

    pub fn call_count(&self) -> usize {
        self.prompts.lock().len()
    }

    /// Prompts received so far, oldest first.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().clone()
    }
}

impl Default for ScriptedModel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CompletionModel for ScriptedModel {
    fn model_id(&self) -> &str {
        "scripted-model"
    }

    async fn complete(&self, prompt: &str) -> Result<String, ProviderError> {
        self.prompts.lock().push(prompt.to_string());

        let answer = self
            .responses
            .lock()
            .iter()
            .find(|(key, _)| prompt.contains(key.as_str()))
            .map(|(_, response)| response.clone())
            .unwrap_or_else(|| self.fallback_response.clone());
        Ok(answer)
    }
}

/// A completion model whose endpoint is always unreachable.
#[derive(Default)]
pub struct FailingModel {
    calls: Mutex<usize>,
}

impl FailingModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn call_count(&self) -> usize {
        *self.calls.lock()
    }
}

#[async_trait]
impl CompletionModel for FailingModel {
    fn model_id(&self) -> &str {
        "failing-model"
    }

    async fn complete(&self, _prompt: &str) -> Result<String, ProviderError> {
        *self.calls.lock() += 1;
        Err(ProviderError::request(
            "http://localhost:1234/v1",
            "connection refused",
        ))
    }
}

/// Assert how many prompts a [`ScriptedModel`] or [`FailingModel`] received.
#[macro_export]
macro_rules! assert_model_called {
    ($model:expr, $expected_count:expr) => {
        let count = $model.call_count();
        assert_eq!(
            count, $expected_count,
            "Expected the model to be called {} times, but it was called {} times",
            $expected_count, count
        );
    };
}
