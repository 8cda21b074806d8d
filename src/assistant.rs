//! Prompt → model → normalization, composed.
//!
//! [`CodeAssistant`] is the one entry point the gateway uses. Each `run*`
//! call builds the task prompt, performs at most one generation call and
//! always returns a fully populated [`StructuredResult`].

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::invoker::{ModelAvailability, ModelInvoker};
use crate::normalize::normalize;
use crate::prompt::PromptBuilder;
use crate::types::{GenerationRequest, StructuredResult};

#[derive(Debug, Clone)]
pub struct CodeAssistant {
    invoker: Arc<ModelInvoker>,
    prompts: PromptBuilder,
}

impl CodeAssistant {
    pub fn new(invoker: Arc<ModelInvoker>) -> Self {
        Self {
            invoker,
            prompts: PromptBuilder::new(),
        }
    }

    pub async fn run(&self, request: &GenerationRequest) -> StructuredResult {
        let prompt = self.prompts.build_for(request);
        debug!(task = %request.task, language = %request.language, "running task");
        let raw = self.invoker.generate(&prompt).await;
        normalize(request, raw)
    }

    /// Blocking variant of [`CodeAssistant::run`]. Must not be called from
    /// inside an async runtime.
    pub fn run_blocking(&self, request: &GenerationRequest) -> StructuredResult {
        let prompt = self.prompts.build_for(request);
        debug!(task = %request.task, language = %request.language, "running task (blocking)");
        let raw = self.invoker.generate_blocking(&prompt);
        normalize(request, raw)
    }

    /// Like [`CodeAssistant::run`]; a cancelled call yields the
    /// generation-error result for the task.
    pub async fn run_with_cancel(
        &self,
        request: &GenerationRequest,
        cancel: &CancellationToken,
    ) -> StructuredResult {
        let prompt = self.prompts.build_for(request);
        let raw = self.invoker.generate_with_cancel(&prompt, cancel).await;
        normalize(request, raw)
    }

    pub fn availability(&self) -> ModelAvailability {
        self.invoker.availability()
    }

    pub fn model(&self) -> &str {
        self.invoker.model()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::fallback;
    use crate::transport::{GenerationTransport, TransportError};
    use crate::types::Task;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Returns a canned reply and remembers the last prompt it saw.
    #[derive(Debug)]
    struct Scripted {
        reply: String,
        seen: Mutex<Option<String>>,
    }

    impl Scripted {
        fn new(reply: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: reply.to_string(),
                seen: Mutex::new(None),
            })
        }
    }

    #[async_trait]
    impl GenerationTransport for Scripted {
        fn model(&self) -> &str {
            "scripted"
        }

        async fn generate(&self, prompt: &str) -> Result<String, TransportError> {
            self.generate_blocking(prompt)
        }

        fn generate_blocking(&self, prompt: &str) -> Result<String, TransportError> {
            *self.seen.lock().unwrap() = Some(prompt.to_string());
            Ok(self.reply.clone())
        }
    }

    #[test]
    fn test_run_analyze_end_to_end() {
        let transport = Scripted::new(
            r#"```json
{"time_complexity": "O(n)", "space_complexity": "O(1)", "explanation": "Linear scan"}
```"#,
        );
        let assistant = CodeAssistant::new(Arc::new(ModelInvoker::with_transport(transport.clone())));
        let request = GenerationRequest::new(Task::Analyze, "for x in xs: pass", "python");

        let result = tokio_test::block_on(assistant.run(&request));
        let analysis = result.as_analysis().unwrap();
        assert_eq!(analysis.time_complexity, "O(n)");
        assert_eq!(analysis.explanation, "Linear scan");

        let prompt = transport.seen.lock().unwrap().clone().unwrap();
        assert!(prompt.starts_with("Analyze this python code"));
        assert!(prompt.contains("for x in xs: pass"));
    }

    #[test]
    fn test_run_blocking_convert_uses_requested_target() {
        let transport = Scripted::new(r#"{"converted_code": "System.out.println(1);", "target_language": "Java 21"}"#);
        let assistant = CodeAssistant::new(Arc::new(ModelInvoker::with_transport(transport.clone())));
        let request =
            GenerationRequest::new(Task::Convert, "print(1)", "python").with_target_language("java");

        let result = assistant.run_blocking(&request);
        let conversion = result.as_conversion().unwrap();
        assert_eq!(conversion.target_language, "java");
        assert_eq!(conversion.original_code, "print(1)");

        let prompt = transport.seen.lock().unwrap().clone().unwrap();
        assert!(prompt.starts_with("Convert this python code to java:"));
    }

    #[tokio::test]
    async fn test_fallback_mode_returns_fixed_results() {
        let assistant = CodeAssistant::new(Arc::new(ModelInvoker::fallback("gemini-1.5-flash", "no key")));
        assert_eq!(assistant.availability(), ModelAvailability::Fallback);
        assert_eq!(assistant.model(), "gemini-1.5-flash");

        let request = GenerationRequest::new(Task::Analyze, "x = 1", "python");
        let analysis = assistant.run(&request).await;
        let analysis = analysis.as_analysis().unwrap();
        assert_eq!(analysis.time_complexity, fallback::FALLBACK_TIME_COMPLEXITY);
        assert_eq!(analysis.space_complexity, fallback::FALLBACK_SPACE_COMPLEXITY);
        assert_eq!(analysis.explanation, fallback::FALLBACK_ANALYSIS);
    }

    #[tokio::test]
    async fn test_cancelled_run_reports_generation_error() {
        let assistant = CodeAssistant::new(Arc::new(ModelInvoker::with_transport(Scripted::new("unused"))));
        let cancel = CancellationToken::new();
        cancel.cancel();
        let request = GenerationRequest::new(Task::Explain, "x = 1", "python");
        let result = assistant.run_with_cancel(&request, &cancel).await;
        assert_eq!(
            result.as_explanation().unwrap().explanation,
            "Error explaining code: generation cancelled"
        );
    }
}
