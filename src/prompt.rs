//! Prompt templates, one fixed instruction per task.
//!
//! Submitted code is substituted verbatim; nothing here inspects or validates
//! it. JSON tasks name the exact keys the normalizer will look for, so the
//! templates and [`Task::expected_fields`] must stay in step.

use crate::types::{GenerationRequest, Task};

/// Builds the instruction string sent to the model.
#[derive(Debug, Clone, Copy, Default)]
pub struct PromptBuilder;

impl PromptBuilder {
    pub fn new() -> Self {
        Self
    }

    /// Build the prompt for `task`. `target_language` is only used by
    /// [`Task::Convert`] and falls back to the default target when absent.
    pub fn build(
        &self,
        task: Task,
        code: &str,
        language: &str,
        target_language: Option<&str>,
    ) -> String {
        match task {
            Task::Analyze => format!(
                "Analyze this {language} code and provide:\n\
                 1. Time complexity\n\
                 2. Space complexity\n\
                 3. A brief explanation\n\n\
                 Code:\n{code}\n\n\
                 {}",
                json_instruction(task)
            ),
            Task::Optimize => format!(
                "Optimize this {language} code and provide:\n\
                 1. The optimized code\n\
                 2. A list of improvements made\n\n\
                 Code:\n{code}\n\n\
                 {}",
                json_instruction(task)
            ),
            Task::Convert => {
                let target = target_language
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .unwrap_or(crate::types::DEFAULT_TARGET_LANGUAGE);
                format!(
                    "Convert this {language} code to {target}:\n\n\
                     Code:\n{code}\n\n\
                     {}",
                    json_instruction(task)
                )
            }
            Task::Explain => format!(
                "Explain this {language} code in plain language:\n\n\
                 Code:\n{code}\n\n\
                 Please provide a clear and concise explanation of what the code does."
            ),
        }
    }

    pub fn build_for(&self, request: &GenerationRequest) -> String {
        self.build(
            request.task,
            &request.code,
            &request.language,
            request.target_language.as_deref(),
        )
    }
}

fn json_instruction(task: Task) -> String {
    format!(
        "Please format your response as JSON with keys: {}",
        task.expected_fields().join(", ")
    )
}
