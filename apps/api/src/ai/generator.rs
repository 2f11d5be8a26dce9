use async_trait::async_trait;
use serde::Deserialize;

use crate::ai::prompts::{
    build_generate_prompt, build_tailor_prompt, GENERATE_SYSTEM, TAILOR_SYSTEM,
};
use crate::errors::AppError;
use crate::llm_client::LlmClient;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest {
    #[serde(default)]
    pub job_title: String,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub custom_prompt: Option<String>,
}

/// Room for a whole rewritten CV.
const TAILOR_MAX_TOKENS: u32 = 4000;

/// Produces CV content for a role. Carried in `AppState` as `Arc<dyn ContentGenerator>`.
#[async_trait]
pub trait ContentGenerator: Send + Sync {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, AppError>;

    /// Rewrites `cv_json` for a job and returns the model's raw JSON answer.
    async fn tailor(
        &self,
        job_title: &str,
        job_description: &str,
        cv_json: &str,
    ) -> Result<String, AppError>;
}

pub struct LlmContentGenerator(pub LlmClient);

#[async_trait]
impl ContentGenerator for LlmContentGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, AppError> {
        let non_empty = |s: &Option<String>| {
            s.as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };
        let prompt = build_generate_prompt(
            request.job_title.trim(),
            non_empty(&request.company).as_deref(),
            non_empty(&request.custom_prompt).as_deref(),
        );
        Ok(self.0.call_text(&prompt, GENERATE_SYSTEM).await?)
    }

    async fn tailor(
        &self,
        job_title: &str,
        job_description: &str,
        cv_json: &str,
    ) -> Result<String, AppError> {
        let prompt = build_tailor_prompt(job_title, job_description, cv_json);
        Ok(self
            .0
            .call_text_with_limit(&prompt, TAILOR_SYSTEM, TAILOR_MAX_TOKENS)
            .await?)
    }
}

/// Stands in when no LLM API key is configured.
pub struct UnavailableGenerator;

#[async_trait]
impl ContentGenerator for UnavailableGenerator {
    async fn generate(&self, _request: &GenerationRequest) -> Result<String, AppError> {
        Err(disabled())
    }

    async fn tailor(&self, _: &str, _: &str, _: &str) -> Result<String, AppError> {
        Err(disabled())
    }
}

fn disabled() -> AppError {
    AppError::Config("ANTHROPIC_API_KEY is not set; AI generation is disabled".to_string())
}

#[cfg(test)]
pub mod testing {
    use async_trait::async_trait;
    use serde_json::Value;

    use super::{ContentGenerator, GenerationRequest};
    use crate::errors::AppError;

    /// Echoes the job title back. Tailoring returns the CV with its summary rewritten
    /// to name the job.
    pub struct EchoGenerator;

    #[async_trait]
    impl ContentGenerator for EchoGenerator {
        async fn generate(&self, request: &GenerationRequest) -> Result<String, AppError> {
            Ok(format!("- Delivered results as {}", request.job_title))
        }

        async fn tailor(
            &self,
            job_title: &str,
            _job_description: &str,
            cv_json: &str,
        ) -> Result<String, AppError> {
            let mut cv: Value = serde_json::from_str(cv_json)
                .map_err(|e| AppError::Validation(e.to_string()))?;
            cv["summary"]["content"] = Value::String(format!("Tailored for {job_title}"));
            Ok(cv.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unavailable_generator_reports_config_error() {
        let err = UnavailableGenerator
            .generate(&GenerationRequest::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Config(_)));

        let err = UnavailableGenerator.tailor("a", "b", "{}").await.unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }
}
