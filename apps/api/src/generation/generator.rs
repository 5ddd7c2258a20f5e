//! Resume Generation: orchestrates the request pipeline.
//!
//! Flow: validate → build_prompt → LLM generate → (optional) compile → respond.
//!
//! Validation and credential checks happen before any external call. A failed
//! generation ends the request. A failed compilation does not: the LaTeX is
//! still returned with `pdf_error` set.

use base64::Engine;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::ProviderKind;
use crate::errors::AppError;
use crate::generation::prompt_builder::build_prompt;
use crate::generation::template::resolve_template;
use crate::llm_client::{TextGenerator, TokenUsage};
use crate::render::LatexCompiler;

// ────────────────────────────────────────────────────────────────────────────
// Data models
// ────────────────────────────────────────────────────────────────────────────

/// Request body for `POST /api/generate-resume`, as received.
/// Fields are optional here so absent and blank inputs get their own messages.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GenerateResumeRequest {
    #[serde(rename = "jobDescription")]
    pub job_description: Option<String>,
    pub resume: Option<String>,
    /// Inline LaTeX template; overrides the configured template file.
    pub template: Option<String>,
    /// Per-request switch for PDF compilation. Defaults to the service setting.
    pub compile: Option<bool>,
}

/// A request that passed validation. Both texts are trimmed and non-empty.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub resume: String,
    pub job_description: String,
    pub template: Option<String>,
    pub compile: Option<bool>,
}

impl GenerateResumeRequest {
    pub fn validate(self) -> Result<GenerationRequest, AppError> {
        let (Some(job_description), Some(resume)) = (self.job_description, self.resume) else {
            return Err(AppError::Validation(
                "Missing required fields: jobDescription and resume".to_string(),
            ));
        };

        let job_description = job_description.trim();
        let resume = resume.trim();
        if job_description.is_empty() || resume.is_empty() {
            return Err(AppError::Validation(
                "Job description and resume cannot be empty".to_string(),
            ));
        }

        Ok(GenerationRequest {
            resume: resume.to_string(),
            job_description: job_description.to_string(),
            template: self.template,
            compile: self.compile,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GenerateResumeResponse {
    /// Generated LaTeX source.
    pub resume: String,
    pub usage: TokenUsage,
    /// Base64-encoded PDF, present only when compilation succeeded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pdf: Option<String>,
    /// Why compilation failed. Generation itself still succeeded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pdf_error: Option<String>,
}

// ────────────────────────────────────────────────────────────────────────────
// Pipeline
// ────────────────────────────────────────────────────────────────────────────

/// Collaborators for one request. Borrowed from shared state, nothing mutable.
pub struct ResumePipeline<'a> {
    /// `None` when the provider credential is not configured.
    pub llm: Option<&'a dyn TextGenerator>,
    pub provider: ProviderKind,
    pub default_template: &'a str,
    /// `None` disables compilation regardless of the request.
    pub compiler: Option<&'a LatexCompiler>,
    pub compile_by_default: bool,
}

impl ResumePipeline<'_> {
    pub async fn run(
        &self,
        request: GenerateResumeRequest,
    ) -> Result<GenerateResumeResponse, AppError> {
        // Validating
        let request = request.validate()?;
        let llm = self
            .llm
            .ok_or(AppError::MissingCredential(self.provider.api_key_env()))?;

        // Generating
        let template = resolve_template(request.template.as_deref(), self.default_template);
        let prompt = build_prompt(&request.resume, &request.job_description, template);
        info!(
            "Generating resume with {} ({} prompt chars)",
            llm.model(),
            prompt.len()
        );

        let completion = llm.generate(prompt.as_str()).await?;
        info!(
            "Resume generated: {} total tokens",
            completion.usage.total_tokens
        );

        let mut response = GenerateResumeResponse {
            resume: completion.text,
            usage: completion.usage,
            pdf: None,
            pdf_error: None,
        };

        // Compiling
        let wants_pdf = request.compile.unwrap_or(self.compile_by_default);
        if let (true, Some(compiler)) = (wants_pdf, self.compiler) {
            match compiler.compile(&response.resume).await {
                Ok(pdf) => {
                    response.pdf = Some(base64::engine::general_purpose::STANDARD.encode(pdf));
                }
                Err(e) => {
                    warn!("PDF compilation failed, returning LaTeX only: {e}");
                    response.pdf_error = Some(e.to_string());
                }
            }
        }

        Ok(response)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::{Completion, LlmError};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    /// Records prompts and replays a canned outcome.
    struct MockGenerator {
        calls: AtomicUsize,
        prompts: Mutex<Vec<String>>,
        fail: bool,
    }

    impl MockGenerator {
        fn ok() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                prompts: Mutex::new(Vec::new()),
                fail: false,
            }
        }

        fn failing() -> Self {
            Self {
                fail: true,
                ..Self::ok()
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl TextGenerator for MockGenerator {
        fn provider(&self) -> ProviderKind {
            ProviderKind::Groq
        }

        fn model(&self) -> &str {
            "mock-model"
        }

        async fn generate(&self, prompt: &str) -> Result<Completion, LlmError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.prompts.lock().unwrap().push(prompt.to_string());
            if self.fail {
                return Err(LlmError::Api {
                    status: 503,
                    message: "upstream unavailable".to_string(),
                });
            }
            Ok(Completion {
                text: "\\documentclass{article}\\begin{document}Jane\\end{document}".to_string(),
                usage: TokenUsage::new(10, 20, None),
                raw: serde_json::Value::Null,
            })
        }
    }

    fn request(resume: &str, jd: &str) -> GenerateResumeRequest {
        GenerateResumeRequest {
            job_description: Some(jd.to_string()),
            resume: Some(resume.to_string()),
            template: None,
            compile: None,
        }
    }

    fn pipeline<'a>(
        llm: Option<&'a dyn TextGenerator>,
        compiler: Option<&'a LatexCompiler>,
    ) -> ResumePipeline<'a> {
        ResumePipeline {
            llm,
            provider: ProviderKind::Groq,
            default_template: "DEFAULT-TEMPLATE",
            compiler,
            compile_by_default: true,
        }
    }

    #[tokio::test]
    async fn test_blank_inputs_rejected_without_calls() {
        let mock = MockGenerator::ok();
        let p = pipeline(Some(&mock), None);

        for (resume, jd) in [("", "jd"), ("resume", "   "), ("\n\t", "jd")] {
            let err = p.run(request(resume, jd)).await.unwrap_err();
            assert!(matches!(err, AppError::Validation(_)));
            assert_eq!(err.to_string(), "Job description and resume cannot be empty");
        }
        assert_eq!(mock.calls(), 0);
    }

    #[tokio::test]
    async fn test_missing_fields_have_distinct_message() {
        let mock = MockGenerator::ok();
        let err = pipeline(Some(&mock), None)
            .run(GenerateResumeRequest {
                resume: Some("resume".to_string()),
                ..Default::default()
            })
            .await
            .unwrap_err();

        assert_eq!(
            err.to_string(),
            "Missing required fields: jobDescription and resume"
        );
        assert_eq!(mock.calls(), 0);
    }

    #[tokio::test]
    async fn test_missing_credential_is_configuration_error() {
        let err = pipeline(None, None)
            .run(request("resume", "jd"))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::MissingCredential("GROQ_API_KEY")));
    }

    #[tokio::test]
    async fn test_validation_precedes_credential_check() {
        let err = pipeline(None, None).run(request("", "jd")).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_success_returns_text_and_usage() {
        let mock = MockGenerator::ok();
        let response = pipeline(Some(&mock), None)
            .run(request("  Jane Doe, Rust engineer  ", "Rust role"))
            .await
            .unwrap();

        assert_eq!(mock.calls(), 1);
        assert!(response.resume.starts_with("\\documentclass"));
        assert_eq!(response.usage.total_tokens, 30);
        assert!(response.pdf.is_none());
        assert!(response.pdf_error.is_none());

        let prompts = mock.prompts.lock().unwrap();
        assert!(prompts[0].contains("Jane Doe, Rust engineer\n\nJOB DESCRIPTION:"));
        assert!(prompts[0].contains("DEFAULT-TEMPLATE"));
    }

    #[tokio::test]
    async fn test_inline_template_reaches_prompt() {
        let mock = MockGenerator::ok();
        let mut req = request("resume", "jd");
        req.template = Some("INLINE-TEMPLATE".to_string());

        pipeline(Some(&mock), None).run(req).await.unwrap();

        let prompts = mock.prompts.lock().unwrap();
        assert!(prompts[0].contains("INLINE-TEMPLATE"));
        assert!(!prompts[0].contains("DEFAULT-TEMPLATE"));
    }

    #[tokio::test]
    async fn test_generation_failure_skips_compilation() {
        let scratch = tempfile::tempdir().unwrap();
        let compiler = LatexCompiler::new("definitely-not-a-latex-binary", Duration::from_secs(1))
            .with_scratch_root(scratch.path());
        let mock = MockGenerator::failing();

        let err = pipeline(Some(&mock), Some(&compiler))
            .run(request("resume", "jd"))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Generation(_)));
        assert_eq!(
            err.to_string(),
            "Failed to generate resume: API error (status 503): upstream unavailable"
        );
        assert_eq!(std::fs::read_dir(scratch.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_absent_compiler_keeps_latex_and_reports_pdf_error() {
        let compiler = LatexCompiler::new("definitely-not-a-latex-binary", Duration::from_secs(1));
        let mock = MockGenerator::ok();

        let response = pipeline(Some(&mock), Some(&compiler))
            .run(request("resume", "jd"))
            .await
            .unwrap();

        assert!(response.resume.starts_with("\\documentclass"));
        assert!(response.pdf.is_none());
        assert!(response.pdf_error.unwrap().contains("not installed"));
    }

    #[tokio::test]
    async fn test_request_can_opt_out_of_compilation() {
        let compiler = LatexCompiler::new("definitely-not-a-latex-binary", Duration::from_secs(1));
        let mock = MockGenerator::ok();
        let mut req = request("resume", "jd");
        req.compile = Some(false);

        let response = pipeline(Some(&mock), Some(&compiler)).run(req).await.unwrap();

        assert!(response.pdf.is_none());
        assert!(response.pdf_error.is_none());
    }

    #[tokio::test]
    async fn test_disabled_default_skips_compilation_unless_requested() {
        let compiler = LatexCompiler::new("definitely-not-a-latex-binary", Duration::from_secs(1));
        let mock = MockGenerator::ok();
        let p = ResumePipeline {
            compile_by_default: false,
            ..pipeline(Some(&mock), Some(&compiler))
        };

        let response = p.run(request("resume", "jd")).await.unwrap();
        assert!(response.pdf.is_none());
        assert!(response.pdf_error.is_none());

        let mut req = request("resume", "jd");
        req.compile = Some(true);
        let response = p.run(req).await.unwrap();
        assert!(response.pdf.is_none());
        assert!(response.pdf_error.unwrap().contains("not installed"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_compiled_pdf_is_base64_encoded() {
        let scratch = tempfile::tempdir().unwrap();
        let script = scratch.path().join("fake.sh");
        std::fs::write(&script, "printf 'PDF' > \"$4/resume.pdf\"\n").unwrap();
        let compiler = LatexCompiler::new("sh", Duration::from_secs(10))
            .with_pre_args([script.to_string_lossy().into_owned()]);
        let mock = MockGenerator::ok();

        let response = pipeline(Some(&mock), Some(&compiler))
            .run(request("resume", "jd"))
            .await
            .unwrap();

        assert_eq!(response.pdf.as_deref(), Some("UERG"));
        assert!(response.pdf_error.is_none());
    }

    #[test]
    fn test_response_omits_absent_pdf_fields() {
        let response = GenerateResumeResponse {
            resume: "\\documentclass{article}".to_string(),
            usage: TokenUsage::new(10, 20, None),
            pdf: None,
            pdf_error: None,
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["usage"]["total_tokens"], 30);
        assert!(json.get("pdf").is_none());
        assert!(json.get("pdf_error").is_none());
    }

    #[test]
    fn test_request_uses_camel_case_job_description() {
        let request: GenerateResumeRequest = serde_json::from_value(serde_json::json!({
            "jobDescription": "Rust role",
            "resume": "Jane"
        }))
        .unwrap();
        assert_eq!(request.job_description.as_deref(), Some("Rust role"));
        assert!(request.template.is_none());
    }
}
