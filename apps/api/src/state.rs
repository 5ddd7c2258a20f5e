use std::sync::Arc;

use crate::config::Config;
use crate::generation::generator::ResumePipeline;
use crate::llm_client::TextGenerator;
use crate::render::LatexCompiler;

/// Shared application state injected into all route handlers via Axum extractors.
/// Everything here is read-only after startup.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    /// `None` when the provider credential is missing; health reports it and
    /// generation requests are refused.
    pub llm: Option<Arc<dyn TextGenerator>>,
    pub compiler: Arc<LatexCompiler>,
    /// Contents of the configured template file, read once at startup.
    pub template: Arc<str>,
}

impl AppState {
    pub fn pipeline(&self) -> ResumePipeline<'_> {
        ResumePipeline {
            llm: self.llm.as_deref(),
            provider: self.config.llm.provider,
            default_template: &self.template,
            compiler: Some(self.compiler.as_ref()),
            compile_by_default: self.config.compiler.enabled,
        }
    }
}
