// Resume Generation Pipeline
// Implements: template loading, prompt building, request orchestration.
// All LLM calls go through llm_client, all PDF work through render.

pub mod generator;
pub mod handlers;
pub mod prompt_builder;
pub mod prompts;
pub mod template;
