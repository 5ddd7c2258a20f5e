//! Prompt Builder: renders the one prompt sent to the model per request.

use std::fmt;

use crate::generation::prompts::{CLOSING, INSTRUCTIONS, JOB_DESCRIPTION_HEADER, PREAMBLE};

/// The rendered prompt. Built once, never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt(String);

impl Prompt {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Prompt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Places the three inputs verbatim between the fixed prompt segments.
///
/// Inputs are appended, never scanned, so placeholder-looking text inside a
/// resume or template (`{{NAME}}`, `{resume}`) reaches the model unchanged.
/// The caller is responsible for rejecting blank resume / job description text.
pub fn build_prompt(resume: &str, job_description: &str, template: &str) -> Prompt {
    let mut prompt = String::with_capacity(
        PREAMBLE.len()
            + template.len()
            + INSTRUCTIONS.len()
            + resume.len()
            + JOB_DESCRIPTION_HEADER.len()
            + job_description.len()
            + CLOSING.len(),
    );
    prompt.push_str(PREAMBLE);
    prompt.push_str(template);
    prompt.push_str(INSTRUCTIONS);
    prompt.push_str(resume);
    prompt.push_str(JOB_DESCRIPTION_HEADER);
    prompt.push_str(job_description);
    prompt.push_str(CLOSING);
    Prompt(prompt)
}
