//! `tailor` command line: generate a tailored LaTeX resume from local files.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::{info, warn};

use crate::config::{Config, ProviderKind};
use crate::errors::AppError;
use crate::generation::prompt_builder::build_prompt;
use crate::generation::template::{load_template_file, read_template_strict};
use crate::llm_client::{Completion, LlmClient, TextGenerator};
use crate::render::LatexCompiler;


pub const RESPONSE_FILE: &str = "response.txt";
pub const TEX_FILE: &str = "resume.tex";
pub const PDF_FILE: &str = "resume.pdf";

/// Tailor a resume to a job description with a hosted LLM, as LaTeX.
#[derive(Parser, Debug)]
#[command(name = "tailor")]
#[command(version)]
pub struct Args {
    /// Resume text file
    #[arg(short, long)]
    pub resume: PathBuf,

    /// Job description text file
    #[arg(short, long = "job-description", alias = "job_description")]
    pub job_description: PathBuf,

    /// LaTeX template file [default: TEMPLATE_PATH or txt_files/template.txt]
    #[arg(short, long)]
    pub template: Option<PathBuf>,

    /// LLM provider; overrides LLM_PROVIDER. LLM_MODEL and LLM_BASE_URL still apply
    #[arg(long, value_enum)]
    pub provider: Option<ProviderKind>,

    /// Directory for response.txt, resume.tex and resume.pdf
    #[arg(short, long, default_value = ".")]
    pub output_dir: PathBuf,

    /// Also compile resume.tex to PDF
    #[arg(long)]
    pub pdf: bool,

    /// Debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    /// Applies command line overrides on top of the environment configuration.
    pub fn apply_to<F>(&self, config: Config, lookup: F) -> Config
    where
        F: Fn(&str) -> Option<String>,
    {
        match self.provider {
            Some(provider) => config.with_provider(provider, lookup),
            None => config,
        }
    }
}

/// What a run produced on disk.
#[derive(Debug)]
pub struct Outcome {
    pub completion: Completion,
    pub response_path: PathBuf,
    pub tex_path: PathBuf,
    pub pdf_path: Option<PathBuf>,
}

pub async fn execute(args: &Args, config: &Config) -> Result<Outcome> {
    let resume = read_input(&args.resume, "resume")?;
    let job_description = read_input(&args.job_description, "job description")?;
    let template = match &args.template {
        Some(path) => read_template_strict(path)?,
        None => load_template_file(&config.template_path),
    };

    let llm = LlmClient::from_config(&config.llm)?
        .ok_or(AppError::MissingCredential(config.llm.provider.api_key_env()))?;

    let prompt = build_prompt(&resume, &job_description, &template);
    info!(
        "Generating resume with {} via {}",
        llm.model(),
        config.llm.provider.as_str()
    );
    let completion = llm
        .generate(prompt.as_str())
        .await
        .context("Failed to generate resume")?;

    std::fs::create_dir_all(&args.output_dir)
        .with_context(|| format!("Failed to create {}", args.output_dir.display()))?;

    let response_path = args.output_dir.join(RESPONSE_FILE);
    let raw = serde_json::to_string_pretty(&completion.raw)?;
    std::fs::write(&response_path, raw)
        .with_context(|| format!("Failed to write {}", response_path.display()))?;

    let tex_path = args.output_dir.join(TEX_FILE);
    std::fs::write(&tex_path, &completion.text)
        .with_context(|| format!("Failed to write {}", tex_path.display()))?;

    let pdf_path = if args.pdf {
        compile_pdf(config, &completion.text, &args.output_dir.join(PDF_FILE)).await?
    } else {
        None
    };

    Ok(Outcome {
        completion,
        response_path,
        tex_path,
        pdf_path,
    })
}

/// Compile failures are reported and skipped; the LaTeX is already on disk.
async fn compile_pdf(config: &Config, latex: &str, target: &Path) -> Result<Option<PathBuf>> {
    let compiler = LatexCompiler::from_config(&config.compiler);
    match compiler.compile(latex).await {
        Ok(pdf) => {
            std::fs::write(target, pdf)
                .with_context(|| format!("Failed to write {}", target.display()))?;
            Ok(Some(target.to_path_buf()))
        }
        Err(e) => {
            warn!("{e}");
            Ok(None)
        }
    }
}

fn read_input(path: &Path, what: &str) -> Result<String> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {what} file {}", path.display()))?;
    if text.trim().is_empty() {
        bail!("The {what} file {} is empty", path.display());
    }
    Ok(text)
}

/// Prints the generated LaTeX followed by token counts. Written file paths
/// go to the log.
pub fn print_report(outcome: &Outcome) -> io::Result<()> {
    info!("Saved {}", outcome.tex_path.display());
    info!("Saved {}", outcome.response_path.display());
    if let Some(pdf) = &outcome.pdf_path {
        info!("Saved {}", pdf.display());
    }
    write_report(&mut io::stdout().lock(), outcome)
}

fn write_report<W: Write>(out: &mut W, outcome: &Outcome) -> io::Result<()> {
    let usage = outcome.completion.usage;
    writeln!(out, "{}", outcome.completion.text)?;
    writeln!(out, "Input tokens: {}", usage.prompt_tokens)?;
    writeln!(out, "Output tokens: {}", usage.completion_tokens)?;
    writeln!(out, "Total tokens: {}", usage.total_tokens)?;
    out.flush()
}
