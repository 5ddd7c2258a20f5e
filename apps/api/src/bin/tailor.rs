use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use resume_tailor::cli::{execute, print_report, Args};
use resume_tailor::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = args.apply_to(Config::from_env()?, |key| std::env::var(key).ok());

    // Logs go to stderr; stdout carries the generated resume.
    let level = if args.verbose { "debug" } else { config.rust_log.as_str() };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("resume_tailor={level}"))
        }))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let outcome = execute(&args, &config).await?;
    print_report(&outcome)?;
    Ok(())
}
