use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use resume_tailor::config::Config;
use resume_tailor::generation::template::load_template_file;
use resume_tailor::llm_client::{LlmClient, TextGenerator};
use resume_tailor::render::LatexCompiler;
use resume_tailor::routes::build_router;
use resume_tailor::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on malformed env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "resume_tailor={},api={},tower_http={}",
                &config.rust_log, &config.rust_log, &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting resume tailor API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize LLM client (absent when the credential is missing)
    let llm = LlmClient::from_config(&config.llm)?
        .map(|client| Arc::new(client) as Arc<dyn TextGenerator>);
    if llm.is_none() {
        warn!(
            "{} is not set; /api/generate-resume will answer 500 until it is",
            config.llm.provider.api_key_env()
        );
    }

    let compiler = LatexCompiler::from_config(&config.compiler);
    info!(
        "PDF compilation {} (compiler: {}, timeout: {:?})",
        if config.compiler.enabled { "enabled" } else { "disabled" },
        compiler.program(),
        config.compiler.timeout
    );

    let template = load_template_file(&config.template_path);

    // Build app state
    let state = AppState {
        config: Arc::new(config.clone()),
        llm,
        compiler: Arc::new(compiler),
        template: Arc::from(template),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
