use axum::{extract::State, Json};
use serde_json::{json, Map, Value};

use crate::state::AppState;

/// GET /api/health
/// Reports liveness and whether the selected provider has a credential.
pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    let provider = state.config.llm.provider;

    let mut body = Map::new();
    body.insert("status".into(), json!("healthy"));
    body.insert(
        format!("{}_api_configured", provider.as_str()),
        json!(state.llm.is_some()),
    );
    body.insert("provider".into(), json!(provider.as_str()));
    body.insert("model".into(), json!(state.config.llm.model));
    body.insert("version".into(), json!(env!("CARGO_PKG_VERSION")));

    Json(Value::Object(body))
}
