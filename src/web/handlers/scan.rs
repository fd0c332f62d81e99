// Scan handlers — classify an input and persist the result.
//
// POST /scan        — raw text (treated as a URL scan)
// POST /scan/email  — multipart file, decoded as UTF-8
// POST /scan/html   — multipart file, decoded as UTF-8
//
// Uploaded content is truncated to MAX_CONTENT_CHARS before classification
// and storage, so the persisted row and the classified text always match.

use axum::extract::{Multipart, State};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::classify::ClassificationResult;
use crate::db::models::{InputType, NewScan};
use crate::web::error::ApiResult;
use crate::web::AppState;

use super::read_upload;

/// Cap on stored/classified input length, in characters.
pub const MAX_CONTENT_CHARS: usize = 571;

/// Display label for raw text scans, which carry no filename.
const URL_INPUT_NAME: &str = "User URL Input";

#[derive(Deserialize)]
pub struct ScanRequest {
    pub input_text: String,
}

/// POST /scan — classify raw text and persist a url-typed scan.
pub async fn scan_text(
    State(state): State<AppState>,
    Json(request): Json<ScanRequest>,
) -> ApiResult<Json<Value>> {
    let content = truncate_chars(&request.input_text, MAX_CONTENT_CHARS);
    let result = state.orchestrator.classify(&request.input_text).await?;

    persist(&state, InputType::Url, URL_INPUT_NAME, content, &result).await?;

    Ok(Json(json!({
        "status": "success",
        "data": result,
    })))
}

/// POST /scan/email — classify an uploaded email body.
pub async fn scan_email(
    state: State<AppState>,
    multipart: Multipart,
) -> ApiResult<Json<Value>> {
    scan_upload(state, multipart, InputType::Email).await
}

/// POST /scan/html — classify an uploaded HTML snippet.
pub async fn scan_html(state: State<AppState>, multipart: Multipart) -> ApiResult<Json<Value>> {
    scan_upload(state, multipart, InputType::Html).await
}

async fn scan_upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
    input_type: InputType,
) -> ApiResult<Json<Value>> {
    let (filename, bytes) = read_upload(&mut multipart).await?;
    let text = truncate_chars(&String::from_utf8_lossy(&bytes), MAX_CONTENT_CHARS);

    let result = state.orchestrator.classify(&text).await?;
    persist(&state, input_type, &filename, text, &result).await?;

    Ok(Json(json!({
        "filename": filename,
        "status": "success",
        "data": result,
    })))
}

async fn persist(
    state: &AppState,
    input_type: InputType,
    raw_name: &str,
    content: String,
    result: &ClassificationResult,
) -> ApiResult<()> {
    let scan = NewScan {
        input_type,
        raw_name: raw_name.to_string(),
        content,
        is_malicious: result.is_malicious,
        threat_type: result.threat_type.clone(),
        threat_score: result.threat_score,
        binary_score: result.binary_score,
        tokens: result.highlighted_tokens.join(", "),
    };
    state.db.record_scan(&scan).await?;
    Ok(())
}

/// Truncate to a character count, never splitting a UTF-8 code point.
fn truncate_chars(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}
