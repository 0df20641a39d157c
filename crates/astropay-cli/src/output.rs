//! Response rendering.

use astropay_client::ApiResponse;

/// Render a response for stdout: pretty JSON when structured, the body
/// verbatim otherwise.
pub fn render(resp: &ApiResponse) -> anyhow::Result<String> {
    match resp {
        ApiResponse::Json(value) => Ok(serde_json::to_string_pretty(value)?),
        ApiResponse::Raw(text) => Ok(text.clone()),
    }
}
