use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct PreviewResponse {
    pub status: &'static str,
    pub preview: String,
}
