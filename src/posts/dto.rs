use serde::Deserialize;

/// Request body for a new post. Fields default to empty so that missing
/// ones are reported by validation rather than by the JSON extractor.
#[derive(Debug, Deserialize)]
pub struct CreatePostRequest {
    #[serde(default)]
    pub headline: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub message: String,
    pub level: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdatePostRequest {
    #[serde(default)]
    pub message: String,
}
