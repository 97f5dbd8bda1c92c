use thiserror::Error;

#[derive(Debug, Error)]
pub enum TrialMatchError {
    #[error("{api} request failed: {message}")]
    Api { api: String, message: String },

    #[error("{api} returned an unreadable JSON response: {source}")]
    ApiJson {
        api: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("failed to initialize HTTP client: {0}")]
    HttpClientInit(#[source] reqwest::Error),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("{0} credential is not configured")]
    MissingCredential(&'static str),

    #[error("template rendering failed: {0}")]
    Template(#[from] minijinja::Error),

    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),
}
