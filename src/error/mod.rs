#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON Error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Thread Pool Error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("Validation Error: {0} should be {1}")]
    Validation(String, String),
}
