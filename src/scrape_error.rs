#[derive(Debug)]
pub enum ScrapeError {
    /// Caller input was missing or malformed. Detected before any
    /// network call is made.
    Validation(String),
    /// A priming or search request failed terminally. Page fetches that
    /// fail mid-pagination are not reported here; they truncate instead.
    Network(String),
}

impl std::fmt::Display for ScrapeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScrapeError::Validation(details) => write!(f, "ValidationError: {}", details),
            ScrapeError::Network(details) => write!(f, "NetworkError: {}", details),
        }
    }
}

impl std::error::Error for ScrapeError {}

impl From<reqwest::Error> for ScrapeError {
    fn from(err: reqwest::Error) -> Self {
        ScrapeError::Network(err.to_string())
    }
}
