use std::time::Duration;

pub const DEFAULT_API_BASE: &str = "http://localhost:8000";

/// Where the API lives and how long plain requests may take.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub api_base: String,
    /// Applies to posts requests only. Generation streams run for as long
    /// as the server keeps sending.
    pub request_timeout: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            request_timeout: Some(Duration::from_secs(30)),
        }
    }
}

impl ClientConfig {
    pub fn new(api_base: impl Into<String>) -> Self {
        Self {
            api_base: api_base.into(),
            ..Self::default()
        }
    }

    pub fn with_request_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Absolute URL for an API path such as `/api/posts/`.
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.api_base.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_joins_without_double_slashes() {
        let config = ClientConfig::new("http://api.test/");
        assert_eq!(config.endpoint("/api/posts/"), "http://api.test/api/posts/");
        assert_eq!(
            ClientConfig::default().endpoint("api/ai/generate"),
            "http://localhost:8000/api/ai/generate"
        );
    }
}
