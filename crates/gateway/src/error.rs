use pixsynth_core::retry::FailureClass;

/// Errors from the provider HTTP layer.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// The request did not complete within its timeout.
    #[error("Provider request timed out: {0}")]
    Timeout(String),

    /// The provider could not be reached (DNS, connect, TLS).
    #[error("Provider connection failed: {0}")]
    Connection(String),

    /// HTTP 429 from the provider.
    #[error("Provider rate limit exceeded: {detail}")]
    RateLimited { detail: String },

    /// Any other non-2xx status.
    #[error("Provider API error ({status}): {body}")]
    Api { status: u16, body: String },

    /// A 2xx response whose payload is not what the endpoint promises.
    #[error("Malformed provider response: {0}")]
    Malformed(String),

    /// No credentials were configured for this provider.
    #[error("{0} is not configured")]
    NotConfigured(&'static str),

    /// Any other transport failure.
    #[error("Provider request failed: {0}")]
    Request(String),
}

impl GatewayError {
    /// Classification consumed by retry policies.
    pub fn class(&self) -> FailureClass {
        match self {
            Self::Timeout(_) => FailureClass::Timeout,
            Self::Connection(_) => FailureClass::Connection,
            Self::RateLimited { .. } => FailureClass::RateLimited,
            _ => FailureClass::Other,
        }
    }

    /// Map a non-success status and its body to an error.
    pub fn from_status(status: u16, body: String) -> Self {
        if status == 429 {
            Self::RateLimited {
                detail: rate_limit_detail(&body),
            }
        } else {
            Self::Api { status, body }
        }
    }
}

impl From<reqwest::Error> for GatewayError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout(e.to_string())
        } else if e.is_connect() {
            Self::Connection(e.to_string())
        } else if e.is_decode() {
            Self::Malformed(e.to_string())
        } else {
            Self::Request(e.to_string())
        }
    }
}

/// Pull `detail` out of a JSON 429 body, falling back to the raw text.
fn rate_limit_detail(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("detail").and_then(|d| d.as_str()).map(str::to_string))
        .unwrap_or_else(|| {
            if body.is_empty() {
                "Rate limit exceeded".to_string()
            } else {
                body.to_string()
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn status_429_is_rate_limited() {
        let err = GatewayError::from_status(429, r#"{"detail":"wait longer"}"#.into());
        assert_matches!(err, GatewayError::RateLimited { ref detail } if detail == "wait longer");
        assert_eq!(err.class(), FailureClass::RateLimited);
    }

    #[test]
    fn status_429_without_json_keeps_body() {
        let err = GatewayError::from_status(429, "slow down".into());
        assert_matches!(err, GatewayError::RateLimited { detail } if detail == "slow down");
    }

    #[test]
    fn other_status_is_api_error() {
        let err = GatewayError::from_status(500, "boom".into());
        assert_matches!(err, GatewayError::Api { status: 500, .. });
        assert_eq!(err.class(), FailureClass::Other);
    }

    #[test]
    fn transport_classes() {
        assert_eq!(
            GatewayError::Timeout("t".into()).class(),
            FailureClass::Timeout
        );
        assert_eq!(
            GatewayError::Connection("c".into()).class(),
            FailureClass::Connection
        );
        assert_eq!(
            GatewayError::NotConfigured("PixelLab").class(),
            FailureClass::Other
        );
    }
}
