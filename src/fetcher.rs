use std::error::Error as StdError;
use std::io::Read;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::redirect;
use tracing::debug;

use crate::error::MoonError;

/// A response whose body has not been read yet.
pub struct HttpResponse {
    pub status: u16,
    pub content_length: Option<u64>,
    pub body: Box<dyn Read>,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// The only thing the rest of the program needs from the network.
pub trait Transport {
    fn get(&self, url: &str) -> Result<HttpResponse, MoonError>;
}

pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Result<Self, MoonError> {
        let redirect_policy = redirect::Policy::custom(|attempt| {
            if attempt.previous().len() > 10 {
                attempt.error("Too many redirects (>10)")
            } else {
                attempt.follow()
            }
        });

        let client = Client::builder()
            .redirect(redirect_policy)
            .timeout(timeout)
            .user_agent(concat!("moon_phases/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(classify)?;

        Ok(Self { client })
    }
}

impl Transport for HttpTransport {
    fn get(&self, url: &str) -> Result<HttpResponse, MoonError> {
        debug!(%url, "GET");
        let response = self.client.get(url).send().map_err(classify)?;
        Ok(HttpResponse {
            status: response.status().as_u16(),
            content_length: response.content_length(),
            body: Box::new(response),
        })
    }
}

/// Sorts a reqwest failure into the error taxonomy.
fn classify(err: reqwest::Error) -> MoonError {
    let message = describe(&err);
    if is_tls_failure(&err) {
        MoonError::Transport(message)
    } else if err.is_timeout() || err.is_connect() || err.is_request() || err.is_builder() {
        MoonError::EndpointUnavailable(message)
    } else {
        MoonError::Transport(message)
    }
}

// The top-level message embeds the request URL, so only the causes are read.
fn is_tls_failure(err: &(dyn StdError + 'static)) -> bool {
    let mut current = err.source();
    while let Some(e) = current {
        let text = e.to_string().to_ascii_lowercase();
        if ["certificate", "tls", "ssl", "handshake"]
            .iter()
            .any(|needle| text.contains(needle))
        {
            return true;
        }
        current = e.source();
    }
    false
}

// reqwest's top-level message hides the cause ("error sending request").
fn describe(err: &(dyn StdError + 'static)) -> String {
    let mut parts = vec![err.to_string()];
    let mut current = err.source();
    while let Some(e) = current {
        parts.push(e.to_string());
        current = e.source();
    }
    parts.join(": ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fmt;

    #[derive(Debug)]
    struct Layer {
        message: &'static str,
        source: Option<Box<Layer>>,
    }

    impl fmt::Display for Layer {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(self.message)
        }
    }

    impl StdError for Layer {
        fn source(&self) -> Option<&(dyn StdError + 'static)> {
            self.source.as_deref().map(|e| e as &(dyn StdError + 'static))
        }
    }

    fn chain(messages: &[&'static str]) -> Layer {
        messages
            .iter()
            .rev()
            .fold(None, |source: Option<Layer>, &message| {
                Some(Layer {
                    message,
                    source: source.map(Box::new),
                })
            })
            .unwrap()
    }

    #[test]
    fn test_tls_failure_found_deep_in_chain() {
        let err = chain(&[
            "error sending request",
            "client error (Connect)",
            "invalid peer certificate: UnknownIssuer",
        ]);
        assert!(is_tls_failure(&err));
    }

    #[test]
    fn test_connection_refused_is_not_tls() {
        let err = chain(&["error sending request", "Connection refused (os error 111)"]);
        assert!(!is_tls_failure(&err));
    }

    #[test]
    fn test_host_name_does_not_look_like_tls() {
        let err = chain(&[
            "error sending request for url (https://ssl.tls-mirror.example/api/dialamoon/2024-01-01T00:00)",
            "client error (Connect)",
            "tcp connect error: Connection refused (os error 111)",
        ]);
        assert!(!is_tls_failure(&err));
    }

    #[test]
    fn test_describe_joins_chain() {
        let err = chain(&["error sending request", "dns error", "no such host"]);
        assert_eq!(describe(&err), "error sending request: dns error: no such host");
    }

    #[test]
    fn test_unreachable_host_is_endpoint_unavailable() {
        let transport = HttpTransport::new(Duration::from_secs(2)).unwrap();
        // Port 9 on localhost is "discard"; nothing should be listening.
        let result = transport.get("http://127.0.0.1:9/api/dialamoon/2024-01-01T00:00");
        assert!(matches!(result, Err(MoonError::EndpointUnavailable(_))));
    }

    #[test]
    fn test_success_range() {
        let response = |status| HttpResponse {
            status,
            content_length: None,
            body: Box::new(std::io::empty()),
        };
        assert!(response(200).is_success());
        assert!(response(204).is_success());
        assert!(!response(304).is_success());
        assert!(!response(404).is_success());
    }
}
