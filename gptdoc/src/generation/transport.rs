//! HTTP transport

use super::error::GenerationError;
use std::io::Read;
use std::time::Duration;

/// Status and raw body of an HTTP response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Whether the status is 2xx
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Body decoded as UTF-8 (lossy)
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Blocking HTTP client used by the service clients
///
/// Non-success statuses are returned as responses, not errors; only
/// failures to complete the exchange are errors.
pub trait Transport {
    /// POST a JSON body with bearer authentication
    fn post_json(
        &self,
        url: &str,
        bearer_token: &str,
        body: &serde_json::Value,
    ) -> Result<HttpResponse, GenerationError>;

    /// GET a URL without authentication
    fn get(&self, url: &str) -> Result<HttpResponse, GenerationError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn post_json(
        &self,
        url: &str,
        bearer_token: &str,
        body: &serde_json::Value,
    ) -> Result<HttpResponse, GenerationError> {
        (**self).post_json(url, bearer_token, body)
    }

    fn get(&self, url: &str) -> Result<HttpResponse, GenerationError> {
        (**self).get(url)
    }
}

/// [`Transport`] backed by a `ureq` agent
#[derive(Debug, Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    /// Create a transport whose requests time out after `timeout`
    pub fn new(timeout: Duration) -> Self {
        Self {
            agent: ureq::AgentBuilder::new().timeout(timeout).build(),
        }
    }
}

impl Transport for UreqTransport {
    fn post_json(
        &self,
        url: &str,
        bearer_token: &str,
        body: &serde_json::Value,
    ) -> Result<HttpResponse, GenerationError> {
        log::debug!("POST {}", url);
        let result = self
            .agent
            .post(url)
            .set("Authorization", &format!("Bearer {}", bearer_token))
            .set("Content-Type", "application/json")
            .set("Accept", "application/json")
            .send_string(&body.to_string());
        read_response(url, result)
    }

    fn get(&self, url: &str) -> Result<HttpResponse, GenerationError> {
        log::debug!("GET {}", url);
        read_response(url, self.agent.get(url).call())
    }
}

fn read_response(
    url: &str,
    result: Result<ureq::Response, ureq::Error>,
) -> Result<HttpResponse, GenerationError> {
    let response = match result {
        Ok(response) | Err(ureq::Error::Status(_, response)) => response,
        Err(ureq::Error::Transport(transport)) => {
            return Err(GenerationError::Transport {
                url: url.to_string(),
                message: transport.to_string(),
            })
        }
    };

    let status = response.status();
    let mut body = Vec::new();
    response
        .into_reader()
        .read_to_end(&mut body)
        .map_err(|e| GenerationError::Transport {
            url: url.to_string(),
            message: e.to_string(),
        })?;

    log::debug!("{} answered {} ({} bytes)", url, status, body.len());
    Ok(HttpResponse { status, body })
}

/// Transport double that replays canned responses and records requests
#[cfg(test)]
pub(crate) mod scripted {
    use super::*;
    use std::cell::RefCell;
    use std::collections::VecDeque;

    /// A request seen by [`ScriptedTransport`]
    #[derive(Debug, Clone)]
    pub(crate) struct SeenRequest {
        pub url: String,
        pub bearer_token: Option<String>,
        pub body: Option<serde_json::Value>,
    }

    #[derive(Default)]
    pub(crate) struct ScriptedTransport {
        responses: RefCell<VecDeque<HttpResponse>>,
        pub seen: RefCell<Vec<SeenRequest>>,
    }

    impl ScriptedTransport {
        pub(crate) fn new() -> Self {
            Self::default()
        }

        pub(crate) fn respond(self, status: u16, body: impl Into<Vec<u8>>) -> Self {
            self.responses.borrow_mut().push_back(HttpResponse {
                status,
                body: body.into(),
            });
            self
        }

        pub(crate) fn request(&self, index: usize) -> SeenRequest {
            self.seen.borrow()[index].clone()
        }

        fn next(&self, url: &str) -> Result<HttpResponse, GenerationError> {
            self.responses
                .borrow_mut()
                .pop_front()
                .ok_or_else(|| GenerationError::Transport {
                    url: url.to_string(),
                    message: "no scripted response left".to_string(),
                })
        }
    }

    impl Transport for ScriptedTransport {
        fn post_json(
            &self,
            url: &str,
            bearer_token: &str,
            body: &serde_json::Value,
        ) -> Result<HttpResponse, GenerationError> {
            self.seen.borrow_mut().push(SeenRequest {
                url: url.to_string(),
                bearer_token: Some(bearer_token.to_string()),
                body: Some(body.clone()),
            });
            self.next(url)
        }

        fn get(&self, url: &str) -> Result<HttpResponse, GenerationError> {
            self.seen.borrow_mut().push(SeenRequest {
                url: url.to_string(),
                bearer_token: None,
                body: None,
            });
            self.next(url)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_helpers() {
        let ok = HttpResponse {
            status: 200,
            body: b"{}".to_vec(),
        };
        assert!(ok.is_success());
        assert_eq!(ok.text(), "{}");

        let denied = HttpResponse {
            status: 401,
            body: Vec::new(),
        };
        assert!(!denied.is_success());
    }
}
