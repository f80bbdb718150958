//! Request execution.
//!
//! # Design
//! The client never performs I/O itself. Anything that can turn an
//! `HttpRequest` into an `HttpResponse` implements [`Transport`]: the blocking
//! [`UreqTransport`], a native host bridging through the C ABI, or a scripted
//! fake in tests. Non-2xx statuses are returned as data; interpreting them is
//! the client's job. There are no retries and no timeouts.

use crate::error::Result;
use crate::http::{HttpRequest, HttpResponse};

pub trait Transport {
    fn execute(&self, request: HttpRequest) -> Result<HttpResponse>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
        (**self).execute(request)
    }
}

#[cfg(feature = "ureq")]
pub use self::blocking::UreqTransport;

#[cfg(feature = "ureq")]
mod blocking {
    use tracing::debug;

    use super::Transport;
    use crate::error::{Result, RosterError};
    use crate::http::{HttpMethod, HttpRequest, HttpResponse};

    /// Blocking transport backed by a `ureq` agent.
    #[derive(Debug, Clone)]
    pub struct UreqTransport {
        agent: ureq::Agent,
    }

    impl UreqTransport {
        pub fn new() -> Self {
            // Status codes are data here; `ApiClient` decides what is an error.
            let agent = ureq::Agent::config_builder()
                .http_status_as_error(false)
                .build()
                .new_agent();
            Self { agent }
        }
    }

    impl Default for UreqTransport {
        fn default() -> Self {
            Self::new()
        }
    }

    impl Transport for UreqTransport {
        fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
            debug!(method = request.method.as_str(), url = %request.url, "executing request");

            let result = match request.method {
                HttpMethod::Get => {
                    let mut builder = self.agent.get(&request.url);
                    for (key, value) in &request.headers {
                        builder = builder.header(key.as_str(), value.as_str());
                    }
                    builder.call()
                }
                HttpMethod::Post => {
                    let mut builder = self.agent.post(&request.url);
                    for (key, value) in &request.headers {
                        builder = builder.header(key.as_str(), value.as_str());
                    }
                    match &request.body {
                        Some(body) => builder.send(body.as_bytes()),
                        None => builder.send_empty(),
                    }
                }
            };
            let mut response = result.map_err(|e| RosterError::Transport(e.to_string()))?;

            let status = response.status().as_u16();
            let headers = response
                .headers()
                .iter()
                .filter_map(|(key, value)| {
                    value
                        .to_str()
                        .ok()
                        .map(|value| (key.as_str().to_string(), value.to_string()))
                })
                .collect();
            let body = response
                .body_mut()
                .read_to_string()
                .map_err(|e| RosterError::Transport(e.to_string()))?;

            Ok(HttpResponse {
                status,
                headers,
                body,
            })
        }
    }
}
