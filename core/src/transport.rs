//! The injected send primitive behind every `Resource` exchange.
//!
//! # Design
//! A `Transport` takes an `HttpRequest` and answers exactly once through a
//! one-shot `Reply`, from whatever thread it likes. `send` itself must not
//! block on the network. Timeouts belong to the transport; the resource
//! client has none of its own.
//!
//! `UreqTransport` runs each exchange on its own worker thread with a
//! blocking `ureq` agent. A panic on that thread still answers the reply
//! with a `TransportError`, and a body larger than the configured limit is
//! reported as an absent body. `Scripted` answers from a queue of canned outcomes
//! without any network, for tests and offline runs.

use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::Duration;

use crate::error::TransportError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};

/// One-shot continuation receiving the outcome of an exchange.
pub type Reply = Box<dyn FnOnce(Result<HttpResponse, TransportError>) + Send + 'static>;

pub trait Transport: Send + Sync {
    /// Start the exchange and return immediately. `reply` must be invoked
    /// exactly once, unless the exchange never terminates.
    fn send(&self, request: HttpRequest, reply: Reply);
}

/// Settings for `UreqTransport`.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Upper bound for a whole exchange. `None` waits indefinitely.
    pub timeout: Option<Duration>,
    pub user_agent: String,
    /// Largest response body read, in bytes.
    pub body_limit: u64,
}

pub const DEFAULT_BODY_LIMIT: u64 = 10 * 1024 * 1024;

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: Some(Duration::from_secs(30)),
            user_agent: format!("jsonres/{}", env!("CARGO_PKG_VERSION")),
            body_limit: DEFAULT_BODY_LIMIT,
        }
    }
}

/// Blocking `ureq` agent driven from one worker thread per exchange.
///
/// Non-2xx responses are returned as data rather than errors, so status
/// interpretation stays with the resource client.
#[derive(Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
    user_agent: String,
    body_limit: u64,
}

impl UreqTransport {
    pub fn new(config: TransportConfig) -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(config.timeout)
            .build()
            .new_agent();
        Self {
            agent,
            user_agent: config.user_agent,
            body_limit: config.body_limit,
        }
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new(TransportConfig::default())
    }
}

impl Transport for UreqTransport {
    fn send(&self, request: HttpRequest, reply: Reply) {
        let agent = self.agent.clone();
        let user_agent = self.user_agent.clone();
        let body_limit = self.body_limit;
        let slot = Arc::new(Mutex::new(Some(reply)));
        let worker_slot = Arc::clone(&slot);

        let spawned = thread::Builder::new()
            .name("jsonres-transport".to_string())
            .spawn(move || {
                let outcome = guarded(|| execute(&agent, &request, &user_agent, body_limit));
                if let Some(reply) = take_reply(&worker_slot) {
                    reply(outcome);
                }
            });

        if let Err(err) = spawned {
            tracing::error!(error = %err, "failed to spawn transport worker");
            if let Some(reply) = take_reply(&slot) {
                reply(Err(TransportError::new(format!(
                    "failed to spawn transport worker: {err}"
                ))));
            }
        }
    }
}

fn take_reply(slot: &Mutex<Option<Reply>>) -> Option<Reply> {
    slot.lock().unwrap_or_else(PoisonError::into_inner).take()
}

/// Run `exchange`, turning a panic into a `TransportError` so the reply is
/// still answered.
fn guarded(
    exchange: impl FnOnce() -> Result<HttpResponse, TransportError>,
) -> Result<HttpResponse, TransportError> {
    panic::catch_unwind(AssertUnwindSafe(exchange)).unwrap_or_else(|_| {
        tracing::error!("transport worker panicked");
        Err(TransportError::new("transport worker panicked"))
    })
}

/// Perform one blocking exchange.
fn execute(
    agent: &ureq::Agent,
    request: &HttpRequest,
    user_agent: &str,
    body_limit: u64,
) -> Result<HttpResponse, TransportError> {
    let result = match request.method {
        HttpMethod::Get => {
            let mut builder = agent.get(request.url.as_str()).header("User-Agent", user_agent);
            for (name, value) in &request.headers {
                builder = builder.header(name.as_str(), value.as_str());
            }
            builder.call()
        }
        HttpMethod::Post => {
            let mut builder = agent.post(request.url.as_str()).header("User-Agent", user_agent);
            for (name, value) in &request.headers {
                builder = builder.header(name.as_str(), value.as_str());
            }
            builder.send_empty()
        }
    };

    let mut response = result.map_err(|err| TransportError::new(err.to_string()))?;
    let status = response.status().as_u16();
    let headers = response
        .headers()
        .iter()
        .filter_map(|(name, value)| {
            let value = value.to_str().ok()?;
            Some((name.as_str().to_string(), value.to_string()))
        })
        .collect();
    let body = match response
        .body_mut()
        .with_config()
        .limit(body_limit)
        .read_to_vec()
    {
        Ok(body) => Some(body),
        Err(ureq::Error::BodyExceedsLimit(limit)) => {
            tracing::warn!(url = %request.url, limit, "response body exceeds limit");
            None
        }
        Err(err) => return Err(TransportError::new(format!("failed to read body: {err}"))),
    };

    Ok(HttpResponse {
        status: Some(status),
        headers,
        body,
    })
}

/// Transport answering from a queue of canned outcomes.
///
/// Outcomes are consumed in order, one per request. When the queue is empty
/// the request fails with a `TransportError`. Replies arrive on a separate
/// thread, after `delay` if one is set.
#[derive(Debug, Default)]
pub struct Scripted {
    outcomes: Mutex<VecDeque<Result<HttpResponse, TransportError>>>,
    seen: Mutex<Vec<HttpRequest>>,
    delay: Option<Duration>,
}

impl Scripted {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response with the given status and body.
    pub fn respond(self, status: u16, body: impl Into<Vec<u8>>) -> Self {
        self.push(Ok(HttpResponse::new(status, body)));
        self
    }

    /// Queue a transport-level failure.
    pub fn fail(self, message: &str) -> Self {
        self.push(Err(TransportError::new(message)));
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn push(&self, outcome: Result<HttpResponse, TransportError>) {
        self.outcomes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(outcome);
    }

    /// Requests received so far, oldest first.
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.seen
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Transport for Scripted {
    fn send(&self, request: HttpRequest, reply: Reply) {
        let outcome = self
            .outcomes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::new("no scripted response left")));
        self.seen
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request);

        let delay = self.delay;
        thread::spawn(move || {
            if let Some(delay) = delay {
                thread::sleep(delay);
            }
            reply(outcome);
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    fn request(url: &str) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Get,
            url: url.to_string(),
            headers: Vec::new(),
        }
    }

    fn send_and_wait(
        transport: &dyn Transport,
        req: HttpRequest,
    ) -> Result<HttpResponse, TransportError> {
        let (tx, rx) = mpsc::channel();
        transport.send(
            req,
            Box::new(move |outcome| {
                let _ = tx.send(outcome);
            }),
        );
        rx.recv_timeout(Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn scripted_answers_in_order() {
        let transport = Scripted::new().respond(200, "first").fail("offline");

        let first = send_and_wait(&transport, request("https://a.test/1")).unwrap();
        assert_eq!(first, HttpResponse::new(200, "first"));

        let second = send_and_wait(&transport, request("https://a.test/2")).unwrap_err();
        assert_eq!(second.message(), "offline");
    }

    #[test]
    fn scripted_fails_when_exhausted() {
        let transport = Scripted::new();
        let err = send_and_wait(&transport, request("https://a.test/")).unwrap_err();
        assert_eq!(err.message(), "no scripted response left");
    }

    #[test]
    fn scripted_records_requests() {
        let transport = Scripted::new().respond(200, "").respond(204, "");
        send_and_wait(&transport, request("https://a.test/1")).unwrap();
        send_and_wait(&transport, request("https://a.test/2")).unwrap();

        let urls: Vec<String> = transport.requests().into_iter().map(|r| r.url).collect();
        assert_eq!(urls, vec!["https://a.test/1", "https://a.test/2"]);
    }

    #[test]
    fn scripted_delay_defers_reply() {
        let transport = Scripted::new()
            .respond(200, "")
            .with_delay(Duration::from_millis(50));
        let started = std::time::Instant::now();
        send_and_wait(&transport, request("https://a.test/")).unwrap();
        assert!(started.elapsed() >= Duration::from_millis(50));
    }

    #[test]
    fn default_config_has_timeout_and_agent_name() {
        let config = TransportConfig::default();
        assert_eq!(config.timeout, Some(Duration::from_secs(30)));
        assert!(config.user_agent.starts_with("jsonres/"));
        assert_eq!(config.body_limit, DEFAULT_BODY_LIMIT);
    }

    #[test]
    fn guarded_passes_outcome_through() {
        let outcome = guarded(|| Ok(HttpResponse::new(204, "")));
        assert_eq!(outcome, Ok(HttpResponse::new(204, "")));

        let err = guarded(|| Err(TransportError::new("offline"))).unwrap_err();
        assert_eq!(err.message(), "offline");
    }

    #[test]
    fn guarded_turns_panic_into_transport_error() {
        let err = guarded(|| panic!("worker blew up")).unwrap_err();
        assert_eq!(err.message(), "transport worker panicked");
    }
}
