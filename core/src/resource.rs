//! Generic request/response client for a single remote resource.
//!
//! # Design
//! A `Resource<T>` is bound to one URL and decodes successful responses into
//! `T`. Callers register callbacks, then call `get` or `post`; both return at
//! once and the outcome arrives later on the completion context:
//!
//! ```no_run
//! use std::sync::Arc;
//! use jsonres_core::{CompletionQueue, JsonResource, UreqTransport};
//!
//! let queue = CompletionQueue::new("ui").unwrap();
//! let mut me = JsonResource::new(
//!     "https://api.example.com/me",
//!     Arc::new(UreqTransport::default()),
//!     Arc::new(queue),
//! );
//! me.on_success(|json| println!("hello {}", json.get("name").as_string()))
//!     .on_failure(|err| eprintln!("profile fetch failed: {err}"));
//! me.get().unwrap();
//! ```
//!
//! Each issued request invokes exactly one of the two callbacks, exactly
//! once, on the completion context. This includes a malformed URL, which is
//! reported as `PayloadInvalid` through the same deferred path rather than
//! synchronously.
//!
//! Issuing a request finalizes its configuration: the callbacks registered
//! at that moment are the ones the outcome is delivered to. Only one exchange
//! may be outstanding per resource; a second `get`/`post` before the first
//! has been delivered is refused with `InFlight`. The outstanding flag is
//! cleared on the completion context just before the callback runs, so a
//! callback may issue a follow-up request (e.g. a retry).

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use url::Url;

use crate::completion::CompletionContext;
use crate::decode::Decodable;
use crate::error::{InFlight, ResourceError, TransportError};
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::json::JsonValue;
use crate::keys::ParamKey;
use crate::transport::Transport;

pub const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

type SuccessFn<T> = Arc<dyn Fn(T) + Send + Sync>;
type FailureFn = Arc<dyn Fn(ResourceError) + Send + Sync>;

/// A resource whose payload is decoded into a dynamic `JsonValue`.
pub type JsonResource = Resource<JsonValue>;

pub struct Resource<T> {
    url: String,
    success: Option<SuccessFn<T>>,
    failure: Option<FailureFn>,
    transport: Arc<dyn Transport>,
    context: Arc<dyn CompletionContext>,
    in_flight: Arc<AtomicBool>,
}

impl<T: Decodable + Send + 'static> Resource<T> {
    pub fn new(
        url: impl Into<String>,
        transport: Arc<dyn Transport>,
        context: Arc<dyn CompletionContext>,
    ) -> Self {
        Self {
            url: url.into(),
            success: None,
            failure: None,
            transport,
            context,
            in_flight: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Change the target URL. Affects requests issued afterwards only.
    pub fn set_url(&mut self, url: impl Into<String>) {
        self.url = url.into();
    }

    /// Whether an exchange has been issued and its outcome not yet delivered.
    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Replace the success callback.
    pub fn on_success(&mut self, callback: impl Fn(T) + Send + Sync + 'static) -> &mut Self {
        self.success = Some(Arc::new(callback));
        self
    }

    /// Replace the failure callback.
    pub fn on_failure(
        &mut self,
        callback: impl Fn(ResourceError) + Send + Sync + 'static,
    ) -> &mut Self {
        self.failure = Some(Arc::new(callback));
        self
    }

    /// Issue a GET for the resource URL.
    pub fn get(&self) -> Result<(), InFlight> {
        self.begin()?;
        match Url::parse(&self.url) {
            Ok(url) => self.execute(HttpRequest {
                method: HttpMethod::Get,
                url: url.into(),
                headers: Vec::new(),
            }),
            Err(err) => self.pre_error(err),
        }
        Ok(())
    }

    /// Issue a POST with `params` encoded as the query string, replacing any
    /// query already present in the URL. The request has no body.
    pub fn post<K, V, I>(&self, params: I) -> Result<(), InFlight>
    where
        K: ParamKey,
        V: AsRef<str>,
        I: IntoIterator<Item = (K, V)>,
    {
        self.begin()?;
        match post_url(&self.url, params) {
            Ok(url) => self.execute(HttpRequest {
                method: HttpMethod::Post,
                url,
                headers: vec![("Content-Type".to_string(), JSON_CONTENT_TYPE.to_string())],
            }),
            Err(err) => self.pre_error(err),
        }
        Ok(())
    }

    fn begin(&self) -> Result<(), InFlight> {
        if self.in_flight.swap(true, Ordering::AcqRel) {
            tracing::warn!(url = %self.url, "request refused: exchange already in flight");
            return Err(InFlight {
                url: self.url.clone(),
            });
        }
        Ok(())
    }

    fn execute(&self, request: HttpRequest) {
        tracing::debug!(method = request.method.as_str(), url = %request.url, "issuing request");
        let delivery = self.delivery();
        self.transport.send(
            request,
            Box::new(move |outcome| delivery.deliver(classify(outcome))),
        );
    }

    fn pre_error(&self, err: url::ParseError) {
        tracing::warn!(url = %self.url, error = %err, "malformed request URL");
        self.delivery().deliver(Err(ResourceError::PayloadInvalid));
    }

    fn delivery(&self) -> Delivery<T> {
        Delivery {
            success: self.success.clone(),
            failure: self.failure.clone(),
            context: Arc::clone(&self.context),
            in_flight: Arc::clone(&self.in_flight),
        }
    }
}

impl<T> fmt::Debug for Resource<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resource")
            .field("url", &self.url)
            .field("in_flight", &self.in_flight.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

/// Callbacks captured when a request was issued.
struct Delivery<T> {
    success: Option<SuccessFn<T>>,
    failure: Option<FailureFn>,
    context: Arc<dyn CompletionContext>,
    in_flight: Arc<AtomicBool>,
}

impl<T: Send + 'static> Delivery<T> {
    fn deliver(self, outcome: Result<T, ResourceError>) {
        let context = Arc::clone(&self.context);
        context.dispatch(Box::new(move || {
            self.in_flight.store(false, Ordering::Release);
            match outcome {
                Ok(payload) => {
                    if let Some(success) = self.success {
                        success(payload);
                    }
                }
                Err(err) => {
                    tracing::debug!(error = %err, "request failed");
                    if let Some(failure) = self.failure {
                        failure(err);
                    }
                }
            }
        }));
    }
}

/// Classify the outcome of an exchange.
///
/// Transport errors become `TransportFailure`; a status outside 200..=299 (or
/// none at all) becomes `HttpStatus`; a missing or undecodable body becomes
/// `PayloadInvalid`.
pub fn classify<T: Decodable>(
    outcome: Result<HttpResponse, TransportError>,
) -> Result<T, ResourceError> {
    let response = outcome.map_err(|err| {
        tracing::debug!(error = %err, "transport failure");
        ResourceError::TransportFailure
    })?;
    if !response.is_success() {
        return Err(ResourceError::HttpStatus(response.status));
    }
    response
        .body
        .as_deref()
        .and_then(T::decode)
        .ok_or(ResourceError::PayloadInvalid)
}

fn post_url<K, V, I>(base: &str, params: I) -> Result<String, url::ParseError>
where
    K: ParamKey,
    V: AsRef<str>,
    I: IntoIterator<Item = (K, V)>,
{
    let mut url = Url::parse(base)?;
    let mut params = params.into_iter().peekable();
    if params.peek().is_some() {
        let mut query = url.query_pairs_mut();
        query.clear();
        for (key, value) in params {
            query.append_pair(key.as_key(), value.as_ref());
        }
    }
    Ok(url.into())
}
