use bytes::Bytes;
use http_body_util::Full;
use hyper::{
    body::Incoming,
    header::{HeaderValue, CONTENT_TYPE},
    service::Service,
    Method, Request, Response, StatusCode, Uri,
};
use regex::Regex;
use serde::Serialize;
use serde_json::json;
use tokio::sync::watch;
use tracing::{debug, error};
use url_escape::decode;

use std::{
    collections::HashMap,
    future::Future,
    pin::Pin,
    sync::{Arc, LazyLock},
};

use crate::{
    directory::store::Directory,
    timing::{
        clock::Clock,
        refresh::{BusinessStatus, StatusSnapshot},
    },
};

use super::response::{HealthResponse, ListResponse};

type HttpResult = Result<Response<Full<Bytes>>, hyper::Error>;

static ID_SANITIZER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]{1,64}$").unwrap());

/// The Server
///
/// Handles every API endpoint. Businesses are read through `Directory`, "now"
/// comes from the injected `Clock`, and list queries are answered from the
/// latest snapshot published by the status refresher.
///
/// One clone is handed to each connection task, so everything inside is either
/// shared behind an `Arc` or cheap to clone.
#[derive(Clone)]
pub struct Server {
    directory: Directory,
    clock: Arc<dyn Clock>,
    statuses: watch::Receiver<Arc<StatusSnapshot>>,
}

impl Server {
    pub fn setup(
        directory: Directory,
        clock: Arc<dyn Clock>,
        statuses: watch::Receiver<Arc<StatusSnapshot>>,
    ) -> Self {
        Self {
            directory,
            clock,
            statuses,
        }
    }

    /// Parses the query parameters and returns a `hashmap` of key pair values
    /// Returns `None` if the parameters are malformed
    fn parse_params(text: &str) -> Option<HashMap<String, String>> {
        let mut map: HashMap<String, String> = HashMap::new();
        for pairs in text.split('&').filter(|pair| !pair.is_empty()) {
            let mut iterator = pairs.splitn(2, '=');
            map.insert(
                iterator.next()?.to_string(),
                decode(iterator.next()?).to_string(),
            );
        }
        Some(map)
    }

    fn params(uri: &Uri) -> Option<HashMap<String, String>> {
        match uri.query() {
            None => Some(HashMap::new()),
            Some(query) => Self::parse_params(query),
        }
    }

    /// The /api/status API endpoint.
    ///
    /// Evaluates one business against the clock at request time rather than
    /// using the last snapshot, so a freshly stored business is visible at once.
    ///
    /// 400 when `id` is missing or malformed, 204 when there is no such business.
    fn business_status(&self, uri: &Uri) -> HttpResult {
        let Some(params) = Self::params(uri) else {
            return Self::bad_request("Malformed Parameters.");
        };
        let Some(id) = params.get("id") else {
            return Self::bad_request("id not provided.");
        };
        if !ID_SANITIZER.is_match(id) {
            return Self::bad_request("Malformed id");
        }

        let business = match self.directory.business(id) {
            Ok(Some(business)) => business,
            Ok(None) => return Self::no_data(),
            Err(err) => {
                error!(id = %id, "Could not load business: {}", err);
                return Self::server_error(&err.to_string());
            }
        };
        Self::ok_data(BusinessStatus::evaluate(business, &self.clock.now()))
    }

    /// The /api/businesses API endpoint.
    ///
    /// Optional `open_now=true|false` and `category=<name>` filters, applied to the
    /// latest refresh snapshot.
    fn list_businesses(&self, uri: &Uri) -> HttpResult {
        let Some(params) = Self::params(uri) else {
            return Self::bad_request("Malformed Parameters.");
        };
        let open_now = match params.get("open_now").map(String::as_str) {
            None => None,
            Some("true") | Some("1") => Some(true),
            Some("false") | Some("0") => Some(false),
            Some(_) => return Self::bad_request("Malformed open_now"),
        };
        let category = params.get("category").filter(|category| !category.trim().is_empty());

        let snapshot = self.statuses.borrow().clone();
        let businesses: Vec<BusinessStatus> = snapshot
            .statuses
            .iter()
            .filter(|status| open_now.map_or(true, |open| status.state.is_open == open))
            .filter(|status| category.map_or(true, |category| status.business.in_category(category)))
            .cloned()
            .collect();
        debug!(
            generation = snapshot.generation,
            matched = businesses.len(),
            "Listing businesses"
        );
        Self::ok_data(ListResponse::new(snapshot.computed_at.clone(), businesses))
    }

    fn health(&self) -> HttpResult {
        let snapshot = self.statuses.borrow().clone();
        Self::ok_data(HealthResponse::new(
            snapshot.generation,
            snapshot.computed_at.clone(),
        ))
    }

    pub fn route(&self, method: &Method, uri: &Uri) -> HttpResult {
        match method {
            &Method::GET => match uri.path() {
                "/api/status" => self.business_status(uri),
                "/api/businesses" => self.list_businesses(uri),
                "/api/health" => self.health(),
                _ => Server::not_found(""),
            },
            _ => Server::not_found(""),
        }
    }

    fn respond(status: StatusCode, body: Bytes) -> HttpResult {
        let mut res = Response::new(Full::new(body));
        *res.status_mut() = status;
        res.headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(res)
    }

    fn error_body(message: &str) -> Bytes {
        Bytes::from(json!({ "error": message }).to_string())
    }

    /// Return a 200 OK response with the data provided.
    fn ok_data<T: Serialize>(body: T) -> HttpResult {
        match serde_json::to_vec(&body) {
            Ok(data) => Self::respond(StatusCode::OK, Bytes::from(data)),
            Err(err) => Self::server_error(&err.to_string()),
        }
    }

    /// Return a 500 Internal Server Error response with the message provided.
    fn server_error(message: &str) -> HttpResult {
        Self::respond(StatusCode::INTERNAL_SERVER_ERROR, Self::error_body(message))
    }

    /// Return a 404 Not Found response with the message provided. Leave it empty
    /// for no message.
    fn not_found(message: &str) -> HttpResult {
        let body = if message.is_empty() {
            Bytes::new()
        } else {
            Self::error_body(message)
        };
        Self::respond(StatusCode::NOT_FOUND, body)
    }

    /// Return a 400 Bad Request response with the message provided.
    fn bad_request(message: &str) -> HttpResult {
        Self::respond(StatusCode::BAD_REQUEST, Self::error_body(message))
    }

    /// Return a 204 No Content response.
    fn no_data() -> HttpResult {
        Self::respond(StatusCode::NO_CONTENT, Bytes::new())
    }
}

impl Service<Request<Incoming>> for Server {
    type Response = Response<Full<Bytes>>;
    type Error = hyper::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn call(&self, req: Request<Incoming>) -> Self::Future {
        let res = self.route(req.method(), req.uri());
        Box::pin(async { res })
    }
}
