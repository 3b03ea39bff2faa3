//! A small client for JSON APIs over HTTP / HTTPS.
//!
//! [ApiClient] joins endpoints onto a base URI, authenticates every request,
//! and hands back [Response]s which remember the request they answer.
//! Listings which span several pages are walked with [Paginated].

use std::sync::Arc;

use arc_swap::ArcSwap;
use http::Method;
use http::Uri;
use hyperdriver::service::SharedService;
pub use secret::Secret;
use tower::ServiceExt;

mod authentication;
pub mod error;
mod paginate;
pub mod request;
pub mod response;
pub mod uri;

pub use self::authentication::{
    Authentication, AuthenticationLayer, AuthenticationService, BearerAuth,
};
pub use self::error::{Error, HttpResponseError};
pub use self::paginate::{Cursor, CursorSource, LinkHeader, Page, Paginated, PaginationError};
pub use self::request::RequestBuilder;
pub use self::response::Response;
use self::uri::UriExtension as _;

/// A client for accessing APIs over HTTP / HTTPS
///
/// Useful inner object to wrap for individual API clients.
#[derive(Debug, Clone)]
pub struct ApiClient<A> {
    base: Arc<ArcSwap<Uri>>,
    inner: hyperdriver::client::SharedClientService<hyperdriver::Body, hyperdriver::Body>,
    authentication: std::marker::PhantomData<fn() -> A>,
}

impl<A> ApiClient<A>
where
    A: Authentication + Send + Sync + 'static,
{
    /// Create a new API Client which sends requests through `inner`.
    ///
    /// This is how service clients add their own layers, and how tests
    /// substitute a [mock::MockService].
    pub fn new_with_inner_service<S>(base: Uri, authentication: A, inner: S) -> Self
    where
        S: tower::Service<
                http::Request<hyperdriver::Body>,
                Response = http::Response<hyperdriver::Body>,
                Error = hyperdriver::client::Error,
            > + Clone
            + Send
            + Sync
            + 'static,
        S::Future: Send + 'static,
    {
        let authentication = Arc::new(ArcSwap::new(Arc::new(authentication)));

        let service = tower::ServiceBuilder::new()
            .layer(SharedService::layer())
            .layer(AuthenticationLayer::new(authentication))
            .service(inner);

        ApiClient {
            base: Arc::new(ArcSwap::new(Arc::new(base))),
            inner: service,
            authentication: std::marker::PhantomData,
        }
    }
}

impl<A> ApiClient<A> {
    /// The URI which endpoints are joined onto.
    pub fn base(&self) -> Uri {
        (*self.base.load_full()).clone()
    }
}

impl<A> ApiClient<A>
where
    A: Authentication,
{
    /// Build a GET request against an endpoint relative to the base URI.
    pub fn get(&self, endpoint: &str) -> RequestBuilder<A> {
        RequestBuilder::new(self.clone(), self.base().join(endpoint), Method::GET)
    }

    /// Send a fully assembled request.
    pub async fn execute(
        &self,
        req: http::Request<hyperdriver::Body>,
    ) -> Result<Response, hyperdriver::client::Error> {
        let method = req.method().clone();
        let uri = req.uri().clone();

        tracing::trace!("{method} {uri}");
        let response = self.inner.clone().oneshot(req).await?;
        tracing::trace!("{method} {uri} -> {}", response.status());

        Ok(Response::new(uri, response))
    }
}

pub mod mock {
    //! A canned-response service for exercising API clients without a network.

    use std::collections::HashMap;
    use std::sync::Arc;

    use bytes::Bytes;
    use http::response;
    use parking_lot::Mutex;

    #[derive(Debug, Clone)]
    enum MockResponse {
        Reply {
            status: http::StatusCode,
            headers: http::HeaderMap,
            body: Vec<u8>,
        },
        Fail,
    }

    /// A request seen by a [MockService].
    #[derive(Debug, Clone)]
    pub struct RecordedRequest {
        /// Request method
        pub method: http::Method,
        /// Full request URI
        pub uri: http::Uri,
        /// Request headers, after authentication
        pub headers: http::HeaderMap,
    }

    /// Serves canned responses keyed by request path, or by path and query.
    ///
    /// A response registered with a query (`/items?page=2`) takes precedence
    /// over one registered for the bare path. Requests for unregistered paths
    /// panic.
    #[derive(Debug, Default, Clone)]
    pub struct MockService {
        responses: HashMap<String, MockResponse>,
        requests: Arc<Mutex<Vec<RecordedRequest>>>,
    }

    impl MockService {
        /// An empty mock with no canned responses.
        pub fn new() -> Self {
            Self::default()
        }

        /// Answer requests for `path` with the given status, headers, and body.
        pub fn add(
            &mut self,
            path: &str,
            status: http::StatusCode,
            headers: http::HeaderMap,
            body: Vec<u8>,
        ) {
            let response = MockResponse::Reply {
                status,
                headers,
                body,
            };
            self.responses.insert(path.to_owned(), response);
        }

        /// Answer requests for `path` with `200 OK` and a JSON body.
        pub fn add_json(&mut self, path: &str, body: &str) {
            let mut headers = http::HeaderMap::new();
            headers.insert(
                http::header::CONTENT_TYPE,
                http::HeaderValue::from_static("application/json"),
            );
            self.add(path, http::StatusCode::OK, headers, body.as_bytes().to_vec());
        }

        /// Fail requests for `path` as if the connection timed out.
        pub fn fail(&mut self, path: &str) {
            self.responses.insert(path.to_owned(), MockResponse::Fail);
        }

        /// All requests seen so far, in order.
        pub fn requests(&self) -> Vec<RecordedRequest> {
            self.requests.lock().clone()
        }
    }

    impl tower::Service<http::Request<hyperdriver::Body>> for MockService {
        type Response = http::Response<hyperdriver::Body>;
        type Error = hyperdriver::client::Error;
        type Future = std::future::Ready<Result<Self::Response, Self::Error>>;

        fn poll_ready(
            &mut self,
            _cx: &mut std::task::Context<'_>,
        ) -> std::task::Poll<Result<(), Self::Error>> {
            std::task::Poll::Ready(Ok(()))
        }

        fn call(&mut self, req: http::Request<hyperdriver::Body>) -> Self::Future {
            self.requests.lock().push(RecordedRequest {
                method: req.method().clone(),
                uri: req.uri().clone(),
                headers: req.headers().clone(),
            });

            let path = req.uri().path();
            let with_query = req
                .uri()
                .path_and_query()
                .map(|pq| pq.as_str())
                .unwrap_or(path);

            let response = self
                .responses
                .get(with_query)
                .or_else(|| self.responses.get(path))
                .unwrap_or_else(|| panic!("No response configured for path: {with_query}"));

            let (status, headers, body) = match response {
                MockResponse::Reply {
                    status,
                    headers,
                    body,
                } => (status, headers, body),
                MockResponse::Fail => {
                    return std::future::ready(Err(hyperdriver::client::Error::RequestTimeout))
                }
            };

            let mut builder = response::Builder::new()
                .status(*status)
                .version(http::Version::HTTP_11);

            for (key, value) in headers.iter() {
                builder = builder.header(key, value);
            }

            let response = builder
                .body(hyperdriver::Body::from(Bytes::from(body.clone())))
                .unwrap();

            std::future::ready(Ok(response))
        }
    }
}
