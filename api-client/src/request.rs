//! Building and sending requests.

use http::{header::HeaderValue, HeaderName, Uri};

use crate::paginate::{CursorSource, Paginated};
use crate::response::Response;
use crate::uri::UriExtension as _;
use crate::{ApiClient, Authentication, Error};

/// Builder for a single request against an [ApiClient].
#[derive(Debug)]
pub struct RequestBuilder<A> {
    req: http::request::Builder,
    uri: Uri,
    client: ApiClient<A>,
}

impl<A> RequestBuilder<A> {
    /// Start a request to `uri` with `method`.
    pub fn new(client: ApiClient<A>, uri: Uri, method: http::Method) -> Self {
        Self {
            req: http::Request::builder().method(method),
            uri,
            client,
        }
    }

    /// Add a header to the request.
    pub fn header<K, V>(mut self, key: K, value: V) -> Self
    where
        HeaderName: TryFrom<K>,
        <HeaderName as TryFrom<K>>::Error: Into<http::Error>,
        HeaderValue: TryFrom<V>,
        <HeaderValue as TryFrom<V>>::Error: Into<http::Error>,
    {
        self.req = self.req.header(key, value);
        self
    }

    /// Append url-encoded query parameters to the request URI.
    pub fn query<Q: serde::Serialize + ?Sized>(mut self, query: &Q) -> Result<Self, Error> {
        let encoded = serde_urlencoded::to_string(query)?;
        self.uri = self.uri.with_query(&encoded)?;
        Ok(self)
    }

    /// Assemble the request without sending it.
    pub fn build(self) -> Result<http::Request<hyperdriver::Body>, Error> {
        let request = self
            .req
            .uri(self.uri)
            .body(hyperdriver::Body::empty())?;
        Ok(request)
    }

    /// Send the request, returning the response whatever its status.
    pub async fn send(self) -> Result<Response, Error>
    where
        A: Authentication,
    {
        let client = self.client.clone();
        let req = self.build()?;
        client.execute(req).await.map_err(Error::Request)
    }

    /// Walk a paginated listing which starts at this request.
    ///
    /// The items of every page are deserialized as `T`, and `cursors` finds
    /// the link from one page to the next.
    pub fn paginate<T, C>(self, cursors: C) -> Result<Paginated<A, T, C>, Error>
    where
        A: Authentication,
        C: CursorSource,
    {
        let client = self.client.clone();
        let (parts, _) = self.build()?.into_parts();
        Ok(Paginated::new(
            client,
            parts.method,
            parts.uri,
            parts.headers,
            cursors,
        ))
    }
}
