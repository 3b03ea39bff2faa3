//! Cursor-driven pagination.
//!
//! A listing endpoint answers with one [Page] at a time. Each page may carry a
//! [Cursor] pointing at the next one; how that cursor is encoded on the wire
//! is the business of a [CursorSource]. [Paginated] drives the loop: fetch a
//! page, hand out its items, follow the cursor, stop when there is none.

use std::collections::VecDeque;
use std::fmt;
use std::future::Future as _;
use std::pin::Pin;
use std::task::{ready, Context, Poll};

use futures::future::BoxFuture;
use http::{HeaderMap, Method, Uri};
use thiserror::Error;

use crate::response::Response;
use crate::{ApiClient, Authentication, Error};

/// An opaque reference to the next page of a paginated listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cursor(Uri);

impl Cursor {
    /// A cursor which continues at `uri`.
    pub fn new(uri: Uri) -> Self {
        Cursor(uri)
    }

    /// Unwrap into the URI of the next page.
    pub fn into_uri(self) -> Uri {
        self.0
    }
}

/// One page of a listing, and the cursor to the page after it.
#[derive(Debug, Clone)]
pub struct Page<T> {
    /// Items on this page.
    pub items: Vec<T>,

    /// Continuation, if the server reported another page.
    pub next: Option<Cursor>,
}

/// Extracts the continuation cursor from a page response.
pub trait CursorSource {
    /// The cursor to the next page, or `None` on the last page.
    fn next_cursor(&self, response: &Response) -> Option<Cursor>;
}

/// Continuation carried in the `Link` response header, as in
/// `Link: <https://api.example.com/items?page=2>; rel="next"`.
///
/// Relative targets are resolved against the URI of the request.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinkHeader;

impl LinkHeader {
    /// Find the target of the `rel="next"` link in a `Link` header value.
    pub fn next_target(value: &str) -> Option<&str> {
        value.split(',').find_map(|link| {
            let mut params = link.split(';');
            let target = params.next()?.trim();
            let target = target.strip_prefix('<')?.strip_suffix('>')?;

            let is_next = params.any(|param| {
                let Some((key, value)) = param.split_once('=') else {
                    return false;
                };
                key.trim().eq_ignore_ascii_case("rel")
                    && value
                        .trim()
                        .trim_matches('"')
                        .split_ascii_whitespace()
                        .any(|rel| rel.eq_ignore_ascii_case("next"))
            });

            is_next.then_some(target)
        })
    }
}

impl CursorSource for LinkHeader {
    fn next_cursor(&self, response: &Response) -> Option<Cursor> {
        let target = response
            .headers()
            .get_all(http::header::LINK)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .find_map(LinkHeader::next_target)?;

        let base = url::Url::parse(&response.uri().to_string()).ok()?;
        let next = match base.join(target) {
            Ok(next) => next,
            Err(error) => {
                tracing::warn!("Ignoring unparseable next link {target:?}: {error}");
                return None;
            }
        };

        match next.as_str().parse() {
            Ok(uri) => Some(Cursor::new(uri)),
            Err(error) => {
                tracing::warn!("Ignoring invalid next link {target:?}: {error}");
                None
            }
        }
    }
}

/// A page of a listing could not be fetched.
#[derive(Debug, Error)]
#[error("Fetching page {page} of {uri}")]
pub struct PaginationError {
    /// One-based number of the page which failed.
    pub page: usize,

    /// URI of the page which failed.
    pub uri: Uri,

    /// What went wrong.
    #[source]
    pub source: Error,
}

type PageFuture<T> = BoxFuture<'static, Result<Page<T>, Error>>;

enum State<T> {
    Query,
    Buffered(VecDeque<T>),
    Requesting(Uri, PageFuture<T>),
    Done,
}

/// A stream of items collected from a paginated listing.
///
/// Pages are requested one at a time, and only once the items of the previous
/// page have been consumed. The stream ends after a page without a cursor, or
/// after an empty page. A failed page is yielded as a single
/// [PaginationError], after which the stream ends.
#[pin_project::pin_project]
pub struct Paginated<A, T, C> {
    client: ApiClient<A>,
    method: Method,
    headers: HeaderMap,
    next: Option<Uri>,
    cursors: C,
    page: usize,
    state: State<T>,
}

impl<A: fmt::Debug, T, C: fmt::Debug> fmt::Debug for Paginated<A, T, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Paginated")
            .field("client", &self.client)
            .field("next", &self.next)
            .field("cursors", &self.cursors)
            .field("page", &self.page)
            .finish()
    }
}

impl<A, T, C> Paginated<A, T, C> {
    /// Paginate starting from the request described by `method`, `uri`, and `headers`.
    ///
    /// Every page is requested with the same method and headers.
    pub fn new(
        client: ApiClient<A>,
        method: Method,
        uri: Uri,
        headers: HeaderMap,
        cursors: C,
    ) -> Self {
        Self {
            client,
            method,
            headers,
            next: Some(uri),
            cursors,
            page: 0,
            state: State::Query,
        }
    }

    /// Number of pages requested so far.
    pub fn pages(&self) -> usize {
        self.page
    }
}

async fn fetch_page<A, T, C>(
    client: ApiClient<A>,
    cursors: C,
    request: http::Request<hyperdriver::Body>,
) -> Result<Page<T>, Error>
where
    A: Authentication,
    T: serde::de::DeserializeOwned,
    C: CursorSource,
{
    let response = client.execute(request).await.map_err(Error::Request)?;
    let response = response.error_for_status().await.map_err(Error::Response)?;

    let next = cursors.next_cursor(&response);
    let items: Vec<T> = response.json().await.map_err(Error::ResponseBody)?;

    Ok(Page { items, next })
}

impl<A, T, C> futures::Stream for Paginated<A, T, C>
where
    A: Authentication + Send + Sync + 'static,
    T: serde::de::DeserializeOwned + Send + 'static,
    C: CursorSource + Clone + Send + 'static,
{
    type Item = Result<T, PaginationError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.project();

        loop {
            match this.state {
                State::Query => {
                    let Some(uri) = this.next.take() else {
                        tracing::trace!("No more pages to request, stream is done");
                        *this.state = State::Done;
                        continue;
                    };

                    *this.page += 1;

                    let mut builder = http::Request::builder()
                        .method(this.method.clone())
                        .uri(uri.clone());
                    if let Some(headers) = builder.headers_mut() {
                        *headers = this.headers.clone();
                    }

                    let request = match builder.body(hyperdriver::Body::empty()) {
                        Ok(request) => request,
                        Err(error) => {
                            *this.state = State::Done;
                            return Poll::Ready(Some(Err(PaginationError {
                                page: *this.page,
                                uri,
                                source: error.into(),
                            })));
                        }
                    };

                    tracing::trace!(page = *this.page, "Requesting page: {uri}");
                    let future = Box::pin(fetch_page(
                        this.client.clone(),
                        this.cursors.clone(),
                        request,
                    ));
                    *this.state = State::Requesting(uri, future);
                }
                State::Buffered(items) => {
                    if let Some(item) = items.pop_front() {
                        return Poll::Ready(Some(Ok(item)));
                    }
                    *this.state = State::Query;
                }
                State::Requesting(uri, future) => {
                    let result = ready!(future.as_mut().poll(cx));
                    match result {
                        Ok(page) if page.items.is_empty() => {
                            tracing::trace!(page = *this.page, "Empty page, stream is done");
                            *this.state = State::Done;
                        }
                        Ok(page) => {
                            tracing::trace!(
                                page = *this.page,
                                items = page.items.len(),
                                more = page.next.is_some(),
                                "Received page"
                            );
                            *this.next = page.next.map(Cursor::into_uri);
                            *this.state = State::Buffered(VecDeque::from(page.items));
                        }
                        Err(error) => {
                            let uri = uri.clone();
                            *this.state = State::Done;
                            return Poll::Ready(Some(Err(PaginationError {
                                page: *this.page,
                                uri,
                                source: error,
                            })));
                        }
                    }
                }
                State::Done => return Poll::Ready(None),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn link_header_next_target() {
        let value = "<https://api.github.com/repositories/1/commits?per_page=100&page=2>; rel=\"next\", <https://api.github.com/repositories/1/commits?per_page=100&page=5>; rel=\"last\"";
        assert_eq!(
            LinkHeader::next_target(value),
            Some("https://api.github.com/repositories/1/commits?per_page=100&page=2")
        );
    }

    #[test]
    fn link_header_without_next() {
        let value = "<https://api.github.com/repositories/1/commits?page=1>; rel=\"first\", <https://api.github.com/repositories/1/commits?page=4>; rel=\"prev\"";
        assert_eq!(LinkHeader::next_target(value), None);
        assert_eq!(LinkHeader::next_target(""), None);
    }

    #[test]
    fn link_header_rel_lists() {
        let value = "</items?page=3>; title=\"more\"; rel=\"next last\"";
        assert_eq!(LinkHeader::next_target(value), Some("/items?page=3"));
    }
}
