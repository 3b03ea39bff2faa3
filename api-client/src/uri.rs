//! URI utilities.

use camino::Utf8Path;
use http::uri::PathAndQuery;
use http::Uri;

/// Extension trait for URIs.
pub trait UriExtension {
    /// Join a path to a URI.
    fn join<P: AsRef<str>>(self, path: P) -> Uri;

    /// Append an already url-encoded query string to a URI.
    ///
    /// Any existing query is kept, and the new pairs are added after it.
    fn with_query(self, encoded: &str) -> Result<Uri, http::Error>;
}

impl UriExtension for Uri {
    fn join<P: AsRef<str>>(self, path: P) -> Uri {
        let mut parts = self.into_parts();

        parts.path_and_query = parts.path_and_query.as_ref().map(|pq| {
            let joined = Utf8Path::new(pq.path()).join(path.as_ref());
            PathAndQuery::from_maybe_shared(joined.to_string()).unwrap()
        });
        Uri::from_parts(parts).unwrap()
    }

    fn with_query(self, encoded: &str) -> Result<Uri, http::Error> {
        if encoded.is_empty() {
            return Ok(self);
        }

        let mut parts = self.into_parts();
        let pq = match parts.path_and_query.as_ref() {
            Some(pq) => match pq.query() {
                Some(existing) if !existing.is_empty() => {
                    format!("{}?{}&{}", pq.path(), existing, encoded)
                }
                _ => format!("{}?{}", pq.path(), encoded),
            },
            None => format!("/?{encoded}"),
        };

        parts.path_and_query = Some(PathAndQuery::try_from(pq)?);
        Ok(Uri::from_parts(parts)?)
    }
}

#[cfg(test)]
mod tests {

    use super::*;

    #[test]
    fn join_endpoint_onto_api_base() {
        let uri = "https://api.github.com/".parse::<Uri>().unwrap();
        let joined = uri.join("user/repos");
        assert_eq!(joined.to_string(), "https://api.github.com/user/repos");

        let uri = "https://ghe.example.com/api/v3".parse::<Uri>().unwrap();
        let joined = uri.join("repos/octo/hello/topics");
        assert_eq!(
            joined.to_string(),
            "https://ghe.example.com/api/v3/repos/octo/hello/topics"
        );

        let uri = "https://api.github.com/bar/".parse::<Uri>().unwrap();
        let joined = uri.join("/user/repos");
        assert_eq!(joined.to_string(), "https://api.github.com/user/repos");
    }

    #[test]
    fn join_empty() {
        let uri = "http://example.com/bar".parse::<Uri>().unwrap();
        let joined = uri.join("");
        assert_eq!(joined.to_string(), "http://example.com/bar/");
    }

    #[test]
    fn query_is_appended() {
        let uri = "https://api.github.com/repos/octo/hello/commits"
            .parse::<Uri>()
            .unwrap();
        let uri = uri.with_query("per_page=100").unwrap();
        assert_eq!(
            uri.to_string(),
            "https://api.github.com/repos/octo/hello/commits?per_page=100"
        );

        let uri = uri.with_query("page=2").unwrap();
        assert_eq!(uri.query(), Some("per_page=100&page=2"));
    }

    #[test]
    fn empty_query_is_a_no_op() {
        let uri = "https://api.github.com/user/repos".parse::<Uri>().unwrap();
        assert_eq!(uri.clone().with_query("").unwrap(), uri);
    }
}
