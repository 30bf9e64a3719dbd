//! Request Key Module
//!
//! Cache identity of a request: method plus normalized URL.

use std::fmt;

use reqwest::Method;
use url::Url;

// == Request Key ==
/// Identity under which a response is stored in a generation.
///
/// Fragments never reach the network, so they are stripped before comparison.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestKey {
    method: Method,
    url: Url,
}

impl RequestKey {
    pub fn new(method: Method, url: &Url) -> Self {
        let mut url = url.clone();
        url.set_fragment(None);
        Self { method, url }
    }

    /// GET key for a URL.
    pub fn get(url: &Url) -> Self {
        Self::new(Method::GET, url)
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

impl fmt::Display for RequestKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fragment_is_ignored() {
        let a = RequestKey::get(&Url::parse("http://localhost/app.js#v=1").unwrap());
        let b = RequestKey::get(&Url::parse("http://localhost/app.js").unwrap());
        assert_eq!(a, b);
    }

    #[test]
    fn test_query_is_significant() {
        let a = RequestKey::get(&Url::parse("http://localhost/data?page=1").unwrap());
        let b = RequestKey::get(&Url::parse("http://localhost/data?page=2").unwrap());
        assert_ne!(a, b);
    }

    #[test]
    fn test_method_is_significant() {
        let url = Url::parse("http://localhost/form").unwrap();
        assert_ne!(RequestKey::get(&url), RequestKey::new(Method::POST, &url));
    }

    #[test]
    fn test_display() {
        let key = RequestKey::get(&Url::parse("http://localhost/index.html#top").unwrap());
        assert_eq!(key.to_string(), "GET http://localhost/index.html");
    }
}
