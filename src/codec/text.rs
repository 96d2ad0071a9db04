use std::{fmt, sync::Arc};
use url::Url;

use super::{Decoded, FieldProblem};

/// A URL cell: the text exactly as it appeared in the feed, and its parsed form.
///
/// Parsing normalizes (lowercased host, a `/` path added), so output always
/// comes from `raw`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FeedUrl {
    raw: Arc<str>,
    url: Url,
}

impl FeedUrl {
    pub fn parse(raw: &str) -> Result<Self, url::ParseError> {
        Ok(Self {
            url: Url::parse(raw)?,
            raw: Arc::from(raw),
        })
    }

    /// The original cell text.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

impl fmt::Display for FeedUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Absolute URL, `None` when unparsable.
pub fn decode_url(raw: &str) -> Decoded<Option<FeedUrl>> {
    match FeedUrl::parse(raw) {
        Ok(url) => Decoded::clean(Some(url)),
        Err(_) => Decoded::failed(None, FieldProblem::UrlParse),
    }
}

pub fn encode_url(url: Option<&FeedUrl>) -> String {
    url.map(|u| u.as_str().to_owned()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_absolute_urls() {
        let d = decode_url("https://transit.example.org/fares?zone=1");
        assert!(d.is_clean());
        let url = d.value.expect("url");
        assert_eq!(url.url().host_str(), Some("transit.example.org"));
        assert_eq!(decode_url(&encode_url(Some(&url))).value, Some(url));
    }

    #[test]
    fn text_is_written_back_unnormalized() {
        for raw in ["https://example.org", "HTTPS://Example.ORG/Fares", "http://example.org:80"] {
            let url = decode_url(raw).value.expect(raw);
            assert_eq!(encode_url(Some(&url)), raw);
            assert_eq!(url.to_string(), raw);
        }
        let bare = FeedUrl::parse("https://example.org").expect("bare host");
        assert_eq!(bare.url().as_str(), "https://example.org/");
    }

    #[test]
    fn relative_or_garbage_is_a_parse_problem() {
        for raw in ["www.example.org", "/fares", "http://[::1"] {
            let d = decode_url(raw);
            assert_eq!(d.value, None, "{raw}");
            assert_eq!(d.problems, vec![FieldProblem::UrlParse], "{raw}");
        }
    }

    #[test]
    fn missing_url_is_empty() {
        assert_eq!(encode_url(None), "");
    }
}
