use once_cell::sync::Lazy;
use regex::bytes::Regex;

/// Pattern matching http/https/ftp links, carried over from the original
/// link-counting tool.
const LINK_PATTERN: &str =
    r"(http|ftp|https)://([\w\-_]+(?:(?:\.[\w\-_]+)+))([\w\-.,@?^=%&:/~+#]*[\w\-@?^=%&/~+#])?";

static LINK_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(LINK_PATTERN).expect("link pattern is valid"));

/// Opaque "compute score from content" operation. Pure and infallible; runs
/// on the fetch task, off the dispatcher's control loop.
pub trait Scorer: Send + Sync + 'static {
    fn score(&self, content: &[u8]) -> u64;
}

/// Counts non-overlapping occurrences of a fixed byte needle.
#[derive(Debug, Clone)]
pub struct SubstringScorer {
    needle: Vec<u8>,
}

impl SubstringScorer {
    pub fn new(needle: impl Into<Vec<u8>>) -> Self {
        let needle = needle.into();
        assert!(!needle.is_empty(), "needle must not be empty");
        Self { needle }
    }
}

impl Scorer for SubstringScorer {
    fn score(&self, content: &[u8]) -> u64 {
        let mut count = 0u64;
        let mut haystack = content;
        while let Some(position) = find(haystack, &self.needle) {
            count += 1;
            haystack = &haystack[position + self.needle.len()..];
        }
        count
    }
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.len() > haystack.len() {
        return None;
    }
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

/// Counts link-shaped matches in the content. Works on raw bytes; fetched
/// pages are not guaranteed to be valid UTF-8.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinkScorer;

impl Scorer for LinkScorer {
    fn score(&self, content: &[u8]) -> u64 {
        LINK_REGEX.find_iter(content).count() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn substring_counts_non_overlapping_occurrences() {
        let scorer = SubstringScorer::new("Go");
        assert_eq!(scorer.score(b"Go Go gopher Go"), 3);
        assert_eq!(scorer.score(b"going, going, gone"), 0);
        assert_eq!(scorer.score(b""), 0);
    }

    #[test]
    fn substring_needle_longer_than_content_scores_zero() {
        let scorer = SubstringScorer::new("golang");
        assert_eq!(scorer.score(b"go"), 0);
    }

    #[test]
    fn links_are_counted_in_html() {
        let body = br#"<html><body>
            <a href="https://example.com/a">one</a>
            <a href="http://example.org/path?x=1&y=2">two</a>
            plain text ftp://files.example.net/archive.tar
        </body></html>"#;
        assert_eq!(LinkScorer.score(body), 3);
    }

    #[test]
    fn bare_hostnames_are_not_links() {
        assert_eq!(LinkScorer.score(b"example.com and www.example.org"), 0);
    }

    #[test]
    fn links_survive_non_utf8_content() {
        let mut body = vec![0xff, 0xfe, 0x00];
        body.extend_from_slice(b" https://example.com/page ");
        body.push(0xff);
        assert_eq!(LinkScorer.score(&body), 1);
    }
}
