//! Link extraction
//!
//! Scans raw page text for anchor tags and yields normalized in-domain
//! targets. Tag recognition is regex-driven: at each `<` the extractor
//! looks for the shortest following prefix that forms a well-formed XML
//! tag, bounded by a fixed window so pathological markup cannot stall
//! the scan. Anything that is not an `<a href=...>` within the window is
//! skipped.

use crate::crawler::state::VisitedSet;
use crate::url::{in_domain, Target};
use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

/// Assumed maximum tag length in characters; longer candidates are
/// abandoned and the scan resumes at the next `<`
const MAX_TAG_LENGTH: usize = 666;

/// Matches a complete well-formed XML tag
static TAG_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new("^<(\"[^\"]*\"|'[^']*'|[^'\">])*>$").expect("tag regex is valid")
});

/// Extracts crawlable links from a page body.
///
/// Each returned target is in-domain, normalized, and unique: hrefs are
/// deduplicated against this page's own links, the global visited set,
/// and the worker's requested set.
pub fn extract_links(
    html: &str,
    base: &Target,
    domain: &str,
    visited: &VisitedSet,
    requested: &HashSet<String>,
) -> Vec<Target> {
    let mut page_set: HashSet<String> = HashSet::new();
    let mut links = Vec::new();

    let mut search_from = 0;
    while let Some(rel) = html[search_from..].find('<') {
        let tag_start = search_from + rel;

        match shortest_tag(&html[tag_start..]) {
            Some(tag) => {
                if let Some(target) = href_from_tag(tag, base, domain) {
                    let url = target.url();
                    if !page_set.contains(&url)
                        && !visited.contains(&url)
                        && !requested.contains(&url)
                    {
                        page_set.insert(url);
                        links.push(target);
                    }
                }
                search_from = tag_start + tag.len();
            }
            None => search_from = tag_start + 1,
        }
    }

    links
}

/// Finds the shortest prefix of `s` (which starts at a `<`) that matches
/// the tag regex, within the tag-length window
fn shortest_tag(s: &str) -> Option<&str> {
    let mut chars = 0;
    for (offset, ch) in s.char_indices() {
        chars += 1;
        if chars > MAX_TAG_LENGTH {
            return None;
        }
        // a tag can only close at '>'; skip regex runs that cannot match
        if ch != '>' {
            continue;
        }
        let candidate = &s[..offset + ch.len_utf8()];
        if TAG_REGEX.is_match(candidate) {
            return Some(candidate);
        }
    }
    None
}

/// Pulls a normalized in-domain target out of one syntactically valid
/// tag, or `None` when the tag is not a usable `<a href=...>`
fn href_from_tag(tag: &str, base: &Target, domain: &str) -> Option<Target> {
    let chars: Vec<char> = tag.chars().collect();

    // skip spaces after '<'; the tag name must start with 'a'
    let mut i = 1;
    while i < chars.len() && chars[i] == ' ' {
        i += 1;
    }
    if i >= chars.len() || (chars[i] != 'a' && chars[i] != 'A') {
        return None;
    }

    // locate " href" (any case) past the tag name
    i = find_chars_ci(&chars, i, &[' ', 'h', 'r', 'e', 'f'])?;
    i += 5;

    // '=' with arbitrary surrounding spaces
    while i < chars.len() && chars[i] == ' ' {
        i += 1;
    }
    if i >= chars.len() || chars[i] != '=' {
        return None;
    }
    i += 1;
    while i < chars.len() && chars[i] == ' ' {
        i += 1;
    }
    if i >= chars.len() {
        return None;
    }

    // opening quote: single, double, or escaped double
    let quote;
    if chars[i] == '"' || chars[i] == '\'' {
        quote = chars[i];
        i += 1;
    } else if chars[i] == '\\' && i + 1 < chars.len() && chars[i + 1] == '"' {
        quote = '"';
        i += 2;
    } else {
        return None;
    }

    // read the value up to the matching (possibly escaped) closing quote
    let value_start = i;
    let mut value_end = None;
    while i < chars.len() {
        if chars[i] == quote {
            value_end = Some(i);
            break;
        }
        if quote == '"' && chars[i] == '\\' && i + 1 < chars.len() && chars[i + 1] == '"' {
            value_end = Some(i);
            break;
        }
        i += 1;
    }

    let href: String = chars[value_start..value_end?].iter().collect();

    let target = Target::from_href(&href, base)?;
    if !in_domain(&target.host, domain) {
        return None;
    }
    Some(target)
}

/// Case-insensitive search for a character sequence, returning the index
/// where it begins
fn find_chars_ci(haystack: &[char], from: usize, needle: &[char]) -> Option<usize> {
    if haystack.len() < needle.len() {
        return None;
    }
    (from..=haystack.len() - needle.len()).find(|&i| {
        haystack[i..i + needle.len()]
            .iter()
            .zip(needle)
            .all(|(a, b)| a.to_ascii_lowercase() == b.to_ascii_lowercase())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Target {
        Target::parse("https://www.example.com").unwrap()
    }

    fn extract(html: &str) -> Vec<String> {
        let visited = VisitedSet::new();
        let requested = HashSet::new();
        extract_links(html, &base(), "example.com", &visited, &requested)
            .into_iter()
            .map(|t| t.url())
            .collect()
    }

    #[test]
    fn test_absolute_link() {
        let links = extract(r#"<a href="https://example.com/about">About</a>"#);
        assert_eq!(links, vec!["https://example.com/about"]);
    }

    #[test]
    fn test_relative_link_uses_base() {
        let links = extract(r#"<a href="/contact">Contact</a>"#);
        assert_eq!(links, vec!["https://www.example.com/contact"]);
    }

    #[test]
    fn test_single_quoted_href() {
        let links = extract("<a href='/a'>x</a>");
        assert_eq!(links, vec!["https://www.example.com/a"]);
    }

    #[test]
    fn test_escaped_quotes() {
        let links = extract(r#"<a href=\"/escaped\">x</a>"#);
        assert_eq!(links, vec!["https://www.example.com/escaped"]);
    }

    #[test]
    fn test_spacing_variations() {
        let links = extract(r#"< a  href = "/spaced" >x</a>"#);
        assert_eq!(links, vec!["https://www.example.com/spaced"]);
    }

    #[test]
    fn test_uppercase_tag_and_attr() {
        let links = extract(r#"<A HREF="/upper">x</A>"#);
        assert_eq!(links, vec!["https://www.example.com/upper"]);
    }

    #[test]
    fn test_foreign_domain_dropped() {
        let links = extract(r#"<a href="https://evil.example.org/">x</a>"#);
        assert!(links.is_empty());
    }

    #[test]
    fn test_subdomain_kept() {
        let links = extract(r#"<a href="https://blog.example.com/post">x</a>"#);
        assert_eq!(links, vec!["https://blog.example.com/post"]);
    }

    #[test]
    fn test_non_anchor_tags_skipped() {
        let links = extract(r#"<img src="/x.png"><link href="/style.css"><a href="/real">x</a>"#);
        assert_eq!(links, vec!["https://www.example.com/real"]);
    }

    #[test]
    fn test_mailto_and_fragment_skipped() {
        let links = extract(r##"<a href="mailto:x@y.com">m</a><a href="#top">t</a>"##);
        assert!(links.is_empty());
    }

    #[test]
    fn test_per_page_dedup() {
        let links = extract(r#"<a href="/a">1</a><a href="/a">2</a><a href="/a/">3</a>"#);
        assert_eq!(links, vec!["https://www.example.com/a"]);
    }

    #[test]
    fn test_visited_urls_skipped() {
        let visited = VisitedSet::new();
        visited.insert("https://www.example.com/seen");
        let requested = HashSet::new();
        let links = extract_links(
            r#"<a href="/seen">s</a><a href="/new">n</a>"#,
            &base(),
            "example.com",
            &visited,
            &requested,
        );
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].url(), "https://www.example.com/new");
    }

    #[test]
    fn test_requested_urls_skipped() {
        let visited = VisitedSet::new();
        let mut requested = HashSet::new();
        requested.insert("https://www.example.com/mine".to_string());
        let links = extract_links(
            r#"<a href="/mine">m</a>"#,
            &base(),
            "example.com",
            &visited,
            &requested,
        );
        assert!(links.is_empty());
    }

    #[test]
    fn test_oversized_tag_skipped() {
        let filler = "x".repeat(700);
        let html = format!(r#"<a data-blob="{}" href="/long">x</a><a href="/ok">y</a>"#, filler);
        let links = extract(&html);
        assert_eq!(links, vec!["https://www.example.com/ok"]);
    }

    #[test]
    fn test_extraction_is_deterministic() {
        let html = r#"<a href="/b">b</a><a href="/a">a</a><a href="/c">c</a>"#;
        assert_eq!(extract(html), extract(html));
        assert_eq!(
            extract(html),
            vec![
                "https://www.example.com/b",
                "https://www.example.com/a",
                "https://www.example.com/c"
            ]
        );
    }

    #[test]
    fn test_unclosed_tag_does_not_stall() {
        let links = extract(r#"<a href="/fine">x</a><a href="/broken"#);
        assert_eq!(links, vec!["https://www.example.com/fine"]);
    }
}
