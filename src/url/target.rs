use crate::UrlError;

const PROTOCOL_SEPARATOR: &str = "://";
// Escaped separator seen in hrefs embedded inside scripts: `:\/\/`
const ESCAPED_SEPARATOR: &str = ":\\/\\/";

/// A parsed crawl target: one URL decomposed into its components.
///
/// The canonical string form is `scheme + host + port + path` where
/// `scheme` retains its `://` suffix, `host` is lowercase, `port` is the
/// literal `":nnn"` or empty, and `path` begins with `/` or is empty with
/// any trailing `/` removed. Two targets are the same page iff their
/// canonical strings are equal.
#[derive(Debug, Clone)]
pub struct Target {
    /// `"http://"` or `"https://"`, lowercase
    pub scheme: String,

    /// Hostname component, lowercase
    pub host: String,

    /// Port specification (`":8080"`) if present, otherwise empty
    pub port: String,

    /// `""` or `"/..."`, trailing slash removed
    pub path: String,

    /// Hint that the host's robots.txt has not been fetched yet
    pub needs_robots: bool,
}

impl Target {
    /// Parses an absolute http(s) URL into its components.
    ///
    /// Both the literal `://` separator and the escaped `:\/\/` form are
    /// recognized; the stored scheme always uses the literal form. The
    /// host is split from the path at the first `/` after the scheme, or
    /// at the first `?` when no `/` appears.
    pub fn parse(url: &str) -> Result<Self, UrlError> {
        if !url.to_lowercase().starts_with("http") {
            return Err(UrlError::InvalidScheme(format!(
                "expected http:// or https://, got '{}'",
                url
            )));
        }

        let (scheme, rest) = match url.find(PROTOCOL_SEPARATOR) {
            Some(end) => (
                url[..end + PROTOCOL_SEPARATOR.len()].to_lowercase(),
                &url[end + PROTOCOL_SEPARATOR.len()..],
            ),
            None => match url.find(ESCAPED_SEPARATOR) {
                Some(end) => (
                    format!("{}{}", url[..end].to_lowercase(), PROTOCOL_SEPARATOR),
                    &url[end + ESCAPED_SEPARATOR.len()..],
                ),
                None => {
                    return Err(UrlError::Parse(format!(
                        "missing protocol separator in '{}'",
                        url
                    )))
                }
            },
        };

        let (raw_host, raw_path) = match rest.find('/') {
            Some(slash) => (&rest[..slash], rest[slash..].to_string()),
            None => match rest.find('?') {
                Some(query) => (&rest[..query], rest[query..].to_string()),
                None => (rest, String::new()),
            },
        };

        let mut host = raw_host.to_lowercase();
        // hostnames scraped from escaped markup can carry trailing backslashes
        while host.ends_with('\\') {
            host.pop();
        }

        let mut port = String::new();
        if let Some(colon) = host.find(':') {
            port = host[colon..].to_string();
            host.truncate(colon);
        }

        if host.is_empty() {
            return Err(UrlError::MissingHost);
        }

        Ok(Self {
            scheme,
            host,
            port,
            path: normalize_path(raw_path),
            needs_robots: false,
        })
    }

    /// Resolves a raw href scraped from a page against a base target.
    ///
    /// Returns `None` for hrefs that are not crawlable links: fragments,
    /// `mailto:`/`tel:`/`file:`/`javascript:` schemes, template
    /// placeholders, empty strings, and relative paths that do not start
    /// with `/`.
    pub fn from_href(raw: &str, base: &Target) -> Option<Self> {
        if raw.is_empty() {
            return None;
        }

        if raw.starts_with("mailto:")
            || raw.starts_with("tel:")
            || raw.starts_with("file:")
            || raw.starts_with("javascript:")
        {
            return None;
        }

        if raw.starts_with('#') {
            return None;
        }

        // fix urls mangled by HTML entity escaping
        let mut href = raw.replace("&#x2F;", "/");

        while href.ends_with('/') {
            href.pop();
        }

        if href.is_empty() {
            return None;
        }

        if href.starts_with('{') || href.starts_with('+') {
            return None;
        }

        if href.to_lowercase().starts_with("http")
            && (href.contains(PROTOCOL_SEPARATOR) || href.contains(ESCAPED_SEPARATOR))
        {
            Self::parse(&href).ok()
        } else if href.starts_with('/') {
            Some(Self {
                scheme: base.scheme.clone(),
                host: base.host.clone(),
                port: base.port.clone(),
                path: normalize_path(href),
                needs_robots: false,
            })
        } else {
            None
        }
    }

    /// The canonical URL string composed from the stored components
    pub fn url(&self) -> String {
        format!("{}{}{}{}", self.scheme, self.host, self.port, self.path)
    }

    /// Hostname plus port specification, as used in request URLs
    pub fn host_port(&self) -> String {
        format!("{}{}", self.host, self.port)
    }

    /// True when the scheme is one the crawler can fetch
    pub fn is_fetchable(&self) -> bool {
        self.scheme == "http://" || self.scheme == "https://"
    }
}

fn normalize_path(mut path: String) -> String {
    while path.ends_with('/') {
        path.pop();
    }
    path
}
