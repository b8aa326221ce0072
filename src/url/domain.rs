/// Extracts the registrable domain from a hostname.
///
/// The registrable domain is the last two dot-separated labels of the
/// hostname (`www.example.com` -> `example.com`). Hostnames with fewer
/// than two dots are returned unchanged.
///
/// # Examples
///
/// ```
/// use rickbot::url::registrable_domain;
///
/// assert_eq!(registrable_domain("www.example.com"), "example.com");
/// assert_eq!(registrable_domain("example.com"), "example.com");
/// assert_eq!(registrable_domain("localhost"), "localhost");
/// ```
pub fn registrable_domain(hostname: &str) -> String {
    let mut dots = 0;
    for (i, c) in hostname.char_indices().rev() {
        if c == '.' {
            dots += 1;
            if dots == 2 {
                return hostname[i + 1..].to_string();
            }
        }
    }
    hostname.to_string()
}

/// Returns true if the hostname belongs to the registrable domain.
///
/// The check is substring containment, not suffix matching, so any
/// hostname that merely contains the domain is accepted. This mirrors
/// the behavior the crawler has always had; callers should not rely on
/// it rejecting hosts like `example.com.evil.org`.
pub fn in_domain(hostname: &str, domain: &str) -> bool {
    hostname.contains(domain)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_two_label_hostname() {
        assert_eq!(registrable_domain("example.com"), "example.com");
    }

    #[test]
    fn test_subdomain_stripped() {
        assert_eq!(registrable_domain("www.example.com"), "example.com");
        assert_eq!(registrable_domain("blog.example.com"), "example.com");
    }

    #[test]
    fn test_nested_subdomain_stripped() {
        assert_eq!(registrable_domain("api.v2.example.com"), "example.com");
    }

    #[test]
    fn test_single_label_hostname() {
        assert_eq!(registrable_domain("localhost"), "localhost");
    }

    #[test]
    fn test_ip_address_keeps_last_two_octets() {
        // IPv4 literals fall out of the label rule; the crawler keys its
        // domain gate off whatever the last two labels are.
        assert_eq!(registrable_domain("127.0.0.1"), "0.1");
    }

    #[test]
    fn test_in_domain_exact() {
        assert!(in_domain("example.com", "example.com"));
    }

    #[test]
    fn test_in_domain_subdomain() {
        assert!(in_domain("www.example.com", "example.com"));
        assert!(in_domain("deep.sub.example.com", "example.com"));
    }

    #[test]
    fn test_foreign_host_rejected() {
        assert!(!in_domain("evil.org", "example.com"));
        assert!(!in_domain("examples.org", "example.com"));
    }

    #[test]
    fn test_substring_containment_is_permissive() {
        // Deliberately permissive: containment admits these.
        assert!(in_domain("example.com.evil.org", "example.com"));
        assert!(in_domain("notexample.com", "example.com"));
    }
}
