use url::Url;

/// Extracts the lowercase host of a URL, without a leading `www.`
///
/// # Examples
///
/// ```
/// use url::Url;
/// use sumi_scout::url::extract_domain;
///
/// let url = Url::parse("https://WWW.Example.com/path").unwrap();
/// assert_eq!(extract_domain(&url), Some("example.com".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(|h| {
        let host = h.to_lowercase();
        match host.strip_prefix("www.") {
            Some(rest) => rest.to_string(),
            None => host,
        }
    })
}

/// Same as [`extract_domain`] for a URL string; None if it does not parse
pub fn domain_of(url: &str) -> Option<String> {
    Url::parse(url).ok().as_ref().and_then(extract_domain)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_subdomain() {
        let url = Url::parse("https://blog.example.com/post").unwrap();
        assert_eq!(extract_domain(&url), Some("blog.example.com".to_string()));
    }

    #[test]
    fn test_ip_host() {
        let url = Url::parse("http://127.0.0.1:3000/").unwrap();
        assert_eq!(extract_domain(&url), Some("127.0.0.1".to_string()));
    }

    #[test]
    fn test_domain_of() {
        assert_eq!(domain_of("https://www.acme.com/x"), Some("acme.com".to_string()));
        assert_eq!(domain_of("nonsense"), None);
        assert_eq!(domain_of("mailto:a@b.com"), None);
    }
}
