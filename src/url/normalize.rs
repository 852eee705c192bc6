use crate::UrlError;
use url::Url;

/// Query parameters that only track campaigns and never change page content
const TRACKING_PARAMS: &[&str] = &[
    "utm_source",
    "utm_medium",
    "utm_campaign",
    "utm_term",
    "utm_content",
    "fbclid",
    "gclid",
    "mc_eid",
    "_hsenc",
    "_hsmi",
];

/// Normalizes a URL so that equivalent links share one queue/graph key
///
/// # Normalization Steps
///
/// 1. Parse; reject non-http(s) schemes and hostless URLs
/// 2. Lowercase the host and drop a leading `www.`
/// 3. Collapse repeated slashes and drop a trailing slash (root stays `/`)
/// 4. Remove the fragment
/// 5. Remove tracking parameters, sort the rest, drop an empty query
///
/// The scheme is preserved: `http` and `https` variants stay distinct.
///
/// # Examples
///
/// ```
/// use sumi_scout::url::normalize_url;
///
/// let url = normalize_url("https://WWW.Example.com/about/?utm_source=x#team").unwrap();
/// assert_eq!(url.as_str(), "https://example.com/about");
/// ```
pub fn normalize_url(url_str: &str) -> Result<Url, UrlError> {
    let mut url = Url::parse(url_str.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(url.scheme().to_string()));
    }

    let host = url.host_str().ok_or(UrlError::MissingDomain)?.to_lowercase();
    let host = host.strip_prefix("www.").unwrap_or(&host).to_string();
    url.set_host(Some(&host))
        .map_err(|e| UrlError::Malformed(format!("Failed to set host: {}", e)))?;

    let path = normalize_path(url.path());
    url.set_path(&path);
    url.set_fragment(None);

    if url.query().is_some() {
        let mut params: Vec<(String, String)> = url
            .query_pairs()
            .filter(|(k, _)| !TRACKING_PARAMS.contains(&k.as_ref()))
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        params.sort();

        if params.is_empty() {
            url.set_query(None);
        } else {
            url.query_pairs_mut().clear().extend_pairs(params);
        }
    }

    Ok(url)
}

fn normalize_path(path: &str) -> String {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    if segments.is_empty() {
        "/".to_string()
    } else {
        format!("/{}", segments.join("/"))
    }
}
