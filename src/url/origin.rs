use url::Url;

/// Returns true when both URLs share scheme, host and effective port
///
/// # Examples
///
/// ```
/// use url::Url;
/// use sumi_wake::url::same_origin;
///
/// let root = Url::parse("https://example.com/").unwrap();
/// assert!(same_origin(&root, &Url::parse("https://example.com:443/a").unwrap()));
/// assert!(!same_origin(&root, &Url::parse("http://example.com/a").unwrap()));
/// assert!(!same_origin(&root, &Url::parse("https://blog.example.com/").unwrap()));
/// ```
pub fn same_origin(a: &Url, b: &Url) -> bool {
    match (a.host_str(), b.host_str()) {
        (Some(host_a), Some(host_b)) => {
            a.scheme() == b.scheme()
                && host_a.eq_ignore_ascii_case(host_b)
                && a.port_or_known_default() == b.port_or_known_default()
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_same_origin_ignores_path_query_fragment() {
        assert!(same_origin(
            &url("https://example.com/"),
            &url("https://example.com/a/b?c=d#e")
        ));
    }

    #[test]
    fn test_same_origin_scheme_mismatch() {
        assert!(!same_origin(
            &url("https://example.com/"),
            &url("http://example.com/")
        ));
    }

    #[test]
    fn test_same_origin_subdomain_mismatch() {
        assert!(!same_origin(
            &url("https://example.com/"),
            &url("https://www.example.com/")
        ));
    }

    #[test]
    fn test_same_origin_port_mismatch() {
        assert!(!same_origin(
            &url("http://127.0.0.1:8080/"),
            &url("http://127.0.0.1:8081/")
        ));
    }

    #[test]
    fn test_same_origin_explicit_default_port() {
        assert!(same_origin(
            &url("http://example.com/"),
            &url("http://example.com:80/x")
        ));
    }
}
