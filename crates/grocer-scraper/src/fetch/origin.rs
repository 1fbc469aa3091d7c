//! URL helpers shared by the fetchers and retailer extractors.

/// Resolves `href` against `base`, the way a browser resolves a link.
///
/// Absolute hrefs are returned unchanged. Returns `None` when `base` is not a
/// valid URL or the join fails.
#[must_use]
pub fn absolute_url(base: &str, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }
    let base = reqwest::Url::parse(base)
        .map_err(|e| tracing::debug!(base, error = %e, "base URL does not parse"))
        .ok()?;
    base.join(href).ok().map(String::from)
}

/// Extracts the hostname from a URL for use in error messages.
///
/// Falls back to the full URL string if parsing fails.
#[must_use]
pub fn extract_domain(url: &str) -> String {
    reqwest::Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_owned))
        .unwrap_or_else(|| url.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absolute_url_joins_root_relative_href() {
        assert_eq!(
            absolute_url("https://www.aldi.nl", "/producten/zuivel.html").as_deref(),
            Some("https://www.aldi.nl/producten/zuivel.html")
        );
    }

    #[test]
    fn absolute_url_keeps_absolute_href() {
        assert_eq!(
            absolute_url("https://www.aldi.nl", "https://cdn.aldi.nl/a.png").as_deref(),
            Some("https://cdn.aldi.nl/a.png")
        );
    }

    #[test]
    fn absolute_url_trims_whitespace() {
        assert_eq!(
            absolute_url("https://www.dirk.nl/", "  boodschappen/zuivel ").as_deref(),
            Some("https://www.dirk.nl/boodschappen/zuivel")
        );
    }

    #[test]
    fn absolute_url_rejects_empty_href() {
        assert!(absolute_url("https://www.dirk.nl/", "   ").is_none());
    }

    #[test]
    fn absolute_url_rejects_invalid_base() {
        assert!(absolute_url("not a url", "/x").is_none());
    }

    #[test]
    fn extract_domain_strips_scheme_and_path() {
        assert_eq!(extract_domain("https://www.vomar.nl/producten"), "www.vomar.nl");
    }

    #[test]
    fn extract_domain_fallback_no_scheme() {
        assert_eq!(extract_domain("vomar.nl"), "vomar.nl");
    }
}
