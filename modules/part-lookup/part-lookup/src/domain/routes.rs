//! Route table of the search API.

use std::collections::BTreeMap;

use part_lookup_sdk::LookupError;
use url::Url;

/// Route name of the part number search.
pub const PART_SEARCH: &str = "part_search";

const ROUTES: &[(&str, &str)] = &[(PART_SEARCH, "/search/partnumber")];

/// Resolved service URLs, keyed by route name.
///
/// Built once from the API base and version, then shared read-only.
/// URLs are `{api_base}/{api_version}{route}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceRoutes {
    urls: BTreeMap<&'static str, Url>,
    part_search: Url,
}

impl ServiceRoutes {
    /// Resolve every known route against `api_base` and `api_version`.
    ///
    /// # Errors
    /// Returns [`LookupError::Configuration`] when the base is not an
    /// absolute http(s) URL or a route does not resolve.
    pub fn new(api_base: &str, api_version: &str) -> Result<Self, LookupError> {
        let base = api_base.trim().trim_end_matches('/');
        let version = api_version.trim().trim_matches('/');

        let parsed = Url::parse(base)
            .map_err(|e| LookupError::configuration(format!("invalid api_base '{base}': {e}")))?;
        if !matches!(parsed.scheme(), "http" | "https") || parsed.cannot_be_a_base() {
            return Err(LookupError::configuration(format!(
                "api_base '{base}' must be an absolute http(s) URL"
            )));
        }

        let mut urls = BTreeMap::new();
        for (name, path) in ROUTES {
            let raw = if version.is_empty() {
                format!("{base}{path}")
            } else {
                format!("{base}/{version}{path}")
            };
            let url = Url::parse(&raw).map_err(|e| {
                LookupError::configuration(format!("route '{name}' does not resolve: {e}"))
            })?;
            urls.insert(*name, url);
        }

        let part_search = urls
            .get(PART_SEARCH)
            .cloned()
            .ok_or_else(|| LookupError::configuration("part search route is missing"))?;

        Ok(Self { urls, part_search })
    }

    /// URL of a named route.
    #[must_use]
    pub fn url(&self, route: &str) -> Option<&Url> {
        self.urls.get(route)
    }

    /// URL of the part number search.
    #[must_use]
    pub fn part_search(&self) -> &Url {
        &self.part_search
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn test_part_search_url_is_composed_from_base_and_version() {
        let routes = ServiceRoutes::new("https://api.mouser.com/api", "v1").unwrap();
        assert_eq!(
            routes.part_search().as_str(),
            "https://api.mouser.com/api/v1/search/partnumber"
        );
        assert_eq!(routes.url(PART_SEARCH), Some(routes.part_search()));
        assert_eq!(routes.url("order_history"), None);
    }

    #[test]
    fn test_slashes_are_normalized() {
        let routes = ServiceRoutes::new("http://127.0.0.1:8080/api/", "/v2/").unwrap();
        assert_eq!(
            routes.part_search().as_str(),
            "http://127.0.0.1:8080/api/v2/search/partnumber"
        );
    }

    #[test]
    fn test_empty_version_is_skipped() {
        let routes = ServiceRoutes::new("http://localhost:9000", "").unwrap();
        assert_eq!(
            routes.part_search().as_str(),
            "http://localhost:9000/search/partnumber"
        );
    }

    #[test]
    fn test_invalid_base_is_rejected() {
        for base in ["not a url", "ftp://example.com/api", "mailto:someone@example.com"] {
            assert!(
                matches!(
                    ServiceRoutes::new(base, "v1"),
                    Err(LookupError::Configuration { .. })
                ),
                "{base}"
            );
        }
    }
}
