//! URL resolution against the configured root and proxy URIs.

use halcyon_core::url::{add_slash, strip_template_vars};
use halcyon_core::HalConfig;
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlResolver {
    root_uri: String,
    proxy_uri: Option<String>,
    /// `root_uri` with a trailing slash, so relative paths land under it.
    base: Option<Url>,
}

impl UrlResolver {
    pub fn new(root_uri: impl Into<String>, proxy_uri: Option<String>) -> Self {
        let root_uri = root_uri.into();
        let base = Url::parse(&add_slash(&root_uri)).ok();
        Self {
            root_uri,
            proxy_uri: proxy_uri.filter(|p| !p.is_empty()),
            base,
        }
    }

    pub fn from_config(config: &HalConfig) -> Self {
        Self::new(config.root_uri.clone(), config.proxy_uri.clone())
    }

    pub fn root_uri(&self) -> &str {
        &self.root_uri
    }

    pub fn proxy_uri(&self) -> Option<&str> {
        self.proxy_uri.as_deref()
    }

    /// `href` as an absolute URL. Hrefs that already carry a scheme are
    /// returned unchanged; anything else is joined against the root URI,
    /// so `/x` lands on the root's origin and `x` under the root's path.
    pub fn absolute(&self, href: &str) -> String {
        if Url::parse(href).is_ok() {
            return href.to_string();
        }
        match self.base.as_ref().and_then(|base| base.join(href).ok()) {
            Some(url) => url.into(),
            None => href.to_string(),
        }
    }

    /// Literal fetch target for `raw`: template variables stripped, the
    /// result made absolute, and the root URI rewritten to the proxy URI
    /// (with a trailing slash when there is no query) when a proxy is
    /// configured.
    pub fn resolve(&self, raw: &str) -> String {
        let url = self.absolute(&strip_template_vars(raw));
        match &self.proxy_uri {
            Some(proxy) if !self.root_uri.is_empty() => {
                add_slash(&url.replacen(self.root_uri.as_str(), proxy, 1))
            }
            _ => url,
        }
    }

    /// The proxy URI when set, otherwise the root URI.
    pub fn base_url(&self) -> &str {
        self.proxy_uri.as_deref().unwrap_or(&self.root_uri)
    }

    /// URL of a named collection under [`base_url`](Self::base_url), or the
    /// base itself.
    pub fn resource_url(&self, resource: Option<&str>) -> String {
        let base = self.base_url().trim_end_matches('/');
        match resource {
            Some(name) => format!("{}/{}", base, name.trim_start_matches('/')),
            None => strip_template_vars(base),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_without_proxy_strips_templates() {
        let resolver = UrlResolver::new("http://host/api", None);
        assert_eq!(resolver.resolve("http://host/api/orders/{id}"), "http://host/api/orders/");
        assert_eq!(resolver.resolve("http://host/api/a{?page,size}"), "http://host/api/a");
    }

    #[test]
    fn test_resolve_rewrites_root_to_proxy() {
        let resolver = UrlResolver::new("http://host/api", Some("http://proxy/p".into()));
        assert_eq!(resolver.resolve("http://host/api/a/1"), "http://proxy/p/a/1/");
        assert_eq!(
            resolver.resolve("http://host/api/a?page=2"),
            "http://proxy/p/a?page=2"
        );
        assert_eq!(resolver.resolve("http://other/x"), "http://other/x/");
    }

    #[test]
    fn test_relative_hrefs_join_the_root() {
        let resolver = UrlResolver::new("http://host/api", None);
        assert_eq!(resolver.resolve("/a/1/widgets"), "http://host/a/1/widgets");
        assert_eq!(resolver.resolve("/api/a/1/widgets"), "http://host/api/a/1/widgets");
        assert_eq!(resolver.resolve("a/1/widgets"), "http://host/api/a/1/widgets");
        assert_eq!(resolver.resolve("/orders/{id}"), "http://host/orders/");
        assert_eq!(resolver.absolute("http://other/x?y=1"), "http://other/x?y=1");
    }

    #[test]
    fn test_relative_hrefs_are_proxied_after_joining() {
        let resolver = UrlResolver::new("http://host/api", Some("http://proxy/p".into()));
        assert_eq!(resolver.resolve("a/1"), "http://proxy/p/a/1/");
        assert_eq!(resolver.resolve("/api/a?page=2"), "http://proxy/p/a?page=2");
    }

    #[test]
    fn test_unparseable_root_leaves_hrefs_alone() {
        let resolver = UrlResolver::new("not a url", None);
        assert_eq!(resolver.absolute("/a/1"), "/a/1");
    }

    #[test]
    fn test_empty_proxy_is_ignored() {
        let resolver = UrlResolver::new("http://host/api", Some(String::new()));
        assert_eq!(resolver.proxy_uri(), None);
        assert_eq!(resolver.base_url(), "http://host/api");
    }

    #[test]
    fn test_resource_url() {
        let resolver = UrlResolver::new("http://host/api/", None);
        assert_eq!(resolver.resource_url(Some("widgets")), "http://host/api/widgets");
        assert_eq!(resolver.resource_url(None), "http://host/api");

        let proxied = UrlResolver::new("http://host/api", Some("http://proxy".into()));
        assert_eq!(proxied.resource_url(Some("/widgets")), "http://proxy/widgets");
    }
}
