//! URL helpers: template stripping, template filling and query editing.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;

use ::url::Url;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use regex::Regex;

use crate::error::{HalError, HalResult};

static TEMPLATE_VAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{[^}]*\}").expect("Invalid template regex"));

/// Everything but RFC 3986 unreserved characters.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Unreserved and reserved characters pass, as do existing escapes.
const RESERVED: &AsciiSet = &COMPONENT
    .remove(b':')
    .remove(b'/')
    .remove(b'?')
    .remove(b'#')
    .remove(b'[')
    .remove(b']')
    .remove(b'@')
    .remove(b'!')
    .remove(b'$')
    .remove(b'&')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')')
    .remove(b'*')
    .remove(b'+')
    .remove(b',')
    .remove(b';')
    .remove(b'=')
    .remove(b'%');

/// Query keys and values: sub-delimiters other than `&`, `=` and `+` stay
/// literal, so `sort=name,DESC` is written as is.
const QUERY_PART: &AsciiSet = &COMPONENT
    .remove(b':')
    .remove(b'/')
    .remove(b'?')
    .remove(b'@')
    .remove(b'!')
    .remove(b'$')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')')
    .remove(b'*')
    .remove(b',')
    .remove(b';');

/// Remove every `{...}` template expression from `url`.
pub fn strip_template_vars(url: &str) -> String {
    TEMPLATE_VAR.replace_all(url, "").into_owned()
}

/// Append a trailing slash when `uri` has no query string and does not
/// already end with one.
pub fn add_slash(uri: &str) -> String {
    if uri.is_empty() || uri.contains('?') || uri.ends_with('/') {
        uri.to_string()
    } else {
        format!("{uri}/")
    }
}

/// The part of `url` before its query string or fragment.
pub fn strip_query(url: &str) -> &str {
    let end = url.find(['?', '#']).unwrap_or(url.len());
    &url[..end]
}

/// Percent-encode a query value (everything but RFC 3986 unreserved chars).
pub fn encode_component(value: &str) -> String {
    utf8_percent_encode(value, COMPONENT).to_string()
}

/// Percent-encode everything outside the unreserved and reserved sets.
fn encode_reserved(value: &str) -> String {
    utf8_percent_encode(value, RESERVED).to_string()
}

// ============================================================================
// URI TEMPLATE FILLING
// ============================================================================

struct Operator {
    first: &'static str,
    sep: &'static str,
    named: bool,
    if_empty: &'static str,
    allow_reserved: bool,
}

fn operator_for(ch: Option<char>) -> Option<Operator> {
    let op = match ch {
        None => Operator { first: "", sep: ",", named: false, if_empty: "", allow_reserved: false },
        Some('+') => Operator { first: "", sep: ",", named: false, if_empty: "", allow_reserved: true },
        Some('#') => Operator { first: "#", sep: ",", named: false, if_empty: "", allow_reserved: true },
        Some('.') => Operator { first: ".", sep: ".", named: false, if_empty: "", allow_reserved: false },
        Some('/') => Operator { first: "/", sep: "/", named: false, if_empty: "", allow_reserved: false },
        Some(';') => Operator { first: ";", sep: ";", named: true, if_empty: "", allow_reserved: false },
        Some('?') => Operator { first: "?", sep: "&", named: true, if_empty: "=", allow_reserved: false },
        Some('&') => Operator { first: "&", sep: "&", named: true, if_empty: "=", allow_reserved: false },
        Some(_) => return None,
    };
    Some(op)
}

/// Expand an RFC 6570 (level 3) URI template from `params`.
///
/// Variables without a value are omitted, as the RFC requires. Explode
/// modifiers are accepted and ignored since all values are scalars; prefix
/// modifiers (`{var:3}`) truncate the value.
pub fn fill_template(template: &str, params: &BTreeMap<String, String>) -> HalResult<String> {
    let invalid = |reason: &str| HalError::InvalidTemplate {
        template: template.to_string(),
        reason: reason.to_string(),
    };

    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        let end = after.find('}').ok_or_else(|| invalid("unclosed expression"))?;
        let expr = &after[..end];
        rest = &after[end + 1..];

        let first = expr.chars().next().ok_or_else(|| invalid("empty expression"))?;
        let (op, vars) = if first.is_ascii_alphanumeric() || first == '_' || first == '%' {
            (operator_for(None), expr)
        } else {
            (operator_for(Some(first)), &expr[first.len_utf8()..])
        };
        let op = op.ok_or_else(|| invalid("unsupported operator"))?;

        let mut expanded = Vec::new();
        for spec in vars.split(',').filter(|s| !s.is_empty()) {
            let spec = spec.trim_end_matches('*');
            let (name, prefix) = match spec.split_once(':') {
                Some((name, len)) => {
                    let len = len.parse::<usize>().map_err(|_| invalid("bad prefix modifier"))?;
                    (name, Some(len))
                }
                None => (spec, None),
            };
            let Some(value) = params.get(name) else {
                continue;
            };
            let value: String = match prefix {
                Some(len) => value.chars().take(len).collect(),
                None => value.clone(),
            };
            let encoded = if op.allow_reserved {
                encode_reserved(&value)
            } else {
                encode_component(&value)
            };
            if op.named {
                if encoded.is_empty() {
                    expanded.push(format!("{name}{}", op.if_empty));
                } else {
                    expanded.push(format!("{name}={encoded}"));
                }
            } else {
                expanded.push(encoded);
            }
        }
        if !expanded.is_empty() {
            out.push_str(op.first);
            out.push_str(&expanded.join(op.sep));
        }
    }
    if rest.contains('}') {
        return Err(invalid("unbalanced closing brace"));
    }
    out.push_str(rest);
    Ok(out)
}

// ============================================================================
// QUERY EDITING
// ============================================================================

/// An absolute URL with its query held as ordered, decoded pairs, so
/// individual parameters can be replaced in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryUrl {
    url: Url,
    pairs: Vec<(String, String)>,
}

impl QueryUrl {
    pub fn parse(url: &str) -> HalResult<Self> {
        let parsed = Url::parse(url).map_err(|e| HalError::invalid_url(url, e))?;
        let pairs = parsed.query_pairs().into_owned().collect();
        Ok(Self { url: parsed, pairs })
    }

    pub fn path(&self) -> &str {
        self.url.path()
    }

    /// First value for `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Replace the first occurrence of `key` in place (dropping any later
    /// duplicates), or append it when absent.
    pub fn set(&mut self, key: &str, value: impl Into<String>) -> &mut Self {
        let value = value.into();
        match self.pairs.iter().position(|(k, _)| k == key) {
            Some(idx) => {
                self.pairs[idx].1 = value;
                let mut seen = 0usize;
                self.pairs.retain(|(k, _)| {
                    if k == key {
                        seen += 1;
                        seen == 1
                    } else {
                        true
                    }
                });
            }
            None => self.pairs.push((key.to_string(), value)),
        }
        self
    }

    /// Append a pair even if `key` already occurs.
    pub fn append(&mut self, key: &str, value: impl Into<String>) -> &mut Self {
        self.pairs.push((key.to_string(), value.into()));
        self
    }

    /// Remove every occurrence of `key`.
    pub fn remove(&mut self, key: &str) -> &mut Self {
        self.pairs.retain(|(k, _)| k != key);
        self
    }

    /// The edited URL.
    pub fn to_url(&self) -> Url {
        let mut url = self.url.clone();
        if self.pairs.is_empty() {
            url.set_query(None);
        } else {
            let query = self
                .pairs
                .iter()
                .map(|(k, v)| {
                    format!(
                        "{}={}",
                        utf8_percent_encode(k, QUERY_PART),
                        utf8_percent_encode(v, QUERY_PART)
                    )
                })
                .collect::<Vec<_>>()
                .join("&");
            url.set_query(Some(&query));
        }
        url
    }
}

impl fmt::Display for QueryUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_url().as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_strip_template_vars() {
        assert_eq!(strip_template_vars("/orders/{id}"), "/orders/");
        assert_eq!(
            strip_template_vars("http://h/api/people{?page,size,sort}"),
            "http://h/api/people"
        );
        assert_eq!(strip_template_vars("/plain"), "/plain");
    }

    #[test]
    fn test_add_slash() {
        assert_eq!(add_slash("http://h/api"), "http://h/api/");
        assert_eq!(add_slash("http://h/api/"), "http://h/api/");
        assert_eq!(add_slash("http://h/api?x=1"), "http://h/api?x=1");
        assert_eq!(add_slash(""), "");
    }

    #[test]
    fn test_strip_query() {
        assert_eq!(strip_query("http://h/a?x=1#f"), "http://h/a");
        assert_eq!(strip_query("/a#frag"), "/a");
        assert_eq!(strip_query("/a"), "/a");
    }

    #[test]
    fn test_fill_simple_and_query_templates() {
        let p = params(&[("id", "42"), ("q", "a b")]);
        assert_eq!(fill_template("/orders/{id}", &p).unwrap(), "/orders/42");
        assert_eq!(
            fill_template("/orders/search{?q,missing}", &p).unwrap(),
            "/orders/search?q=a%20b"
        );
        assert_eq!(
            fill_template("/orders{?id}{&q}", &p).unwrap(),
            "/orders?id=42&q=a%20b"
        );
    }

    #[test]
    fn test_fill_omits_unset_expressions() {
        let p = params(&[]);
        assert_eq!(fill_template("/orders{?page,size}", &p).unwrap(), "/orders");
    }

    #[test]
    fn test_fill_path_and_reserved_operators() {
        let p = params(&[("seg", "x"), ("path", "/a/b"), ("name", "abcdef")]);
        assert_eq!(fill_template("/root{/seg}", &p).unwrap(), "/root/x");
        assert_eq!(fill_template("{+path}/c", &p).unwrap(), "/a/b/c");
        assert_eq!(fill_template("/n/{name:3}", &p).unwrap(), "/n/abc");
        assert_eq!(fill_template("/m{;seg}", &p).unwrap(), "/m;seg=x");
    }

    #[test]
    fn test_fill_rejects_unclosed_expression() {
        let err = fill_template("/orders/{id", &params(&[])).unwrap_err();
        assert!(matches!(err, HalError::InvalidTemplate { .. }));
    }

    #[test]
    fn test_fill_reserved_keeps_escapes_and_encodes_spaces() {
        let p = params(&[("path", "/a b/%2F")]);
        assert_eq!(fill_template("{+path}", &p).unwrap(), "/a%20b/%2F");
        assert_eq!(fill_template("{path}", &p).unwrap(), "%2Fa%20b%2F%252F");
    }

    #[test]
    fn test_query_url_replace_in_place() {
        let mut url = QueryUrl::parse("http://h/people?size=5&page=2&q=x").unwrap();
        url.set("page", "7").set("size", "10");
        assert_eq!(url.to_string(), "http://h/people?size=10&page=7&q=x");
    }

    #[test]
    fn test_query_url_append_when_absent() {
        let mut url = QueryUrl::parse("http://h/people").unwrap();
        url.set("size", "20").set("page", "1");
        assert_eq!(url.to_string(), "http://h/people?size=20&page=1");
    }

    #[test]
    fn test_query_url_remove_and_append_duplicates() {
        let mut url = QueryUrl::parse("http://h/people?sort=a,ASC&size=3&sort=b,DESC#top").unwrap();
        url.remove("sort").append("sort", "c,ASC").append("sort", "d,DESC");
        assert_eq!(url.to_string(), "http://h/people?size=3&sort=c,ASC&sort=d,DESC#top");
        assert_eq!(url.get("size"), Some("3"));
        assert_eq!(url.path(), "/people");
    }

    #[test]
    fn test_query_url_reencodes_decoded_values() {
        let mut url = QueryUrl::parse("http://h/people?q=a%20b&x=1%262").unwrap();
        assert_eq!(url.get("q"), Some("a b"));
        url.remove("size");
        assert_eq!(url.to_string(), "http://h/people?q=a%20b&x=1%262");
    }

    #[test]
    fn test_query_url_dropping_last_pair_clears_query() {
        let mut url = QueryUrl::parse("http://h/people?page=1").unwrap();
        url.remove("page");
        assert_eq!(url.to_string(), "http://h/people");
    }

    #[test]
    fn test_query_url_rejects_relative() {
        let err = QueryUrl::parse("/people?page=1").unwrap_err();
        assert!(matches!(err, HalError::InvalidUrl { .. }));
    }
}
