//! Offset pagination with navigation links
//!
//! A page envelope bundles one page of results with the total count and
//! `self` / `first` / `previous` / `next` / `last` links. Links reuse the
//! current request path and query string with only `limit` and `offset`
//! replaced.

use serde::Serialize;
use url::form_urlencoded;

/// Path and query parameters of the request being answered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    pub path: String,
    pub query: Vec<(String, String)>,
}

impl RequestContext {
    pub fn new(path: impl Into<String>, query: Vec<(String, String)>) -> Self {
        Self {
            path: path.into(),
            query,
        }
    }

    /// Build from a path and a raw (undecoded) query string.
    pub fn from_parts(path: &str, query: Option<&str>) -> Self {
        let query = query
            .map(|q| {
                form_urlencoded::parse(q.as_bytes())
                    .map(|(k, v)| (k.into_owned(), v.into_owned()))
                    .collect()
            })
            .unwrap_or_default();

        Self::new(path, query)
    }

    /// First value of a query parameter.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Href for this request with `limit` and `offset` substituted.
    pub fn href(&self, limit: i64, offset: i64) -> String {
        let mut params = self.query.clone();
        set_param(&mut params, "limit", limit.to_string());
        set_param(&mut params, "offset", offset.to_string());

        let query = form_urlencoded::Serializer::new(String::new())
            .extend_pairs(params.iter())
            .finish();

        format!("{}?{}", self.path, query)
    }
}

/// Replace the first occurrence in place (dropping repeats) or append.
fn set_param(params: &mut Vec<(String, String)>, name: &str, value: String) {
    match params.iter().position(|(k, _)| k == name) {
        Some(pos) => {
            params[pos].1 = value;
            let mut seen = 0;
            params.retain(|(k, _)| {
                if k != name {
                    return true;
                }
                seen += 1;
                seen == 1
            });
        }
        None => params.push((name.to_string(), value)),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Link {
    pub href: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageLinks {
    #[serde(rename = "self")]
    pub self_link: Link,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first: Option<Link>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous: Option<Link>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<Link>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last: Option<Link>,
}

/// One page of results with the total count and navigation links.
#[derive(Debug, Clone, Serialize)]
pub struct PageEnvelope<T> {
    pub total: i64,
    pub items: Vec<T>,
    pub links: PageLinks,
}

pub fn build_page<T>(
    items: Vec<T>,
    total: i64,
    limit: i64,
    offset: i64,
    request: &RequestContext,
) -> PageEnvelope<T> {
    let link = |offset: i64| {
        Some(Link {
            href: request.href(limit, offset),
        })
    };

    let mut links = PageLinks {
        self_link: Link {
            href: request.href(limit, offset),
        },
        first: None,
        previous: None,
        next: None,
        last: None,
    };

    // limit 0 means every row on one page, so only `self` is emitted
    if limit > 0 {
        if offset != 0 && total > offset {
            links.first = link(0);
            links.previous = link((offset - limit).max(0));
        }

        if offset < total - limit {
            links.next = link((offset + limit).min(total - limit));
            links.last = link(total - limit);
        }
    }

    PageEnvelope {
        total,
        items,
        links,
    }
}
