//! Server-generated hypermedia links.
//!
//! Links pointing back into the API (`self`, `parent`, ...) are derived from
//! the request base URL and are never persisted. Any other link a client
//! supplied is stored as-is and has relative hrefs resolved on the way out.

use url::Url;

use crate::types::Link;

/// Relations generated by the server. Links with these relations are dropped
/// before storage.
pub const SERVER_RELS: &[&str] = &["self", "parent", "collection", "root", "items"];

const MEDIA_TYPE_JSON: &str = "application/json";
const MEDIA_TYPE_GEOJSON: &str = "application/geo+json";

/// Returns true if `link` is one the server regenerates.
pub fn is_server_link(link: &Link) -> bool {
    SERVER_RELS.contains(&link.rel.as_str())
}

/// Returns `base_url` with exactly one trailing slash.
fn normalize_base(base_url: &str) -> String {
    format!("{}/", base_url.trim_end_matches('/'))
}

/// Links of an item.
#[derive(Debug, Clone)]
pub struct ItemLinks<'a> {
    collection_id: &'a str,
    item_id: &'a str,
    base_url: String,
}

impl<'a> ItemLinks<'a> {
    /// Links for `item_id` in `collection_id` served under `base_url`.
    pub fn new(collection_id: &'a str, item_id: &'a str, base_url: &str) -> Self {
        Self {
            collection_id,
            item_id,
            base_url: normalize_base(base_url),
        }
    }

    /// The `self`, `parent`, `collection` and `root` links.
    pub fn create_links(&self) -> Vec<Link> {
        let collection_href = format!("{}collections/{}", self.base_url, self.collection_id);
        vec![
            Link::new(
                "self",
                format!("{}/items/{}", collection_href, self.item_id),
            )
            .with_type(MEDIA_TYPE_GEOJSON),
            Link::new("parent", collection_href.clone()).with_type(MEDIA_TYPE_JSON),
            Link::new("collection", collection_href).with_type(MEDIA_TYPE_JSON),
            Link::new("root", self.base_url.clone()).with_type(MEDIA_TYPE_JSON),
        ]
    }
}

/// Links of a collection.
#[derive(Debug, Clone)]
pub struct CollectionLinks<'a> {
    collection_id: &'a str,
    base_url: String,
}

impl<'a> CollectionLinks<'a> {
    /// Links for `collection_id` served under `base_url`.
    pub fn new(collection_id: &'a str, base_url: &str) -> Self {
        Self {
            collection_id,
            base_url: normalize_base(base_url),
        }
    }

    /// The `self`, `parent`, `items` and `root` links.
    pub fn create_links(&self) -> Vec<Link> {
        let self_href = format!("{}collections/{}", self.base_url, self.collection_id);
        vec![
            Link::new("self", self_href.clone()).with_type(MEDIA_TYPE_JSON),
            Link::new("parent", self.base_url.clone()).with_type(MEDIA_TYPE_JSON),
            Link::new("items", format!("{}/items", self_href)).with_type(MEDIA_TYPE_GEOJSON),
            Link::new("root", self.base_url.clone()).with_type(MEDIA_TYPE_JSON),
        ]
    }
}

/// Resolves relative hrefs against `base_url`. Absolute hrefs, and every href
/// when `base_url` is not a valid URL, are left unchanged.
pub fn resolve_links(links: &mut [Link], base_url: &str) {
    let Ok(base) = Url::parse(&normalize_base(base_url)) else {
        return;
    };

    for link in links.iter_mut() {
        if Url::parse(&link.href).is_ok() {
            continue;
        }
        if let Ok(resolved) = base.join(&link.href) {
            link.href = resolved.to_string();
        }
    }
}

/// Rewrites hrefs under `base_url` to paths relative to it, so stored links do
/// not depend on the host that served the request.
pub fn relativize_links(links: &mut [Link], base_url: &str) {
    let base = normalize_base(base_url);
    for link in links.iter_mut() {
        if let Some(relative) = link.href.strip_prefix(&base) {
            if !relative.is_empty() {
                link.href = relative.to_string();
            }
        }
    }
}

/// Server links from `generated` followed by the non-server links of `stored`,
/// resolved against `base_url`.
pub fn merge_links(generated: Vec<Link>, stored: Vec<Link>, base_url: &str) -> Vec<Link> {
    let mut foreign: Vec<Link> = stored.into_iter().filter(|l| !is_server_link(l)).collect();
    resolve_links(&mut foreign, base_url);

    let mut links = generated;
    links.extend(foreign);
    links
}
