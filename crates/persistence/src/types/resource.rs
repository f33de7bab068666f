//! STAC resource types.
//!
//! Only the fields the adapter reads or writes are typed. Everything else a
//! client sends is kept in `additional_fields` and round-trips unchanged.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{StorageResult, ValidationError};

fn default_item_type() -> String {
    "Feature".to_string()
}

fn default_collection_type() -> String {
    "Collection".to_string()
}

/// A hypermedia link attached to a resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link {
    /// Relationship of the target to the resource (`self`, `parent`, ...).
    pub rel: String,

    /// Target URL, absolute or relative to the API base URL.
    pub href: String,

    /// Media type of the target.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub r#type: Option<String>,

    /// Human-readable title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Any other link attributes.
    #[serde(flatten)]
    pub additional_fields: Map<String, Value>,
}

impl Link {
    /// Creates a link with the given relation and target.
    pub fn new(rel: impl Into<String>, href: impl Into<String>) -> Self {
        Self {
            rel: rel.into(),
            href: href.into(),
            r#type: None,
            title: None,
            additional_fields: Map::new(),
        }
    }

    /// Sets the media type.
    pub fn with_type(mut self, media_type: impl Into<String>) -> Self {
        self.r#type = Some(media_type.into());
        self
    }
}

/// A STAC item: a GeoJSON feature owned by exactly one collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    /// GeoJSON type, always `Feature`.
    #[serde(rename = "type", default = "default_item_type")]
    pub r#type: String,

    /// STAC version.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stac_version: Option<String>,

    /// STAC extension schema URIs.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stac_extensions: Vec<String>,

    /// Item identifier, unique in the item index.
    pub id: String,

    /// GeoJSON geometry.
    #[serde(default)]
    pub geometry: Option<Value>,

    /// Bounding box of the geometry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bbox: Option<Vec<f64>>,

    /// Temporal and custom properties.
    #[serde(default)]
    pub properties: Map<String, Value>,

    /// Hypermedia links.
    #[serde(default)]
    pub links: Vec<Link>,

    /// Asset dictionary.
    #[serde(default)]
    pub assets: Map<String, Value>,

    /// Identifier of the owning collection.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collection: Option<String>,

    /// Fields not modelled above.
    #[serde(flatten)]
    pub additional_fields: Map<String, Value>,
}

impl Item {
    /// Creates an empty item with the given id.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            r#type: default_item_type(),
            stac_version: None,
            stac_extensions: Vec::new(),
            id: id.into(),
            geometry: None,
            bbox: None,
            properties: Map::new(),
            links: Vec::new(),
            assets: Map::new(),
            collection: None,
            additional_fields: Map::new(),
        }
    }

    /// Sets the owning collection.
    pub fn with_collection(mut self, collection_id: impl Into<String>) -> Self {
        self.collection = Some(collection_id.into());
        self
    }

    /// Sets the geometry.
    pub fn with_geometry(mut self, geometry: Value) -> Self {
        self.geometry = Some(geometry);
        self
    }

    /// Sets a single property.
    pub fn with_property(mut self, key: impl Into<String>, value: Value) -> Self {
        self.properties.insert(key.into(), value);
        self
    }

    /// Returns the owning collection id, or an empty string when unset.
    pub fn collection_id(&self) -> &str {
        self.collection.as_deref().unwrap_or_default()
    }

    /// Parses an item from its JSON form.
    pub fn from_value(value: Value) -> StorageResult<Self> {
        serde_json::from_value(value).map_err(|e| {
            ValidationError::InvalidResource {
                message: format!("not a STAC item: {}", e),
            }
            .into()
        })
    }

    /// Returns the JSON form of the item.
    pub fn to_value(&self) -> StorageResult<Value> {
        Ok(serde_json::to_value(self)?)
    }
}

/// A STAC collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Collection {
    /// Resource type, always `Collection`.
    #[serde(rename = "type", default = "default_collection_type")]
    pub r#type: String,

    /// STAC version.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stac_version: Option<String>,

    /// STAC extension schema URIs.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stac_extensions: Vec<String>,

    /// Globally unique collection identifier.
    pub id: String,

    /// Short title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Detailed description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Hypermedia links.
    #[serde(default)]
    pub links: Vec<Link>,

    /// Fields not modelled above (license, extent, summaries, ...).
    #[serde(flatten)]
    pub additional_fields: Map<String, Value>,
}

impl Collection {
    /// Creates an empty collection with the given id.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            r#type: default_collection_type(),
            stac_version: None,
            stac_extensions: Vec::new(),
            id: id.into(),
            title: None,
            description: None,
            links: Vec::new(),
            additional_fields: Map::new(),
        }
    }

    /// Sets the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Parses a collection from its JSON form.
    pub fn from_value(value: Value) -> StorageResult<Self> {
        serde_json::from_value(value).map_err(|e| {
            ValidationError::InvalidResource {
                message: format!("not a STAC collection: {}", e),
            }
            .into()
        })
    }

    /// Returns the JSON form of the collection.
    pub fn to_value(&self) -> StorageResult<Value> {
        Ok(serde_json::to_value(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_item_preserves_unknown_fields() {
        let value = json!({
            "type": "Feature",
            "stac_version": "1.0.0",
            "id": "tile-1",
            "collection": "naip",
            "geometry": {"type": "Point", "coordinates": [1.0, 2.0]},
            "properties": {"datetime": "2020-01-01T00:00:00Z", "gsd": 0.6},
            "links": [],
            "assets": {},
            "naip:quadrant": "NE"
        });

        let item = Item::from_value(value.clone()).unwrap();
        assert_eq!(item.id, "tile-1");
        assert_eq!(item.collection_id(), "naip");
        assert_eq!(item.additional_fields["naip:quadrant"], "NE");
        assert_eq!(item.to_value().unwrap(), value);
    }

    #[test]
    fn test_item_defaults() {
        let item = Item::from_value(json!({"id": "a"})).unwrap();
        assert_eq!(item.r#type, "Feature");
        assert!(item.properties.is_empty());
        assert!(item.collection.is_none());
        assert_eq!(item.collection_id(), "");
    }

    #[test]
    fn test_item_without_id_is_invalid() {
        let err = Item::from_value(json!({"type": "Feature"})).unwrap_err();
        assert!(err.to_string().contains("not a STAC item"));
    }

    #[test]
    fn test_collection_round_trip_keeps_extent() {
        let value = json!({
            "type": "Collection",
            "id": "naip",
            "description": "NAIP imagery",
            "links": [{"rel": "license", "href": "https://example.com/license"}],
            "license": "proprietary",
            "extent": {"spatial": {"bbox": [[-180, -90, 180, 90]]}}
        });

        let collection = Collection::from_value(value.clone()).unwrap();
        assert_eq!(collection.description.as_deref(), Some("NAIP imagery"));
        assert_eq!(collection.links[0].rel, "license");
        assert_eq!(collection.to_value().unwrap(), value);
    }

    #[test]
    fn test_link_builder() {
        let link = Link::new("self", "http://x/").with_type("application/json");
        let value = serde_json::to_value(&link).unwrap();
        assert_eq!(value, json!({"rel": "self", "href": "http://x/", "type": "application/json"}));
    }
}
