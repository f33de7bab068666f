//! STAC fixtures for persistence layer testing.

use serde_json::{Value, json};

use stac_persistence::types::{Collection, Item, ItemBatch};

/// Base URL used for link generation in tests.
pub const BASE_URL: &str = "http://localhost:8080/";

/// The `naip` collection.
pub fn naip_collection() -> Collection {
    Collection::from_value(json!({
        "type": "Collection",
        "stac_version": "1.0.0",
        "id": "naip",
        "title": "NAIP: National Agriculture Imagery Program",
        "description": "Aerial imagery acquired during the agricultural growing seasons",
        "license": "proprietary",
        "extent": {
            "spatial": {"bbox": [[-124.78, 24.74, -66.95, 49.35]]},
            "temporal": {"interval": [["2010-01-01T00:00:00Z", null]]}
        },
        "links": [
            {"rel": "license", "href": "https://www.fsa.usda.gov/help/policies-and-links/"}
        ]
    }))
    .unwrap()
}

/// A second, unrelated collection.
pub fn landsat_collection() -> Collection {
    Collection::new("landsat").with_description("Landsat Collection 2 Level-2")
}

/// An item of the `naip` collection.
pub fn tile_item(id: &str) -> Item {
    Item::from_value(tile_value(id)).unwrap()
}

/// JSON form of [`tile_item`].
pub fn tile_value(id: &str) -> Value {
    json!({
        "type": "Feature",
        "stac_version": "1.0.0",
        "id": id,
        "collection": "naip",
        "geometry": {
            "type": "Polygon",
            "coordinates": [[
                [-110.0, 39.0], [-109.9, 39.0], [-109.9, 39.1], [-110.0, 39.1], [-110.0, 39.0]
            ]]
        },
        "bbox": [-110.0, 39.0, -109.9, 39.1],
        "properties": {
            "datetime": "2020-06-15T17:00:00Z",
            "gsd": 0.6,
            "proj:epsg": 26912,
            "naip:state": "ut"
        },
        "assets": {
            "image": {
                "href": "https://naipeuwest.blob.core.windows.net/naip/image.tif",
                "type": "image/tiff; application=geotiff; profile=cloud-optimized"
            }
        },
        "links": []
    })
}

/// A batch of `naip` items with the given ids, in order.
pub fn tile_batch(ids: &[&str]) -> ItemBatch {
    ids.iter().map(|id| tile_item(id)).collect()
}

/// A GeoJSON feature collection of `naip` items.
pub fn feature_collection(ids: &[&str]) -> Value {
    json!({
        "type": "FeatureCollection",
        "features": ids.iter().map(|id| tile_value(id)).collect::<Vec<_>>()
    })
}
