//! Index mapping definitions.
//!
//! Defines how item and collection documents are typed by the engine: explicit
//! field types for the fields every STAC document shares, followed by an ordered
//! list of dynamic templates for the long tail of extension fields.
//!
//! Dynamic templates are evaluated first-match-wins in declaration order, so the
//! field-name specific rules come before the two catch-alls (`strings`,
//! `numerics`). Explicit properties always take precedence over templates.
//!
//! The same rules can be evaluated locally with [`IndexMappingSpec::resolve`],
//! which is what the in-memory engine and the tests use.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value, json};

use crate::core::{DocumentEngine, IndexCreation};
use crate::error::StorageResult;

/// The JSON kind a dynamic template can be restricted to
/// (`match_mapping_type`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JsonKind {
    /// JSON string.
    String,
    /// JSON integer.
    Long,
    /// JSON floating point number.
    Double,
    /// JSON boolean.
    Boolean,
    /// JSON object.
    Object,
}

impl JsonKind {
    /// Detects the kind of a JSON value the way the engine does for unmapped
    /// fields. Arrays take the kind of their first element; `null` has none.
    pub fn of(value: &Value) -> Option<Self> {
        match value {
            Value::String(_) => Some(JsonKind::String),
            Value::Number(n) if n.is_f64() => Some(JsonKind::Double),
            Value::Number(_) => Some(JsonKind::Long),
            Value::Bool(_) => Some(JsonKind::Boolean),
            Value::Object(_) => Some(JsonKind::Object),
            Value::Array(values) => values.first().and_then(JsonKind::of),
            Value::Null => None,
        }
    }

    /// Name used in the engine's mapping DSL.
    pub fn as_str(&self) -> &'static str {
        match self {
            JsonKind::String => "string",
            JsonKind::Long => "long",
            JsonKind::Double => "double",
            JsonKind::Boolean => "boolean",
            JsonKind::Object => "object",
        }
    }
}

#[derive(Debug, Clone)]
enum FieldMatcher {
    Any,
    Wildcard { pattern: String, regex: Regex },
    Regex(Regex),
}

impl FieldMatcher {
    fn wildcard(pattern: String) -> Self {
        let anchored = format!("^{}$", regex::escape(&pattern).replace(r"\*", ".*"));
        let regex = Regex::new(&anchored).expect("escaped wildcard pattern is a valid regex");
        FieldMatcher::Wildcard { pattern, regex }
    }

    fn is_match(&self, field_name: &str) -> bool {
        match self {
            FieldMatcher::Any => true,
            FieldMatcher::Wildcard { regex, .. } | FieldMatcher::Regex(regex) => {
                regex.is_match(field_name)
            }
        }
    }
}

/// A named, pattern-based rule assigning a mapping to unmapped fields.
#[derive(Debug, Clone)]
pub struct DynamicTemplate {
    name: String,
    match_mapping_type: Option<JsonKind>,
    matcher: FieldMatcher,
    mapping: Value,
}

impl DynamicTemplate {
    /// A template that applies to every unmapped field.
    pub fn new(name: impl Into<String>, mapping: Value) -> Self {
        Self {
            name: name.into(),
            match_mapping_type: None,
            matcher: FieldMatcher::Any,
            mapping,
        }
    }

    /// Restricts the template to field names matching `pattern` (`*` wildcards).
    pub fn matching(mut self, pattern: impl Into<String>) -> Self {
        self.matcher = FieldMatcher::wildcard(pattern.into());
        self
    }

    /// Restricts the template to field names matching a regular expression.
    pub fn matching_regex(mut self, pattern: &str) -> Result<Self, regex::Error> {
        self.matcher = FieldMatcher::Regex(Regex::new(pattern)?);
        Ok(self)
    }

    /// Restricts the template to values of the given JSON kind.
    pub fn for_kind(mut self, kind: JsonKind) -> Self {
        self.match_mapping_type = Some(kind);
        self
    }

    /// Template name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Mapping assigned to matching fields.
    pub fn mapping(&self) -> &Value {
        &self.mapping
    }

    /// Returns true if the template applies to `field_name` with value `kind`.
    pub fn matches(&self, field_name: &str, kind: Option<JsonKind>) -> bool {
        if let Some(expected) = self.match_mapping_type {
            if kind != Some(expected) {
                return false;
            }
        }
        self.matcher.is_match(field_name)
    }

    /// The template in the engine's mapping DSL.
    pub fn to_json(&self) -> Value {
        let mut body = Map::new();
        if let Some(kind) = self.match_mapping_type {
            body.insert("match_mapping_type".to_string(), json!(kind.as_str()));
        }
        match &self.matcher {
            FieldMatcher::Any => {}
            FieldMatcher::Wildcard { pattern, .. } => {
                body.insert("match".to_string(), json!(pattern));
            }
            FieldMatcher::Regex(re) => {
                body.insert("match_pattern".to_string(), json!("regex"));
                body.insert("match".to_string(), json!(re.as_str()));
            }
        }
        body.insert("mapping".to_string(), self.mapping.clone());
        json!({ self.name.clone(): Value::Object(body) })
    }
}

/// How a field ended up mapped.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldMapping<'a> {
    /// Declared in the explicit properties.
    Static(&'a Value),
    /// Assigned by the named dynamic template.
    Dynamic {
        /// Template name.
        template: &'a str,
        /// Assigned mapping.
        mapping: &'a Value,
    },
}

impl FieldMapping<'_> {
    /// The engine field type (`keyword`, `date`, ...), if the mapping names one.
    pub fn field_type(&self) -> Option<&str> {
        let mapping = match self {
            FieldMapping::Static(mapping) => mapping,
            FieldMapping::Dynamic { mapping, .. } => mapping,
        };
        mapping.get("type").and_then(Value::as_str)
    }
}

/// Schema of one index: explicit properties plus ordered dynamic templates.
///
/// Immutable once defined; the process-wide instances are [`items_mapping`]
/// and [`collections_mapping`].
#[derive(Debug, Clone)]
pub struct IndexMappingSpec {
    numeric_detection: bool,
    dynamic_templates: Vec<DynamicTemplate>,
    properties: Map<String, Value>,
}

impl IndexMappingSpec {
    /// Creates a spec from explicit properties and templates.
    pub fn new(properties: Map<String, Value>, dynamic_templates: Vec<DynamicTemplate>) -> Self {
        Self {
            numeric_detection: false,
            dynamic_templates,
            properties,
        }
    }

    /// Mapping of the items index.
    pub fn items() -> Self {
        let properties = json!({
            "id": { "type": "keyword" },
            "collection": { "type": "keyword" },
            "geometry": { "type": "geo_shape" },
            "assets": { "type": "object", "enabled": false },
            "links": { "type": "object", "enabled": false },
            "properties": {
                "type": "object",
                "properties": {
                    // Common metadata
                    "datetime": { "type": "date" },
                    "start_datetime": { "type": "date" },
                    "end_datetime": { "type": "date" },
                    "created": { "type": "date" },
                    "updated": { "type": "date" },
                    // Satellite extension
                    "sat:absolute_orbit": { "type": "integer" },
                    "sat:relative_orbit": { "type": "integer" }
                }
            }
        });

        Self::new(object(properties), stac_dynamic_templates())
    }

    /// Mapping of the collections index.
    pub fn collections() -> Self {
        let properties = json!({
            "id": { "type": "keyword" },
            "links": { "type": "object", "enabled": false },
            "extent": {
                "type": "object",
                "properties": {
                    "temporal": {
                        "type": "object",
                        "properties": {
                            "interval": { "type": "date" }
                        }
                    }
                }
            }
        });

        Self::new(object(properties), stac_dynamic_templates())
    }

    /// Dynamic templates in evaluation order.
    pub fn dynamic_templates(&self) -> &[DynamicTemplate] {
        &self.dynamic_templates
    }

    /// Explicit properties.
    pub fn properties(&self) -> &Map<String, Value> {
        &self.properties
    }

    /// The `mappings` body in the engine's mapping DSL.
    pub fn to_json(&self) -> Value {
        json!({
            "numeric_detection": self.numeric_detection,
            "dynamic_templates": self
                .dynamic_templates
                .iter()
                .map(DynamicTemplate::to_json)
                .collect::<Vec<_>>(),
            "properties": self.properties,
        })
    }

    /// Resolves the mapping of a dotted field path such as
    /// `properties.sat:absolute_orbit`.
    ///
    /// Explicit properties win. A path below an explicit object that is not
    /// indexed (`enabled: false`) resolves to that object. Otherwise the
    /// dynamic templates are tried in order against the last path segment.
    pub fn resolve(&self, path: &str, kind: Option<JsonKind>) -> Option<FieldMapping<'_>> {
        let segments: Vec<&str> = path.split('.').collect();
        let mut level = &self.properties;

        for (i, segment) in segments.iter().enumerate() {
            let Some(mapping) = level.get(*segment) else {
                break;
            };
            if i == segments.len() - 1 {
                return Some(FieldMapping::Static(mapping));
            }
            match mapping.get("properties").and_then(Value::as_object) {
                Some(children) => level = children,
                None if mapping.get("enabled") == Some(&Value::Bool(false)) => {
                    return Some(FieldMapping::Static(mapping));
                }
                None => break,
            }
        }

        let field_name = segments.last().copied().unwrap_or(path);
        self.dynamic_templates
            .iter()
            .find(|t| t.matches(field_name, kind))
            .map(|t| FieldMapping::Dynamic {
                template: t.name(),
                mapping: t.mapping(),
            })
    }
}

impl PartialEq for IndexMappingSpec {
    fn eq(&self, other: &Self) -> bool {
        self.to_json() == other.to_json()
    }
}

fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

/// Dynamic templates shared by both indices, most specific first.
fn stac_dynamic_templates() -> Vec<DynamicTemplate> {
    vec![
        // Common metadata
        DynamicTemplate::new("descriptions", json!({ "type": "text" }))
            .matching("description")
            .for_kind(JsonKind::String),
        DynamicTemplate::new("titles", json!({ "type": "text" }))
            .matching("title")
            .for_kind(JsonKind::String),
        // Projection extension
        DynamicTemplate::new("proj_epsg", json!({ "type": "integer" })).matching("proj:epsg"),
        DynamicTemplate::new("proj_projjson", json!({ "type": "object", "enabled": false }))
            .matching("proj:projjson"),
        DynamicTemplate::new("proj_centroid", json!({ "type": "geo_point" }))
            .matching("proj:centroid")
            .for_kind(JsonKind::String),
        DynamicTemplate::new("proj_geometry", json!({ "type": "geo_shape" }))
            .matching("proj:geometry")
            .for_kind(JsonKind::String),
        DynamicTemplate::new("no_index_href", json!({ "type": "text", "index": false }))
            .matching("href"),
        // Everything else
        DynamicTemplate::new("strings", json!({ "type": "keyword" })).for_kind(JsonKind::String),
        DynamicTemplate::new("numerics", json!({ "type": "float" })).for_kind(JsonKind::Long),
    ]
}

static ITEMS_MAPPING: LazyLock<IndexMappingSpec> = LazyLock::new(IndexMappingSpec::items);
static COLLECTIONS_MAPPING: LazyLock<IndexMappingSpec> =
    LazyLock::new(IndexMappingSpec::collections);

/// The process-wide items mapping.
pub fn items_mapping() -> &'static IndexMappingSpec {
    &ITEMS_MAPPING
}

/// The process-wide collections mapping.
pub fn collections_mapping() -> &'static IndexMappingSpec {
    &COLLECTIONS_MAPPING
}

/// Ensures `name` exists with `spec`, creating it if necessary.
///
/// An index that already exists is success; only engine failures are errors.
pub async fn ensure_index<E>(engine: &E, name: &str, spec: &IndexMappingSpec) -> StorageResult<()>
where
    E: DocumentEngine + ?Sized,
{
    match engine.create_index(name, spec).await? {
        IndexCreation::Created => {
            tracing::info!("Created {} index '{}'", engine.name(), name);
        }
        IndexCreation::AlreadyExists => {
            tracing::trace!("Index '{}' already exists", name);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_items_mapping_structure() {
        let mapping = IndexMappingSpec::items().to_json();

        assert_eq!(mapping["numeric_detection"], false);
        let props = &mapping["properties"];
        assert_eq!(props["geometry"]["type"], "geo_shape");
        assert_eq!(props["assets"]["enabled"], false);
        assert_eq!(props["links"]["enabled"], false);
        assert_eq!(props["properties"]["properties"]["datetime"]["type"], "date");
        assert_eq!(
            props["properties"]["properties"]["sat:absolute_orbit"]["type"],
            "integer"
        );
    }

    #[test]
    fn test_dynamic_template_order() {
        let spec = IndexMappingSpec::items();
        let names: Vec<_> = spec.dynamic_templates().iter().map(|t| t.name()).collect();
        assert_eq!(
            names,
            vec![
                "descriptions",
                "titles",
                "proj_epsg",
                "proj_projjson",
                "proj_centroid",
                "proj_geometry",
                "no_index_href",
                "strings",
                "numerics"
            ]
        );

        let templates = spec.to_json()["dynamic_templates"].clone();
        assert_eq!(
            templates[0],
            json!({"descriptions": {
                "match_mapping_type": "string",
                "match": "description",
                "mapping": {"type": "text"}
            }})
        );
        assert_eq!(
            templates[7],
            json!({"strings": {"match_mapping_type": "string", "mapping": {"type": "keyword"}}})
        );
    }

    #[test]
    fn test_resolve_static_wins() {
        let spec = IndexMappingSpec::items();
        let resolved = spec
            .resolve("properties.datetime", Some(JsonKind::String))
            .unwrap();
        assert!(matches!(resolved, FieldMapping::Static(_)));
        assert_eq!(resolved.field_type(), Some("date"));
    }

    #[test]
    fn test_resolve_specific_before_catch_all() {
        let spec = IndexMappingSpec::items();

        let title = spec.resolve("properties.title", Some(JsonKind::String)).unwrap();
        assert_eq!(title.field_type(), Some("text"));

        let epsg = spec.resolve("properties.proj:epsg", Some(JsonKind::Long)).unwrap();
        assert!(matches!(epsg, FieldMapping::Dynamic { template: "proj_epsg", .. }));
        assert_eq!(epsg.field_type(), Some("integer"));

        let platform = spec.resolve("properties.platform", Some(JsonKind::String)).unwrap();
        assert!(matches!(platform, FieldMapping::Dynamic { template: "strings", .. }));
        assert_eq!(platform.field_type(), Some("keyword"));

        let count = spec.resolve("properties.view:count", Some(JsonKind::Long)).unwrap();
        assert_eq!(count.field_type(), Some("float"));
    }

    #[test]
    fn test_resolve_unmatched_kinds() {
        let spec = IndexMappingSpec::items();
        assert!(spec.resolve("properties.gsd", Some(JsonKind::Double)).is_none());
        assert!(spec.resolve("properties.flag", Some(JsonKind::Boolean)).is_none());
    }

    #[test]
    fn test_resolve_below_disabled_object() {
        let spec = IndexMappingSpec::items();
        let resolved = spec
            .resolve("assets.visual.href", Some(JsonKind::String))
            .unwrap();
        assert!(matches!(resolved, FieldMapping::Static(m) if m["enabled"] == false));
    }

    #[test]
    fn test_href_not_indexed() {
        let spec = IndexMappingSpec::collections();
        let resolved = spec.resolve("providers.href", Some(JsonKind::String)).unwrap();
        assert!(matches!(resolved, FieldMapping::Dynamic { template: "no_index_href", mapping } if mapping["index"] == false));
    }

    #[test]
    fn test_wildcard_match() {
        let matches =
            |pattern: &str, name: &str| FieldMatcher::wildcard(pattern.into()).is_match(name);
        assert!(matches("proj:*", "proj:epsg"));
        assert!(matches("*_datetime", "start_datetime"));
        assert!(matches("a*b*c", "axxbyyc"));
        assert!(!matches("a*b*c", "axxcyyb"));
        assert!(!matches("title", "titles"));
        assert!(!matches("eo.bands", "eo_bands"));
        assert!(matches("*", ""));

        let template = DynamicTemplate::new("proj", json!({"type": "keyword"})).matching("proj:*");
        assert_eq!(template.to_json()["proj"]["match"], "proj:*");
        assert!(template.to_json()["proj"].get("match_pattern").is_none());
    }

    #[test]
    fn test_regex_template() {
        let template = DynamicTemplate::new("eo", json!({"type": "float"}))
            .matching_regex(r"^eo:(cloud_cover|snow_cover)$")
            .unwrap();
        assert!(template.matches("eo:cloud_cover", Some(JsonKind::Double)));
        assert!(!template.matches("eo:bands", Some(JsonKind::Object)));
        assert_eq!(template.to_json()["eo"]["match_pattern"], "regex");
    }

    #[test]
    fn test_json_kind_detection() {
        assert_eq!(JsonKind::of(&json!("x")), Some(JsonKind::String));
        assert_eq!(JsonKind::of(&json!(3)), Some(JsonKind::Long));
        assert_eq!(JsonKind::of(&json!(3.5)), Some(JsonKind::Double));
        assert_eq!(JsonKind::of(&json!([1, 2])), Some(JsonKind::Long));
        assert_eq!(JsonKind::of(&json!(null)), None);
    }

    #[test]
    fn test_process_wide_specs_are_stable() {
        assert_eq!(items_mapping(), &IndexMappingSpec::items());
        assert_eq!(collections_mapping(), &IndexMappingSpec::collections());
        assert_ne!(items_mapping(), collections_mapping());
    }
}
