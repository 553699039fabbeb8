//! GeoJSON boundary loading and value/category map files
//!
//! Only the subset the exporter needs is read: a FeatureCollection whose features
//! carry Polygon or MultiPolygon geometry plus an id and a display-name property.
//! Anything else is skipped and reported, never fatal.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::Path;

use crate::error::{ChoroError, ChoroResult};
use crate::types::{CategoryMap, Geometry, LonLat, Polygon, Region, Ring, ValueMap};

/// Which feature properties hold the region id and display name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegionProps {
    pub id_key: String,
    pub name_key: String,
}

impl Default for RegionProps {
    fn default() -> Self {
        Self { id_key: "adm_cd".to_string(), name_key: "adm_nm".to_string() }
    }
}

/// A feature that was left out of a [`RegionSet`].
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedFeature {
    pub index: usize,
    pub reason: String,
}

/// Parsed regions in input order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RegionSet {
    pub regions: Vec<Region>,
    pub skipped: Vec<SkippedFeature>,
}

impl RegionSet {
    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }
}

#[derive(Deserialize)]
struct RawCollection {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    features: Vec<RawFeature>,
}

#[derive(Deserialize)]
struct RawFeature {
    #[serde(default)]
    properties: Option<serde_json::Map<String, Value>>,
    #[serde(default)]
    geometry: Option<Value>,
}

type RawRing = Vec<Vec<f64>>;

fn ring_from_raw(raw: RawRing) -> Option<Ring> {
    raw.into_iter()
        .map(|pos| -> Option<LonLat> { if pos.len() >= 2 { Some([pos[0], pos[1]]) } else { None } })
        .collect()
}

fn polygon_from_raw(raw: Vec<RawRing>) -> Option<Polygon> {
    let rings = raw.into_iter().map(ring_from_raw).collect::<Option<Vec<_>>>()?;
    Polygon::from_rings(rings)
}

/// Convert a GeoJSON geometry object. `index` is only used for error reporting.
pub fn geometry_from_value(index: usize, value: &Value) -> ChoroResult<Geometry> {
    let kind = value.get("type").and_then(Value::as_str).unwrap_or("<missing>");
    let invalid = |kind: &str| ChoroError::InvalidGeometry { index, kind: kind.to_string() };
    let coords = value.get("coordinates").cloned().unwrap_or(Value::Null);

    match kind {
        "Polygon" => {
            let raw: Vec<RawRing> = serde_json::from_value(coords).map_err(|_| invalid("malformed Polygon"))?;
            polygon_from_raw(raw).map(Geometry::Polygon).ok_or_else(|| invalid("malformed Polygon"))
        }
        "MultiPolygon" => {
            let raw: Vec<Vec<RawRing>> =
                serde_json::from_value(coords).map_err(|_| invalid("malformed MultiPolygon"))?;
            raw.into_iter()
                .map(polygon_from_raw)
                .collect::<Option<Vec<_>>>()
                .map(Geometry::MultiPolygon)
                .ok_or_else(|| invalid("malformed MultiPolygon"))
        }
        other => Err(invalid(other)),
    }
}

fn property_string(props: Option<&serde_json::Map<String, Value>>, key: &str) -> Option<String> {
    match props?.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Parse a FeatureCollection document into regions.
pub fn parse_feature_collection(json: &str, props: &RegionProps) -> ChoroResult<RegionSet> {
    let raw: RawCollection = serde_json::from_str(json)?;
    if raw.kind != "FeatureCollection" {
        return Err(ChoroError::InvalidParams(format!("expected a FeatureCollection, found {}", raw.kind)));
    }

    let mut set = RegionSet::default();
    for (index, feature) in raw.features.into_iter().enumerate() {
        let geometry = match feature.geometry.as_ref() {
            Some(value) if !value.is_null() => geometry_from_value(index, value),
            _ => Err(ChoroError::InvalidGeometry { index, kind: "null".to_string() }),
        };
        let geometry = match geometry {
            Ok(geometry) => geometry,
            Err(err) => {
                log::warn!("Skipping feature: {}", err);
                set.skipped.push(SkippedFeature { index, reason: err.to_string() });
                continue;
            }
        };

        let properties = feature.properties.as_ref();
        let id = property_string(properties, &props.id_key).unwrap_or_else(|| {
            log::debug!("Feature {} has no '{}' property", index, props.id_key);
            String::new()
        });
        let name = property_string(properties, &props.name_key).unwrap_or_default();
        set.regions.push(Region::new(id, name, geometry));
    }

    log::info!("Loaded {} regions ({} skipped)", set.regions.len(), set.skipped.len());
    Ok(set)
}

pub fn load_regions<P: AsRef<Path>>(path: P, props: &RegionProps) -> ChoroResult<RegionSet> {
    let text = fs::read_to_string(path.as_ref())?;
    parse_feature_collection(&text, props)
}

/// Read a `{ "<id>": number | null }` file.
pub fn load_value_map<P: AsRef<Path>>(path: P) -> ChoroResult<ValueMap> {
    let text = fs::read_to_string(path.as_ref())?;
    let values: ValueMap = serde_json::from_str(&text)?;
    log::debug!("Loaded {} values from {}", values.len(), path.as_ref().display());
    Ok(values)
}

/// Read a `{ "<id>": "<category key>" }` file.
pub fn load_category_map<P: AsRef<Path>>(path: P) -> ChoroResult<CategoryMap> {
    let text = fs::read_to_string(path.as_ref())?;
    let labels: CategoryMap = serde_json::from_str(&text)?;
    log::debug!("Loaded {} category assignments from {}", labels.len(), path.as_ref().display());
    Ok(labels)
}
