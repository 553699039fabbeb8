use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::error::{ChoroError, ChoroResult};

/// A `[longitude, latitude]` pair in WGS84 degrees.
pub type LonLat = [f64; 2];

/// A closed ring of positions. The closing vertex may or may not repeat the first one.
pub type Ring = Vec<LonLat>;

/// 8-bit RGBA color, written as `#rrggbb` or `#rrggbbaa` in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const WHITE: Color = Color::rgb(255, 255, 255);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Parse `#rrggbb` / `#rrggbbaa` (leading `#` optional).
    pub fn from_hex(s: &str) -> ChoroResult<Self> {
        let hex = s.trim();
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        if !(hex.len() == 6 || hex.len() == 8) || !hex.is_ascii() {
            return Err(ChoroError::InvalidColor(s.to_string()));
        }
        let channel = |i: usize| {
            u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| ChoroError::InvalidColor(s.to_string()))
        };
        let a = if hex.len() == 8 { channel(6)? } else { 255 };
        Ok(Self { r: channel(0)?, g: channel(2)?, b: channel(4)?, a })
    }

    pub fn to_hex(&self) -> String {
        if self.a == 255 {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for Color {
    type Err = ChoroError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl TryFrom<String> for Color {
    type Error = ChoroError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_hex(&value)
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_hex()
    }
}

/// One outer ring plus zero or more holes.
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    pub exterior: Ring,
    pub holes: Vec<Ring>,
}

impl Polygon {
    pub fn new(exterior: Ring, holes: Vec<Ring>) -> Self {
        Self { exterior, holes }
    }

    /// Build from GeoJSON ring order: first ring is the exterior.
    pub fn from_rings(mut rings: Vec<Ring>) -> Option<Self> {
        if rings.is_empty() {
            return None;
        }
        let exterior = rings.remove(0);
        Some(Self { exterior, holes: rings })
    }

    /// Exterior first, then holes.
    pub fn rings(&self) -> impl Iterator<Item = &Ring> + '_ {
        std::iter::once(&self.exterior).chain(self.holes.iter())
    }
}

/// Region boundary geometry. Only the two areal GeoJSON types are representable.
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    Polygon(Polygon),
    MultiPolygon(Vec<Polygon>),
}

impl Geometry {
    pub fn polygons(&self) -> &[Polygon] {
        match self {
            Geometry::Polygon(polygon) => std::slice::from_ref(polygon),
            Geometry::MultiPolygon(polygons) => polygons,
        }
    }

    /// Every ring of every constituent polygon, in input order.
    pub fn rings(&self) -> impl Iterator<Item = &Ring> + '_ {
        self.polygons().iter().flat_map(|polygon| polygon.rings())
    }

    pub fn ring_count(&self) -> usize {
        self.rings().count()
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Geometry::Polygon(_) => "Polygon",
            Geometry::MultiPolygon(_) => "MultiPolygon",
        }
    }
}

/// An administrative region with its boundary.
#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    pub id: String,
    pub name: String,
    pub geometry: Geometry,
}

impl Region {
    pub fn new(id: impl Into<String>, name: impl Into<String>, geometry: Geometry) -> Self {
        Self { id: id.into(), name: name.into(), geometry }
    }
}

/// Region id -> observed value. Absent, null, non-finite and non-positive entries are "no data".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValueMap {
    values: HashMap<String, Option<f64>>,
}

impl ValueMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: impl Into<String>, value: f64) {
        self.values.insert(id.into(), Some(value));
    }

    pub fn insert_missing(&mut self, id: impl Into<String>) {
        self.values.insert(id.into(), None);
    }

    /// The value for `id` if it counts as data.
    pub fn get(&self, id: &str) -> Option<f64> {
        self.values
            .get(id)
            .copied()
            .flatten()
            .filter(|v| v.is_finite() && *v > 0.0)
    }

    /// All values that count as data, in no particular order.
    pub fn positive_values(&self) -> Vec<f64> {
        self.values
            .values()
            .filter_map(|v| *v)
            .filter(|v| v.is_finite() && *v > 0.0)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl FromIterator<(String, f64)> for ValueMap {
    fn from_iter<I: IntoIterator<Item = (String, f64)>>(iter: I) -> Self {
        Self { values: iter.into_iter().map(|(k, v)| (k, Some(v))).collect() }
    }
}

/// Region id -> precomputed category key (e.g. `hot_95`, `HH`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryMap {
    labels: HashMap<String, String>,
}

impl CategoryMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: impl Into<String>, key: impl Into<String>) {
        self.labels.insert(id.into(), key.into());
    }

    pub fn get(&self, id: &str) -> Option<&str> {
        self.labels.get(id).map(String::as_str)
    }

    /// True when at least one region is assigned `key`.
    pub fn is_populated(&self, key: &str) -> bool {
        self.labels.values().any(|k| k == key)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

impl FromIterator<(String, String)> for CategoryMap {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self { labels: iter.into_iter().collect() }
    }
}
