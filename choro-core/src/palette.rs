//! Color ramps, categorical palettes and the value -> color scheme

use serde::{Deserialize, Serialize};

use crate::classify::{classify_values, ClassBreaks};
use crate::error::{ChoroError, ChoroResult};
use crate::format::NumberFormat;
use crate::types::{CategoryMap, Color, ValueMap};

/// Gray used for regions without data.
pub const DEFAULT_NO_DATA: Color = Color::rgb(0xd0, 0xd0, 0xd0);

/// ColorBrewer YlOrRd, 7 classes.
const YL_OR_RD: [Color; 7] = [
    Color::rgb(0xff, 0xff, 0xb2),
    Color::rgb(0xfe, 0xd9, 0x76),
    Color::rgb(0xfe, 0xb2, 0x4c),
    Color::rgb(0xfd, 0x8d, 0x3c),
    Color::rgb(0xfc, 0x4e, 0x2a),
    Color::rgb(0xe3, 0x1a, 0x1c),
    Color::rgb(0xb1, 0x00, 0x26),
];

/// Sequential colors indexed by class, plus the no-data color.
///
/// Deserialization goes through [`ColorRamp::new`], so an empty ramp is rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawRamp")]
pub struct ColorRamp {
    colors: Vec<Color>,
    no_data: Color,
}

#[derive(Deserialize)]
struct RawRamp {
    colors: Vec<Color>,
    #[serde(default = "default_no_data")]
    no_data: Color,
}

fn default_no_data() -> Color {
    DEFAULT_NO_DATA
}

impl TryFrom<RawRamp> for ColorRamp {
    type Error = ChoroError;

    fn try_from(raw: RawRamp) -> ChoroResult<Self> {
        Self::new(raw.colors, raw.no_data)
    }
}

impl ColorRamp {
    pub fn new(colors: Vec<Color>, no_data: Color) -> ChoroResult<Self> {
        if colors.is_empty() {
            return Err(ChoroError::InvalidParams("color ramp needs at least one color".into()));
        }
        Ok(Self { colors, no_data })
    }

    /// ColorBrewer YlOrRd, 7 classes.
    pub fn yl_or_rd() -> Self {
        Self { colors: YL_OR_RD.to_vec(), no_data: DEFAULT_NO_DATA }
    }

    pub fn colors(&self) -> &[Color] {
        &self.colors
    }

    pub fn no_data(&self) -> Color {
        self.no_data
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    /// Color for class `index`; indices past the end reuse the last color.
    pub fn color(&self, index: usize) -> Color {
        self.colors.get(index).copied().unwrap_or_else(|| self.last())
    }

    pub fn last(&self) -> Color {
        self.colors.last().copied().unwrap_or(self.no_data)
    }
}

impl Default for ColorRamp {
    fn default() -> Self {
        Self::yl_or_rd()
    }
}

/// One category of a categorical palette.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryStyle {
    pub key: String,
    pub color: Color,
    pub label: String,
}

impl CategoryStyle {
    pub fn new(key: impl Into<String>, color: Color, label: impl Into<String>) -> Self {
        Self { key: key.into(), color, label: label.into() }
    }
}

/// Ordered label set for precomputed classifications.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoricalPalette {
    categories: Vec<CategoryStyle>,
    no_data: Color,
}

impl CategoricalPalette {
    pub fn new(categories: Vec<CategoryStyle>, no_data: Color) -> ChoroResult<Self> {
        for (i, c) in categories.iter().enumerate() {
            if categories[..i].iter().any(|prev| prev.key == c.key) {
                return Err(ChoroError::InvalidParams(format!("duplicate category key: {}", c.key)));
            }
        }
        Ok(Self { categories, no_data })
    }

    /// Getis-Ord Gi* confidence tiers.
    pub fn getis_ord() -> Self {
        Self {
            categories: vec![
                CategoryStyle::new("hot_99", Color::rgb(0xb2, 0x18, 0x2b), "Hot spot (p<0.01)"),
                CategoryStyle::new("hot_95", Color::rgb(0xef, 0x8a, 0x62), "Hot spot (p<0.05)"),
                CategoryStyle::new("hot_90", Color::rgb(0xfd, 0xdb, 0xc7), "Hot spot (p<0.10)"),
                CategoryStyle::new("ns", Color::rgb(0xf0, 0xf0, 0xf0), "Not significant"),
                CategoryStyle::new("cold_90", Color::rgb(0xd1, 0xe5, 0xf0), "Cold spot (p<0.10)"),
                CategoryStyle::new("cold_95", Color::rgb(0x67, 0xa9, 0xcf), "Cold spot (p<0.05)"),
                CategoryStyle::new("cold_99", Color::rgb(0x21, 0x66, 0xac), "Cold spot (p<0.01)"),
            ],
            no_data: DEFAULT_NO_DATA,
        }
    }

    /// Local Moran's I quadrants.
    pub fn local_moran() -> Self {
        Self {
            categories: vec![
                CategoryStyle::new("HH", Color::rgb(0xd7, 0x19, 0x1c), "HH - High-High cluster"),
                CategoryStyle::new("LL", Color::rgb(0x2c, 0x7b, 0xb6), "LL - Low-Low cluster"),
                CategoryStyle::new("HL", Color::rgb(0xfd, 0xae, 0x61), "HL - High-Low outlier"),
                CategoryStyle::new("LH", Color::rgb(0xab, 0xd9, 0xe9), "LH - Low-High outlier"),
                CategoryStyle::new("ns", Color::rgb(0xf0, 0xf0, 0xf0), "Not significant"),
            ],
            no_data: DEFAULT_NO_DATA,
        }
    }

    pub fn categories(&self) -> &[CategoryStyle] {
        &self.categories
    }

    pub fn get(&self, key: &str) -> Option<&CategoryStyle> {
        self.categories.iter().find(|c| c.key == key)
    }

    pub fn no_data(&self) -> Color {
        self.no_data
    }
}

/// A swatch in the printed legend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegendEntry {
    pub color: Color,
    pub label: String,
}

impl LegendEntry {
    pub fn new(color: Color, label: impl Into<String>) -> Self {
        Self { color, label: label.into() }
    }
}

/// Fixed wording used when deriving legend labels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LegendText {
    pub no_data: String,
    pub above_max_prefix: String,
    pub range_separator: String,
}

impl Default for LegendText {
    fn default() -> Self {
        Self {
            no_data: "No data".to_string(),
            above_max_prefix: "> ".to_string(),
            range_separator: " ~ ".to_string(),
        }
    }
}

/// How a region's fill color is chosen.
#[derive(Debug, Clone, PartialEq)]
pub enum ColorScheme {
    /// Natural-breaks classes over observed values.
    Continuous {
        breaks: ClassBreaks,
        ramp: ColorRamp,
        values: ValueMap,
        format: NumberFormat,
    },
    /// Externally computed labels, e.g. hotspot tiers.
    Categorical {
        palette: CategoricalPalette,
        assignments: CategoryMap,
    },
}

impl ColorScheme {
    /// Classify `values` into `classes` natural-breaks classes. An all-no-data input is
    /// not an error: every region is then drawn with the ramp's no-data color.
    pub fn continuous(values: ValueMap, ramp: ColorRamp, classes: usize, format: NumberFormat) -> Self {
        let breaks = match classify_values(&values, classes) {
            Ok(breaks) => breaks,
            Err(err) => {
                log::warn!("{}; rendering every region as no-data", err);
                ClassBreaks::empty()
            }
        };
        ColorScheme::Continuous { breaks, ramp, values, format }
    }

    pub fn categorical(palette: CategoricalPalette, assignments: CategoryMap) -> Self {
        ColorScheme::Categorical { palette, assignments }
    }

    pub fn no_data_color(&self) -> Color {
        match self {
            ColorScheme::Continuous { ramp, .. } => ramp.no_data(),
            ColorScheme::Categorical { palette, .. } => palette.no_data(),
        }
    }

    pub fn fill_for(&self, region_id: &str) -> Color {
        match self {
            ColorScheme::Continuous { breaks, ramp, values, .. } => values
                .get(region_id)
                .and_then(|v| breaks.class_of(v))
                .map(|class| ramp.color(class))
                .unwrap_or_else(|| ramp.no_data()),
            ColorScheme::Categorical { palette, assignments } => assignments
                .get(region_id)
                .and_then(|key| palette.get(key))
                .map(|style| style.color)
                .unwrap_or_else(|| palette.no_data()),
        }
    }

    /// Legend swatches, no-data first.
    pub fn legend_entries(&self, text: &LegendText) -> Vec<LegendEntry> {
        let mut entries = vec![LegendEntry::new(self.no_data_color(), text.no_data.clone())];
        match self {
            ColorScheme::Continuous { breaks, ramp, format, .. } => {
                let bounds = breaks.as_slice();
                for (i, &upper) in bounds.iter().enumerate() {
                    let lower = if i == 0 { 0.0 } else { bounds[i - 1] };
                    let label = format!("{}{}{}", format.format(lower), text.range_separator, format.format(upper));
                    entries.push(LegendEntry::new(ramp.color(i), label));
                }
                if let Some(max) = breaks.max() {
                    entries.push(LegendEntry::new(ramp.last(), format!("{}{}", text.above_max_prefix, format.format(max))));
                }
            }
            ColorScheme::Categorical { palette, assignments } => {
                entries.extend(
                    palette
                        .categories()
                        .iter()
                        .filter(|c| assignments.is_populated(&c.key))
                        .map(|c| LegendEntry::new(c.color, c.label.clone())),
                );
            }
        }
        entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(pairs: &[(&str, f64)]) -> ValueMap {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn test_ramp_clamps_index() {
        let ramp = ColorRamp::yl_or_rd();
        assert_eq!(ramp.len(), 7);
        assert_eq!(ramp.color(0), Color::rgb(0xff, 0xff, 0xb2));
        assert_eq!(ramp.color(6), ramp.last());
        assert_eq!(ramp.color(42), ramp.last());
        assert!(ColorRamp::new(vec![], DEFAULT_NO_DATA).is_err());
    }

    #[test]
    fn test_deserialized_ramp_is_validated() {
        assert!(serde_json::from_str::<ColorRamp>(r#"{"colors": []}"#).is_err());
        assert!(serde_json::from_str::<ColorRamp>(r##"{"colors": [], "no_data": "#d0d0d0"}"##).is_err());

        let ramp: ColorRamp = serde_json::from_str(r##"{"colors": ["#112233"]}"##).unwrap();
        assert_eq!(ramp.color(3), Color::rgb(0x11, 0x22, 0x33));
        assert_eq!(ramp.no_data(), DEFAULT_NO_DATA);

        let back: ColorRamp = serde_json::from_str(&serde_json::to_string(&ColorRamp::yl_or_rd()).unwrap()).unwrap();
        assert_eq!(back, ColorRamp::yl_or_rd());
    }

    #[test]
    fn test_yl_or_rd_matches_brewer_hex() {
        let hex: Vec<String> = ColorRamp::yl_or_rd().colors().iter().map(Color::to_hex).collect();
        assert_eq!(hex, ["#ffffb2", "#fed976", "#feb24c", "#fd8d3c", "#fc4e2a", "#e31a1c", "#b10026"]);
        assert_eq!(CategoricalPalette::getis_ord().get("hot_99").map(|s| s.color.to_hex()).as_deref(), Some("#b2182b"));
    }

    #[test]
    fn test_continuous_fill_lookup() {
        let vals = values(&[("a", 10.0), ("b", 10.0), ("c", 100.0), ("d", 0.0)]);
        let scheme = ColorScheme::continuous(vals, ColorRamp::yl_or_rd(), 7, NumberFormat::count());
        let ramp = ColorRamp::yl_or_rd();
        assert_eq!(scheme.fill_for("a"), ramp.color(0));
        assert_eq!(scheme.fill_for("c"), ramp.color(1));
        assert_eq!(scheme.fill_for("d"), DEFAULT_NO_DATA);
        assert_eq!(scheme.fill_for("missing"), DEFAULT_NO_DATA);
    }

    #[test]
    fn test_zero_classes_renders_no_data() {
        let vals = values(&[("a", 10.0), ("b", 100.0)]);
        let scheme = ColorScheme::continuous(vals, ColorRamp::yl_or_rd(), 0, NumberFormat::count());
        assert_eq!(scheme.fill_for("b"), DEFAULT_NO_DATA);
    }

    #[test]
    fn test_fill_is_monotonic_in_value() {
        let vals: ValueMap = (1..=60).map(|i| (format!("r{i}"), (i * i) as f64)).collect();
        let scheme = ColorScheme::continuous(vals, ColorRamp::yl_or_rd(), 5, NumberFormat::count());
        let ColorScheme::Continuous { breaks, .. } = &scheme else { unreachable!() };
        let mut last = 0;
        for i in 1..=60 {
            let class = breaks.class_of((i * i) as f64).unwrap();
            assert!(class >= last);
            last = class;
        }
        assert_eq!(last, breaks.len() - 1);
    }

    #[test]
    fn test_empty_input_renders_all_no_data() {
        let vals = values(&[("a", 0.0), ("b", -2.0)]);
        let scheme = ColorScheme::continuous(vals, ColorRamp::yl_or_rd(), 7, NumberFormat::count());
        assert_eq!(scheme.fill_for("a"), DEFAULT_NO_DATA);
        let legend = scheme.legend_entries(&LegendText::default());
        assert_eq!(legend, vec![LegendEntry::new(DEFAULT_NO_DATA, "No data")]);
    }

    #[test]
    fn test_continuous_legend_labels() {
        let breaks = ClassBreaks::new(vec![9_000.0, 45_000.0, 320_000.0]).unwrap();
        let scheme = ColorScheme::Continuous {
            breaks,
            ramp: ColorRamp::yl_or_rd(),
            values: ValueMap::new(),
            format: NumberFormat::count(),
        };
        let labels: Vec<String> = scheme
            .legend_entries(&LegendText::default())
            .into_iter()
            .map(|e| e.label)
            .collect();
        assert_eq!(labels, vec!["No data", "0 ~ 9,000", "9,000 ~ 5man", "5man ~ 32man", "> 32man"]);
    }

    #[test]
    fn test_categorical_fill_and_legend() {
        let assignments: CategoryMap = [("a", "hot_99"), ("b", "ns"), ("c", "cold_95"), ("d", "bogus")]
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let scheme = ColorScheme::categorical(CategoricalPalette::getis_ord(), assignments);

        assert_eq!(scheme.fill_for("a"), Color::rgb(0xb2, 0x18, 0x2b));
        assert_eq!(scheme.fill_for("d"), DEFAULT_NO_DATA);
        assert_eq!(scheme.fill_for("zz"), DEFAULT_NO_DATA);

        let legend = scheme.legend_entries(&LegendText::default());
        let labels: Vec<&str> = legend.iter().map(|e| e.label.as_str()).collect();
        assert_eq!(labels, vec!["No data", "Hot spot (p<0.01)", "Not significant", "Cold spot (p<0.05)"]);
    }

    #[test]
    fn test_palette_rejects_duplicate_keys() {
        let style = CategoryStyle::new("HH", Color::rgb(0, 0, 0), "x");
        assert!(CategoricalPalette::new(vec![style.clone(), style], DEFAULT_NO_DATA).is_err());
        assert_eq!(CategoricalPalette::local_moran().categories().len(), 5);
    }
}
