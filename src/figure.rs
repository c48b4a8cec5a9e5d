//! Figure builder: turns (view mode, continent filter, dataset) into a
//! self-contained chart descriptor. Pure; identical inputs give equal output.

use crate::data::{CityId, CityRecord, Dataset};
use crate::format::{clip, format_population, hex_with_opacity, population_bar, DEFAULT_ACCENT};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Width of the unicode population bar shown in hover cards
pub const HOVER_BAR_WIDTH: usize = 14;
/// Max chars of "best known for" shown in hover cards
pub const HOVER_FAMOUS_CHARS: usize = 65;

const MARKER_OPACITY: f64 = 0.93;
const MARKER_OUTLINE: &str = "rgba(255,255,255,0.55)";
const MARKER_OUTLINE_WIDTH: f64 = 1.5;
const HOVER_HINT: &str = "Click for full details & CSV export  ›";

/// Globe (orthographic sphere) or flat world map
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewMode {
    #[default]
    Globe,
    #[serde(alias = "flat")]
    FlatMap,
}

impl FromStr for ViewMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "globe" | "3d" => Ok(ViewMode::Globe),
            "flat" | "flat_map" | "flatmap" | "map" => Ok(ViewMode::FlatMap),
            other => Err(format!("unknown view mode {other:?} (expected globe or flat)")),
        }
    }
}

/// Restricts displayed cities to one continent, or shows all
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ContinentFilter {
    #[default]
    All,
    Only(String),
}

impl ContinentFilter {
    pub fn matches(&self, continent: &str) -> bool {
        match self {
            ContinentFilter::All => true,
            ContinentFilter::Only(c) => c == continent,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            ContinentFilter::All => "All",
            ContinentFilter::Only(c) => c,
        }
    }
}

impl From<String> for ContinentFilter {
    fn from(s: String) -> Self {
        if s.trim().is_empty() || s.trim().eq_ignore_ascii_case("all") {
            ContinentFilter::All
        } else {
            ContinentFilter::Only(s)
        }
    }
}

impl From<&str> for ContinentFilter {
    fn from(s: &str) -> Self {
        ContinentFilter::from(s.to_string())
    }
}

impl From<ContinentFilter> for String {
    fn from(f: ContinentFilter) -> Self {
        f.as_str().to_string()
    }
}

impl fmt::Display for ContinentFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Clamped linear mapping from population to marker size
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarkerScale {
    pub min_size: f64,
    pub max_size: f64,
    /// Population per unit of marker size
    pub scale_factor: f64,
}

impl MarkerScale {
    #[inline]
    pub fn size_for(&self, population: u64) -> f64 {
        (population as f64 / self.scale_factor).clamp(self.min_size, self.max_size)
    }
}

/// Land/ocean/border colors shared by both projections
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoPalette {
    pub land: String,
    pub ocean: String,
    pub country: String,
    pub coastline: String,
    pub lake: String,
}

/// Translucent glow drawn behind each marker
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HaloStyle {
    pub size_multiplier: f64,
    pub opacity: f64,
}

/// Presentation parameters of a figure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FigureStyle {
    pub marker: MarkerScale,
    pub palette: GeoPalette,
    pub halo: Option<HaloStyle>,
}

/// The two cosmetic variants of the explorer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StyleVariant {
    /// Natural Earth colors, plain markers
    #[default]
    Classic,
    /// Deep-space colors, haloed markers
    Glow,
}

impl StyleVariant {
    pub fn marker_scale(self) -> MarkerScale {
        match self {
            StyleVariant::Classic => MarkerScale {
                min_size: 9.0,
                max_size: 24.0,
                scale_factor: 850_000.0 / 2.3,
            },
            StyleVariant::Glow => MarkerScale {
                min_size: 8.0,
                max_size: 22.0,
                scale_factor: 1_000_000.0 / 2.0,
            },
        }
    }

    pub fn style(self) -> FigureStyle {
        match self {
            StyleVariant::Classic => FigureStyle {
                marker: self.marker_scale(),
                palette: GeoPalette {
                    land: "#2d5e1e".into(),
                    ocean: "#12345e".into(),
                    country: "#3a7028".into(),
                    coastline: "#4a9040".into(),
                    lake: "#1a4972".into(),
                },
                halo: None,
            },
            StyleVariant::Glow => FigureStyle {
                marker: self.marker_scale(),
                palette: GeoPalette {
                    land: "#1b3a2f".into(),
                    ocean: "#050d1f".into(),
                    country: "#2a5a4a".into(),
                    coastline: "#3fd0c9".into(),
                    lake: "#0b2340".into(),
                },
                halo: Some(HaloStyle {
                    size_multiplier: 1.8,
                    opacity: 0.18,
                }),
            },
        }
    }
}

impl FromStr for StyleVariant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "classic" => Ok(StyleVariant::Classic),
            "glow" => Ok(StyleVariant::Glow),
            other => Err(format!("unknown style variant {other:?} (expected classic or glow)")),
        }
    }
}

/// Tooltip content for one city
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HoverCard {
    pub title: String,
    pub subtitle: String,
    pub population: String,
    pub population_bar: String,
    pub famous_for: String,
    pub top_attraction: String,
    pub hint: String,
    pub accent: String,
}

/// One plotted city
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarkerPoint {
    /// Returned verbatim in click events
    pub customdata: CityId,
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    pub size: f64,
    pub hover: HoverCard,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Halo {
    pub color: String,
    pub size_multiplier: f64,
}

/// All markers of one continent
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarkerLayer {
    pub continent: String,
    /// Legend label
    pub name: String,
    pub color: String,
    pub opacity: f64,
    pub outline: String,
    pub outline_width: f64,
    pub halo: Option<Halo>,
    pub points: Vec<MarkerPoint>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Rotation {
    pub lon: f64,
    pub lat: f64,
    pub roll: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Projection {
    Orthographic { rotation: Rotation },
    Equirectangular { lat_range: [f64; 2], lon_range: [f64; 2] },
}

/// Home rotation of the globe
pub const GLOBE_ROTATION: Rotation = Rotation {
    lon: 15.0,
    lat: 15.0,
    roll: 0.0,
};
/// Latitude band shown by the flat map
pub const FLAT_LAT_RANGE: [f64; 2] = [-85.0, 85.0];
pub const FLAT_LON_RANGE: [f64; 2] = [-180.0, 180.0];

impl Projection {
    pub fn for_view(view_mode: ViewMode) -> Self {
        match view_mode {
            ViewMode::Globe => Projection::Orthographic {
                rotation: GLOBE_ROTATION,
            },
            ViewMode::FlatMap => Projection::Equirectangular {
                lat_range: FLAT_LAT_RANGE,
                lon_range: FLAT_LON_RANGE,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeoLayout {
    pub palette: GeoPalette,
    pub projection: Projection,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegendEntry {
    pub label: String,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Legend {
    pub title: String,
    pub entries: Vec<LegendEntry>,
}

/// Complete chart descriptor
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FigureDescriptor {
    pub view_mode: ViewMode,
    pub continent_filter: ContinentFilter,
    pub layers: Vec<MarkerLayer>,
    pub geo: GeoLayout,
    pub legend: Legend,
}

impl FigureDescriptor {
    /// Every plotted point, in layer order
    pub fn points(&self) -> impl Iterator<Item = (&MarkerLayer, &MarkerPoint)> + '_ {
        self.layers
            .iter()
            .flat_map(|layer| layer.points.iter().map(move |p| (layer, p)))
    }

    pub fn point(&self, id: CityId) -> Option<(&MarkerLayer, &MarkerPoint)> {
        self.points().find(|(_, p)| p.customdata == id)
    }
}

/// Build the map figure for the given view and filter
pub fn build_figure(
    view_mode: ViewMode,
    filter: &ContinentFilter,
    dataset: &Dataset,
    style: &FigureStyle,
) -> FigureDescriptor {
    let layers: Vec<MarkerLayer> = dataset
        .continents_present()
        .into_iter()
        .filter(|continent| filter.matches(continent))
        .filter_map(|continent| build_layer(continent, dataset, style))
        .collect();

    let legend = Legend {
        title: "Continents".to_string(),
        entries: layers
            .iter()
            .map(|l| LegendEntry {
                label: l.name.clone(),
                color: l.color.clone(),
            })
            .collect(),
    };

    FigureDescriptor {
        view_mode,
        continent_filter: filter.clone(),
        layers,
        geo: GeoLayout {
            palette: style.palette.clone(),
            projection: Projection::for_view(view_mode),
        },
        legend,
    }
}

fn build_layer(continent: &str, dataset: &Dataset, style: &FigureStyle) -> Option<MarkerLayer> {
    let color = dataset.color_for(continent).to_string();
    let points: Vec<MarkerPoint> = dataset
        .iter()
        .filter(|(_, c)| c.continent == continent)
        .map(|(id, c)| MarkerPoint {
            customdata: id,
            name: c.name.clone(),
            lat: c.lat,
            lon: c.lon,
            size: style.marker.size_for(c.population),
            hover: hover_card(c, &color),
        })
        .collect();

    if points.is_empty() {
        return None;
    }

    let halo = style.halo.map(|h| Halo {
        color: hex_with_opacity(&color, h.opacity)
            .or_else(|_| hex_with_opacity(DEFAULT_ACCENT, h.opacity))
            .unwrap_or_default(),
        size_multiplier: h.size_multiplier,
    });

    let emoji = dataset.emoji_for(continent);
    let name = if emoji.is_empty() {
        continent.to_string()
    } else {
        format!("{emoji}  {continent}")
    };

    Some(MarkerLayer {
        continent: continent.to_string(),
        name,
        color,
        opacity: MARKER_OPACITY,
        outline: MARKER_OUTLINE.to_string(),
        outline_width: MARKER_OUTLINE_WIDTH,
        halo,
        points,
    })
}

fn hover_card(city: &CityRecord, accent: &str) -> HoverCard {
    HoverCard {
        title: format!("{}  {}", city.flag, city.name),
        subtitle: format!("{}  ·  {}", city.country, city.continent),
        population: format_population(city.population),
        population_bar: population_bar(city.population, HOVER_BAR_WIDTH),
        famous_for: clip(&city.best_known_for, HOVER_FAMOUS_CHARS),
        top_attraction: city.top_attractions.first().cloned().unwrap_or_default(),
        hint: HOVER_HINT.to_string(),
        accent: accent.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::tests::{city, styles};
    use crate::data::Dataset;
    use std::collections::BTreeSet;

    fn sample() -> Dataset {
        let mut cities = vec![
            city("Tokyo", "Asia", 37_400_000),
            city("Paris", "Europe", 11_000_000),
            city("Osaka", "Asia", 19_000_000),
            city("Lagos", "Africa", 15_400_000),
            city("Hamlet", "Europe", 800),
        ];
        cities[0].best_known_for = "x".repeat(100);
        Dataset::new(cities, styles()).unwrap()
    }

    fn classic() -> FigureStyle {
        StyleVariant::Classic.style()
    }

    #[test]
    fn test_idempotent() {
        let ds = sample();
        for view in [ViewMode::Globe, ViewMode::FlatMap] {
            for filter in [ContinentFilter::All, ContinentFilter::from("Asia")] {
                let a = build_figure(view, &filter, &ds, &classic());
                let b = build_figure(view, &filter, &ds, &classic());
                assert_eq!(a, b);
            }
        }
    }

    #[test]
    fn test_filter_keeps_only_continent() {
        let ds = sample();
        for continent in ["Asia", "Europe", "Africa"] {
            let fig = build_figure(ViewMode::Globe, &continent.into(), &ds, &classic());
            assert_eq!(fig.layers.len(), 1);
            for (layer, point) in fig.points() {
                assert_eq!(layer.continent, continent);
                assert_eq!(ds.get(point.customdata).unwrap().continent, continent);
            }
        }
    }

    #[test]
    fn test_all_filter_covers_dataset() {
        let ds = sample();
        let fig = build_figure(ViewMode::Globe, &ContinentFilter::All, &ds, &classic());
        let plotted: BTreeSet<CityId> = fig.points().map(|(_, p)| p.customdata).collect();
        let all: BTreeSet<CityId> = ds.iter().map(|(id, _)| id).collect();
        assert_eq!(plotted, all);
        assert_eq!(fig.points().count(), ds.len());
    }

    #[test]
    fn test_layers_follow_style_table_order() {
        let fig = build_figure(ViewMode::Globe, &ContinentFilter::All, &sample(), &classic());
        let order: Vec<&str> = fig.layers.iter().map(|l| l.continent.as_str()).collect();
        assert_eq!(order, vec!["Asia", "Europe", "Africa"]);
        assert_eq!(fig.legend.entries.len(), 3);
        assert_eq!(fig.legend.entries[0].label, "🌏  Asia");
        assert_eq!(fig.legend.entries[0].color, "#ff6b6b");
    }

    #[test]
    fn test_marker_size_monotonic_and_bounded() {
        let scale = classic().marker;
        let pops = [0, 800, 100_000, 2_000_000, 4_000_000, 8_000_000, 30_000_000, u64::MAX / 2];
        for pair in pops.windows(2) {
            let (a, b) = (scale.size_for(pair[0]), scale.size_for(pair[1]));
            assert!(a <= b);
            assert!((scale.min_size..=scale.max_size).contains(&a));
            assert!((scale.min_size..=scale.max_size).contains(&b));
        }

        let fig = build_figure(ViewMode::Globe, &"Asia".into(), &sample(), &classic());
        let sizes: Vec<(u64, f64)> = fig
            .points()
            .map(|(_, p)| (sample().get(p.customdata).unwrap().population, p.size))
            .collect();
        for a in &sizes {
            for b in &sizes {
                if a.0 < b.0 {
                    assert!(a.1 <= b.1);
                }
            }
        }
    }

    #[test]
    fn test_testopolis_scenario() {
        let mut c = city("Testopolis", "Asia", 3_400_000);
        c.top_attractions = vec!["Grand Gate".into()];
        let ds = Dataset::new(vec![c], styles()).unwrap();

        let fig = build_figure(ViewMode::Globe, &"Asia".into(), &ds, &classic());
        assert_eq!(fig.layers.len(), 1);
        let layer = &fig.layers[0];
        assert_eq!(layer.points.len(), 1);

        let p = &layer.points[0];
        assert_eq!(p.name, "Testopolis");
        let scale = classic().marker;
        assert!(p.size >= scale.min_size && p.size <= scale.max_size);
        assert_eq!(p.hover.population, "3.4M");
        assert_eq!(p.hover.top_attraction, "Grand Gate");
        assert_eq!(p.hover.population_bar.chars().count(), HOVER_BAR_WIDTH);
    }

    #[test]
    fn test_empty_results_are_not_errors() {
        let ds = sample();
        let fig = build_figure(ViewMode::FlatMap, &"Oceania".into(), &ds, &classic());
        assert!(fig.layers.is_empty());
        assert!(fig.legend.entries.is_empty());

        let empty = Dataset::new(Vec::new(), styles()).unwrap();
        let fig = build_figure(ViewMode::Globe, &ContinentFilter::All, &empty, &classic());
        assert!(fig.layers.is_empty());
    }

    #[test]
    fn test_hover_truncates_famous_for() {
        let fig = build_figure(ViewMode::Globe, &"Asia".into(), &sample(), &classic());
        let tokyo = &fig.layers[0].points[0];
        assert_eq!(tokyo.hover.famous_for.chars().count(), HOVER_FAMOUS_CHARS);
        assert_eq!(tokyo.hover.title, "🏳  Tokyo");
        assert_eq!(tokyo.hover.subtitle, "Testland  ·  Asia");
    }

    #[test]
    fn test_projection_per_view() {
        let ds = sample();
        let globe = build_figure(ViewMode::Globe, &ContinentFilter::All, &ds, &classic());
        let flat = build_figure(ViewMode::FlatMap, &ContinentFilter::All, &ds, &classic());
        assert!(matches!(globe.geo.projection, Projection::Orthographic { .. }));
        match flat.geo.projection {
            Projection::Equirectangular { lat_range, lon_range } => {
                assert_eq!(lat_range, [-85.0, 85.0]);
                assert_eq!(lon_range, [-180.0, 180.0]);
            }
            other => panic!("unexpected projection {other:?}"),
        }
        assert_eq!(globe.geo.palette, flat.geo.palette);
    }

    #[test]
    fn test_unstyled_continent_uses_default_color() {
        let ds = Dataset::new(
            vec![city("Atlantis City", "Atlantis", 10), city("Kyoto", "Asia", 10)],
            styles(),
        )
        .unwrap();
        let fig = build_figure(ViewMode::Globe, &ContinentFilter::All, &ds, &classic());
        assert_eq!(fig.layers.len(), 2);
        assert_eq!(fig.layers[1].continent, "Atlantis");
        assert_eq!(fig.layers[1].color, DEFAULT_ACCENT);
        assert_eq!(fig.layers[1].name, "Atlantis");
    }

    #[test]
    fn test_glow_variant_adds_halo() {
        let fig = build_figure(
            ViewMode::Globe,
            &ContinentFilter::All,
            &sample(),
            &StyleVariant::Glow.style(),
        );
        let halo = fig.layers[0].halo.as_ref().unwrap();
        assert_eq!(halo.color, "rgba(255,107,107,0.18)");
        assert!(build_figure(ViewMode::Globe, &ContinentFilter::All, &sample(), &classic()).layers[0]
            .halo
            .is_none());
    }

    #[test]
    fn test_payload_serializes_as_number() {
        let fig = build_figure(ViewMode::Globe, &"Europe".into(), &sample(), &classic());
        let json = serde_json::to_value(&fig).unwrap();
        assert_eq!(json["layers"][0]["points"][0]["customdata"], serde_json::json!(1));
        assert_eq!(json["continent_filter"], "Europe");
        assert_eq!(json["geo"]["projection"]["type"], "orthographic");
    }

    #[test]
    fn test_parse_modes() {
        assert_eq!("flat".parse::<ViewMode>().unwrap(), ViewMode::FlatMap);
        assert_eq!("Globe".parse::<ViewMode>().unwrap(), ViewMode::Globe);
        assert!("sphere".parse::<ViewMode>().is_err());
        assert_eq!(ContinentFilter::from("all"), ContinentFilter::All);
        assert_eq!("glow".parse::<StyleVariant>().unwrap(), StyleVariant::Glow);
    }
}
