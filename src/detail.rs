//! Detail view for a selected city: header, stats, comparison charts and lists

use crate::data::{CityId, CityRecord, Dataset};
use crate::format::{
    format_population, group_thousands, hex_with_opacity, truncate_label, DEFAULT_ACCENT,
    POPULATION_CEILING,
};
use serde::Serialize;

const DIMMED_BAR: &str = "rgba(30,55,90,0.65)";
const ATTRACTION_SCORES: [u32; 5] = [95, 88, 80, 73, 65];
const ATTRACTION_OPACITIES: [f64; 5] = [0.95, 0.82, 0.70, 0.58, 0.46];
const ATTRACTION_LABEL_CHARS: usize = 22;
const ATTRACTION_MARKER: &str = "✦";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Header {
    pub flag: String,
    pub name: String,
    pub country: String,
    pub continent: String,
    pub accent: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PopulationSection {
    /// "3,400,000"
    pub display: String,
    /// Bar fill in percent, 0..=100
    pub fill_percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatChip {
    pub icon: &'static str,
    pub label: &'static str,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonBar {
    pub city: String,
    pub population: u64,
    pub label: String,
    pub color: String,
    pub highlighted: bool,
}

/// Horizontal bars of every city on the same continent, ascending
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonChart {
    pub title: String,
    pub bars: Vec<ComparisonBar>,
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttractionBar {
    pub label: String,
    pub score: u32,
    pub opacity: f64,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttractionChart {
    pub title: String,
    pub bars: Vec<AttractionBar>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttractionItem {
    pub marker: &'static str,
    pub marker_color: String,
    pub text: String,
}

/// Everything the detail panel shows for one city
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetailView {
    pub id: CityId,
    pub header: Header,
    pub description: String,
    pub tags: Vec<String>,
    pub population: PopulationSection,
    pub chips: Vec<StatChip>,
    pub comparison: ComparisonChart,
    pub attractions_chart: AttractionChart,
    pub attractions: Vec<AttractionItem>,
    /// `None` when the city has no fun facts; the section is then omitted
    pub fun_facts: Option<Vec<String>>,
}

/// Build the detail view of `id`, or `None` if it is not in the dataset
pub fn build_detail(id: CityId, dataset: &Dataset) -> Option<DetailView> {
    let city = dataset.get(id)?;
    let accent = dataset.color_for(&city.continent).to_string();

    Some(DetailView {
        id,
        header: Header {
            flag: city.flag.clone(),
            name: city.name.clone(),
            country: city.country.clone(),
            continent: city.continent.clone(),
            accent: accent.clone(),
        },
        description: city.description.clone(),
        tags: tags(&city.best_known_for),
        population: PopulationSection {
            display: group_thousands(city.population),
            fill_percent: fill_percent(city.population),
        },
        chips: stat_chips(city),
        comparison: comparison_chart(id, city, dataset, &accent),
        attractions_chart: attraction_chart(city, &accent),
        attractions: city
            .top_attractions
            .iter()
            .map(|a| AttractionItem {
                marker: ATTRACTION_MARKER,
                marker_color: accent.clone(),
                text: a.clone(),
            })
            .collect(),
        fun_facts: (!city.fun_facts.is_empty()).then(|| city.fun_facts.clone()),
    })
}

/// Population bar fill, saturating at the ceiling
pub fn fill_percent(population: u64) -> f64 {
    (population as f64 / POPULATION_CEILING * 100.0).min(100.0)
}

fn tags(best_known_for: &str) -> Vec<String> {
    best_known_for
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(String::from)
        .collect()
}

fn stat_chips(city: &CityRecord) -> Vec<StatChip> {
    let chip = |icon, label, value: &str| StatChip {
        icon,
        label,
        value: value.to_string(),
    };
    vec![
        chip("👥", "Population", &format_population(city.population)),
        chip("🗣", "Language", &city.language),
        chip("💱", "Currency", &city.currency),
        chip("🕐", "Timezone", &city.timezone),
        chip("📅", "Founded", city.founded.as_deref().unwrap_or("Ancient")),
        chip("🌍", "Continent", &city.continent),
    ]
}

fn comparison_chart(id: CityId, city: &CityRecord, dataset: &Dataset, accent: &str) -> ComparisonChart {
    let mut peers: Vec<(CityId, &CityRecord)> = dataset
        .iter()
        .filter(|(_, c)| c.continent == city.continent)
        .collect();
    // Stable sort keeps dataset order among equal populations
    peers.sort_by_key(|(_, c)| c.population);

    let bars: Vec<ComparisonBar> = peers
        .into_iter()
        .map(|(peer_id, c)| {
            let highlighted = peer_id == id;
            ComparisonBar {
                city: c.name.clone(),
                population: c.population,
                label: format_population(c.population),
                color: if highlighted { accent.to_string() } else { DIMMED_BAR.to_string() },
                highlighted,
            }
        })
        .collect();

    ComparisonChart {
        title: format!("Population — {}", city.continent),
        height: (bars.len() as u32 * 38).max(200),
        bars,
    }
}

fn attraction_chart(city: &CityRecord, accent: &str) -> AttractionChart {
    let bars = city
        .top_attractions
        .iter()
        .zip(ATTRACTION_SCORES)
        .zip(ATTRACTION_OPACITIES)
        .map(|((name, score), opacity)| AttractionBar {
            label: truncate_label(name, ATTRACTION_LABEL_CHARS),
            score,
            opacity,
            color: hex_with_opacity(accent, opacity)
                .or_else(|_| hex_with_opacity(DEFAULT_ACCENT, opacity))
                .unwrap_or_default(),
        })
        .collect();

    AttractionChart {
        title: "Attraction Popularity Score".to_string(),
        bars,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::tests::{city, styles};
    use crate::data::ContinentStyle;

    fn sample() -> Dataset {
        let mut osaka = city("Osaka", "Asia", 19_000_000);
        osaka.founded = Some("645".into());
        osaka.fun_facts = vec!["Kuidaore means eat until you drop.".into()];
        osaka.top_attractions = vec![
            "Osaka Castle".into(),
            "Dotonbori".into(),
            "Universal Studios Japan Theme Park".into(),
            "Kaiyukan Aquarium".into(),
            "Shitenno-ji".into(),
            "Umeda Sky Building".into(),
        ];
        Dataset::new(
            vec![
                city("Tokyo", "Asia", 37_400_000),
                city("Paris", "Europe", 11_000_000),
                osaka,
                city("Nara", "Asia", 350_000),
            ],
            styles(),
        )
        .unwrap()
    }

    #[test]
    fn test_header_and_population() {
        let ds = sample();
        let view = build_detail(CityId(2), &ds).unwrap();
        assert_eq!(view.header.name, "Osaka");
        assert_eq!(view.header.accent, "#ff6b6b");
        assert_eq!(view.population.display, "19,000,000");
        assert!((view.population.fill_percent - 19.0 / 22.0 * 100.0).abs() < 1e-9);

        let tokyo = build_detail(CityId(0), &ds).unwrap();
        assert_eq!(tokyo.population.fill_percent, 100.0);
    }

    #[test]
    fn test_chips_order_and_defaults() {
        let ds = sample();
        let labels: Vec<&str> = build_detail(CityId(0), &ds)
            .unwrap()
            .chips
            .iter()
            .map(|c| c.label)
            .collect();
        assert_eq!(
            labels,
            vec!["Population", "Language", "Currency", "Timezone", "Founded", "Continent"]
        );

        let tokyo = build_detail(CityId(0), &ds).unwrap();
        assert_eq!(tokyo.chips[0].value, "37.4M");
        assert_eq!(tokyo.chips[4].value, "Ancient");
        let osaka = build_detail(CityId(2), &ds).unwrap();
        assert_eq!(osaka.chips[4].value, "645");
    }

    #[test]
    fn test_comparison_sorted_and_highlighted() {
        let ds = sample();
        let view = build_detail(CityId(2), &ds).unwrap();
        let names: Vec<&str> = view.comparison.bars.iter().map(|b| b.city.as_str()).collect();
        assert_eq!(names, vec!["Nara", "Osaka", "Tokyo"]);

        let highlighted: Vec<&ComparisonBar> =
            view.comparison.bars.iter().filter(|b| b.highlighted).collect();
        assert_eq!(highlighted.len(), 1);
        assert_eq!(highlighted[0].city, "Osaka");
        assert_eq!(highlighted[0].color, "#ff6b6b");
        assert!(view
            .comparison
            .bars
            .iter()
            .filter(|b| !b.highlighted)
            .all(|b| b.color == DIMMED_BAR));
        assert_eq!(view.comparison.title, "Population — Asia");
        assert_eq!(view.comparison.height, 200);
    }

    #[test]
    fn test_attraction_chart_capped_at_five() {
        let view = build_detail(CityId(2), &sample()).unwrap();
        let bars = &view.attractions_chart.bars;
        assert_eq!(bars.len(), 5);
        assert_eq!(
            bars.iter().map(|b| b.score).collect::<Vec<_>>(),
            ATTRACTION_SCORES.to_vec()
        );
        assert_eq!(bars[2].label, "Universal Studios Japa…");
        assert_eq!(bars[0].color, "rgba(255,107,107,0.95)");
        assert!(bars.windows(2).all(|w| w[0].opacity > w[1].opacity));
        // The list itself is never truncated
        assert_eq!(view.attractions.len(), 6);
        assert_eq!(view.attractions[0].marker_color, "#ff6b6b");
    }

    #[test]
    fn test_attraction_chart_short_list() {
        let view = build_detail(CityId(0), &sample()).unwrap();
        assert_eq!(view.attractions_chart.bars.len(), 2);
        assert_eq!(view.attractions_chart.bars[1].score, 88);
    }

    #[test]
    fn test_fun_facts_omitted_when_empty() {
        let ds = sample();
        assert!(build_detail(CityId(0), &ds).unwrap().fun_facts.is_none());
        assert_eq!(build_detail(CityId(2), &ds).unwrap().fun_facts.unwrap().len(), 1);
    }

    #[test]
    fn test_tags_split_and_trimmed() {
        let view = build_detail(CityId(0), &sample()).unwrap();
        assert_eq!(view.tags, vec!["Testing", "Fixtures", "Assertions"]);
    }

    #[test]
    fn test_unstyled_continent_renders_with_default_accent() {
        let ds = Dataset::new(vec![city("Atlantis City", "Atlantis", 100)], styles()).unwrap();
        let view = build_detail(CityId(0), &ds).unwrap();
        assert_eq!(view.header.accent, DEFAULT_ACCENT);
        assert_eq!(view.attractions_chart.bars[0].color, "rgba(0,210,255,0.95)");
    }

    #[test]
    fn test_invalid_style_color_falls_back() {
        let mut table = styles();
        table.push(ContinentStyle {
            name: "Mars".into(),
            color: "crimson".into(),
            emoji: String::new(),
        });
        let ds = Dataset::new(vec![city("Olympus", "Mars", 100)], table).unwrap();
        let view = build_detail(CityId(0), &ds).unwrap();
        assert_eq!(view.header.accent, "crimson");
        assert_eq!(view.attractions_chart.bars[0].color, "rgba(0,210,255,0.95)");
    }

    #[test]
    fn test_unknown_id() {
        assert!(build_detail(CityId(99), &sample()).is_none());
    }
}
