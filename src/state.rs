//! View-state controller: one explicit state value, updated by a reducer

use crate::data::{CityId, CityRecord, Dataset};
use crate::export::Download;
use crate::figure::{ContinentFilter, ViewMode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error};

/// Session UI state. `panel_visible` implies `selected.is_some()`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ViewState {
    pub view_mode: ViewMode,
    pub continent_filter: ContinentFilter,
    pub selected: Option<CityId>,
    pub panel_visible: bool,
}

impl ViewState {
    /// The city whose panel is currently shown
    pub fn open_city<'a>(&self, dataset: &'a Dataset) -> Option<(CityId, &'a CityRecord)> {
        if !self.panel_visible {
            return None;
        }
        let id = self.selected?;
        dataset.get(id).map(|c| (id, c))
    }
}

/// Discrete user input
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    SelectGlobe,
    SelectFlatMap,
    SetContinentFilter { continent: ContinentFilter },
    /// A map point was clicked; `payload` is the point's opaque customdata
    PointClicked {
        #[serde(default)]
        payload: Option<Value>,
    },
    ClosePanel,
    ExportCity,
    ExportAll,
}

/// Result of applying one event
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub state: ViewState,
    pub download: Option<Download>,
}

impl Transition {
    fn unchanged(state: &ViewState) -> Self {
        Self {
            state: state.clone(),
            download: None,
        }
    }
}

/// Apply `event` to `state`. Invalid input leaves the state unchanged.
pub fn reduce(state: &ViewState, event: &Event, dataset: &Dataset) -> Transition {
    let mut next = state.clone();
    let mut download = None;

    match event {
        Event::SelectGlobe => next.view_mode = ViewMode::Globe,
        Event::SelectFlatMap => next.view_mode = ViewMode::FlatMap,
        Event::SetContinentFilter { continent } => match continent {
            ContinentFilter::Only(name) if !dataset.has_continent(name) => {
                debug!("ignoring filter for unknown continent {name:?}");
                return Transition::unchanged(state);
            }
            _ => next.continent_filter = continent.clone(),
        },
        Event::PointClicked { payload } => {
            let Some(id) = payload.as_ref().and_then(|p| CityId::decode(p, dataset)) else {
                debug!("ignoring click with undecodable payload {payload:?}");
                return Transition::unchanged(state);
            };
            next.selected = Some(id);
            next.panel_visible = true;
        }
        Event::ClosePanel => next.panel_visible = false,
        Event::ExportCity => {
            let Some(city) = state.selected.and_then(|id| dataset.get(id)) else {
                debug!("city export requested with no city selected");
                return Transition::unchanged(state);
            };
            download = Download::for_city(city)
                .map_err(|e| error!("exporting {} failed: {e}", city.name))
                .ok();
        }
        Event::ExportAll => {
            download = Download::for_dataset(dataset)
                .map_err(|e| error!("exporting dataset failed: {e}"))
                .ok();
        }
    }

    Transition { state: next, download }
}

/// One entry of the continent selector
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterOption {
    pub value: ContinentFilter,
    pub label: String,
}

/// `All` followed by every continent present in the dataset
pub fn filter_options(dataset: &Dataset) -> Vec<FilterOption> {
    std::iter::once(FilterOption {
        value: ContinentFilter::All,
        label: "🌐  All".to_string(),
    })
    .chain(dataset.continents_present().into_iter().map(|name| {
        let emoji = dataset.emoji_for(name);
        FilterOption {
            value: ContinentFilter::Only(name.to_string()),
            label: if emoji.is_empty() {
                name.to_string()
            } else {
                format!("{emoji}  {name}")
            },
        }
    }))
    .collect()
}

/// The filter after (or before) `current` in selector order, wrapping
pub fn cycle_filter(current: &ContinentFilter, dataset: &Dataset, forward: bool) -> ContinentFilter {
    let options = filter_options(dataset);
    let pos = options.iter().position(|o| &o.value == current).unwrap_or(0);
    let len = options.len();
    let next = if forward { (pos + 1) % len } else { (pos + len - 1) % len };
    options[next].value.clone()
}
