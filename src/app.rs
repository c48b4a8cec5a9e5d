use crate::data::{CityId, Dataset};
use crate::detail::{build_detail, DetailView};
use crate::export::{write_download, Download};
use crate::figure::{build_figure, FigureDescriptor, FigureStyle, MarkerPoint};
use crate::map::{Lod, MapLayers, MapRenderer, MapView};
use crate::state::{cycle_filter, reduce, Event, Transition, ViewState};
use ratatui::layout::Rect;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, error, info};

/// Terminal application state
pub struct App {
    pub dataset: Arc<Dataset>,
    pub style: FigureStyle,
    pub state: ViewState,
    pub figure: FigureDescriptor,
    /// Detail panel content while the panel is open
    pub detail: Option<DetailView>,
    pub view: MapView,
    pub map_renderer: MapRenderer,
    /// Last rendered map frame, also used for picking
    pub layers: MapLayers,
    /// Map area inside its border, in terminal cells
    pub map_area: Rect,
    pub export_dir: PathBuf,
    /// Status bar message, e.g. the last export path
    pub status: Option<String>,
    pub hovered: Option<CityId>,
    /// Current mouse position for the tooltip
    pub mouse_pos: Option<(u16, u16)>,
    /// Last mouse position for drag tracking
    pub last_mouse: Option<(u16, u16)>,
    /// Vertical scroll of the detail panel
    pub detail_scroll: u16,
    pub should_quit: bool,
    dragged: bool,
    dirty: bool,
}

impl App {
    pub fn new(
        dataset: Arc<Dataset>,
        style: FigureStyle,
        map_renderer: MapRenderer,
        export_dir: PathBuf,
        map_area: Rect,
    ) -> Self {
        let state = ViewState::default();
        let figure = build_figure(state.view_mode, &state.continent_filter, &dataset, &style);
        let (w, h) = (map_area.width as usize, map_area.height as usize);
        let mut view = MapView::new(w * 2, h * 4);
        view.apply_projection(&figure.geo.projection);
        let layers = map_renderer.render(w, h, &view, &figure, None);

        Self {
            dataset,
            style,
            state,
            figure,
            detail: None,
            view,
            map_renderer,
            layers,
            map_area,
            export_dir,
            status: None,
            hovered: None,
            mouse_pos: None,
            last_mouse: None,
            detail_scroll: 0,
            should_quit: false,
            dragged: false,
            dirty: false,
        }
    }

    /// Run one event through the reducer and apply its effects
    pub fn dispatch(&mut self, event: Event) {
        let Transition { state, download } = reduce(&self.state, &event, &self.dataset);
        if state != self.state {
            debug!("{event:?} -> {state:?}");
            let reopened = state.panel_visible && state.selected != self.state.selected;
            self.state = state;
            if reopened {
                self.detail_scroll = 0;
            }
            self.rebuild();
        }
        if let Some(download) = download {
            self.save(&download);
        }
    }

    /// Re-derive the figure and detail view from the current state
    fn rebuild(&mut self) {
        self.view.set_mode(self.state.view_mode);
        self.figure = build_figure(
            self.state.view_mode,
            &self.state.continent_filter,
            &self.dataset,
            &self.style,
        );
        self.view.apply_projection(&self.figure.geo.projection);
        self.detail = self
            .state
            .open_city(&self.dataset)
            .and_then(|(id, _)| build_detail(id, &self.dataset));
        if self.hovered.is_some_and(|id| self.figure.point(id).is_none()) {
            self.hovered = None;
        }
        self.dirty = true;
    }

    fn save(&mut self, download: &Download) {
        match write_download(&self.export_dir, download) {
            Ok(path) => {
                info!("exported {}", path.display());
                self.status = Some(format!("Saved {}", path.display()));
            }
            Err(e) => {
                error!("failed to write {}: {e}", download.filename);
                self.status = Some(format!("Export failed: {e}"));
            }
        }
    }

    /// Re-render the map if anything changed since the last frame
    pub fn prepare(&mut self) {
        if !self.dirty {
            return;
        }
        let highlight = self.hovered.or(self.state.selected.filter(|_| self.state.panel_visible));
        self.layers = self.map_renderer.render(
            self.map_area.width as usize,
            self.map_area.height as usize,
            &self.view,
            &self.figure,
            highlight,
        );
        self.dirty = false;
    }

    /// Update the map area when the terminal resizes
    pub fn set_map_area(&mut self, area: Rect) {
        if area != self.map_area {
            self.map_area = area;
            self.view.set_size(area.width as usize * 2, area.height as usize * 4);
            self.dirty = true;
        }
    }

    pub fn pan(&mut self, dx: i32, dy: i32) {
        self.view.pan(dx, dy);
        self.dirty = true;
    }

    pub fn zoom_in(&mut self) {
        self.view.zoom_in();
        self.dirty = true;
    }

    pub fn zoom_out(&mut self) {
        self.view.zoom_out();
        self.dirty = true;
    }

    pub fn zoom_in_at(&mut self, col: u16, row: u16) {
        if let Some((px, py)) = self.to_pixel(col, row) {
            self.view.zoom_in_at(px, py);
            self.dirty = true;
        }
    }

    pub fn zoom_out_at(&mut self, col: u16, row: u16) {
        if let Some((px, py)) = self.to_pixel(col, row) {
            self.view.zoom_out_at(px, py);
            self.dirty = true;
        }
    }

    pub fn reset_view(&mut self) {
        self.view.reset();
        self.dirty = true;
    }

    pub fn cycle_filter(&mut self, forward: bool) {
        let continent = cycle_filter(&self.state.continent_filter, &self.dataset, forward);
        self.dispatch(Event::SetContinentFilter { continent });
    }

    pub fn open(&mut self, id: CityId) {
        self.dispatch(Event::PointClicked {
            payload: Some(id.to_payload()),
        });
    }

    /// Open the detail panel of the hovered city
    pub fn open_hovered(&mut self) {
        if let Some(id) = self.hovered {
            self.open(id);
        }
    }

    /// Move the hover to the next (or previous) city on screen
    pub fn step_hover(&mut self, forward: bool) {
        let visible: Vec<CityId> = self
            .figure
            .points()
            .map(|(_, p)| p.customdata)
            .filter(|id| self.layers.position_of(*id).is_some())
            .collect();
        if visible.is_empty() {
            return;
        }
        let len = visible.len();
        let next = match self.hovered.and_then(|h| visible.iter().position(|id| *id == h)) {
            Some(i) if forward => (i + 1) % len,
            Some(i) => (i + len - 1) % len,
            None if forward => 0,
            None => len - 1,
        };
        self.hovered = Some(visible[next]);
        self.mouse_pos = None;
        self.dirty = true;
    }

    pub fn scroll_detail(&mut self, delta: i16) {
        self.detail_scroll = self.detail_scroll.saturating_add_signed(delta);
    }

    /// Handle mouse drag
    pub fn handle_drag(&mut self, col: u16, row: u16) {
        if let Some((last_col, last_row)) = self.last_mouse {
            let dx = last_col as i32 - col as i32;
            let dy = last_row as i32 - row as i32;
            if dx != 0 || dy != 0 {
                self.dragged = true;
                // Terminal cells are 2x4 braille pixels
                self.pan(dx * 2, dy * 4);
            }
        }
        self.last_mouse = Some((col, row));
    }

    pub fn begin_press(&mut self, col: u16, row: u16) {
        self.last_mouse = Some((col, row));
        self.dragged = false;
    }

    /// Mouse release: a click without drag selects the marker under it
    pub fn end_press(&mut self, col: u16, row: u16) {
        let clicked = !self.dragged;
        self.last_mouse = None;
        self.dragged = false;
        if clicked {
            if let Some(id) = self.pick(col, row) {
                self.open(id);
            }
        }
    }

    /// Update mouse position and hover
    pub fn set_mouse_pos(&mut self, col: u16, row: u16) {
        self.mouse_pos = Some((col, row));
        let hovered = self.pick(col, row);
        if hovered != self.hovered {
            self.hovered = hovered;
            self.dirty = true;
        }
    }

    /// City marker under a terminal cell
    pub fn pick(&self, col: u16, row: u16) -> Option<CityId> {
        let (px, py) = self.to_pixel(col, row)?;
        // Aim at the middle of the 2x4 cell
        self.layers.pick(px + 1, py + 2)
    }

    /// Terminal cell to map braille pixel, `None` outside the map
    fn to_pixel(&self, col: u16, row: u16) -> Option<(i32, i32)> {
        let area = self.map_area;
        if col < area.x || row < area.y || col >= area.right() || row >= area.bottom() {
            return None;
        }
        Some((((col - area.x) as i32) * 2, ((row - area.y) as i32) * 4))
    }

    /// Hover card of the hovered city with its screen cell
    pub fn hover_point(&self) -> Option<(&MarkerPoint, (u16, u16))> {
        let id = self.hovered?;
        let (_, point) = self.figure.point(id)?;
        let (px, py) = self.layers.position_of(id)?;
        let cell = (self.map_area.x + (px / 2) as u16, self.map_area.y + (py / 4) as u16);
        Some((point, cell))
    }

    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    pub fn zoom_level(&self) -> String {
        format!("{:.1}x", self.view.zoom())
    }

    pub fn center_coords(&self) -> String {
        let (lon, lat) = self.view.center();
        format!(
            "{:.1}°{}, {:.1}°{}",
            lat.abs(),
            if lat >= 0.0 { "N" } else { "S" },
            lon.abs(),
            if lon >= 0.0 { "E" } else { "W" }
        )
    }

    pub fn lod_level(&self) -> &'static str {
        Lod::from_zoom(self.view.zoom()).label()
    }

    /// (shown, total) city counts
    pub fn counts(&self) -> (usize, usize) {
        (self.figure.points().count(), self.dataset.len())
    }
}
