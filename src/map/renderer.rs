use crate::braille::BrailleCanvas;
use crate::data::CityId;
use crate::figure::{FigureDescriptor, Projection};
use crate::map::geometry::{draw_circle, draw_line, draw_ring};
use crate::map::spatial::SpatialGrid;
use crate::map::view::MapView;
use rayon::prelude::*;

/// A geographic line (sequence of lon/lat coordinates)
pub type LineString = Vec<(f64, f64)>;

/// Projected segment (x0, y0, x1, y1) in braille pixels
type Segment = (i32, i32, i32, i32);

/// Zoom at which every marker gets a name label
const LABEL_ZOOM: f64 = 2.0;
/// Extra pixels around a marker that still count as a hit
const PICK_SLOP: i32 = 3;

/// Level of detail for backdrop data
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Lod {
    Low,    // 110m - world view
    Medium, // 50m - continental
    High,   // 10m - regional
}

impl Lod {
    pub fn from_zoom(zoom: f64) -> Self {
        if zoom < 2.0 {
            Lod::Low
        } else if zoom < 8.0 {
            Lod::Medium
        } else {
            Lod::High
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Lod::Low => "110m",
            Lod::Medium => "50m",
            Lod::High => "10m",
        }
    }
}

/// A canvas drawn in one color
#[derive(Clone)]
pub struct ColoredCanvas {
    pub canvas: BrailleCanvas,
    /// `#rrggbb` or `rgba(..)`
    pub color: String,
}

/// Everything one frame of the map needs, back to front
pub struct MapLayers {
    pub coastlines: BrailleCanvas,
    pub borders: BrailleCanvas,
    /// Globe limb, or the latitude limits of the flat map
    pub outline: BrailleCanvas,
    pub halos: Vec<ColoredCanvas>,
    pub markers: Vec<ColoredCanvas>,
    /// Ring around the hovered or selected city
    pub highlight: BrailleCanvas,
    /// (column, row, text) in character cells
    pub labels: Vec<(u16, u16, String)>,
    /// Marker hit targets in braille pixels
    pub picks: SpatialGrid<(CityId, i32)>,
}

impl MapLayers {
    /// City whose marker covers the pixel, nearest first
    pub fn pick(&self, px: i32, py: i32) -> Option<CityId> {
        let (&(id, radius), dist) = self.picks.nearest(px, py, MAX_MARKER_RADIUS + PICK_SLOP)?;
        (dist <= f64::from(radius)).then_some(id)
    }

    /// Pixel position of a plotted city
    pub fn position_of(&self, id: CityId) -> Option<(i32, i32)> {
        self.picks.position_of(|(other, _)| *other == id)
    }
}

const MAX_MARKER_RADIUS: i32 = 8;

/// Map renderer with multi-resolution backdrop data
#[derive(Default)]
pub struct MapRenderer {
    pub coastlines_low: Vec<LineString>,
    pub coastlines_medium: Vec<LineString>,
    pub coastlines_high: Vec<LineString>,
    pub borders_medium: Vec<LineString>,
    pub borders_high: Vec<LineString>,
}

impl MapRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Most detailed coastlines at or below `lod`
    fn coastlines(&self, lod: Lod) -> &[LineString] {
        let by_detail = [&self.coastlines_high, &self.coastlines_medium, &self.coastlines_low];
        let start = match lod {
            Lod::High => 0,
            Lod::Medium => 1,
            Lod::Low => 2,
        };
        by_detail[start..]
            .iter()
            .copied()
            .find(|c| !c.is_empty())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Borders are only drawn once zoomed past the world view
    fn borders(&self, lod: Lod) -> &[LineString] {
        match lod {
            Lod::Low => &[],
            Lod::Medium => &self.borders_medium,
            Lod::High if self.borders_high.is_empty() => &self.borders_medium,
            Lod::High => &self.borders_high,
        }
    }

    /// Render the backdrop and the figure's markers on a `width` x `height` character grid
    pub fn render(
        &self,
        width: usize,
        height: usize,
        view: &MapView,
        figure: &FigureDescriptor,
        highlight: Option<CityId>,
    ) -> MapLayers {
        let zoom = view.zoom();
        let lod = Lod::from_zoom(zoom);

        let mut coastlines = BrailleCanvas::new(width, height);
        for (x0, y0, x1, y1) in project_lines(self.coastlines(lod), view) {
            draw_line(&mut coastlines, x0, y0, x1, y1);
        }

        let mut borders = BrailleCanvas::new(width, height);
        for (x0, y0, x1, y1) in project_lines(self.borders(lod), view) {
            draw_line(&mut borders, x0, y0, x1, y1);
        }

        let mut layers = MapLayers {
            coastlines,
            borders,
            outline: outline(width, height, view, &figure.geo.projection),
            halos: Vec::new(),
            markers: Vec::new(),
            highlight: BrailleCanvas::new(width, height),
            labels: Vec::new(),
            picks: SpatialGrid::default(),
        };
        self.render_markers(&mut layers, view, figure, highlight);
        layers
    }

    fn render_markers(
        &self,
        layers: &mut MapLayers,
        view: &MapView,
        figure: &FigureDescriptor,
        highlight: Option<CityId>,
    ) {
        let (width, height) = (layers.coastlines.width(), layers.coastlines.height());
        let zoom = view.zoom();

        for layer in &figure.layers {
            let mut markers = BrailleCanvas::new(width, height);
            let mut halos = BrailleCanvas::new(width, height);

            for point in &layer.points {
                let Some((px, py)) = view.project(point.lon, point.lat) else {
                    continue;
                };
                if !on_canvas(px, py, &markers) {
                    continue;
                }

                let radius = marker_radius(point.size, zoom);
                if let Some(halo) = &layer.halo {
                    let halo_radius = (radius as f64 * halo.size_multiplier).round() as i32;
                    draw_circle(&mut halos, px, py, halo_radius);
                }
                draw_circle(&mut markers, px, py, radius);
                layers.picks.insert(px, py, (point.customdata, radius + PICK_SLOP));

                let highlighted = highlight == Some(point.customdata);
                if highlighted {
                    draw_ring(&mut layers.highlight, px, py, radius + 2);
                }
                if (highlighted || zoom >= LABEL_ZOOM) && px >= 0 && py >= 0 {
                    let col = (px / 2) as u16;
                    let row = (py / 4) as u16;
                    if let Some(label_col) = col.checked_add(2) {
                        layers.labels.push((label_col, row, point.name.clone()));
                    }
                }
            }

            if let Some(halo) = &layer.halo {
                layers.halos.push(ColoredCanvas {
                    canvas: halos,
                    color: halo.color.clone(),
                });
            }
            layers.markers.push(ColoredCanvas {
                canvas: markers,
                color: layer.color.clone(),
            });
        }
    }

    pub fn add_coastline(&mut self, line: LineString, lod: Lod) {
        match lod {
            Lod::Low => self.coastlines_low.push(line),
            Lod::Medium => self.coastlines_medium.push(line),
            Lod::High => self.coastlines_high.push(line),
        }
    }

    pub fn add_border(&mut self, line: LineString, lod: Lod) {
        match lod {
            Lod::High => self.borders_high.push(line),
            Lod::Low | Lod::Medium => self.borders_medium.push(line),
        }
    }

    pub fn has_data(&self) -> bool {
        !self.coastlines_low.is_empty()
            || !self.coastlines_medium.is_empty()
            || !self.coastlines_high.is_empty()
    }
}

/// Braille-pixel radius of a marker of the given figure size
pub fn marker_radius(size: f64, zoom: f64) -> i32 {
    let scaled = size / 6.0 * zoom.sqrt().min(2.0);
    (scaled.round() as i32).clamp(1, MAX_MARKER_RADIUS)
}

fn on_canvas(px: i32, py: i32, canvas: &BrailleCanvas) -> bool {
    px >= 0 && py >= 0 && (px as usize) < canvas.pixel_width() && (py as usize) < canvas.pixel_height()
}

/// Project every line in parallel, keeping the drawable segments
fn project_lines(lines: &[LineString], view: &MapView) -> Vec<Segment> {
    lines
        .par_iter()
        .flat_map_iter(|line| project_line(line, view))
        .collect()
}

fn project_line(line: &LineString, view: &MapView) -> Vec<Segment> {
    let (width, height) = view.size();
    let mut segments = Vec::new();
    let mut prev: Option<(i32, i32)> = None;

    for &(lon, lat) in line {
        let Some((px, py)) = view.project(lon, lat) else {
            prev = None;
            continue;
        };
        if let Some((x0, y0)) = prev {
            // Long jumps are antimeridian wraps on the flat map
            let dist = ((px - x0).abs() + (py - y0).abs()) as usize;
            if dist < width.max(1) / 2 && segment_might_be_visible((x0, y0), (px, py), width, height) {
                segments.push((x0, y0, px, py));
            }
        }
        prev = Some((px, py));
    }
    segments
}

fn segment_might_be_visible(p1: (i32, i32), p2: (i32, i32), width: usize, height: usize) -> bool {
    p1.0.max(p2.0) >= 0
        && p1.0.min(p2.0) < width as i32
        && p1.1.max(p2.1) >= 0
        && p1.1.min(p2.1) < height as i32
}

/// Edge of the figure's projection: the globe limb, or the top and
/// bottom of the flat map's latitude band
fn outline(width: usize, height: usize, view: &MapView, projection: &Projection) -> BrailleCanvas {
    let mut canvas = BrailleCanvas::new(width, height);
    match projection {
        Projection::Orthographic { .. } => {
            let globe = view.globe();
            let (cx, cy) = globe.center_px();
            draw_ring(&mut canvas, cx.round() as i32, cy.round() as i32, globe.radius.round() as i32);
        }
        Projection::Equirectangular { lat_range, .. } => {
            let flat = view.flat();
            let right = canvas.pixel_width() as i32 - 1;
            for &lat in lat_range {
                let (_, y) = flat.project(flat.center_lon, lat);
                draw_line(&mut canvas, 0, y, right, y);
            }
        }
    }
    canvas
}
