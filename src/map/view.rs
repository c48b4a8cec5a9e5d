use crate::figure::{Projection, Rotation, ViewMode, GLOBE_ROTATION};
use crate::map::globe::GlobeViewport;
use crate::map::projection::FlatViewport;

/// Camera over both projections. Each keeps its own pan and zoom,
/// so switching modes and back restores the previous framing.
#[derive(Clone, Debug, PartialEq)]
pub struct MapView {
    mode: ViewMode,
    flat: FlatViewport,
    globe: GlobeViewport,
    /// Rotation the globe returns to on reset
    home: Rotation,
}

impl MapView {
    /// Default framing for a canvas of `width` x `height` braille pixels
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            mode: ViewMode::default(),
            flat: FlatViewport::world(width, height),
            globe: GlobeViewport::world(width, height),
            home: GLOBE_ROTATION,
        }
    }

    /// Adopt a figure's projection: the globe's home rotation, or the
    /// latitude band of the flat map. Roll is not supported.
    pub fn apply_projection(&mut self, projection: &Projection) {
        match *projection {
            Projection::Orthographic { rotation } => {
                if rotation != self.home {
                    self.home = rotation;
                    self.globe.look_at(rotation.lon, rotation.lat);
                }
            }
            Projection::Equirectangular { lat_range, .. } => self.flat.set_lat_range(lat_range),
        }
    }

    pub fn mode(&self) -> ViewMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: ViewMode) {
        self.mode = mode;
    }

    /// Back to the home framing of both projections
    pub fn reset(&mut self) {
        let (w, h) = self.size();
        let lat_range = self.flat.lat_range();
        let home = self.home;
        *self = Self {
            mode: self.mode,
            home,
            ..Self::new(w, h)
        };
        self.flat.set_lat_range(lat_range);
        self.globe.look_at(home.lon, home.lat);
    }

    pub fn size(&self) -> (usize, usize) {
        (self.flat.width, self.flat.height)
    }

    pub fn set_size(&mut self, width: usize, height: usize) {
        if self.size() != (width, height) {
            self.flat.set_size(width, height);
            self.globe.set_size(width, height);
        }
    }

    /// (lon, lat) to pixels; `None` when hidden behind the globe
    #[inline]
    pub fn project(&self, lon: f64, lat: f64) -> Option<(i32, i32)> {
        match self.mode {
            ViewMode::FlatMap => Some(self.flat.project(lon, lat)),
            ViewMode::Globe => self.globe.project(lon, lat),
        }
    }

    /// Pixels to (lon, lat); `None` off the globe disk
    pub fn unproject(&self, px: i32, py: i32) -> Option<(f64, f64)> {
        match self.mode {
            ViewMode::FlatMap => Some(self.flat.unproject(px, py)),
            ViewMode::Globe => self.globe.unproject(px, py),
        }
    }

    /// Pan the flat map or rotate the globe by a pixel delta
    pub fn pan(&mut self, dx: i32, dy: i32) {
        match self.mode {
            ViewMode::FlatMap => self.flat.pan(dx, dy),
            ViewMode::Globe => self.globe.rotate_drag(dx, dy),
        }
    }

    pub fn zoom_in(&mut self) {
        match self.mode {
            ViewMode::FlatMap => self.flat.zoom_in(),
            ViewMode::Globe => self.globe.zoom_in(),
        }
    }

    pub fn zoom_out(&mut self) {
        match self.mode {
            ViewMode::FlatMap => self.flat.zoom_out(),
            ViewMode::Globe => self.globe.zoom_out(),
        }
    }

    pub fn zoom_in_at(&mut self, px: i32, py: i32) {
        match self.mode {
            ViewMode::FlatMap => self.flat.zoom_in_at(px, py),
            ViewMode::Globe => self.globe.zoom_in_at(px, py),
        }
    }

    pub fn zoom_out_at(&mut self, px: i32, py: i32) {
        match self.mode {
            ViewMode::FlatMap => self.flat.zoom_out_at(px, py),
            ViewMode::Globe => self.globe.zoom_out_at(px, py),
        }
    }

    /// 1.0 at the whole-world framing of either projection
    pub fn zoom(&self) -> f64 {
        match self.mode {
            ViewMode::FlatMap => self.flat.zoom,
            ViewMode::Globe => self.globe.effective_zoom(),
        }
    }

    /// (lon, lat) at the middle of the canvas
    pub fn center(&self) -> (f64, f64) {
        match self.mode {
            ViewMode::FlatMap => (self.flat.center_lon, self.flat.center_lat),
            ViewMode::Globe => self.globe.center_lonlat(),
        }
    }

    pub fn flat(&self) -> &FlatViewport {
        &self.flat
    }

    pub fn globe(&self) -> &GlobeViewport {
        &self.globe
    }
}
