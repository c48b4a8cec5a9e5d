use crate::figure::FLAT_LAT_RANGE;

const MIN_ZOOM: f64 = 1.0;
const MAX_ZOOM: f64 = 40.0;
const ZOOM_STEP: f64 = 1.5;

/// Flat world map using an equirectangular projection
#[derive(Clone, Debug, PartialEq)]
pub struct FlatViewport {
    /// Center longitude (-180 to 180)
    pub center_lon: f64,
    /// Center latitude, within `lat_range`
    pub center_lat: f64,
    /// 1.0 fits all 360° of longitude across the canvas
    pub zoom: f64,
    /// Canvas pixel width
    pub width: usize,
    /// Canvas pixel height
    pub height: usize,
    /// Southern and northern edge of the map
    lat_range: [f64; 2],
}

impl FlatViewport {
    pub fn new(center_lon: f64, center_lat: f64, zoom: f64, width: usize, height: usize) -> Self {
        let mut vp = Self {
            center_lon,
            center_lat,
            zoom: zoom.clamp(MIN_ZOOM, MAX_ZOOM),
            width,
            height,
            lat_range: FLAT_LAT_RANGE,
        };
        vp.normalize();
        vp
    }

    /// Whole-world view
    pub fn world(width: usize, height: usize) -> Self {
        Self::new(0.0, 0.0, 1.0, width, height)
    }

    /// Pixels per degree
    #[inline]
    fn scale(&self) -> f64 {
        self.zoom * self.width.max(1) as f64 / 360.0
    }

    fn normalize(&mut self) {
        self.center_lon = wrap_lon(self.center_lon);
        self.center_lat = self.clamp_lat(self.center_lat);
    }

    #[inline]
    fn clamp_lat(&self, lat: f64) -> f64 {
        lat.clamp(self.lat_range[0], self.lat_range[1])
    }

    pub fn lat_range(&self) -> [f64; 2] {
        self.lat_range
    }

    /// Limit the map to a latitude band; non-finite or empty bands are ignored
    pub fn set_lat_range(&mut self, range: [f64; 2]) {
        let [a, b] = range;
        if !a.is_finite() || !b.is_finite() || a == b {
            return;
        }
        self.lat_range = [a.min(b).max(-90.0), a.max(b).min(90.0)];
        self.normalize();
    }

    /// Pan by a pixel delta
    pub fn pan(&mut self, dx: i32, dy: i32) {
        let scale = self.scale();
        self.center_lon += dx as f64 / scale;
        self.center_lat -= dy as f64 / scale;
        self.normalize();
    }

    pub fn zoom_in(&mut self) {
        self.zoom = (self.zoom * ZOOM_STEP).min(MAX_ZOOM);
    }

    pub fn zoom_out(&mut self) {
        self.zoom = (self.zoom / ZOOM_STEP).max(MIN_ZOOM);
    }

    pub fn zoom_in_at(&mut self, px: i32, py: i32) {
        self.zoom_at(px, py, ZOOM_STEP);
    }

    pub fn zoom_out_at(&mut self, px: i32, py: i32) {
        self.zoom_at(px, py, 1.0 / ZOOM_STEP);
    }

    /// Zoom keeping the point under the cursor fixed
    fn zoom_at(&mut self, px: i32, py: i32, factor: f64) {
        let (lon, lat) = self.unproject(px, py);
        self.zoom = (self.zoom * factor).clamp(MIN_ZOOM, MAX_ZOOM);
        let (new_px, new_py) = self.project(lon, lat);
        self.pan(new_px - px, new_py - py);
    }

    /// Geographic (lon, lat) to pixel coordinates
    pub fn project(&self, lon: f64, lat: f64) -> (i32, i32) {
        let scale = self.scale();
        let dlon = wrap_lon(lon - self.center_lon);
        let dlat = self.clamp_lat(lat) - self.center_lat;
        let px = (self.width as f64 / 2.0 + dlon * scale).round() as i32;
        let py = (self.height as f64 / 2.0 - dlat * scale).round() as i32;
        (px, py)
    }

    /// Pixel coordinates back to (lon, lat)
    pub fn unproject(&self, px: i32, py: i32) -> (f64, f64) {
        let scale = self.scale();
        let lon = self.center_lon + (px as f64 - self.width as f64 / 2.0) / scale;
        let lat = self.center_lat - (py as f64 - self.height as f64 / 2.0) / scale;
        (wrap_lon(lon), self.clamp_lat(lat))
    }

    pub fn set_size(&mut self, width: usize, height: usize) {
        self.width = width;
        self.height = height;
    }
}

/// Wrap a longitude into [-180, 180)
#[inline]
pub fn wrap_lon(lon: f64) -> f64 {
    (lon + 180.0).rem_euclid(360.0) - 180.0
}
