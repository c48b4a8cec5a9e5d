use crate::figure::GLOBE_ROTATION;
use glam::DVec3;

const ZOOM_STEP: f64 = 1.5;
const MAX_ZOOM: f64 = 40.0;
/// Share of the shorter canvas side the sphere fills at zoom 1
const FIT: f64 = 0.48;

/// Orthographic projection of a rotating sphere.
/// Orientation is stored as an orthonormal camera basis.
#[derive(Clone, Debug, PartialEq)]
pub struct GlobeViewport {
    /// Points from the globe center toward the camera
    forward: DVec3,
    /// East on screen
    right: DVec3,
    /// North on screen
    up: DVec3,
    /// Sphere radius in braille pixels
    pub radius: f64,
    /// Canvas pixel width
    pub width: usize,
    /// Canvas pixel height
    pub height: usize,
}

impl GlobeViewport {
    /// Globe centered on (lon, lat) with the given radius
    pub fn new(center_lon: f64, center_lat: f64, radius: f64, width: usize, height: usize) -> Self {
        let lon_rad = center_lon.to_radians();
        let lat_rad = center_lat.to_radians();

        let forward = lonlat_to_vec3(center_lon, center_lat);
        // Derivative of forward w.r.t. latitude
        let raw_up = DVec3::new(
            -lat_rad.sin() * lon_rad.cos(),
            -lat_rad.sin() * lon_rad.sin(),
            lat_rad.cos(),
        );
        let right = raw_up.cross(forward).normalize();
        let up = forward.cross(right).normalize();

        Self { forward, right, up, radius, width, height }
    }

    /// Whole globe at the home rotation
    pub fn world(width: usize, height: usize) -> Self {
        Self::new(GLOBE_ROTATION.lon, GLOBE_ROTATION.lat, fit_radius(width, height), width, height)
    }

    /// Turn the camera to face (lon, lat), keeping the zoom
    pub fn look_at(&mut self, lon: f64, lat: f64) {
        *self = Self::new(lon, lat, self.radius, self.width, self.height);
    }

    /// The (lon, lat) the camera looks at
    pub fn center_lonlat(&self) -> (f64, f64) {
        let lat = self.forward.z.clamp(-1.0, 1.0).asin().to_degrees();
        let lon = self.forward.y.atan2(self.forward.x).to_degrees();
        (lon, lat)
    }

    /// Screen center in pixels
    #[inline]
    pub fn center_px(&self) -> (f64, f64) {
        (self.width as f64 / 2.0, self.height as f64 / 2.0)
    }

    /// Project to screen pixels; `None` on the far hemisphere
    pub fn project(&self, lon: f64, lat: f64) -> Option<(i32, i32)> {
        let p = lonlat_to_vec3(lon, lat);
        if p.dot(self.forward) < 0.0 {
            return None;
        }

        let (cx, cy) = self.center_px();
        let px = (cx + p.dot(self.right) * self.radius).round() as i32;
        let py = (cy - p.dot(self.up) * self.radius).round() as i32;
        Some((px, py))
    }

    /// Screen pixels back to (lon, lat); `None` outside the disk
    pub fn unproject(&self, px: i32, py: i32) -> Option<(f64, f64)> {
        let (cx, cy) = self.center_px();
        let sx = (px as f64 - cx) / self.radius;
        let sy = -(py as f64 - cy) / self.radius;

        let r2 = sx * sx + sy * sy;
        if r2 > 1.0 {
            return None;
        }

        let sz = (1.0 - r2).sqrt();
        let p = self.right * sx + self.up * sy + self.forward * sz;
        Some(vec3_to_lonlat(p))
    }

    /// Rotate by a pixel drag delta; positive dx turns the globe toward the east
    pub fn rotate_drag(&mut self, dx: i32, dy: i32) {
        self.turn_east(dx as f64 / self.radius);
        self.turn_north(-(dy as f64) / self.radius);
    }

    fn turn_east(&mut self, angle: f64) {
        if angle.abs() > 1e-10 {
            let (sin_a, cos_a) = angle.sin_cos();
            let forward = self.forward * cos_a + self.right * sin_a;
            let right = self.right * cos_a - self.forward * sin_a;
            self.forward = forward.normalize();
            self.right = right.normalize();
        }
    }

    fn turn_north(&mut self, angle: f64) {
        if angle.abs() > 1e-10 {
            let (sin_a, cos_a) = angle.sin_cos();
            let forward = self.forward * cos_a + self.up * sin_a;
            let up = self.up * cos_a - self.forward * sin_a;
            self.forward = forward.normalize();
            self.up = up.normalize();
        }
    }

    fn min_radius(&self) -> f64 {
        fit_radius(self.width, self.height)
    }

    pub fn zoom_in(&mut self) {
        self.radius = (self.radius * ZOOM_STEP).min(self.min_radius() * MAX_ZOOM);
    }

    pub fn zoom_out(&mut self) {
        self.radius = (self.radius / ZOOM_STEP).max(self.min_radius());
    }

    pub fn zoom_in_at(&mut self, px: i32, py: i32) {
        self.zoom_at(px, py, ZOOM_STEP);
    }

    pub fn zoom_out_at(&mut self, px: i32, py: i32) {
        self.zoom_at(px, py, 1.0 / ZOOM_STEP);
    }

    /// Zoom keeping the point under the cursor approximately fixed
    fn zoom_at(&mut self, px: i32, py: i32, factor: f64) {
        let target = self.unproject(px, py);

        let min_r = self.min_radius();
        self.radius = (self.radius * factor).clamp(min_r, min_r * MAX_ZOOM);

        if let Some((lon, lat)) = target {
            let p = lonlat_to_vec3(lon, lat);
            let (cx, cy) = self.center_px();
            let sx_want = (px as f64 - cx) / self.radius;
            let sy_want = -(py as f64 - cy) / self.radius;
            self.turn_east(p.dot(self.right) - sx_want);
            self.turn_north(p.dot(self.up) - sy_want);
        }
    }

    /// 1.0 when the whole sphere fits the canvas
    pub fn effective_zoom(&self) -> f64 {
        self.radius / self.min_radius()
    }

    /// Resize the canvas, keeping the zoom level
    pub fn set_size(&mut self, width: usize, height: usize) {
        let zoom = self.effective_zoom();
        self.width = width;
        self.height = height;
        self.radius = self.min_radius() * zoom;
    }

    /// Whether a pixel lies on the visible disk
    pub fn on_disk(&self, px: i32, py: i32) -> bool {
        self.unproject(px, py).is_some()
    }
}

fn fit_radius(width: usize, height: usize) -> f64 {
    (width.min(height) as f64 * FIT).max(1.0)
}

/// Convert lon/lat (degrees) to a unit sphere vector
#[inline(always)]
fn lonlat_to_vec3(lon: f64, lat: f64) -> DVec3 {
    let lon_rad = lon.to_radians();
    let lat_rad = lat.to_radians();
    DVec3::new(
        lat_rad.cos() * lon_rad.cos(),
        lat_rad.cos() * lon_rad.sin(),
        lat_rad.sin(),
    )
}

#[inline(always)]
fn vec3_to_lonlat(p: DVec3) -> (f64, f64) {
    let lat = p.z.clamp(-1.0, 1.0).asin().to_degrees();
    let lon = p.y.atan2(p.x).to_degrees();
    (lon, lat)
}
