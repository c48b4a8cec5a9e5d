mod geometry;
mod globe;
mod projection;
mod renderer;
mod spatial;
mod view;

pub use globe::GlobeViewport;
pub use projection::{wrap_lon, FlatViewport};
pub use renderer::{marker_radius, ColoredCanvas, LineString, Lod, MapLayers, MapRenderer};
pub use spatial::SpatialGrid;
pub use view::MapView;
