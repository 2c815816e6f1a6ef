pub mod category;
pub mod confidence;
pub mod error;
pub mod geometry;
pub mod model;
pub mod raster;
