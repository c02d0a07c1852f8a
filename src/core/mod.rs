//! Core calibration and geolocation modules

pub mod area;
pub mod calibrate;
pub mod geos;

// Re-export main types
pub use area::{build_area_definition, resolution_info, AreaDefinition, AreaParams, ResolutionInfo, RESOLUTIONS};
pub use calibrate::{apply_lut, mask_valid_range, scale};
pub use geos::{GeosParams, GeosProjection, SweepAxis};
