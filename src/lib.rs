//! fyghi: A Fast, Modular Fengyun-4B GHI Level-1 Decoder
//!
//! This library decodes the Geostationary High-speed Imager Level-1 HDF
//! product into calibrated physical quantities (reflectance, brightness
//! temperature) and derives fixed-grid geostationary area definitions for
//! downstream geolocation and resampling.
//!
//! HDF access itself is delegated to an external loader: the decoder reads
//! arrays and attributes through the [`ArrayStore`] trait and performs a
//! single stateless pass per dataset request.

pub mod core;
pub mod io;
pub mod types;

// Re-export main types and functions for easier access
pub use types::{
    platform_display_name, AttrValue, Calibration, DataArray, DatasetAttrs, DatasetId,
    DatasetInfo, GhiArray, GhiError, GhiResult, OrbitalParameters, ScanDirection,
};

pub use crate::core::area::{
    build_area_definition, resolution_info, AreaDefinition, AreaParams, ResolutionInfo,
    RESOLUTIONS,
};
pub use crate::core::calibrate::{apply_lut, mask_valid_range, scale};
pub use crate::core::geos::{GeosParams, GeosProjection, SweepAxis};
pub use io::{ArrayStore, GhiL1Reader, MemoryStore};
