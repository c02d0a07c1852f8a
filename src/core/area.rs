//! Fixed-grid area parameters and area-definition construction.
//!
//! The imager's fixed grid is described per nominal ground resolution by a
//! row of `RESOLUTIONS`; one table keyed by resolution keeps the offset and
//! scale factors from drifting apart.

use crate::core::geos::{GeosParams, SweepAxis};
use crate::types::{GhiError, GhiResult, ScanDirection};
use serde::{Deserialize, Serialize};

/// Fixed-grid constants for one nominal ground resolution
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResolutionInfo {
    /// Nominal ground resolution (m)
    pub resolution: u32,
    /// Column offset (pixels)
    pub coff: f64,
    /// Column scaling factor
    pub cfac: f64,
    /// Line offset (pixels)
    pub loff: f64,
    /// Line scaling factor
    pub lfac: f64,
    /// Full-disk line count
    pub nlines: f64,
    /// Full-disk column count
    pub ncols: f64,
}

/// Fixed-grid constants for the four supported resolutions
pub const RESOLUTIONS: [ResolutionInfo; 4] = [
    ResolutionInfo {
        resolution: 250,
        coff: 21982.5,
        cfac: 163730198.0,
        loff: 21982.5,
        lfac: 163730198.0,
        nlines: 21980.0,
        ncols: 21980.0,
    },
    ResolutionInfo {
        resolution: 500,
        coff: 10991.5,
        cfac: 81865099.0,
        loff: 10991.5,
        lfac: 81865099.0,
        nlines: 10990.0,
        ncols: 10990.0,
    },
    ResolutionInfo {
        resolution: 1000,
        coff: 5495.5,
        cfac: 40932549.0,
        loff: 5495.5,
        lfac: 40932549.0,
        nlines: 5495.0,
        ncols: 5495.0,
    },
    ResolutionInfo {
        resolution: 2000,
        coff: 2747.5,
        cfac: 20466274.0,
        loff: 2747.5,
        lfac: 20466274.0,
        nlines: 2747.5,
        ncols: 2747.5,
    },
];

/// Look up the fixed-grid constants for a nominal resolution in meters.
pub fn resolution_info(resolution: u32) -> GhiResult<&'static ResolutionInfo> {
    RESOLUTIONS
        .iter()
        .find(|r| r.resolution == resolution)
        .ok_or(GhiError::UnsupportedResolution(resolution))
}

/// Scalar bundle describing one fixed-grid area
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AreaParams {
    pub area_id: String,
    pub description: String,
    pub proj_id: String,
    pub coff: f64,
    pub loff: f64,
    pub cfac: f64,
    pub lfac: f64,
    /// Ellipsoid semi-major axis (m)
    pub semi_major_axis: f64,
    /// Ellipsoid semi-minor axis (m)
    pub semi_minor_axis: f64,
    /// Satellite height above the ellipsoid surface (m)
    pub satellite_height: f64,
    /// Sub-satellite longitude (degrees east)
    pub ssp_lon: f64,
    pub nlines: usize,
    pub ncols: usize,
    /// Column sampling angle (radians)
    pub col_step_ang: f64,
    /// Line stepping angle (radians)
    pub line_step_ang: f64,
    pub scan_direction: ScanDirection,
}

impl AreaParams {
    /// Projection parameters for this grid's `geos` coordinate system.
    pub fn proj_params(&self) -> GeosParams {
        GeosParams {
            semi_major_axis: self.semi_major_axis,
            inverse_flattening: 1.0 / (self.semi_major_axis / self.semi_minor_axis - 1.0),
            satellite_height: self.satellite_height,
            ssp_lon: self.ssp_lon,
            sweep: SweepAxis::X,
        }
    }
}

/// Area descriptor handed to downstream geolocation/resampling consumers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AreaDefinition {
    pub area_id: String,
    pub description: String,
    pub proj_id: String,
    pub projection: GeosParams,
    pub width: usize,
    pub height: usize,
    /// (lower-left x, lower-left y, upper-right x, upper-right y) in projected meters
    pub area_extent: (f64, f64, f64, f64),
}

/// Construct an area definition from a parameter bundle and a projected extent.
pub fn build_area_definition(params: &AreaParams, area_extent: (f64, f64, f64, f64)) -> AreaDefinition {
    AreaDefinition {
        area_id: params.area_id.clone(),
        description: params.description.clone(),
        proj_id: params.proj_id.clone(),
        projection: params.proj_params(),
        width: params.ncols,
        height: params.nlines,
        area_extent,
    }
}
