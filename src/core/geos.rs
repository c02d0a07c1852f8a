//! Forward geostationary (`geos`) projection.
//!
//! Maps geodetic longitude/latitude to fixed-grid coordinates in projected
//! meters for a satellite at a given sub-satellite longitude and height.
//!
//! Reference: Coordination Group for Meteorological Satellites LRIT/HRIT
//! Global Specification (CGMS 03, v2.8).

use serde::{Deserialize, Serialize};
use std::f64::consts::{PI, TAU};

/// Sweep-angle axis convention ("x" for GOES-R/FY-4, "y" for Meteosat)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SweepAxis {
    X,
    Y,
}

/// Parameters of the `geos` projection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeosParams {
    /// Semi-major axis (m)
    pub semi_major_axis: f64,
    /// Inverse flattening; the working polar radius is `a * (1 - 1/rf)`
    pub inverse_flattening: f64,
    /// Satellite height above the ellipsoid surface (m)
    pub satellite_height: f64,
    /// Sub-satellite longitude (degrees east)
    pub ssp_lon: f64,
    pub sweep: SweepAxis,
}

/// Forward `geos` projection over a reference ellipsoid.
///
/// Normalized satellite geometry is precomputed once; `project` is then a
/// handful of trig operations per point.
#[derive(Debug, Clone)]
pub struct GeosProjection {
    semi_major_axis: f64,
    lon_0: f64,
    sweep_x: bool,
    /// Normalized polar radius b/a and its square
    radius_p: f64,
    radius_p2: f64,
    radius_p_inv2: f64,
    /// Satellite distance from Earth center in units of a
    radius_g: f64,
    radius_g_1: f64,
}

impl GeosProjection {
    pub fn new(params: &GeosParams) -> Self {
        let a = params.semi_major_axis;
        let b = a * (1.0 - 1.0 / params.inverse_flattening);
        let radius_p = b / a;
        let radius_g_1 = params.satellite_height / a;
        Self {
            semi_major_axis: a,
            lon_0: params.ssp_lon.to_radians(),
            sweep_x: params.sweep == SweepAxis::X,
            radius_p,
            radius_p2: radius_p * radius_p,
            radius_p_inv2: 1.0 / (radius_p * radius_p),
            radius_g: 1.0 + radius_g_1,
            radius_g_1,
        }
    }

    /// Project a geodetic point to fixed-grid coordinates in meters.
    ///
    /// Returns `None` when the point is behind Earth's limb as seen from the
    /// satellite.
    pub fn project(&self, lon_deg: f64, lat_deg: f64) -> Option<(f64, f64)> {
        let lam = wrap_longitude(lon_deg.to_radians() - self.lon_0);
        let lat = lat_deg.to_radians();

        // Geocentric latitude and normalized surface radius
        let phi = (self.radius_p2 * lat.tan()).atan();
        let r = self.radius_p / (self.radius_p * phi.cos()).hypot(phi.sin());

        // View vector from Earth center, satellite on the +x axis
        let vx = r * lam.cos() * phi.cos();
        let vy = r * lam.sin() * phi.cos();
        let vz = r * phi.sin();

        let tmp = self.radius_g - vx;
        if tmp * vx - vy * vy - vz * vz * self.radius_p_inv2 < 0.0 {
            return None;
        }

        let (x, y) = if self.sweep_x {
            (
                self.radius_g_1 * (vy / tmp.hypot(vz)).atan(),
                self.radius_g_1 * (vz / tmp).atan(),
            )
        } else {
            (
                self.radius_g_1 * (vy / tmp).atan(),
                self.radius_g_1 * (vz / tmp.hypot(vy)).atan(),
            )
        };

        Some((x * self.semi_major_axis, y * self.semi_major_axis))
    }
}

fn wrap_longitude(lam: f64) -> f64 {
    (lam + PI).rem_euclid(TAU) - PI
}
