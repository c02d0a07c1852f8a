//! File handler for the GHI Level-1 HDF product.
//!
//! Ties calibration, metadata adjustment, and area derivation together per
//! requested dataset. Each call is independent and side-effect free on
//! shared state; the handler holds nothing but the store and the product's
//! observation type.

use crate::core::area::{build_area_definition, resolution_info, AreaDefinition, AreaParams};
use crate::core::calibrate::{apply_lut, mask_valid_range, scale};
use crate::core::geos::GeosProjection;
use crate::io::store::{ArrayStore, ATTR_PREFIX};
use crate::types::{
    platform_display_name, AttrValue, Calibration, DataArray, DatasetId, DatasetInfo, GhiError,
    GhiResult, OrbitalParameters, ScanDirection,
};
use chrono::{DateTime, NaiveDateTime, Utc};
use regex::Regex;

/// Substring of storage keys holding image channels
pub const CHANS_ID: &str = "NOMChannel";
/// Substring of storage keys holding satellite navigation angles
pub const SAT_ID: &str = "NOMSatellite";
/// Substring of storage keys holding solar navigation angles
pub const SUN_ID: &str = "NOMSun";

/// Storage key of the per-channel scale/offset table
const CAL_COEF_KEY: &str = "Calibration/CALIBRATION_COEF(SCALE+OFFSET)";

/// Channels imaged at 250 m nominal resolution
const B250_CHANNELS: [&str; 1] = ["C01"];
/// Channels imaged at 500 m nominal resolution; everything else is 2 km
const B500_CHANNELS: [&str; 5] = ["C02", "C03", "C04", "C05", "C06"];

/// Level-1 file handler over an [`ArrayStore`].
pub struct GhiL1Reader<S> {
    store: S,
    /// Observation type from the product filename, e.g. `REGC`
    observation_type: String,
}

impl<S: ArrayStore> GhiL1Reader<S> {
    pub fn new(store: S, observation_type: impl Into<String>) -> Self {
        Self {
            store,
            observation_type: observation_type.into(),
        }
    }

    /// Load one dataset: fetch, calibrate, annotate.
    ///
    /// Returns the calibrated array together with a fresh descriptor whose
    /// `valid_range` reflects the calibrated quantity.
    pub fn get_dataset(
        &self,
        dataset_id: &DatasetId,
        ds_info: &DatasetInfo,
    ) -> GhiResult<(DataArray, DatasetInfo)> {
        let ds_name = &dataset_id.name;
        log::debug!("Reading in get_dataset {}.", ds_name);

        let file_key = resolve_file_key(ds_info);
        let mut data = self.store.array(&file_key)?;
        if data.ndim() >= 2 {
            data.rename_to_yx();
        }

        let (mut data, info) = self.calibrate(data, ds_info, ds_name, &file_key)?;
        self.adjust_attrs(&mut data, &info)?;

        Ok((data, info))
    }

    /// Derive the fixed-grid area definition for a requested resolution.
    pub fn get_area_def(&self, dataset_id: &DatasetId) -> GhiResult<AreaDefinition> {
        let res = resolution_info(dataset_id.resolution)?;

        let c_lats = self.file_attr_f64_array("Corner-Point Latitudes")?;
        let c_lons = self.file_attr_f64_array("Corner-Point Longitudes")?;
        if c_lats.len() < 4 || c_lons.len() < 4 {
            return Err(GhiError::InvalidFormat(
                "expected four corner-point coordinate pairs".to_string(),
            ));
        }

        let band = resolution_band(&dataset_id.name);
        let params = AreaParams {
            area_id: format!("{}_{}", self.observation_type, band),
            description: format!("AGRI {} area", self.observation_type),
            proj_id: format!("FY-4A, {}", band),
            coff: res.coff,
            loff: -res.loff,
            cfac: res.cfac,
            lfac: res.lfac,
            semi_major_axis: self.file_attr_f64("Semi_major_axis")? * 1e3,
            semi_minor_axis: self.file_attr_f64("Semi_minor_axis")? * 1e3,
            satellite_height: self.file_attr_f64("NOMSatHeight")? * 1e3,
            ssp_lon: self.file_attr_f64("NOMSubSatLon")?,
            nlines: self.file_attr_f64("RegLength")? as usize,
            ncols: self.file_attr_f64("RegWidth")? as usize,
            col_step_ang: self.file_attr_f64("dSamplingAngle")? * 1e-6,
            line_step_ang: self.file_attr_f64("dSteppingAngle")? * 1e-6,
            scan_direction: ScanDirection::NorthToSouth,
        };

        let proj = GeosProjection::new(&params.proj_params());
        let mut xs = [0.0_f64; 4];
        let mut ys = [0.0_f64; 4];
        for i in 0..4 {
            let (x, y) = proj.project(c_lons[i], c_lats[i]).ok_or_else(|| {
                GhiError::Projection(format!(
                    "corner point ({}, {}) is not visible from the satellite",
                    c_lons[i], c_lats[i]
                ))
            })?;
            xs[i] = x;
            ys[i] = y;
        }

        // The extent pairs corners 2 and 3 diagonally; this exact combination
        // keeps the area aligned with the reference grid
        let extent = (xs[2], ys[3], xs[3], ys[2]);
        Ok(build_area_definition(&params, extent))
    }

    /// Observation start, from the file's date/time attributes.
    pub fn start_time(&self) -> GhiResult<DateTime<Utc>> {
        let date = self.file_attr_str("Observing Beginning Date")?;
        let time = self.file_attr_str("Observing Beginning Time")?;
        parse_observation_timestamp(&format!("{}T{}Z", date, time))
    }

    /// Observation end, from the file's date/time attributes.
    pub fn end_time(&self) -> GhiResult<DateTime<Utc>> {
        let date = self.file_attr_str("Observing Ending Date")?;
        let time = self.file_attr_str("Observing Ending Time")?;
        parse_observation_timestamp(&format!("{}T{}Z", date, time))
    }

    /// Dispatch on the declared calibration kind, then mask to the valid range.
    fn calibrate(
        &self,
        data: DataArray,
        ds_info: &DatasetInfo,
        ds_name: &str,
        file_key: &str,
    ) -> GhiResult<(DataArray, DatasetInfo)> {
        let mut info = ds_info.clone();
        let mut data = data;

        match info.calibration {
            // No calibration declared or raw counts: pass through
            None | Some(Calibration::Counts) => {
                data.attrs.units = Some(info.units.clone());
                let raw_range = data.attrs.valid_range.ok_or_else(|| {
                    GhiError::MissingAttribute(format!("valid_range on {}", file_key))
                })?;
                info.valid_range = Some(raw_range);
            }
            Some(Calibration::Reflectance) => {
                let channel_index = channel_index_from_key(file_key)?;
                data = self.calibrate_to_reflectance(data, channel_index, &mut info)?;
            }
            Some(Calibration::BrightnessTemperature) => {
                data = self.calibrate_to_bt(data, &mut info, ds_name)?;
            }
            Some(Calibration::Radiance) => {
                return Err(GhiError::UnsupportedCalibration("radiance".to_string()));
            }
        }

        // Apply range limits, but not for counts or we convert to float
        if info.calibration == Some(Calibration::Counts) {
            let fill = data
                .attrs
                .extra
                .get("FillValue")
                .and_then(AttrValue::as_f64)
                .ok_or_else(|| {
                    GhiError::MissingAttribute(format!("FillValue on {}", file_key))
                })?;
            data.attrs.fill_value = Some(fill);
        } else {
            let valid_range = info.valid_range.ok_or_else(|| {
                GhiError::MissingAttribute(format!("valid_range on {}", file_key))
            })?;
            mask_valid_range(&mut data, valid_range);
            data.attrs.valid_range = Some(valid_range);
        }

        Ok((data, info))
    }

    /// Calibrate to reflectance [%].
    fn calibrate_to_reflectance(
        &self,
        data: DataArray,
        channel_index: usize,
        info: &mut DatasetInfo,
    ) -> GhiResult<DataArray> {
        log::debug!("Calibrating to reflectances");

        let coef = self.store.array(CAL_COEF_KEY)?;
        let table = coef
            .values
            .view()
            .into_dimensionality::<ndarray::Ix2>()
            .map_err(|_| {
                GhiError::InvalidFormat(format!(
                    "calibration coefficient table must be 2-D, got {} dimensions",
                    coef.values.ndim()
                ))
            })?;

        // Single-row table means only channel 2 is present (500 m product)
        let channel_index = if table.nrows() == 1 { 0 } else { channel_index };
        if channel_index >= table.nrows() || table.ncols() < 2 {
            return Err(GhiError::InvalidFormat(format!(
                "calibration coefficient table has shape {:?}, no entry for channel index {}",
                table.shape(),
                channel_index
            )));
        }
        let slope = table[[channel_index, 0]];
        let offset = table[[channel_index, 1]];

        let raw_range = data
            .attrs
            .valid_range
            .ok_or_else(|| GhiError::MissingAttribute("valid_range on channel data".to_string()))?;

        let mut data = data;
        data.attrs.scale_factor = Some(slope);
        data.attrs.add_offset = Some(offset);

        let mut data = scale(&data, slope, offset);
        // Fraction to percent
        data.values.mapv_inplace(|v| v * 100.0);

        info.valid_range = Some([
            (raw_range[0] * slope + offset) * 100.0,
            (raw_range[1] * slope + offset) * 100.0,
        ]);
        Ok(data)
    }

    /// Calibrate to brightness temperature [K].
    fn calibrate_to_bt(
        &self,
        data: DataArray,
        info: &mut DatasetInfo,
        ds_name: &str,
    ) -> GhiResult<DataArray> {
        log::debug!("Calibrating to brightness_temperature");

        let lut_key = format!(
            "Calibration/{}",
            info.lut_key.as_deref().unwrap_or(ds_name)
        );
        let lut = self.store.array(&lut_key)?;

        // The DN value is the index into the brightness-temperature table
        let calibrated = apply_lut(&data, &lut)?;
        info.valid_range = Some(lut.attrs.valid_range.ok_or_else(|| {
            GhiError::MissingAttribute(format!("valid_range on {}", lut_key))
        })?);
        Ok(calibrated)
    }

    /// Attach platform, sensor, and orbit metadata, merge the descriptor, and
    /// strip raw calibration inputs from the attribute set.
    fn adjust_attrs(&self, data: &mut DataArray, info: &DatasetInfo) -> GhiResult<()> {
        let satname = platform_display_name(&self.file_attr_str("Satellite Name")?);
        let sensor = self
            .file_attr_str("Sensor Identification Code")?
            .to_lowercase();
        let orbital_parameters = OrbitalParameters {
            satellite_nominal_latitude: self.file_attr_f64("NOMSubSatLat")?,
            satellite_nominal_longitude: self.file_attr_f64("NOMSubSatLon")?,
            satellite_nominal_altitude: self.file_attr_f64("NOMSatHeight")?,
        };

        data.attrs.platform_name = Some(satname);
        data.attrs.sensor = Some(sensor);
        data.attrs.orbital_parameters = Some(orbital_parameters);

        // Merge the descriptor onto the attribute set
        data.attrs.units = Some(info.units.clone());
        if let Some(valid_range) = info.valid_range {
            data.attrs.valid_range = Some(valid_range);
        }
        data.attrs
            .extra
            .insert("name".to_string(), AttrValue::from(info.name.clone()));
        if let Some(calibration) = info.calibration {
            data.attrs.extra.insert(
                "calibration".to_string(),
                AttrValue::from(calibration.to_string()),
            );
        }
        if let Some(file_key) = &info.file_key {
            data.attrs
                .extra
                .insert("file_key".to_string(), AttrValue::from(file_key.clone()));
        }
        if let Some(lut_key) = &info.lut_key {
            data.attrs
                .extra
                .insert("lut_key".to_string(), AttrValue::from(lut_key.clone()));
        }

        // Remove attributes that could be confusing later
        for key in ["FillValue", "Intercept", "Slope"] {
            data.attrs.extra.remove(key);
        }
        Ok(())
    }

    fn file_attr(&self, name: &str) -> GhiResult<(String, AttrValue)> {
        let key = format!("{}{}", ATTR_PREFIX, name);
        let value = self.store.attr(&key)?;
        Ok((key, value))
    }

    fn file_attr_str(&self, name: &str) -> GhiResult<String> {
        let (key, value) = self.file_attr(name)?;
        value
            .as_str()
            .map(str::to_string)
            .ok_or(GhiError::AttributeType {
                key,
                expected: "string",
            })
    }

    fn file_attr_f64(&self, name: &str) -> GhiResult<f64> {
        let (key, value) = self.file_attr(name)?;
        value.as_f64().ok_or(GhiError::AttributeType {
            key,
            expected: "number",
        })
    }

    fn file_attr_f64_array(&self, name: &str) -> GhiResult<Vec<f64>> {
        let (key, value) = self.file_attr(name)?;
        value
            .as_f64_slice()
            .map(<[f64]>::to_vec)
            .ok_or(GhiError::AttributeType {
                key,
                expected: "float array",
            })
    }
}

/// Route a descriptor's storage key into the HDF group holding it.
fn resolve_file_key(ds_info: &DatasetInfo) -> String {
    let key = ds_info.storage_key();
    if key.contains(CHANS_ID) {
        format!("Data/{}", key)
    } else if key.contains(SUN_ID) || key.contains(SAT_ID) {
        format!("Navigation/{}", key)
    } else {
        key.to_string()
    }
}

/// The channel number rides in the trailing two digits of the storage key;
/// it is 1-based on disk.
fn channel_index_from_key(file_key: &str) -> GhiResult<usize> {
    let pattern = Regex::new(r"([0-9]{2})$")
        .map_err(|e| GhiError::InvalidFormat(format!("regex error: {}", e)))?;
    let channel: usize = pattern
        .captures(file_key)
        .and_then(|caps| caps[1].parse().ok())
        .ok_or_else(|| {
            GhiError::InvalidFormat(format!("no trailing channel number in key {}", file_key))
        })?;
    if channel == 0 {
        return Err(GhiError::InvalidFormat(format!(
            "channel number in key {} is not 1-based",
            file_key
        )));
    }
    Ok(channel - 1)
}

/// Nominal-resolution label for a channel name, used only for area naming.
fn resolution_band(name: &str) -> &'static str {
    if B250_CHANNELS.contains(&name) {
        "250m"
    } else if B500_CHANNELS.contains(&name) {
        "500m"
    } else {
        "2000m"
    }
}

/// Strict `%Y-%m-%dT%H:%M:%S.%fZ` parser; fractional seconds are mandatory.
fn parse_observation_timestamp(value: &str) -> GhiResult<DateTime<Utc>> {
    let pattern = Regex::new(r"^\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}\.\d{1,6}Z$")
        .map_err(|e| GhiError::InvalidFormat(format!("regex error: {}", e)))?;
    if !pattern.is_match(value) {
        return Err(GhiError::MalformedTimestamp {
            value: value.to_string(),
            reason: "expected %Y-%m-%dT%H:%M:%S.%fZ".to_string(),
        });
    }
    let naive = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.fZ").map_err(|e| {
        GhiError::MalformedTimestamp {
            value: value.to_string(),
            reason: e.to_string(),
        }
    })?;
    Ok(naive.and_utc())
}
