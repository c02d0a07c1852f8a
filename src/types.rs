use ndarray::ArrayD;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// N-dimensional numeric grid; raw digital numbers and calibrated quantities
/// share this element type, with NaN standing in for fill/missing.
pub type GhiArray = ArrayD<f64>;

/// Calibration kinds a dataset descriptor may declare
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Calibration {
    Counts,
    Reflectance,
    BrightnessTemperature,
    Radiance,
}

impl std::fmt::Display for Calibration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Calibration::Counts => write!(f, "counts"),
            Calibration::Reflectance => write!(f, "reflectance"),
            Calibration::BrightnessTemperature => write!(f, "brightness_temperature"),
            Calibration::Radiance => write!(f, "radiance"),
        }
    }
}

/// Scan direction of the imager
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScanDirection {
    NorthToSouth,
    SouthToNorth,
}

impl std::fmt::Display for ScanDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScanDirection::NorthToSouth => write!(f, "N2S"),
            ScanDirection::SouthToNorth => write!(f, "S2N"),
        }
    }
}

/// A single HDF-style attribute value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AttrValue {
    Str(String),
    Int(i64),
    Float(f64),
    FloatArray(Vec<f64>),
}

impl AttrValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttrValue::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Scalar numeric view; integers widen to f64.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            AttrValue::Float(v) => Some(*v),
            AttrValue::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            AttrValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_f64_slice(&self) -> Option<&[f64]> {
        match self {
            AttrValue::FloatArray(v) => Some(v),
            _ => None,
        }
    }
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        AttrValue::Str(value.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(value: String) -> Self {
        AttrValue::Str(value)
    }
}

impl From<f64> for AttrValue {
    fn from(value: f64) -> Self {
        AttrValue::Float(value)
    }
}

impl From<i64> for AttrValue {
    fn from(value: i64) -> Self {
        AttrValue::Int(value)
    }
}

impl From<Vec<f64>> for AttrValue {
    fn from(value: Vec<f64>) -> Self {
        AttrValue::FloatArray(value)
    }
}

/// Nominal satellite position attached to calibrated datasets
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrbitalParameters {
    pub satellite_nominal_latitude: f64,
    pub satellite_nominal_longitude: f64,
    /// Kilometers, as carried by the file attributes
    pub satellite_nominal_altitude: f64,
}

/// Attribute set carried by a `DataArray`.
///
/// Fields the decoder interprets are typed; anything else rides along in
/// `extra` and is passed through untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DatasetAttrs {
    pub units: Option<String>,
    /// Unordered bounds pair; consumers take min/max explicitly
    pub valid_range: Option<[f64; 2]>,
    pub fill_value: Option<f64>,
    pub scale_factor: Option<f64>,
    pub add_offset: Option<f64>,
    pub platform_name: Option<String>,
    pub sensor: Option<String>,
    pub orbital_parameters: Option<OrbitalParameters>,
    pub extra: HashMap<String, AttrValue>,
}

/// An N-dimensional array with named dimensions and attached attributes
#[derive(Debug, Clone, PartialEq)]
pub struct DataArray {
    pub values: GhiArray,
    pub dims: Vec<String>,
    pub attrs: DatasetAttrs,
}

impl DataArray {
    /// Wrap an array; dimensions get placeholder names `dim_0..dim_n`.
    pub fn new(values: GhiArray, attrs: DatasetAttrs) -> Self {
        let dims = (0..values.ndim()).map(|i| format!("dim_{}", i)).collect();
        Self { values, dims, attrs }
    }

    pub fn ndim(&self) -> usize {
        self.values.ndim()
    }

    /// Rename the two trailing dimensions to the canonical `y`/`x` axes.
    pub fn rename_to_yx(&mut self) {
        let n = self.dims.len();
        if n >= 2 {
            self.dims[n - 2] = "y".to_string();
            self.dims[n - 1] = "x".to_string();
        }
    }
}

/// Identifies one requested output variable
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DatasetId {
    pub name: String,
    /// Nominal ground resolution in meters
    pub resolution: u32,
}

/// Descriptor for a requested output variable.
///
/// Calibration never mutates a caller's descriptor; it returns a fresh copy
/// with `valid_range` rewritten for the calibrated quantity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DatasetInfo {
    pub name: String,
    /// Storage key override; defaults to the dataset name
    pub file_key: Option<String>,
    pub calibration: Option<Calibration>,
    pub units: String,
    /// LUT storage key override for brightness-temperature calibration
    pub lut_key: Option<String>,
    pub valid_range: Option<[f64; 2]>,
}

impl DatasetInfo {
    /// The storage key this dataset is read from.
    pub fn storage_key(&self) -> &str {
        self.file_key.as_deref().unwrap_or(&self.name)
    }
}

/// Map a platform short code to its display name; unmapped codes pass through.
pub fn platform_display_name(code: &str) -> String {
    match code {
        "FY4B" => "FY-4B".to_string(),
        "FY4C" => "FY-4C".to_string(),
        _ => code.to_string(),
    }
}

/// Error types for Level-1 decoding
#[derive(Debug, thiserror::Error)]
pub enum GhiError {
    #[error("missing dataset: {0}")]
    MissingDataset(String),

    #[error("missing attribute: {0}")]
    MissingAttribute(String),

    #[error("attribute {key} is not a {expected}")]
    AttributeType { key: String, expected: &'static str },

    #[error("calibration to {0} is not supported")]
    UnsupportedCalibration(String),

    #[error("unsupported resolution: {0} m")]
    UnsupportedResolution(u32),

    #[error("malformed timestamp {value:?}: {reason}")]
    MalformedTimestamp { value: String, reason: String },

    #[error("invalid data format: {0}")]
    InvalidFormat(String),

    #[error("projection error: {0}")]
    Projection(String),
}

/// Result type for Level-1 decoding operations
pub type GhiResult<T> = Result<T, GhiError>;
