use approx::assert_relative_eq;
use fyghi::{
    AttrValue, Calibration, DataArray, DatasetAttrs, DatasetId, DatasetInfo, GhiError,
    GhiL1Reader, MemoryStore,
};
use ndarray::{ArrayD, IxDyn};

fn channel_array(values: Vec<f64>, shape: &[usize]) -> DataArray {
    let mut attrs = DatasetAttrs::default();
    attrs.valid_range = Some([0.0, 4095.0]);
    attrs
        .extra
        .insert("FillValue".to_string(), AttrValue::from(65535.0));
    attrs
        .extra
        .insert("Slope".to_string(), AttrValue::from(1.0));
    attrs
        .extra
        .insert("Intercept".to_string(), AttrValue::from(0.0));
    DataArray::new(ArrayD::from_shape_vec(IxDyn(shape), values).unwrap(), attrs)
}

fn ghi_store() -> MemoryStore {
    let _ = env_logger::builder().is_test(true).try_init();

    let mut store = MemoryStore::new();
    store.insert_attr("Satellite Name", "FY4B");
    store.insert_attr("Sensor Identification Code", "GHI");
    store.insert_attr("NOMSubSatLat", 0.0);
    store.insert_attr("NOMSubSatLon", 133.0);
    store.insert_attr("NOMSatHeight", 35786.0);
    store.insert_attr("Semi_major_axis", 6378.14);
    store.insert_attr("Semi_minor_axis", 6356.7552);
    store.insert_attr("RegLength", 2748i64);
    store.insert_attr("RegWidth", 5496i64);
    store.insert_attr("dSamplingAngle", 14.0);
    store.insert_attr("dSteppingAngle", 14.0);
    store.insert_attr("Corner-Point Latitudes", vec![45.0, 45.0, 20.0, 20.0]);
    store.insert_attr("Corner-Point Longitudes", vec![110.0, 150.0, 150.0, 110.0]);
    store.insert_attr("Observing Beginning Date", "2020-01-01");
    store.insert_attr("Observing Beginning Time", "00:00:00.000");
    store.insert_attr("Observing Ending Date", "2020-01-01");
    store.insert_attr("Observing Ending Time", "00:14:59.999");

    // Visible channel, calibrated through the scale/offset table
    store.insert_array(
        "Data/NOMChannel02",
        channel_array(vec![0.0, 100.0, 200.0, 4095.0, 65535.0, 50.0], &[2, 3]),
    );
    // One row per channel: [slope, offset]
    let mut coef = vec![0.0; 14];
    coef[2] = 0.0002; // channel 2 slope
    coef[3] = 0.0; // channel 2 offset
    coef[0] = 0.0001;
    coef[1] = 0.01;
    store.insert_array(
        "Calibration/CALIBRATION_COEF(SCALE+OFFSET)",
        DataArray::new(
            ArrayD::from_shape_vec(IxDyn(&[7, 2]), coef).unwrap(),
            DatasetAttrs::default(),
        ),
    );

    // Thermal channel, calibrated through a brightness-temperature LUT
    store.insert_array(
        "Data/NOMChannel07",
        channel_array(vec![0.0, 1.0, 2.0, 65535.0], &[2, 2]),
    );
    let mut lut_attrs = DatasetAttrs::default();
    lut_attrs.valid_range = Some([250.0, 360.0]);
    store.insert_array(
        "Calibration/NOMChannel07",
        DataArray::new(
            ArrayD::from_shape_vec(IxDyn(&[3]), vec![300.0, 299.5, 299.0]).unwrap(),
            lut_attrs,
        ),
    );

    // Navigation angles carry no calibration at all
    let mut angle_attrs = DatasetAttrs::default();
    angle_attrs.valid_range = Some([-180.0, 180.0]);
    store.insert_array(
        "Navigation/NOMSunAzimuth",
        DataArray::new(
            ArrayD::from_shape_vec(IxDyn(&[2, 2]), vec![10.0, -30.0, 270.0, 45.0]).unwrap(),
            angle_attrs,
        ),
    );

    store
}

fn reader() -> GhiL1Reader<MemoryStore> {
    GhiL1Reader::new(ghi_store(), "REGC")
}

fn reflectance_request() -> (DatasetId, DatasetInfo) {
    (
        DatasetId {
            name: "C02".to_string(),
            resolution: 500,
        },
        DatasetInfo {
            name: "C02".to_string(),
            file_key: Some("NOMChannel02".to_string()),
            calibration: Some(Calibration::Reflectance),
            units: "%".to_string(),
            ..Default::default()
        },
    )
}

fn bt_request() -> (DatasetId, DatasetInfo) {
    (
        DatasetId {
            name: "C07".to_string(),
            resolution: 2000,
        },
        DatasetInfo {
            name: "C07".to_string(),
            file_key: Some("NOMChannel07".to_string()),
            calibration: Some(Calibration::BrightnessTemperature),
            units: "K".to_string(),
            lut_key: Some("NOMChannel07".to_string()),
            ..Default::default()
        },
    )
}

#[test]
fn test_reflectance_calibration_values() {
    let reader = reader();
    let (id, info) = reflectance_request();
    let (data, out_info) = reader.get_dataset(&id, &info).unwrap();

    // value = (dn * slope + offset) * 100
    assert_relative_eq!(data.values[[0, 0]], 0.0);
    assert_relative_eq!(data.values[[0, 1]], 2.0, epsilon = 1e-9);
    assert_relative_eq!(data.values[[0, 2]], 4.0, epsilon = 1e-9);
    assert_relative_eq!(data.values[[1, 0]], 81.9, epsilon = 1e-9);
    assert_relative_eq!(data.values[[1, 2]], 1.0, epsilon = 1e-9);
    // The fill DN scales far past the valid range and is masked out
    assert!(data.values[[1, 1]].is_nan());

    // valid range is recomputed for the calibrated quantity
    let valid_range = out_info.valid_range.unwrap();
    assert_relative_eq!(valid_range[0], 0.0);
    assert_relative_eq!(valid_range[1], 81.9, epsilon = 1e-9);

    // the caller's descriptor is untouched
    assert_eq!(info.valid_range, None);
}

#[test]
fn test_reflectance_attrs_after_adjust() {
    let reader = reader();
    let (id, info) = reflectance_request();
    let (data, _) = reader.get_dataset(&id, &info).unwrap();

    assert_eq!(data.attrs.platform_name.as_deref(), Some("FY-4B"));
    assert_eq!(data.attrs.sensor.as_deref(), Some("ghi"));
    assert_eq!(data.attrs.units.as_deref(), Some("%"));
    assert_relative_eq!(data.attrs.scale_factor.unwrap(), 0.0002);
    assert_relative_eq!(data.attrs.add_offset.unwrap(), 0.0);

    let orbital = data.attrs.orbital_parameters.unwrap();
    assert_relative_eq!(orbital.satellite_nominal_latitude, 0.0);
    assert_relative_eq!(orbital.satellite_nominal_longitude, 133.0);
    assert_relative_eq!(orbital.satellite_nominal_altitude, 35786.0);

    // raw calibration inputs are stripped from the attribute set
    assert!(!data.attrs.extra.contains_key("FillValue"));
    assert!(!data.attrs.extra.contains_key("Slope"));
    assert!(!data.attrs.extra.contains_key("Intercept"));
    // descriptor fields are merged in
    assert_eq!(
        data.attrs.extra.get("name").and_then(AttrValue::as_str),
        Some("C02")
    );
    assert_eq!(
        data.attrs
            .extra
            .get("calibration")
            .and_then(AttrValue::as_str),
        Some("reflectance")
    );
}

#[test]
fn test_reflectance_dims_renamed() {
    let reader = reader();
    let (id, info) = reflectance_request();
    let (data, _) = reader.get_dataset(&id, &info).unwrap();
    assert_eq!(data.dims, vec!["y", "x"]);
}

#[test]
fn test_brightness_temperature_calibration() {
    let reader = reader();
    let (id, info) = bt_request();
    let (data, out_info) = reader.get_dataset(&id, &info).unwrap();

    // The DN indexes the LUT directly
    assert_relative_eq!(data.values[[0, 0]], 300.0);
    assert_relative_eq!(data.values[[0, 1]], 299.5);
    assert_relative_eq!(data.values[[1, 0]], 299.0);
    // Out-of-table DN lands on the appended fill entry
    assert!(data.values[[1, 1]].is_nan());

    // The valid range comes from the LUT, not the raw array
    assert_eq!(out_info.valid_range, Some([250.0, 360.0]));
    assert_eq!(data.attrs.valid_range, Some([250.0, 360.0]));
}

#[test]
fn test_counts_passthrough_keeps_fill_dn() {
    let reader = reader();
    let id = DatasetId {
        name: "C02".to_string(),
        resolution: 500,
    };
    let info = DatasetInfo {
        name: "C02".to_string(),
        file_key: Some("NOMChannel02".to_string()),
        calibration: Some(Calibration::Counts),
        units: "1".to_string(),
        ..Default::default()
    };
    let (data, out_info) = reader.get_dataset(&id, &info).unwrap();

    // No masking for counts; the fill DN survives and is declared instead
    assert_relative_eq!(data.values[[1, 1]], 65535.0);
    assert_relative_eq!(data.attrs.fill_value.unwrap(), 65535.0);
    assert_eq!(data.attrs.units.as_deref(), Some("1"));
    // valid range is the raw array's own
    assert_eq!(out_info.valid_range, Some([0.0, 4095.0]));
}

#[test]
fn test_uncalibrated_dataset_is_range_masked() {
    let reader = reader();
    let id = DatasetId {
        name: "solar_azimuth_angle".to_string(),
        resolution: 2000,
    };
    let info = DatasetInfo {
        name: "solar_azimuth_angle".to_string(),
        file_key: Some("NOMSunAzimuth".to_string()),
        calibration: None,
        units: "degree".to_string(),
        ..Default::default()
    };
    let (data, _) = reader.get_dataset(&id, &info).unwrap();

    assert_relative_eq!(data.values[[0, 0]], 10.0);
    assert_relative_eq!(data.values[[0, 1]], -30.0);
    // 270 degrees falls outside the declared valid range
    assert!(data.values[[1, 0]].is_nan());
    assert_eq!(data.attrs.units.as_deref(), Some("degree"));
}

#[test]
fn test_radiance_calibration_is_rejected() {
    let reader = reader();
    let id = DatasetId {
        name: "C07".to_string(),
        resolution: 2000,
    };
    let info = DatasetInfo {
        name: "C07".to_string(),
        file_key: Some("NOMChannel07".to_string()),
        calibration: Some(Calibration::Radiance),
        units: "mW/ (m2 cm-1 sr)".to_string(),
        ..Default::default()
    };
    let result = reader.get_dataset(&id, &info);
    assert!(matches!(
        result,
        Err(GhiError::UnsupportedCalibration(_))
    ));
}

#[test]
fn test_missing_channel_dataset_is_reported() {
    let reader = reader();
    let id = DatasetId {
        name: "C03".to_string(),
        resolution: 500,
    };
    let info = DatasetInfo {
        name: "C03".to_string(),
        file_key: Some("NOMChannel03".to_string()),
        calibration: Some(Calibration::Reflectance),
        units: "%".to_string(),
        ..Default::default()
    };
    assert!(matches!(
        reader.get_dataset(&id, &info),
        Err(GhiError::MissingDataset(_))
    ));
}

#[test]
fn test_start_and_end_time() {
    let reader = reader();
    let start = reader.start_time().unwrap();
    let end = reader.end_time().unwrap();
    assert_eq!(start.to_rfc3339(), "2020-01-01T00:00:00+00:00");
    assert_eq!(end.to_rfc3339(), "2020-01-01T00:14:59.999+00:00");
    assert!(start < end);
}

#[test]
fn test_start_time_requires_fractional_seconds() {
    let mut store = ghi_store();
    store.insert_attr("Observing Beginning Time", "00:00:00");
    let reader = GhiL1Reader::new(store, "REGC");
    assert!(matches!(
        reader.start_time(),
        Err(GhiError::MalformedTimestamp { .. })
    ));
}

#[test]
fn test_start_time_requires_date_attribute() {
    let mut store = MemoryStore::new();
    store.insert_attr("Observing Beginning Time", "00:00:00.000");
    let reader = GhiL1Reader::new(store, "REGC");
    assert!(matches!(
        reader.start_time(),
        Err(GhiError::MissingAttribute(_))
    ));
}
