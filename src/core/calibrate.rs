use crate::types::{DataArray, GhiError, GhiResult};

/// Elements processed per block during LUT remapping. Blocks are independent,
/// so results do not depend on the block size.
const LUT_BLOCK_LEN: usize = 4096;

/// Convert digital number (DN) to a calibrated quantity through scaling.
///
/// `value = dn * slope + offset`, clamped at zero. Attributes of the input are
/// copied verbatim onto the result; NaN fill values propagate.
pub fn scale(dn: &DataArray, slope: f64, offset: f64) -> DataArray {
    log::debug!("Scaling DN with slope {} and offset {}", slope, offset);

    let values = dn.values.mapv(|v| {
        let scaled = v * slope + offset;
        // NaN fails the comparison and passes through unclamped
        if scaled < 0.0 {
            0.0
        } else {
            scaled
        }
    });

    DataArray {
        values,
        dims: dn.dims.clone(),
        attrs: dn.attrs.clone(),
    }
}

/// Calibrate digital numbers by remapping through a lookup table.
///
/// The table gains a trailing NaN entry standing in for fill; any DN outside
/// the table (negative, non-finite, or past the end) lands on that entry.
/// The remap runs block-wise over the flat buffer, in parallel when the
/// `parallel` feature is enabled.
pub fn apply_lut(data: &DataArray, lut: &DataArray) -> GhiResult<DataArray> {
    if lut.values.ndim() != 1 {
        return Err(GhiError::InvalidFormat(format!(
            "LUT must be 1-D, got {} dimensions",
            lut.values.ndim()
        )));
    }
    if lut.values.is_empty() {
        return Err(GhiError::InvalidFormat("LUT is empty".to_string()));
    }
    log::debug!("Applying {}-entry LUT", lut.values.len());

    let mut table: Vec<f64> = lut.values.iter().copied().collect();
    let last_valid = (table.len() - 1) as f64;
    table.push(f64::NAN);

    let mut values = data.values.clone();
    match values.as_slice_mut() {
        Some(flat) => remap_chunks(flat, &table, last_valid),
        // Non-contiguous layouts cannot be chunked as a flat buffer
        None => {
            for v in values.iter_mut() {
                *v = lookup(*v, &table, last_valid);
            }
        }
    }

    Ok(DataArray {
        values,
        dims: data.dims.clone(),
        attrs: data.attrs.clone(),
    })
}

#[cfg(feature = "parallel")]
fn remap_chunks(flat: &mut [f64], table: &[f64], last_valid: f64) {
    use rayon::prelude::*;
    flat.par_chunks_mut(LUT_BLOCK_LEN)
        .for_each(|block| remap_block(block, table, last_valid));
}

#[cfg(not(feature = "parallel"))]
fn remap_chunks(flat: &mut [f64], table: &[f64], last_valid: f64) {
    for block in flat.chunks_mut(LUT_BLOCK_LEN) {
        remap_block(block, table, last_valid);
    }
}

fn remap_block(block: &mut [f64], table: &[f64], last_valid: f64) {
    for v in block.iter_mut() {
        *v = lookup(*v, table, last_valid);
    }
}

#[inline]
fn lookup(dn: f64, table: &[f64], last_valid: f64) -> f64 {
    let sentinel = table.len() - 1;
    let index = if dn.is_finite() && dn >= 0.0 && dn <= last_valid {
        dn as usize
    } else {
        sentinel
    };
    table[index]
}

/// Mask every element outside the inclusive valid range to NaN.
///
/// The bounds pair is unordered; min/max are taken here.
pub fn mask_valid_range(data: &mut DataArray, valid_range: [f64; 2]) {
    let lo = valid_range[0].min(valid_range[1]);
    let hi = valid_range[0].max(valid_range[1]);
    data.values
        .mapv_inplace(|v| if (lo..=hi).contains(&v) { v } else { f64::NAN });
}
