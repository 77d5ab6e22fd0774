//! Host side of the host/shader contract.
//!
//! Every value here has a twin in `shaders/fieldview.wgsl`; the two must change
//! together.

use bytemuck::{Pod, Zeroable};

use crate::canvas::CanvasSize;

use super::error::ContractError;

/// Bytes per field-data line.
pub const FIELD_LINE_BYTES: usize = 116;

/// Device storage sizes must be multiples of this.
pub const STORAGE_ALIGNMENT: u64 = 4;

pub const FIELD_BIND_GROUP: u32 = 0;
pub const FIELD_SOURCE_BINDING: u32 = 0;
pub const FIELD_METRICS_BINDING: u32 = 1;

pub const DIRECT_BIND_GROUP: u32 = 1;
pub const DIRECT_SOURCE_BINDING: u32 = 0;

/// Per-frame aggregates written by the derivation stage.
///
/// Mirrors the WGSL `FrameMetrics` struct field for field.
#[repr(C)]
#[derive(Debug, Default, Copy, Clone, Eq, PartialEq, Pod, Zeroable)]
pub struct FrameMetrics {
    /// Index of the first displayed line; equals the line count when none is.
    pub first_displayed_line: u32,
    pub displayed_line_count: u32,
    /// Widest displayed line, in character cells.
    pub max_line_extent: u32,
}

/// Size of [`FrameMetrics`] in device memory.
pub const FRAME_METRICS_BYTES: u64 = std::mem::size_of::<FrameMetrics>() as u64;

/// Checks the field-data layout: a positive whole number of lines.
pub fn validate_field_len(len: usize) -> Result<usize, ContractError> {
    if len % FIELD_LINE_BYTES != 0 {
        return Err(ContractError::LineMisaligned {
            len,
            bytes_per_line: FIELD_LINE_BYTES,
        });
    }
    if len == 0 {
        return Err(ContractError::EmptyFieldData);
    }
    Ok(len / FIELD_LINE_BYTES)
}

/// Checks that direct pixel data covers the canvas exactly, one byte per pixel.
pub fn validate_direct_len(len: usize, size: CanvasSize) -> Result<(), ContractError> {
    if len as u64 != size.pixel_count() {
        return Err(ContractError::DirectSizeMismatch {
            len,
            width: size.width,
            height: size.height,
        });
    }
    Ok(())
}

/// Values for the shader's pipeline-overridable constants.
///
/// Every pipeline receives the full set; WGSL resolves overrides module-wide.
pub(crate) fn pipeline_constants(size: CanvasSize) -> [(&'static str, f64); 3] {
    [
        ("canvas_width", f64::from(size.width)),
        ("canvas_height", f64::from(size.height)),
        ("line_bytes", FIELD_LINE_BYTES as f64),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_line_is_accepted() {
        assert_eq!(validate_field_len(FIELD_LINE_BYTES), Ok(1));
    }

    #[test]
    fn many_lines_are_counted() {
        assert_eq!(validate_field_len(FIELD_LINE_BYTES * 256), Ok(256));
    }

    #[test]
    fn partial_line_names_the_length() {
        let len = FIELD_LINE_BYTES * 3 + 1;
        let err = validate_field_len(len).unwrap_err();
        assert_eq!(
            err,
            ContractError::LineMisaligned { len: 349, bytes_per_line: 116 }
        );
        assert!(err.to_string().contains("349"));
    }

    #[test]
    fn empty_field_data_is_rejected() {
        assert_eq!(validate_field_len(0), Err(ContractError::EmptyFieldData));
    }

    #[test]
    fn direct_len_must_match_exactly() {
        let size = CanvasSize::default();
        assert!(validate_direct_len(640 * 512, size).is_ok());

        let err = validate_direct_len(640 * 512 - 1, size).unwrap_err();
        assert!(err.to_string().contains("327679"));

        // A multiple of the canvas size is still a mismatch.
        assert!(validate_direct_len(640 * 512 * 2, size).is_err());
    }

    #[test]
    fn metrics_record_is_three_words() {
        assert_eq!(FRAME_METRICS_BYTES, 12);
    }

    #[test]
    fn constants_carry_canvas_size() {
        let c = pipeline_constants(CanvasSize::new(320, 200));
        assert_eq!(c[0], ("canvas_width", 320.0));
        assert_eq!(c[1], ("canvas_height", 200.0));
        assert_eq!(c[2], ("line_bytes", 116.0));
    }
}
