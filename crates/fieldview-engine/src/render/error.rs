use std::fmt;

/// Which of the orchestrator's two render paths an operation targeted.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum RenderPath {
    FieldData,
    Direct,
}

impl fmt::Display for RenderPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderPath::FieldData => f.write_str("field-data"),
            RenderPath::Direct => f.write_str("direct"),
        }
    }
}

/// A buffer layout or configuration contract was violated.
///
/// These are reported before any device work for the affected call is issued.
/// Fallible engine APIs return `anyhow::Result`; recover the typed value with
/// `err.downcast_ref::<ContractError>()`.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum ContractError {
    /// Device storage must be a positive multiple of 4 bytes.
    MisalignedStorage { len: u64 },
    /// A field-data source must hold at least one line.
    EmptyFieldData,
    /// Field data length is not a multiple of the per-line width.
    LineMisaligned { len: usize, bytes_per_line: usize },
    /// Direct pixel data must be exactly one byte per canvas pixel.
    DirectSizeMismatch { len: usize, width: u32, height: u32 },
    /// A region reaches past the end of its backing store.
    RegionOutOfBounds { offset: usize, len: usize, backing_len: usize },
    /// Bytes written to device storage must match its allocated size.
    LengthMismatch { len: usize, expected: u64 },
    /// The orchestrator was built without a source for this path.
    PathNotConfigured(RenderPath),
}

impl fmt::Display for ContractError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContractError::MisalignedStorage { len } => {
                write!(f, "storage length {len} is not a positive multiple of 4")
            }
            ContractError::EmptyFieldData => f.write_str("field data holds no lines"),
            ContractError::LineMisaligned { len, bytes_per_line } => write!(
                f,
                "field data length {len} is not a multiple of line size {bytes_per_line}"
            ),
            ContractError::DirectSizeMismatch { len, width, height } => write!(
                f,
                "direct pixel data is {len} bytes, expected {} ({width}x{height})",
                u64::from(*width) * u64::from(*height)
            ),
            ContractError::RegionOutOfBounds { offset, len, backing_len } => write!(
                f,
                "region {offset}..{} exceeds backing store of {backing_len} bytes",
                offset.saturating_add(*len)
            ),
            ContractError::LengthMismatch { len, expected } => {
                write!(f, "write of {len} bytes into storage of {expected} bytes")
            }
            ContractError::PathNotConfigured(path) => {
                write!(f, "{path} path was not configured at construction")
            }
        }
    }
}

impl std::error::Error for ContractError {}
