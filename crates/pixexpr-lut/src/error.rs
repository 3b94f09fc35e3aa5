use pixexpr_core::ParseError;

/// Errors raised while configuring or running a LUT filter.
#[derive(Debug, thiserror::Error)]
pub enum LutError {
    #[error("plane {plane}: {source}")]
    Parse {
        plane: usize,
        #[source]
        source: ParseError,
    },

    #[error("invalid filter configuration: {0}")]
    Config(#[from] serde_json::Error),

    #[error("{sample} samples cannot hold {bits}-bit data")]
    UnsupportedBitDepth { bits: u32, sample: &'static str },

    #[error("no lookup table for {inputs} input(s) at {bits} bits; use realtime evaluation")]
    TableUnsupported { bits: u32, inputs: usize },

    #[error("plane is {found:?} but {expected:?} was expected")]
    DimensionMismatch {
        expected: (usize, usize),
        found: (usize, usize),
    },

    #[error("buffer holds {found} samples, {expected} needed")]
    BufferSize { expected: usize, found: usize },

    #[error("{needed} source plane(s) required, {found} given")]
    MissingSource { needed: usize, found: usize },

    #[error("a lookup filter takes 1 to 4 inputs, {0} requested")]
    InputCount(usize),

    #[error("plane index {0} out of range")]
    PlaneIndex(usize),

    #[error("invalid plane operator `{0}`")]
    InvalidPlaneOperator(String),

    #[error("invalid spatial mode `{0}`")]
    InvalidSpatialMode(String),
}
