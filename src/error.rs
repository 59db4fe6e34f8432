use thiserror::Error;

/// Error type for background compositing
///
/// Every failure is a contract or configuration violation; nothing is
/// retried and nothing is swallowed.
#[derive(Debug, Error)]
pub enum Error {
    /// A required episode field is absent
    ///
    /// Raised for `stage_id`, for `x_s`, and for `stage_id_q` when `x_q`
    /// is present.
    #[error("Episode is missing required field `{0}`")]
    MissingField(String),

    /// An episode field exists but holds the other kind of data
    #[error("Episode field `{field}` has the wrong kind, expected {expected}")]
    FieldType {
        field: String,
        expected: &'static str,
    },

    /// An episode field holds no examples where at least one is needed
    #[error("Episode field `{0}` is empty")]
    EmptyBatch(&'static str),

    /// Two parallel batches disagree on their number of examples
    #[error("Batch size mismatch for `{field}`: expected {expected}, got {actual}")]
    BatchSizeMismatch {
        field: &'static str,
        expected: usize,
        actual: usize,
    },

    /// Image dimensions do not match
    ///
    /// Images of one batch must share a size, and a composite needs its
    /// foreground and background to agree after cropping.
    #[error("Image dimensions mismatch: expected {expected:?}, actual {actual:?}")]
    DimensionMismatch {
        /// Expected dimensions (width, height)
        expected: (u32, u32),
        /// Actual dimensions (width, height)
        actual: (u32, u32),
    },

    /// A zero-width or zero-height image reached an operation that needs pixels
    #[error("Image dimensions must be non-zero, got {width}x{height}")]
    EmptyImage { width: u32, height: u32 },

    /// The crop window does not fit inside the background
    #[error(
        "Crop window {crop_width}x{crop_height} at ({x}, {y}) does not fit a {width}x{height} background"
    )]
    BackgroundTooSmall {
        x: u32,
        y: u32,
        crop_width: u32,
        crop_height: u32,
        width: u32,
        height: u32,
    },

    /// The background dataset exposes no classes
    #[error("Background dataset has no classes")]
    EmptyClassMap,

    /// A background class has no image ids to sample from
    #[error("Background class {0} has no images")]
    EmptyBackgroundClass(String),

    /// A background class from the class map is unknown to the dataset
    #[error("Background class {0} is not present in the dataset")]
    UnknownBackgroundClass(String),

    /// A query stage id has no entry in the support class assignment
    #[error("Query stage id {stage_id} has no background assignment ({assigned} stages assigned)")]
    StageIdOutOfRange { stage_id: usize, assigned: usize },

    /// Failed to create ImageBuffer from processed pixels
    #[error("Failed to create ImageBuffer from processed pixels")]
    ImageBufferCreationFailed,

    /// Invalid parameter provided to the operation
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// The background dataset failed to fetch images
    #[error("Background dataset failed to fetch images")]
    Dataset(#[source] Box<dyn std::error::Error + Send + Sync>),
}
