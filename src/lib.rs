//! Background compositing for few-shot learning episodes.
//!
//! [`BackgroundCompositor`] puts every support (and query) image of an
//! episode on a background drawn from a [`BackgroundDataset`], sharing one
//! background class between all examples of a stage.

mod error;
mod fewshot_background;
#[cfg(test)]
mod test_utils;
mod utils;

use image::{ImageBuffer, Pixel};

pub use error::Error;
pub use fewshot_background::compositor::{
    BackgroundCompositor, COARSE_KERNEL_SIZE, FINE_KERNEL_SIZE, MASK_THRESHOLD, UPSAMPLE_FACTOR,
};
pub use fewshot_background::config::{BackgroundConfig, MaskSource};
pub use fewshot_background::crop::{crop_or_pad_center, crop_window};
pub use fewshot_background::dataset::BackgroundDataset;
pub use fewshot_background::episode::{
    Episode, EpisodeField, EpisodeFields, QUERY_IMAGES, QUERY_STAGE_IDS, STAGE_IDS,
    SUPPORT_IMAGES,
};
pub use fewshot_background::morphology::dilate_flat;
pub use fewshot_background::normalize::{to_unit_gray, NormalizeUnit};

pub type Image<P> = ImageBuffer<P, Vec<<P as Pixel>::Subpixel>>;
