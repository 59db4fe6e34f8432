use std::fmt::Debug;

use crate::fewshot_background::normalize::NormalizeUnit;

/// Source of background images, grouped by class
///
/// The compositor only reads from the dataset: it asks for the class labels
/// once at construction, then for the image ids of a class and for a batch
/// of images by id on every call.
///
/// Images may use any channel count and any subpixel type covered by
/// [`NormalizeUnit`]; they are normalized and averaged down to one gray
/// channel before use.
pub trait BackgroundDataset {
    /// Class label
    type Class: Clone + Debug;
    /// Identifier of one background image
    type ImageId: Clone + Debug;
    /// Image type returned by [`BackgroundDataset::fetch_images`]
    type Image: NormalizeUnit;
    /// Fetch failure
    type Error: std::error::Error + Send + Sync + 'static;

    /// All class labels, in a stable order
    fn class_labels(&self) -> Vec<Self::Class>;

    /// Image ids of one class, `None` if the class is unknown
    fn image_ids(&self, class: &Self::Class) -> Option<&[Self::ImageId]>;

    /// Fetches one image per id, in the order of `ids`
    fn fetch_images(&self, ids: &[Self::ImageId]) -> Result<Vec<Self::Image>, Self::Error>;
}
