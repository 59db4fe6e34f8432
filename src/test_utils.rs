//! Test utilities for fewshot-background
//!
//! This module provides an in-memory background dataset and image fixtures.
//! It is only compiled when running tests.

use image::{Luma, Pixel};
use thiserror::Error;

use crate::{BackgroundDataset, Image};

/// Failure of the in-memory dataset
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("no background image with id {0}")]
    UnknownId(usize),
}

/// In-memory background dataset
///
/// Classes keep their insertion order; image ids are positions in one
/// shared image list.
#[derive(Debug, Clone, Default)]
pub struct FakeBackgrounds {
    classes: Vec<(String, Vec<usize>)>,
    images: Vec<Image<Luma<u8>>>,
}

impl FakeBackgrounds {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a class holding `images`
    pub fn with_class(mut self, name: &str, images: Vec<Image<Luma<u8>>>) -> Self {
        let first_id = self.images.len();
        let ids = (first_id..first_id + images.len()).collect();
        self.images.extend(images);
        self.classes.push((name.to_owned(), ids));
        self
    }
}

impl BackgroundDataset for FakeBackgrounds {
    type Class = String;
    type ImageId = usize;
    type Image = Image<Luma<u8>>;
    type Error = FetchError;

    fn class_labels(&self) -> Vec<String> {
        self.classes.iter().map(|(name, _)| name.clone()).collect()
    }

    fn image_ids(&self, class: &String) -> Option<&[usize]> {
        self.classes
            .iter()
            .find(|(name, _)| name == class)
            .map(|(_, ids)| ids.as_slice())
    }

    fn fetch_images(&self, ids: &[usize]) -> Result<Vec<Image<Luma<u8>>>, FetchError> {
        ids.iter()
            .map(|&id| self.images.get(id).cloned().ok_or(FetchError::UnknownId(id)))
            .collect()
    }
}

/// Gray value of every image in the "dark" test class
pub const DARK_VALUE: u8 = 40;
/// Gray value of every image in the "light" test class
pub const LIGHT_VALUE: u8 = 200;

/// Creates a dataset with two classes of uniform 12x12 backgrounds
///
/// - "dark": two images of value [`DARK_VALUE`]
/// - "light": two images of value [`LIGHT_VALUE`]
///
/// Every image of a class has the same value, so a composited pixel that
/// falls on the background tells which class was drawn.
pub fn create_test_backgrounds() -> FakeBackgrounds {
    FakeBackgrounds::new()
        .with_class("dark", vec![Image::from_pixel(12, 12, Luma([DARK_VALUE])); 2])
        .with_class("light", vec![Image::from_pixel(12, 12, Luma([LIGHT_VALUE])); 2])
}

/// Creates an 8x8 foreground with a bright 2x2 square at (3, 3)
pub fn create_test_foreground() -> Image<Luma<f32>> {
    Image::from_fn(8, 8, |x, y| {
        if (3..5).contains(&x) && (3..5).contains(&y) {
            Luma([1.0])
        } else {
            Luma([0.0])
        }
    })
}

/// Compares two float images pixel by pixel within `tolerance`
pub fn images_approx_equal<P>(expected: &Image<P>, actual: &Image<P>, tolerance: f32) -> bool
where
    P: Pixel<Subpixel = f32>,
{
    expected.dimensions() == actual.dimensions()
        && expected
            .iter()
            .zip(actual.iter())
            .all(|(e, a)| (e - a).abs() <= tolerance)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fake_backgrounds_assign_consecutive_ids() {
        let dataset = create_test_backgrounds();

        assert_eq!(dataset.class_labels(), vec!["dark", "light"]);
        assert_eq!(dataset.image_ids(&"dark".to_owned()), Some(&[0, 1][..]));
        assert_eq!(dataset.image_ids(&"light".to_owned()), Some(&[2, 3][..]));
        assert_eq!(dataset.image_ids(&"other".to_owned()), None);
    }

    #[test]
    fn fake_backgrounds_fetch_in_request_order() {
        let dataset = create_test_backgrounds();
        let images = dataset.fetch_images(&[3, 0]).unwrap();

        assert_eq!(images[0].get_pixel(0, 0), &Luma([LIGHT_VALUE]));
        assert_eq!(images[1].get_pixel(0, 0), &Luma([DARK_VALUE]));
        assert!(matches!(
            dataset.fetch_images(&[9]),
            Err(FetchError::UnknownId(9))
        ));
    }

    #[test]
    fn images_approx_equal_with_tolerant_comparison() {
        let image = create_test_foreground();
        let mut shifted = image.clone();
        shifted.put_pixel(0, 0, Luma([0.01]));

        assert!(images_approx_equal(&image, &shifted, 0.02));
        assert!(!images_approx_equal(&image, &shifted, 0.001));
    }
}
