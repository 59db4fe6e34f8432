//! Shared fixtures for the integration tests

#![allow(dead_code)]

use fewshot_background::{BackgroundDataset, Image};
use image::Luma;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("no background image with id {0}")]
    UnknownId(usize),
    #[error("background storage is offline")]
    Offline,
}

/// Background dataset held in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryBackgrounds {
    classes: Vec<(String, Vec<usize>)>,
    images: Vec<Image<Luma<u8>>>,
    offline: bool,
}

impl MemoryBackgrounds {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_class(mut self, name: &str, images: Vec<Image<Luma<u8>>>) -> Self {
        let first_id = self.images.len();
        self.classes
            .push((name.to_owned(), (first_id..first_id + images.len()).collect()));
        self.images.extend(images);
        self
    }

    /// Makes every fetch fail
    pub fn offline(mut self) -> Self {
        self.offline = true;
        self
    }
}

impl BackgroundDataset for MemoryBackgrounds {
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
        if self.offline {
            return Err(FetchError::Offline);
        }
        ids.iter()
            .map(|&id| self.images.get(id).cloned().ok_or(FetchError::UnknownId(id)))
            .collect()
    }
}

pub const DARK_VALUE: u8 = 40;
pub const LIGHT_VALUE: u8 = 200;

/// Two classes of uniform 12x12 backgrounds, "dark" and "light"
pub fn uniform_backgrounds() -> MemoryBackgrounds {
    MemoryBackgrounds::new()
        .with_class("dark", vec![Image::from_pixel(12, 12, Luma([DARK_VALUE])); 3])
        .with_class("light", vec![Image::from_pixel(12, 12, Luma([LIGHT_VALUE])); 3])
}

/// One class holding a single 12x12 gradient, so every crop window differs
pub fn gradient_backgrounds() -> MemoryBackgrounds {
    MemoryBackgrounds::new().with_class("gradient", vec![gradient(12, 12)])
}

pub fn gradient(width: u32, height: u32) -> Image<Luma<u8>> {
    Image::from_fn(width, height, |x, y| Luma([(x * 16 + y) as u8]))
}

/// Composited value of a uniform background of `value`
pub fn inverted(value: u8) -> f32 {
    1.0 - f32::from(value) / 255.0
}

/// 8x8 digit-like foreground: a bright vertical bar in columns 3..5
pub fn bar_foreground() -> Image<Luma<f32>> {
    Image::from_fn(8, 8, |x, y| {
        if (3..5).contains(&x) && (1..7).contains(&y) {
            Luma([1.0])
        } else {
            Luma([0.0])
        }
    })
}
