//! Internal utility functions for fewshot-background.
//!
//! Shared validation and normalization helpers used by the compositing steps.

use image::Primitive;

use crate::error::Error;

/// Normalizes a subpixel value using a pre-computed max value.
///
/// This is more efficient when processing multiple pixels with the same type.
///
/// # Arguments
///
/// * `value` - The subpixel value to normalize
/// * `max_value` - The pre-computed maximum value for the type
///
/// # Returns
///
/// The value scaled into `[0, 1]` for integer subpixels; float subpixels
/// have a maximum of `1.0` and pass through unchanged.
#[inline]
pub fn normalize_with_max<S>(value: S, max_value: f32) -> f32
where
    S: Into<f32> + Primitive,
{
    value.into() / max_value
}

/// Validates that an image has non-zero dimensions.
pub fn validate_non_empty_image(width: u32, height: u32) -> Result<(), Error> {
    if width == 0 || height == 0 {
        Err(Error::EmptyImage { width, height })
    } else {
        Ok(())
    }
}

/// Validates that two images have matching dimensions.
///
/// # Arguments
///
/// * `expected` - The reference dimensions (width, height)
/// * `actual` - The dimensions being checked
///
/// # Returns
///
/// `Ok(())` if the dimensions match, otherwise `Error::DimensionMismatch`
pub fn validate_matching_dimensions(expected: (u32, u32), actual: (u32, u32)) -> Result<(), Error> {
    if expected == actual {
        Ok(())
    } else {
        Err(Error::DimensionMismatch { expected, actual })
    }
}
