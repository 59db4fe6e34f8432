use image::{Luma, LumaA, Pixel, Primitive, Rgb, Rgba};
use imageproc::map::map_colors;

use crate::utils::normalize_with_max;
use crate::Image;

/// Conversion of an image into `f32` subpixels within `[0, 1]`
///
/// Integer subpixels are divided by their maximum value, float subpixels are
/// taken as already normalized. The channel layout is preserved.
pub trait NormalizeUnit {
    /// Pixel type of the normalized image
    type Unit: Pixel<Subpixel = f32> + Send + Sync + 'static;

    /// Returns the normalized copy of the image
    fn normalize_unit(&self) -> Image<Self::Unit>;

    /// Returns the image dimensions (width, height)
    fn unit_dimensions(&self) -> (u32, u32);
}

macro_rules! impl_normalize_unit {
    ($pixel:ident; $($subpixel:ty),+) => {
        $(
            impl NormalizeUnit for Image<$pixel<$subpixel>> {
                type Unit = $pixel<f32>;

                fn normalize_unit(&self) -> Image<Self::Unit> {
                    let max_value: f32 = <$subpixel as Primitive>::DEFAULT_MAX_VALUE.into();
                    map_colors(self, |$pixel(channels)| {
                        $pixel(channels.map(|value| normalize_with_max(value, max_value)))
                    })
                }

                fn unit_dimensions(&self) -> (u32, u32) {
                    self.dimensions()
                }
            }
        )+
    };
}

impl_normalize_unit!(Luma; u8, u16, f32);
impl_normalize_unit!(LumaA; u8, u16, f32);
impl_normalize_unit!(Rgb; u8, u16, f32);
impl_normalize_unit!(Rgba; u8, u16, f32);

/// Normalizes an image and collapses it to one channel by averaging all
/// of its channels
///
/// Alpha, when present, takes part in the average like any other channel.
///
/// # Examples
///
/// ```
/// use fewshot_background::{to_unit_gray, Image};
/// use image::Rgb;
///
/// let image: Image<Rgb<u8>> = Image::from_pixel(2, 2, Rgb([255, 0, 0]));
/// let gray = to_unit_gray(&image);
///
/// assert!((gray.get_pixel(0, 0)[0] - 1.0 / 3.0).abs() < 1e-6);
/// ```
pub fn to_unit_gray<I: NormalizeUnit>(image: &I) -> Image<Luma<f32>> {
    let unit = image.normalize_unit();
    let channel_count = f32::from(<I::Unit as Pixel>::CHANNEL_COUNT);
    map_colors(&unit, |pixel| {
        Luma([pixel.channels().iter().sum::<f32>() / channel_count])
    })
}
