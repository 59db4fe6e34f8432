use image::{imageops, GenericImageView, ImageBuffer, Pixel};

use crate::error::Error;
use crate::Image;

/// Copies the `width`x`height` window whose top-left corner is `(x, y)`
///
/// # Errors
///
/// * `Error::BackgroundTooSmall` - When the window leaves the image
pub fn crop_window<P>(
    image: &Image<P>,
    x: u32,
    y: u32,
    width: u32,
    height: u32,
) -> Result<Image<P>, Error>
where
    P: Pixel + 'static,
{
    let (image_width, image_height) = image.dimensions();
    let fits_x = x.checked_add(width).is_some_and(|end| end <= image_width);
    let fits_y = y.checked_add(height).is_some_and(|end| end <= image_height);

    if !(fits_x && fits_y) {
        return Err(Error::BackgroundTooSmall {
            x,
            y,
            crop_width: width,
            crop_height: height,
            width: image_width,
            height: image_height,
        });
    }

    Ok(image.view(x, y, width, height).to_image())
}

/// Brings an image to `width`x`height` around its centre
///
/// Each axis is handled on its own: a longer axis is cropped symmetrically,
/// a shorter one is padded symmetrically with zeros. When the difference is
/// odd the extra pixel goes to the end of the axis.
///
/// # Examples
///
/// ```
/// use fewshot_background::{crop_or_pad_center, Image};
/// use image::Luma;
///
/// let image: Image<Luma<u8>> = Image::from_pixel(2, 6, Luma([9]));
/// let resized = crop_or_pad_center(&image, 4, 4);
///
/// assert_eq!(resized.dimensions(), (4, 4));
/// assert_eq!(resized.get_pixel(0, 0), &Luma([0]));
/// assert_eq!(resized.get_pixel(1, 0), &Luma([9]));
/// ```
pub fn crop_or_pad_center<P>(image: &Image<P>, width: u32, height: u32) -> Image<P>
where
    P: Pixel + 'static,
{
    let (image_width, image_height) = image.dimensions();
    let kept_width = image_width.min(width);
    let kept_height = image_height.min(height);

    let crop_x = (image_width - kept_width) / 2;
    let crop_y = (image_height - kept_height) / 2;
    let pad_x = (width - kept_width) / 2;
    let pad_y = (height - kept_height) / 2;

    let kept = image
        .view(crop_x, crop_y, kept_width, kept_height)
        .to_image();
    let mut canvas = ImageBuffer::new(width, height);
    imageops::replace(&mut canvas, &kept, i64::from(pad_x), i64::from(pad_y));
    canvas
}
