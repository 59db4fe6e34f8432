use image::{ImageBuffer, Pixel};

use crate::error::Error;
use crate::Image;

/// Grayscale dilation with a flat `size`x`size` structuring element
///
/// Every output sample is the maximum of its channel over the window, with
/// stride 1 and "same" padding: the output keeps the input size and the
/// window is clipped at the borders. An even `size` puts the extra row and
/// column after the centre.
///
/// The square element is separable, so the maximum is taken along rows
/// first and along columns second.
///
/// # Errors
///
/// * `Error::InvalidParameter` - When `size` is zero
/// * `Error::ImageBufferCreationFailed` - When result image creation fails
///
/// # Examples
///
/// ```
/// use fewshot_background::{dilate_flat, Image};
/// use image::Luma;
///
/// let mut image: Image<Luma<f32>> = Image::new(5, 5);
/// image.put_pixel(2, 2, Luma([1.0]));
///
/// let dilated = dilate_flat(&image, 3)?;
/// assert_eq!(dilated.get_pixel(1, 1), &Luma([1.0]));
/// assert_eq!(dilated.get_pixel(0, 0), &Luma([0.0]));
/// # Ok::<(), fewshot_background::Error>(())
/// ```
pub fn dilate_flat<P>(image: &Image<P>, size: u32) -> Result<Image<P>, Error>
where
    P: Pixel<Subpixel = f32>,
{
    if size == 0 {
        return Err(Error::InvalidParameter(
            "structuring element size must be at least 1".to_owned(),
        ));
    }

    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Ok(image.clone());
    }

    let channels = usize::from(P::CHANNEL_COUNT);
    let before = ((size - 1) / 2) as usize;
    let after = (size / 2) as usize;
    let (width_us, height_us) = (width as usize, height as usize);
    let row_len = width_us * channels;

    let source = image.as_raw();
    let mut horizontal = vec![0.0f32; source.len()];
    for (row, out) in source
        .chunks_exact(row_len)
        .zip(horizontal.chunks_exact_mut(row_len))
    {
        for x in 0..width_us {
            let start = x.saturating_sub(before);
            let end = (x + after).min(width_us - 1);
            for c in 0..channels {
                out[x * channels + c] = (start..=end)
                    .map(|sx| row[sx * channels + c])
                    .fold(f32::NEG_INFINITY, f32::max);
            }
        }
    }

    let mut output = vec![0.0f32; source.len()];
    for (y, out) in output.chunks_exact_mut(row_len).enumerate() {
        let start = y.saturating_sub(before);
        let end = (y + after).min(height_us - 1);
        for (i, value) in out.iter_mut().enumerate() {
            *value = (start..=end)
                .map(|sy| horizontal[sy * row_len + i])
                .fold(f32::NEG_INFINITY, f32::max);
        }
    }

    ImageBuffer::from_raw(width, height, output).ok_or(Error::ImageBufferCreationFailed)
}
