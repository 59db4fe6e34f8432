use image::imageops::{self, FilterType};
use image::{Luma, Pixel};
use itertools::{izip, Itertools};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};
#[cfg(feature = "rayon")]
use rayon::prelude::*;
use tracing::debug;

use crate::error::Error;
use crate::fewshot_background::config::{BackgroundConfig, MaskSource};
use crate::fewshot_background::crop::{crop_or_pad_center, crop_window};
use crate::fewshot_background::dataset::BackgroundDataset;
use crate::fewshot_background::episode::{
    EpisodeFields, QUERY_IMAGES, QUERY_STAGE_IDS, STAGE_IDS, SUPPORT_IMAGES,
};
use crate::fewshot_background::morphology::dilate_flat;
use crate::fewshot_background::normalize::{to_unit_gray, NormalizeUnit};
use crate::fewshot_background::sampling::{
    pick_image_ids, sample_classes, StageAssignment,
};
use crate::utils::{validate_matching_dimensions, validate_non_empty_image};
use crate::Image;

/// Foreground upsampling factor applied before the dilations
pub const UPSAMPLE_FACTOR: u32 = 3;
/// Side of the flat structuring element of the coarse dilation
pub const COARSE_KERNEL_SIZE: u32 = 5;
/// Side of the flat structuring element of the fine dilation
pub const FINE_KERNEL_SIZE: u32 = 3;
/// Mask values above this keep the foreground
pub const MASK_THRESHOLD: f32 = 0.1;

/// Episode augmentation that puts every example on a random background
///
/// Foreground strokes are found by dilating the (upsampled) foreground;
/// everything outside them is replaced by an inverted background image
/// drawn from a [`BackgroundDataset`]. Backgrounds are picked per stage id,
/// so examples of the same stage share a background class.
///
/// All randomness comes from one seeded generator owned by the compositor:
/// two compositors built with the same seed and fed the same calls produce
/// the same output.
pub struct BackgroundCompositor<D: BackgroundDataset> {
    background_dataset: D,
    class_map: Vec<D::Class>,
    config: BackgroundConfig,
    rng: StdRng,
}

impl<D: BackgroundDataset> BackgroundCompositor<D> {
    /// Builds a compositor over `background_dataset`
    ///
    /// The class map is read from the dataset once, here.
    ///
    /// # Errors
    ///
    /// * `Error::InvalidParameter` - When the configuration does not validate
    /// * `Error::EmptyClassMap` - When the dataset has no classes
    pub fn new(background_dataset: D, config: BackgroundConfig) -> Result<Self, Error> {
        config.validate()?;

        let class_map = background_dataset.class_labels();
        if class_map.is_empty() {
            return Err(Error::EmptyClassMap);
        }

        debug!(
            classes = class_map.len(),
            seed = config.seed,
            "background compositor ready"
        );

        Ok(Self {
            rng: StdRng::seed_from_u64(config.seed),
            background_dataset,
            class_map,
            config,
        })
    }

    /// Dataset the backgrounds are drawn from
    pub fn background_dataset(&self) -> &D {
        &self.background_dataset
    }

    /// Background classes available for sampling, in dataset order
    pub fn class_map(&self) -> &[D::Class] {
        &self.class_map
    }

    /// Settings the compositor was built with
    pub fn config(&self) -> &BackgroundConfig {
        &self.config
    }

    /// Composites the support images, and the query images when present,
    /// onto freshly drawn backgrounds
    ///
    /// Without `random_context` one class is drawn per stage id and shared
    /// by every example of that stage, in support and query alike. With
    /// `random_context` every support and query example draws its own class
    /// and query backgrounds are independent of the support set. With
    /// `random_apply` a support example keeps its original image unless its
    /// draw falls under `apply_prob`; the first example of every run of equal
    /// stage ids is always composited. The query set is always composited.
    ///
    /// Every field is checked before anything is drawn or replaced.
    ///
    /// # Errors
    ///
    /// * `Error::MissingField` - `stage_id` or `x_s` is absent, or `x_q` is
    ///   present without `stage_id_q`
    /// * `Error::BatchSizeMismatch` - stage ids and images disagree in count
    /// * `Error::StageIdOutOfRange` - a query stage id has no support stage
    /// * `Error::InvalidParameter` - a stage id of `usize::MAX`
    /// * `Error::Dataset` - the background dataset failed
    pub fn apply<'e, E>(&mut self, episode: &'e mut E) -> Result<&'e mut E, Error>
    where
        E: EpisodeFields,
        E::Pixel: Pixel<Subpixel = f32> + 'static,
        Image<E::Pixel>: NormalizeUnit<Unit = E::Pixel>,
    {
        let stage_ids = required_ids(episode, STAGE_IDS)?;
        if stage_ids.is_empty() {
            return Err(Error::EmptyBatch(STAGE_IDS));
        }
        let support_len = required_images(episode, SUPPORT_IMAGES)?.len();
        check_batch_size(STAGE_IDS, support_len, stage_ids.len())?;

        let query_stage_ids = match episode.images(QUERY_IMAGES)? {
            Some(query) => {
                let query_len = query.len();
                let ids = required_ids(episode, QUERY_STAGE_IDS)?;
                check_batch_size(QUERY_STAGE_IDS, query_len, ids.len())?;
                Some(ids)
            }
            None => None,
        };

        let (support_classes, query_classes) = if self.config.random_context {
            let support_classes =
                sample_classes(&mut self.rng, &self.class_map, stage_ids.len(), true);
            let query_classes = query_stage_ids
                .as_ref()
                .map(|ids| sample_classes(&mut self.rng, &self.class_map, ids.len(), true));
            (support_classes, query_classes)
        } else {
            let mut assignment =
                StageAssignment::draw(&mut self.rng, &self.class_map, &stage_ids)?;
            let support_classes =
                assignment.classes_for(&mut self.rng, &self.class_map, &stage_ids)?;
            let query_classes = query_stage_ids
                .as_ref()
                .map(|ids| assignment.classes_for(&mut self.rng, &self.class_map, ids))
                .transpose()?;
            debug!(?assignment, "assigned background classes to stages");
            (support_classes, query_classes)
        };

        let support = required_images(episode, SUPPORT_IMAGES)?;
        let backgrounds = self.fetch_backgrounds(&support_classes)?;
        let mut composited = self.process_one(support, &backgrounds)?;
        if self.config.random_apply {
            composited = self.gate_random_apply(support, composited, &stage_ids);
        }
        episode.replace_images(SUPPORT_IMAGES, composited)?;

        if let Some(query_classes) = query_classes {
            let query = required_images(episode, QUERY_IMAGES)?;
            let backgrounds = self.fetch_backgrounds(&query_classes)?;
            let composited = self.process_one(query, &backgrounds)?;
            episode.replace_images(QUERY_IMAGES, composited)?;
        }

        Ok(episode)
    }

    /// Composites a foreground batch onto a parallel batch of gray backgrounds
    ///
    /// Each foreground is normalized, upsampled 3x and dilated twice (5x5
    /// coarse, 3x3 fine). Back at the original size, the coarse result
    /// (nearest-neighbour) is the mask and the fine result (triangle filter)
    /// supplies the kept foreground values; [`MaskSource::Fine`] gates on the
    /// fine result instead. Backgrounds are cropped to the foreground size,
    /// optionally noised, and inverted before they fill the masked-out pixels.
    ///
    /// # Errors
    ///
    /// * `Error::BatchSizeMismatch` - The batches differ in length
    /// * `Error::DimensionMismatch` - Foregrounds differ in size, or random
    ///   cropping is used with backgrounds of different sizes
    /// * `Error::EmptyImage` - The foregrounds have no pixels
    /// * `Error::BackgroundTooSmall` - A random crop does not fit
    pub fn process_one<I>(
        &mut self,
        foreground: &[I],
        background: &[Image<Luma<f32>>],
    ) -> Result<Vec<Image<I::Unit>>, Error>
    where
        I: NormalizeUnit,
    {
        check_batch_size("background", foreground.len(), background.len())?;

        let Some(first) = foreground.first() else {
            return Ok(Vec::new());
        };
        let (width, height) = first.unit_dimensions();
        validate_non_empty_image(width, height)?;
        for image in foreground {
            validate_matching_dimensions((width, height), image.unit_dimensions())?;
        }

        let foreground: Vec<_> = foreground.iter().map(NormalizeUnit::normalize_unit).collect();
        let backgrounds = self.prepare_backgrounds(background, width, height)?;
        let mask_source = self.config.mask_source;

        #[cfg(feature = "rayon")]
        let composited = foreground
            .par_iter()
            .zip(backgrounds.par_iter())
            .map(|(fg, bg)| composite_one(fg, bg, mask_source))
            .collect();

        #[cfg(not(feature = "rayon"))]
        let composited = foreground
            .iter()
            .zip(&backgrounds)
            .map(|(fg, bg)| composite_one(fg, bg, mask_source))
            .collect();

        composited
    }

    fn fetch_backgrounds(
        &mut self,
        classes: &[D::Class],
    ) -> Result<Vec<Image<Luma<f32>>>, Error> {
        let ids = pick_image_ids(&mut self.rng, &self.background_dataset, classes)?;
        let images = self
            .background_dataset
            .fetch_images(&ids)
            .map_err(|err| Error::Dataset(Box::new(err)))?;
        check_batch_size("background", ids.len(), images.len())?;

        Ok(images.iter().map(to_unit_gray).collect())
    }

    /// Crops, noises and inverts the backgrounds
    fn prepare_backgrounds(
        &mut self,
        background: &[Image<Luma<f32>>],
        width: u32,
        height: u32,
    ) -> Result<Vec<Image<Luma<f32>>>, Error> {
        let mut prepared = if self.config.random_crop {
            self.random_crop(background, width, height)?
        } else {
            background
                .iter()
                .map(|image| crop_or_pad_center(image, width, height))
                .collect()
        };

        if self.config.noise_enabled() {
            let normal = Normal::new(0.0, self.config.gaussian_noise_std)
                .map_err(|err| Error::InvalidParameter(err.to_string()))?;
            for image in &mut prepared {
                for Luma([value]) in image.pixels_mut() {
                    *value = (*value + normal.sample(&mut self.rng)).clamp(0.0, 1.0);
                }
            }
        }

        for image in &mut prepared {
            for Luma([value]) in image.pixels_mut() {
                *value = 1.0 - *value;
            }
        }

        Ok(prepared)
    }

    /// One crop window, shared by the whole batch
    fn random_crop(
        &mut self,
        background: &[Image<Luma<f32>>],
        width: u32,
        height: u32,
    ) -> Result<Vec<Image<Luma<f32>>>, Error> {
        let Some(first) = background.first() else {
            return Ok(Vec::new());
        };
        let (background_width, background_height) = first.dimensions();
        for image in background {
            validate_matching_dimensions(first.dimensions(), image.dimensions())?;
        }

        if background_width < width || background_height < height {
            return Err(Error::BackgroundTooSmall {
                x: 0,
                y: 0,
                crop_width: width,
                crop_height: height,
                width: background_width,
                height: background_height,
            });
        }

        let x = self.rng.gen_range(0..=background_width - width);
        let y = self.rng.gen_range(0..=background_height - height);
        debug!(x, y, width, height, "random background crop");

        background
            .iter()
            .map(|image| crop_window(image, x, y, width, height))
            .collect()
    }

    /// Puts back the original image of every example that is neither drawn
    /// nor at a stage boundary
    fn gate_random_apply<P: Pixel>(
        &mut self,
        original: &[Image<P>],
        composited: Vec<Image<P>>,
        stage_ids: &[usize],
    ) -> Vec<Image<P>> {
        let apply_prob = self.config.apply_prob;
        let drawn: Vec<bool> = stage_ids
            .iter()
            .map(|_| self.rng.gen::<f32>() < apply_prob)
            .collect();
        let boundaries = std::iter::once(true).chain(
            stage_ids
                .iter()
                .tuple_windows()
                .map(|(previous, current)| previous != current),
        );
        let applied: Vec<bool> = drawn
            .into_iter()
            .zip(boundaries)
            .map(|(drawn, boundary)| drawn || boundary)
            .collect();

        debug!(
            applied = applied.iter().filter(|&&applied| applied).count(),
            total = applied.len(),
            "random background apply"
        );

        izip!(composited, original, applied)
            .map(|(composited, original, applied)| {
                if applied {
                    composited
                } else {
                    original.clone()
                }
            })
            .collect()
    }
}

fn required_ids<E: EpisodeFields>(episode: &E, name: &'static str) -> Result<Vec<usize>, Error> {
    episode
        .ids(name)?
        .map(<[usize]>::to_vec)
        .ok_or_else(|| Error::MissingField(name.to_owned()))
}

fn required_images<'e, E: EpisodeFields>(
    episode: &'e E,
    name: &'static str,
) -> Result<&'e [Image<E::Pixel>], Error> {
    episode
        .images(name)?
        .ok_or_else(|| Error::MissingField(name.to_owned()))
}

fn check_batch_size(field: &'static str, expected: usize, actual: usize) -> Result<(), Error> {
    if expected == actual {
        Ok(())
    } else {
        Err(Error::BatchSizeMismatch {
            field,
            expected,
            actual,
        })
    }
}

/// Composites one normalized foreground onto one prepared background
fn composite_one<P>(
    foreground: &Image<P>,
    background: &Image<Luma<f32>>,
    mask_source: MaskSource,
) -> Result<Image<P>, Error>
where
    P: Pixel<Subpixel = f32> + 'static,
{
    let (width, height) = foreground.dimensions();
    validate_matching_dimensions((width, height), background.dimensions())?;

    let upsampled = imageops::resize(
        foreground,
        width * UPSAMPLE_FACTOR,
        height * UPSAMPLE_FACTOR,
        FilterType::Triangle,
    );
    let coarse = dilate_flat(&upsampled, COARSE_KERNEL_SIZE)?;
    let fine = dilate_flat(&upsampled, FINE_KERNEL_SIZE)?;

    let coarse = imageops::resize(&coarse, width, height, FilterType::Nearest);
    let mut composited = imageops::resize(&fine, width, height, FilterType::Triangle);
    let mask = match mask_source {
        MaskSource::Coarse => coarse,
        MaskSource::Fine => composited.clone(),
    };

    for (pixel, mask_pixel, &Luma([inverted])) in
        izip!(composited.pixels_mut(), mask.pixels(), background.pixels())
    {
        for (value, &mask_value) in pixel.channels_mut().iter_mut().zip(mask_pixel.channels()) {
            if mask_value <= MASK_THRESHOLD {
                *value = inverted;
            }
        }
    }

    Ok(composited)
}
