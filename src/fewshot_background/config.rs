use crate::error::Error;

/// Which dilation result decides whether a pixel belongs to the foreground
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MaskSource {
    /// 5x5 dilation resized nearest-neighbour; leaves a thin margin around
    /// strokes before the background starts
    #[default]
    Coarse,
    /// 3x3 dilation resized with the triangle filter, the same image that
    /// supplies the kept foreground values
    Fine,
}

/// Construction-time settings of a [`crate::BackgroundCompositor`]
///
/// The settings are fixed once the compositor is built.
///
/// # Examples
///
/// ```
/// use fewshot_background::{BackgroundConfig, MaskSource};
///
/// let config = BackgroundConfig::default()
///     .with_random_apply(true)
///     .with_apply_prob(0.5)
///     .with_gaussian_noise_std(0.1)
///     .with_seed(7);
///
/// assert!(config.validate().is_ok());
/// assert_eq!(config.mask_source, MaskSource::Coarse);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct BackgroundConfig {
    /// Random crop of the background instead of a center crop/pad
    pub random_crop: bool,
    /// Skip compositing on a random subset of support examples
    pub random_apply: bool,
    /// Sample a background class per example instead of per stage id
    pub random_context: bool,
    /// Standard deviation of additive background noise; `<= 0` disables it
    pub gaussian_noise_std: f32,
    /// Per-example compositing probability when `random_apply` is set
    pub apply_prob: f32,
    pub mask_source: MaskSource,
    /// Seed of the compositor's random generator
    pub seed: u64,
}

impl Default for BackgroundConfig {
    fn default() -> Self {
        Self {
            random_crop: true,
            random_apply: false,
            random_context: false,
            gaussian_noise_std: -1.0,
            apply_prob: 1.0,
            mask_source: MaskSource::Coarse,
            seed: 0,
        }
    }
}

impl BackgroundConfig {
    /// Sets random cropping of the background
    #[must_use]
    pub const fn with_random_crop(mut self, random_crop: bool) -> Self {
        self.random_crop = random_crop;
        self
    }

    /// Sets skipping of compositing on a random subset of support examples
    #[must_use]
    pub const fn with_random_apply(mut self, random_apply: bool) -> Self {
        self.random_apply = random_apply;
        self
    }

    /// Sets per-example background classes
    #[must_use]
    pub const fn with_random_context(mut self, random_context: bool) -> Self {
        self.random_context = random_context;
        self
    }

    /// Sets the background noise standard deviation; `<= 0` disables noise
    #[must_use]
    pub const fn with_gaussian_noise_std(mut self, gaussian_noise_std: f32) -> Self {
        self.gaussian_noise_std = gaussian_noise_std;
        self
    }

    /// Sets the per-example compositing probability used by `random_apply`
    #[must_use]
    pub const fn with_apply_prob(mut self, apply_prob: f32) -> Self {
        self.apply_prob = apply_prob;
        self
    }

    /// Sets which dilation gates the composite
    #[must_use]
    pub const fn with_mask_source(mut self, mask_source: MaskSource) -> Self {
        self.mask_source = mask_source;
        self
    }

    /// Sets the seed of the random generator
    #[must_use]
    pub const fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Whether background noise is added
    #[inline]
    pub fn noise_enabled(&self) -> bool {
        self.gaussian_noise_std > 0.0
    }

    /// Checks the numeric settings
    ///
    /// # Errors
    ///
    /// * `Error::InvalidParameter` - `apply_prob` outside `[0, 1]` or a
    ///   non-finite noise standard deviation
    pub fn validate(&self) -> Result<(), Error> {
        if !(0.0..=1.0).contains(&self.apply_prob) {
            return Err(Error::InvalidParameter(format!(
                "apply_prob must be within [0, 1], got {}",
                self.apply_prob
            )));
        }

        if !self.gaussian_noise_std.is_finite() {
            return Err(Error::InvalidParameter(format!(
                "gaussian_noise_std must be finite, got {}",
                self.gaussian_noise_std
            )));
        }

        Ok(())
    }
}
