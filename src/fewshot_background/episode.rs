use std::collections::BTreeMap;
use std::fmt;

use image::Pixel;

use crate::error::Error;
use crate::Image;

/// Support images, `[B, H, W, C]`
pub const SUPPORT_IMAGES: &str = "x_s";
/// Stage id of every support example, `[B]`
pub const STAGE_IDS: &str = "stage_id";
/// Query images, optional
pub const QUERY_IMAGES: &str = "x_q";
/// Stage id of every query example, required with [`QUERY_IMAGES`]
pub const QUERY_STAGE_IDS: &str = "stage_id_q";

/// Access to the named batches of a few-shot episode
///
/// This is the only view the compositor has of an episode. Lookups return
/// `Ok(None)` for an absent field and an error for a field of the other
/// kind.
pub trait EpisodeFields {
    /// Pixel type of the image batches
    type Pixel: Pixel;

    /// Integer batch stored under `name`
    fn ids(&self, name: &str) -> Result<Option<&[usize]>, Error>;

    /// Image batch stored under `name`
    fn images(&self, name: &str) -> Result<Option<&[Image<Self::Pixel>]>, Error>;

    /// Replaces the existing image batch stored under `name`
    fn replace_images(&mut self, name: &str, images: Vec<Image<Self::Pixel>>)
        -> Result<(), Error>;
}

/// One named batch of an [`Episode`]
#[derive(Clone)]
pub enum EpisodeField<P: Pixel> {
    /// One image per example
    Images(Vec<Image<P>>),
    /// One integer per example (stage ids, labels, ...)
    Ids(Vec<usize>),
}

impl<P: Pixel> EpisodeField<P> {
    /// Number of examples in the batch
    pub fn len(&self) -> usize {
        match self {
            Self::Images(images) => images.len(),
            Self::Ids(ids) => ids.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<P: Pixel> fmt::Debug for EpisodeField<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Images(images) => {
                let shape = images.first().map(|image| {
                    let (width, height) = image.dimensions();
                    (height, width, P::CHANNEL_COUNT)
                });
                f.debug_struct("Images")
                    .field("batch", &images.len())
                    .field("shape", &shape)
                    .finish()
            }
            Self::Ids(ids) => f.debug_tuple("Ids").field(ids).finish(),
        }
    }
}

/// A few-shot episode: named batches keyed by field name
///
/// # Examples
///
/// ```
/// use fewshot_background::{Episode, EpisodeFields, Image, STAGE_IDS, SUPPORT_IMAGES};
/// use image::Luma;
///
/// let episode = Episode::new()
///     .with_images(SUPPORT_IMAGES, vec![Image::<Luma<f32>>::new(8, 8); 2])
///     .with_ids(STAGE_IDS, vec![0, 1]);
///
/// assert_eq!(episode.ids(STAGE_IDS)?, Some(&[0, 1][..]));
/// assert_eq!(episode.images(SUPPORT_IMAGES)?.map(<[_]>::len), Some(2));
/// # Ok::<(), fewshot_background::Error>(())
/// ```
#[derive(Clone)]
pub struct Episode<P: Pixel> {
    fields: BTreeMap<String, EpisodeField<P>>,
}

impl<P: Pixel> Default for Episode<P> {
    fn default() -> Self {
        Self {
            fields: BTreeMap::new(),
        }
    }
}

impl<P: Pixel> fmt::Debug for Episode<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.fields.iter()).finish()
    }
}

impl<P: Pixel> Episode<P> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an image batch under `name`
    #[must_use]
    pub fn with_images(mut self, name: impl Into<String>, images: Vec<Image<P>>) -> Self {
        self.insert(name, EpisodeField::Images(images));
        self
    }

    /// Adds an integer batch under `name`
    #[must_use]
    pub fn with_ids(mut self, name: impl Into<String>, ids: Vec<usize>) -> Self {
        self.insert(name, EpisodeField::Ids(ids));
        self
    }

    /// Stores a field, returning the one it replaces
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        field: EpisodeField<P>,
    ) -> Option<EpisodeField<P>> {
        self.fields.insert(name.into(), field)
    }

    /// Field stored under `name`
    pub fn get(&self, name: &str) -> Option<&EpisodeField<P>> {
        self.fields.get(name)
    }

    /// Removes and returns the field stored under `name`
    pub fn remove(&mut self, name: &str) -> Option<EpisodeField<P>> {
        self.fields.remove(name)
    }

    /// Whether a field is stored under `name`
    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Field names in sorted order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }
}

impl<P: Pixel> EpisodeFields for Episode<P> {
    type Pixel = P;

    fn ids(&self, name: &str) -> Result<Option<&[usize]>, Error> {
        match self.fields.get(name) {
            None => Ok(None),
            Some(EpisodeField::Ids(ids)) => Ok(Some(ids)),
            Some(EpisodeField::Images(_)) => Err(Error::FieldType {
                field: name.to_owned(),
                expected: "ids",
            }),
        }
    }

    fn images(&self, name: &str) -> Result<Option<&[Image<P>]>, Error> {
        match self.fields.get(name) {
            None => Ok(None),
            Some(EpisodeField::Images(images)) => Ok(Some(images)),
            Some(EpisodeField::Ids(_)) => Err(Error::FieldType {
                field: name.to_owned(),
                expected: "images",
            }),
        }
    }

    fn replace_images(&mut self, name: &str, images: Vec<Image<P>>) -> Result<(), Error> {
        match self.fields.get_mut(name) {
            Some(EpisodeField::Images(current)) => {
                *current = images;
                Ok(())
            }
            Some(EpisodeField::Ids(_)) => Err(Error::FieldType {
                field: name.to_owned(),
                expected: "images",
            }),
            None => Err(Error::MissingField(name.to_owned())),
        }
    }
}
