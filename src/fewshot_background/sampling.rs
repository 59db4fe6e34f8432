//! Random background selection.

use std::collections::{BTreeMap, BTreeSet};

use rand::seq::index;
use rand::Rng;
use tracing::trace;

use crate::error::Error;
use crate::fewshot_background::dataset::BackgroundDataset;
use crate::fewshot_background::episode::STAGE_IDS;

/// Draws `count` classes from `class_map`
///
/// Without replacement the classes are distinct and come out in random
/// order. The caller guarantees `class_map` is non-empty, and not shorter
/// than `count` when `replace` is false.
pub(crate) fn sample_classes<C, R>(
    rng: &mut R,
    class_map: &[C],
    count: usize,
    replace: bool,
) -> Vec<C>
where
    C: Clone,
    R: Rng,
{
    if replace {
        (0..count).map(|_| random_class(rng, class_map)).collect()
    } else {
        index::sample(rng, class_map.len(), count)
            .into_iter()
            .map(|i| class_map[i].clone())
            .collect()
    }
}

/// Background class of every stage id in `0..stages`
///
/// Without replacement every stage gets its class up front. With
/// replacement the classes are independent, so a stage only gets one the
/// first time it is looked up and sparse stage ids cost nothing.
#[derive(Debug, Clone)]
pub(crate) struct StageAssignment<C> {
    classes: BTreeMap<usize, C>,
    stages: usize,
}

impl<C: Clone> StageAssignment<C> {
    /// Assigns classes to the stages `0..=max(stage_ids)`
    ///
    /// Classes are drawn with replacement only when the class map is too
    /// short to give every stage its own.
    pub(crate) fn draw<R: Rng>(
        rng: &mut R,
        class_map: &[C],
        stage_ids: &[usize],
    ) -> Result<Self, Error> {
        if class_map.is_empty() {
            return Err(Error::EmptyClassMap);
        }

        let max = stage_ids
            .iter()
            .max()
            .copied()
            .ok_or(Error::EmptyBatch(STAGE_IDS))?;
        let stages = max.checked_add(1).ok_or_else(|| {
            Error::InvalidParameter(format!("stage id {max} exceeds the stage count range"))
        })?;

        let classes = if class_map.len() >= stages {
            sample_classes(rng, class_map, stages, false)
                .into_iter()
                .enumerate()
                .collect()
        } else {
            stage_ids
                .iter()
                .copied()
                .collect::<BTreeSet<_>>()
                .into_iter()
                .map(|stage_id| (stage_id, random_class(rng, class_map)))
                .collect()
        };

        Ok(Self { classes, stages })
    }

    /// Looks up the class of every stage id, drawing one for a stage that
    /// has none yet
    pub(crate) fn classes_for<R: Rng>(
        &mut self,
        rng: &mut R,
        class_map: &[C],
        stage_ids: &[usize],
    ) -> Result<Vec<C>, Error> {
        stage_ids
            .iter()
            .map(|&stage_id| {
                if stage_id >= self.stages {
                    return Err(Error::StageIdOutOfRange {
                        stage_id,
                        assigned: self.stages,
                    });
                }
                Ok(self
                    .classes
                    .entry(stage_id)
                    .or_insert_with(|| random_class(rng, class_map))
                    .clone())
            })
            .collect()
    }
}

fn random_class<C: Clone, R: Rng>(rng: &mut R, class_map: &[C]) -> C {
    class_map[rng.gen_range(0..class_map.len())].clone()
}

/// Picks one image id of each class uniformly at random
pub(crate) fn pick_image_ids<D, R>(
    rng: &mut R,
    dataset: &D,
    classes: &[D::Class],
) -> Result<Vec<D::ImageId>, Error>
where
    D: BackgroundDataset,
    R: Rng,
{
    classes
        .iter()
        .map(|class| {
            let ids = dataset
                .image_ids(class)
                .ok_or_else(|| Error::UnknownBackgroundClass(format!("{class:?}")))?;
            if ids.is_empty() {
                return Err(Error::EmptyBackgroundClass(format!("{class:?}")));
            }

            let id = ids[rng.gen_range(0..ids.len())].clone();
            trace!(?class, ?id, "picked background image");
            Ok(id)
        })
        .collect()
}
