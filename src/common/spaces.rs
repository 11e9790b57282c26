use std::sync::{LazyLock, Mutex, MutexGuard};

use dyn_clone::DynClone;
use rand::{rngs::StdRng, Rng, SeedableRng};

pub static SHARED_RNG: LazyLock<Mutex<StdRng>> =
    LazyLock::new(|| Mutex::new(StdRng::seed_from_u64(1234)));

fn shared_rng() -> MutexGuard<'static, StdRng> {
    // a poisoned lock still holds a usable rng
    SHARED_RNG.lock().unwrap_or_else(|e| e.into_inner())
}

/// Reseeds the rng every space samples from.
pub fn seed_spaces_rng(seed: u64) {
    *shared_rng() = StdRng::seed_from_u64(seed);
}

/// Defines a space in which a action, observation, or other may exist
pub trait Space<T: Clone>: DynClone {
    /// tests whether the sample is contained within the space
    fn contains(&self, sample: &T) -> bool;

    /// randomly samples from the space
    fn sample(&mut self) -> T;

    /// returns some semantic representation of the space,
    /// e.g. the number of actions of a discrete space
    fn shape(&self) -> T;

    /// whether the space has nothing to sample from
    fn is_empty(&self) -> bool {
        false
    }
}

dyn_clone::clone_trait_object!(<T> Space<T> where T: Clone);

/// Defines a Discrete Space.
///
/// A Discrete space is a space on `usize` where samples
/// are drawn uniformly from `[0, n)`.
#[derive(Debug, Clone)]
pub struct Discrete {
    /// The upper bound on the space
    n: usize,
}

impl From<usize> for Discrete {
    fn from(value: usize) -> Self {
        Self { n: value }
    }
}

impl Space<usize> for Discrete {
    fn contains(&self, sample: &usize) -> bool {
        *sample < self.n
    }

    fn sample(&mut self) -> usize {
        shared_rng().gen_range(0..self.n)
    }

    fn shape(&self) -> usize {
        self.n
    }

    fn is_empty(&self) -> bool {
        self.n == 0
    }
}

/// Defines a `BoxSpace<T>`.
///
/// A `BoxSpace` is an n-dimensional container where each
/// dimension is bounded by `[low, high]`. Samples are drawn
/// uniformly per dimension.
#[derive(Debug, Clone)]
pub struct BoxSpace<T> {
    /// The lower bound on the space
    low: T,

    /// The upper bound on the space
    high: T,
}

impl From<(Vec<f32>, Vec<f32>)> for BoxSpace<Vec<f32>> {
    fn from(value: (Vec<f32>, Vec<f32>)) -> Self {
        Self {
            low: value.0,
            high: value.1,
        }
    }
}

impl Space<Vec<f32>> for BoxSpace<Vec<f32>> {
    fn contains(&self, sample: &Vec<f32>) -> bool {
        if sample.len() != self.low.len() {
            return false;
        }

        sample
            .iter()
            .zip(self.low.iter())
            .zip(self.high.iter())
            .all(|((&s, &l), &h)| l <= s && s <= h)
    }

    fn sample(&mut self) -> Vec<f32> {
        let mut rng = shared_rng();
        self.low
            .iter()
            .zip(self.high.iter())
            .map(|(&l, &h)| rng.gen_range(l..=h))
            .collect()
    }

    fn shape(&self) -> Vec<f32> {
        self.low.clone()
    }

    fn is_empty(&self) -> bool {
        self.low.len() != self.high.len()
            || self
                .low
                .iter()
                .zip(self.high.iter())
                .any(|(l, h)| l.partial_cmp(h).map_or(true, |o| o.is_gt()))
    }
}

impl BoxSpace<Vec<f32>> {
    pub fn low(&self) -> &Vec<f32> {
        &self.low
    }

    pub fn high(&self) -> &Vec<f32> {
        &self.high
    }
}

#[cfg(test)]
mod test {
    use crate::common::spaces::{BoxSpace, Discrete, Space};

    #[test]
    fn test_discrete_space() {
        let mut space = Discrete::from(2);

        assert_eq!(space.shape(), 2);
        assert!(space.contains(&0));
        assert!(space.contains(&1));
        assert!(!space.contains(&2));

        let sample = space.sample();
        assert!((sample == 0) | (sample == 1))
    }

    #[test]
    fn test_discrete_samples_stay_in_space() {
        let mut space = Discrete::from(7);

        for _ in 0..200 {
            let s = space.sample();
            assert!(space.contains(&s));
        }
    }

    #[test]
    fn test_box_f32_space() {
        let low = vec![0.0, -0.1, 0.1];
        let high = vec![1.0, 1.1, 0.9];

        let mut space = BoxSpace::from((low, high));

        assert_eq!(space.shape().len(), 3);

        assert!(space.contains(&vec![0.0, 1.1, 0.3]));
        assert!(!space.contains(&vec![30.0, 1.1, 0.3]));
        assert!(!space.contains(&vec![0.5]));

        let sample = space.sample();
        assert!(sample.len() == 3);
        assert!(space.contains(&sample));
    }

    #[test]
    fn test_boxed_space_clones() {
        let space: Box<dyn Space<usize>> = Box::new(Discrete::from(3));
        let cloned = dyn_clone::clone_box(&*space);

        assert_eq!(cloned.shape(), 3);
    }

    #[test]
    fn test_empty_spaces() {
        assert!(Discrete::from(0).is_empty());
        assert!(!Discrete::from(1).is_empty());

        assert!(BoxSpace::from((vec![1.0], vec![0.0])).is_empty());
        assert!(BoxSpace::from((vec![0.0, 0.0], vec![1.0])).is_empty());
        assert!(BoxSpace::from((vec![f32::NAN], vec![1.0])).is_empty());
        assert!(!BoxSpace::from((vec![0.5], vec![0.5])).is_empty());
    }
}
