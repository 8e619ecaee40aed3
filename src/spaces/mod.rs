//! Space descriptors: the two leaf kinds live here, composites in `composite`.

pub mod composite;
pub mod space;
pub mod value;

use ndarray::{ArrayD, IxDyn};
use rand::distributions::{Distribution, Uniform};
use rand::Rng;

use crate::core::{GymError, Result};
use crate::utils::rng::PrngKey;

pub use composite::{AnySpace, DictSpace, TupleSpace};
pub use space::Space;
pub use value::Value;

/// A categorical space of integers in `[0, n)`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Discrete {
    n: i64,
}

impl Discrete {
    /// Fails with [`GymError::InvalidSpaceConfig`] unless `n > 0`.
    ///
    /// `n == 0` is rejected too. Category spaces elsewhere commonly accept it,
    /// but an empty space has nothing to sample.
    pub fn new(n: i64) -> Result<Self> {
        if n <= 0 {
            return Err(GymError::InvalidSpaceConfig(format!(
                "Discrete requires num_categories > 0, got {n}"
            )));
        }
        Ok(Self { n })
    }

    /// For callers that have already validated `n > 0`.
    pub(crate) fn new_unchecked(n: i64) -> Self {
        debug_assert!(n > 0);
        Self { n }
    }

    pub fn n(&self) -> i64 { self.n }
}

impl Space for Discrete {
    type Element = i64;

    /// Uniform over every category in `[0, n)`, including `n - 1`.
    fn sample(&self, key: PrngKey) -> Self::Element {
        key.into_rng().gen_range(0..self.n)
    }

    fn contains(&self, elem: &Self::Element) -> bool { (*elem >= 0) & (*elem < self.n) }
}

/// Numeric type a [`BoxSpace`] casts its samples to. Values are carried as `f64`
/// and rounded through the declared type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum Dtype {
    #[default]
    F32,
    F64,
    I32,
    I64,
}

impl Dtype {
    /// Round `v` through this type. Integer casts truncate toward zero and
    /// saturate at the type's range.
    pub fn cast(self, v: f64) -> f64 {
        match self {
            Dtype::F32 => v as f32 as f64,
            Dtype::F64 => v,
            Dtype::I32 => v as i32 as f64,
            Dtype::I64 => v as i64 as f64,
        }
    }

    pub fn is_integer(self) -> bool { matches!(self, Dtype::I32 | Dtype::I64) }
}

/// An interval space: every element of an array of fixed `shape` lies in
/// `[low, high]`.
#[derive(Clone, Debug, PartialEq)]
pub struct BoxSpace {
    low: f64,
    high: f64,
    shape: Vec<usize>,
    dtype: Dtype,
}

impl BoxSpace {
    pub fn new(low: f64, high: f64, shape: &[usize], dtype: Dtype) -> Result<Self> {
        if shape.is_empty() {
            return Err(GymError::InvalidSpaceConfig("BoxSpace requires a non-empty shape".into()));
        }
        if let Some(i) = shape.iter().position(|&d| d == 0) {
            return Err(GymError::InvalidSpaceConfig(format!("BoxSpace shape[{i}] must be > 0")));
        }
        if !low.is_finite() || !high.is_finite() {
            return Err(GymError::InvalidSpaceConfig(format!(
                "BoxSpace bounds must be finite, got [{low}, {high}]"
            )));
        }
        if low > high {
            return Err(GymError::InvalidSpaceConfig(format!("BoxSpace low {low} > high {high}")));
        }
        if !(high - low).is_finite() {
            return Err(GymError::InvalidSpaceConfig(format!(
                "BoxSpace width of [{low}, {high}] overflows f64"
            )));
        }
        Ok(Self { low, high, shape: shape.to_vec(), dtype })
    }

    /// For callers that have already validated the shape and bounds.
    pub(crate) fn new_unchecked(low: f64, high: f64, shape: &[usize], dtype: Dtype) -> Self {
        debug_assert!(!shape.is_empty() && low <= high);
        Self { low, high, shape: shape.to_vec(), dtype }
    }

    pub fn low(&self) -> f64 { self.low }
    pub fn high(&self) -> f64 { self.high }
    pub fn shape(&self) -> &[usize] { &self.shape }
    pub fn dtype(&self) -> Dtype { self.dtype }

    /// Total number of elements.
    pub fn size(&self) -> usize { self.shape.iter().product() }
}

impl Space for BoxSpace {
    type Element = ArrayD<f64>;

    fn sample(&self, key: PrngKey) -> Self::Element {
        let mut rng = key.into_rng();
        let dist = Uniform::new_inclusive(self.low, self.high);
        ArrayD::from_shape_fn(IxDyn(&self.shape), |_| self.dtype.cast(dist.sample(&mut rng)))
    }

    fn contains(&self, elem: &Self::Element) -> bool {
        if elem.shape() != self.shape.as_slice() {
            return false;
        }
        let lo = self.dtype.cast(self.low);
        let hi = self.dtype.cast(self.high);
        // Non-short-circuiting AND so every element is inspected.
        elem.fold(true, |acc, &v| acc & (lo <= v) & (v <= hi))
    }
}
