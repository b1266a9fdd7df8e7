use std::{
    fmt,
    ops::{Add, Neg, Sub},
};

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use thiserror::Error;

use crate::utils::zip_padded::zip_padded;

type CapacityVector = SmallVec<[i32; 4]>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CapacityError {
    #[error("capacity dimension {dimension} divides {numerator} by zero")]
    DivisionByZero { dimension: usize, numerator: i32 },
}

/// Sign of a capacity vector taken over all of its dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapacitySign {
    Positive,
    Zero,
    Negative,
    Mixed,
}

/// Multi-dimensional integer amount used for demands, loads and vehicle capacities.
///
/// Dimensions beyond the stored length are zero, so vectors of different
/// lengths can be combined freely. Every operation returns a new vector.
/// Arithmetic saturates at the bounds of `i32`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Capacity(CapacityVector);

impl Capacity {
    pub const EMPTY: Capacity = Capacity(CapacityVector::new_const());

    pub fn empty() -> Self {
        Self::EMPTY
    }

    pub fn from_vec(vec: Vec<i32>) -> Self {
        Capacity(CapacityVector::from_vec(vec))
    }

    pub fn with_dimensions(dimensions: usize) -> Self {
        let mut vec = CapacityVector::with_capacity(dimensions);
        vec.resize(dimensions, 0);
        Capacity(vec)
    }

    /// Number of explicitly stored dimensions.
    pub fn dimensions(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn get(&self, dimension: usize) -> i32 {
        self.0.get(dimension).copied().unwrap_or(0)
    }

    pub fn iter(&self) -> impl Iterator<Item = i32> + '_ {
        self.0.iter().copied()
    }

    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|&value| value == 0)
    }

    fn combine(&self, other: &Capacity, op: impl Fn(i32, i32) -> i32) -> Capacity {
        Capacity(
            zip_padded(self.iter(), other.iter())
                .map(|(a, b)| op(a, b))
                .collect(),
        )
    }

    pub fn add(&self, other: &Capacity) -> Capacity {
        self.combine(other, i32::saturating_add)
    }

    pub fn subtract(&self, other: &Capacity) -> Capacity {
        self.combine(other, i32::saturating_sub)
    }

    pub fn invert(&self) -> Capacity {
        Capacity(self.0.iter().map(|value| value.saturating_neg()).collect())
    }

    pub fn abs(&self) -> Capacity {
        Capacity(self.0.iter().map(|value| value.saturating_abs()).collect())
    }

    pub fn max(a: &Capacity, b: &Capacity) -> Capacity {
        a.combine(b, i32::max)
    }

    pub fn min(a: &Capacity, b: &Capacity) -> Capacity {
        a.combine(b, i32::min)
    }

    pub fn is_less_or_equal(&self, other: &Capacity) -> bool {
        zip_padded(self.iter(), other.iter()).all(|(a, b)| a <= b)
    }

    pub fn is_greater_or_equal(&self, other: &Capacity) -> bool {
        zip_padded(self.iter(), other.iter()).all(|(a, b)| a >= b)
    }

    pub fn sign(&self) -> CapacitySign {
        let has_positive = self.0.iter().any(|&value| value > 0);
        let has_negative = self.0.iter().any(|&value| value < 0);

        match (has_positive, has_negative) {
            (false, false) => CapacitySign::Zero,
            (true, false) => CapacitySign::Positive,
            (false, true) => CapacitySign::Negative,
            (true, true) => CapacitySign::Mixed,
        }
    }

    /// Average ratio `self[i] / denominator[i]` over the dimensions where at least one side is non-zero.
    ///
    /// Dimensions where both sides are zero do not contribute. A non-zero
    /// numerator over a zero denominator is an error.
    pub fn divide(&self, denominator: &Capacity) -> Result<f64, CapacityError> {
        let mut sum = 0.0;
        let mut contributing = 0;

        for (dimension, (numerator, divisor)) in
            zip_padded(self.iter(), denominator.iter()).enumerate()
        {
            if divisor == 0 {
                if numerator != 0 {
                    return Err(CapacityError::DivisionByZero {
                        dimension,
                        numerator,
                    });
                }
                continue;
            }

            sum += numerator as f64 / divisor as f64;
            contributing += 1;
        }

        if contributing == 0 {
            Ok(0.0)
        } else {
            Ok(sum / contributing as f64)
        }
    }
}

impl PartialEq for Capacity {
    fn eq(&self, other: &Capacity) -> bool {
        zip_padded(self.iter(), other.iter()).all(|(a, b)| a == b)
    }
}

impl Eq for Capacity {}

impl Add<&Capacity> for &Capacity {
    type Output = Capacity;

    fn add(self, rhs: &Capacity) -> Self::Output {
        Capacity::add(self, rhs)
    }
}

impl Sub<&Capacity> for &Capacity {
    type Output = Capacity;

    fn sub(self, rhs: &Capacity) -> Self::Output {
        self.subtract(rhs)
    }
}

impl Neg for &Capacity {
    type Output = Capacity;

    fn neg(self) -> Self::Output {
        self.invert()
    }
}

impl From<Vec<i32>> for Capacity {
    fn from(vec: Vec<i32>) -> Self {
        Capacity::from_vec(vec)
    }
}

impl fmt::Display for Capacity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (index, value) in self.0.iter().enumerate() {
            if index > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{value}")?;
        }
        write!(f, "]")
    }
}
