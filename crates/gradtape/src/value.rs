//! Dense tensor values and the elementwise kernels the engine is built on.
//!
//! The engine itself never inspects tensor contents beyond these helpers;
//! forward ops and gradient rules are expressed entirely through `apply`,
//! `apply_binary` and `reduce_to_shape`.

use crate::error::GradientError;
use crate::scalar::Scalar;

/// A dense tensor value: contiguous data plus a shape.
///
/// Data is stored in column-major order. A value with an empty shape is a
/// scalar holding exactly one element.
///
/// # Examples
///
/// ```
/// use gradtape::TensorValue;
///
/// let t: TensorValue<f64> = TensorValue::from_vec(vec![1.0, 2.0, 3.0], &[3]).unwrap();
/// assert_eq!(t.shape(), &[3]);
/// assert_eq!(t.len(), 3);
///
/// let s = TensorValue::scalar(2.0);
/// assert_eq!(s.len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct TensorValue<T: Scalar> {
    data: Vec<T>,
    shape: Vec<usize>,
}

impl<T: Scalar> TensorValue<T> {
    /// Create a zero-initialized value with the given shape.
    pub fn zeros(shape: &[usize]) -> Self {
        let len: usize = shape.iter().product::<usize>().max(1);
        Self {
            data: vec![T::zero(); len],
            shape: shape.to_vec(),
        }
    }

    /// Create a value filled with ones.
    pub fn ones(shape: &[usize]) -> Self {
        let len: usize = shape.iter().product::<usize>().max(1);
        Self {
            data: vec![T::one(); len],
            shape: shape.to_vec(),
        }
    }

    /// Create a rank-0 (scalar) value.
    pub fn scalar(v: T) -> Self {
        Self {
            data: vec![v],
            shape: Vec::new(),
        }
    }

    /// Create a value from data and shape.
    ///
    /// # Errors
    ///
    /// Returns `GradientError::ShapeMismatch` if the data length does not
    /// match the shape's element count.
    pub fn from_vec(data: Vec<T>, shape: &[usize]) -> Result<Self, GradientError> {
        let expected: usize = shape.iter().product::<usize>().max(1);
        if data.len() != expected {
            return Err(GradientError::ShapeMismatch {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            data,
            shape: shape.to_vec(),
        })
    }

    /// Shape of the value.
    #[inline]
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Number of elements.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if the value has zero elements.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Whether this value broadcasts against any shape (single element).
    #[inline]
    pub fn is_scalar(&self) -> bool {
        self.data.len() == 1
    }

    /// Underlying data as a slice.
    #[inline]
    pub fn data(&self) -> &[T] {
        &self.data
    }

    /// Sum of all elements.
    pub fn sum(&self) -> T {
        self.data.iter().fold(T::zero(), |acc, &x| acc + x)
    }

    /// Apply a function to each element, returning a new value.
    pub fn apply<F>(&self, f: F) -> Self
    where
        F: Fn(T) -> T,
    {
        Self {
            data: self.data.iter().map(|&x| f(x)).collect(),
            shape: self.shape.clone(),
        }
    }

    /// Multiply all elements by a scalar.
    pub fn scale(&self, alpha: T) -> Self {
        self.apply(|x| x * alpha)
    }

    /// Combine two values element-wise.
    ///
    /// Shapes must match, except that a single-element operand broadcasts
    /// against the other operand's shape.
    ///
    /// # Errors
    ///
    /// Returns `GradientError::ShapeMismatch` if neither operand is a
    /// broadcastable scalar and the shapes disagree.
    pub fn apply_binary<F>(a: &Self, b: &Self, f: F) -> Result<Self, GradientError>
    where
        F: Fn(T, T) -> T,
    {
        if a.shape == b.shape {
            let data = a
                .data
                .iter()
                .zip(b.data.iter())
                .map(|(&x, &y)| f(x, y))
                .collect();
            return Ok(Self {
                data,
                shape: a.shape.clone(),
            });
        }
        if a.is_scalar() {
            let x = a.data[0];
            return Ok(Self {
                data: b.data.iter().map(|&y| f(x, y)).collect(),
                shape: b.shape.clone(),
            });
        }
        if b.is_scalar() {
            let y = b.data[0];
            return Ok(Self {
                data: a.data.iter().map(|&x| f(x, y)).collect(),
                shape: a.shape.clone(),
            });
        }
        Err(GradientError::ShapeMismatch {
            expected: a.len(),
            actual: b.len(),
        })
    }

    /// Reduce this value to a target shape by summation.
    ///
    /// Used by gradient rules to fold the gradient of a broadcast operand
    /// back to the operand's own shape. Only the identity reduction and the
    /// full reduction to a single element are supported; anything else is a
    /// shape mismatch.
    pub fn reduce_to_shape(&self, shape: &[usize]) -> Result<Self, GradientError> {
        if self.shape == shape {
            return Ok(self.clone());
        }
        let target_len: usize = shape.iter().product::<usize>().max(1);
        if target_len == 1 {
            return Ok(Self {
                data: vec![self.sum()],
                shape: shape.to_vec(),
            });
        }
        Err(GradientError::ShapeMismatch {
            expected: target_len,
            actual: self.len(),
        })
    }
}
