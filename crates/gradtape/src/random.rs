//! Random tensor values, used mainly for gradient-check inputs.

use crate::scalar::Scalar;
use crate::value::TensorValue;
use rand::Rng;
use rand::distr::StandardUniform;
use rand_distr::StandardNormal;

/// Tensor with elements drawn uniformly from [0, 1).
///
/// # Example
///
/// ```
/// use gradtape::{TensorValue, random_uniform};
/// use rand::SeedableRng;
/// use rand::rngs::StdRng;
///
/// let mut rng = StdRng::seed_from_u64(42);
/// let t: TensorValue<f64> = random_uniform(&[2, 3], &mut rng);
/// assert_eq!(t.len(), 6);
/// assert!(t.data().iter().all(|&x| (0.0..1.0).contains(&x)));
/// ```
pub fn random_uniform<T: Scalar, R: Rng>(shape: &[usize], rng: &mut R) -> TensorValue<T> {
    let len: usize = shape.iter().product::<usize>().max(1);
    let data: Vec<T> = (0..len)
        .map(|_| T::from_f64(rng.sample::<f64, _>(StandardUniform)))
        .collect();
    TensorValue::from_vec(data, shape).expect("random_uniform: lengths agree")
}

/// Tensor with elements drawn from the standard normal distribution.
pub fn random_normal<T: Scalar, R: Rng>(shape: &[usize], rng: &mut R) -> TensorValue<T> {
    let len: usize = shape.iter().product::<usize>().max(1);
    let data: Vec<T> = (0..len)
        .map(|_| T::from_f64(rng.sample::<f64, _>(StandardNormal)))
        .collect();
    TensorValue::from_vec(data, shape).expect("random_normal: lengths agree")
}
