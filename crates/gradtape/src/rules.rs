//! Per-operation gradient rules.
//!
//! Each rule maps the accumulated output gradients of one recorded
//! operation to one gradient (or `None`) per forward input. Rules receive
//! the saved forward values because several of them (exp, sqrt, div-no-nan)
//! depend on values, not just shapes.

use crate::error::GradientError;
use crate::saved::SavedValue;
use crate::scalar::Scalar;
use crate::value::TensorValue;
use std::fmt::Debug;

/// Backward rule for one operation type.
///
/// Given the saved forward inputs, the saved forward outputs, and the
/// accumulated gradient for each output, produce one gradient per forward
/// input. `None` means no gradient flows to that input.
pub trait GradientFunction<T: Scalar>: Debug {
    fn gradient(
        &self,
        inputs: &[SavedValue<T>],
        outputs: &[SavedValue<T>],
        grad_outputs: &[TensorValue<T>],
    ) -> Result<Vec<Option<TensorValue<T>>>, GradientError>;
}

/// Factory producing a rule instance for one traversal visit.
pub type GradientFactory<T> = fn() -> Box<dyn GradientFunction<T>>;

fn expect_arity(
    op_type: &'static str,
    actual: usize,
    expected: usize,
) -> Result<(), GradientError> {
    if actual != expected {
        return Err(GradientError::ArityMismatch {
            op_type,
            expected,
            actual,
        });
    }
    Ok(())
}

/// d(x + y) = (dz, dz), each reduced to its operand's shape.
#[derive(Debug)]
pub struct AddGradient;

impl<T: Scalar> GradientFunction<T> for AddGradient {
    fn gradient(
        &self,
        inputs: &[SavedValue<T>],
        _outputs: &[SavedValue<T>],
        grad_outputs: &[TensorValue<T>],
    ) -> Result<Vec<Option<TensorValue<T>>>, GradientError> {
        expect_arity("AddV2", inputs.len(), 2)?;
        let dz = &grad_outputs[0];
        Ok(vec![
            Some(dz.reduce_to_shape(inputs[0].shape())?),
            Some(dz.reduce_to_shape(inputs[1].shape())?),
        ])
    }
}

/// d(x - y) = (dz, -dz).
#[derive(Debug)]
pub struct SubGradient;

impl<T: Scalar> GradientFunction<T> for SubGradient {
    fn gradient(
        &self,
        inputs: &[SavedValue<T>],
        _outputs: &[SavedValue<T>],
        grad_outputs: &[TensorValue<T>],
    ) -> Result<Vec<Option<TensorValue<T>>>, GradientError> {
        expect_arity("Sub", inputs.len(), 2)?;
        let dz = &grad_outputs[0];
        Ok(vec![
            Some(dz.reduce_to_shape(inputs[0].shape())?),
            Some(dz.apply(|g| -g).reduce_to_shape(inputs[1].shape())?),
        ])
    }
}

/// d(x * y) = (dz * y, dz * x).
#[derive(Debug)]
pub struct MulGradient;

impl<T: Scalar> GradientFunction<T> for MulGradient {
    fn gradient(
        &self,
        inputs: &[SavedValue<T>],
        _outputs: &[SavedValue<T>],
        grad_outputs: &[TensorValue<T>],
    ) -> Result<Vec<Option<TensorValue<T>>>, GradientError> {
        expect_arity("Mul", inputs.len(), 2)?;
        let dz = &grad_outputs[0];
        let dx = TensorValue::apply_binary(dz, inputs[1].get(), |g, y| g * y)?;
        let dy = TensorValue::apply_binary(dz, inputs[0].get(), |g, x| g * x)?;
        Ok(vec![
            Some(dx.reduce_to_shape(inputs[0].shape())?),
            Some(dy.reduce_to_shape(inputs[1].shape())?),
        ])
    }
}

/// d(-x) = -dz.
#[derive(Debug)]
pub struct NegGradient;

impl<T: Scalar> GradientFunction<T> for NegGradient {
    fn gradient(
        &self,
        inputs: &[SavedValue<T>],
        _outputs: &[SavedValue<T>],
        grad_outputs: &[TensorValue<T>],
    ) -> Result<Vec<Option<TensorValue<T>>>, GradientError> {
        expect_arity("Neg", inputs.len(), 1)?;
        Ok(vec![Some(grad_outputs[0].apply(|g| -g))])
    }
}

/// d(e^x) = dz * e^x, reusing the forward output.
#[derive(Debug)]
pub struct ExpGradient;

impl<T: Scalar> GradientFunction<T> for ExpGradient {
    fn gradient(
        &self,
        inputs: &[SavedValue<T>],
        outputs: &[SavedValue<T>],
        grad_outputs: &[TensorValue<T>],
    ) -> Result<Vec<Option<TensorValue<T>>>, GradientError> {
        expect_arity("Exp", inputs.len(), 1)?;
        let dx = TensorValue::apply_binary(&grad_outputs[0], outputs[0].get(), |g, y| g * y)?;
        Ok(vec![Some(dx)])
    }
}

/// d(sqrt(x)) = dz / (2 * sqrt(x)), reusing the forward output.
#[derive(Debug)]
pub struct SqrtGradient;

impl<T: Scalar> GradientFunction<T> for SqrtGradient {
    fn gradient(
        &self,
        inputs: &[SavedValue<T>],
        outputs: &[SavedValue<T>],
        grad_outputs: &[TensorValue<T>],
    ) -> Result<Vec<Option<TensorValue<T>>>, GradientError> {
        expect_arity("Sqrt", inputs.len(), 1)?;
        let two = T::one() + T::one();
        let dx = TensorValue::apply_binary(&grad_outputs[0], outputs[0].get(), |g, y| {
            g / (two * y)
        })?;
        Ok(vec![Some(dx)])
    }
}

/// d(ln(1 + x)) = dz / (1 + x).
#[derive(Debug)]
pub struct Log1pGradient;

impl<T: Scalar> GradientFunction<T> for Log1pGradient {
    fn gradient(
        &self,
        inputs: &[SavedValue<T>],
        _outputs: &[SavedValue<T>],
        grad_outputs: &[TensorValue<T>],
    ) -> Result<Vec<Option<TensorValue<T>>>, GradientError> {
        expect_arity("Log1p", inputs.len(), 1)?;
        let dx = TensorValue::apply_binary(&grad_outputs[0], inputs[0].get(), |g, x| {
            g / (T::one() + x)
        })?;
        Ok(vec![Some(dx)])
    }
}

/// Gradient of division-with-zero-guard.
///
/// dx = dz / y and dy = -dz * x / y^2, with both forced to exactly zero
/// wherever the denominator is exactly zero. The zero override is this
/// rule's policy, not the traversal's.
#[derive(Debug)]
pub struct DivNoNanGradient;

impl<T: Scalar> GradientFunction<T> for DivNoNanGradient {
    fn gradient(
        &self,
        inputs: &[SavedValue<T>],
        _outputs: &[SavedValue<T>],
        grad_outputs: &[TensorValue<T>],
    ) -> Result<Vec<Option<TensorValue<T>>>, GradientError> {
        expect_arity("DivNoNan", inputs.len(), 2)?;
        let dz = &grad_outputs[0];
        let num = inputs[0].get();
        let denom = inputs[1].get();

        let dx = TensorValue::apply_binary(dz, denom, |g, d| {
            if d == T::zero() { T::zero() } else { g / d }
        })?;
        let g_num = TensorValue::apply_binary(dz, num, |g, x| g * x)?;
        let dy = TensorValue::apply_binary(&g_num, denom, |gx, d| {
            if d == T::zero() { T::zero() } else { -(gx / (d * d)) }
        })?;
        Ok(vec![
            Some(dx.reduce_to_shape(inputs[0].shape())?),
            Some(dy.reduce_to_shape(inputs[1].shape())?),
        ])
    }
}

pub fn add_registerer<T: Scalar>() -> Box<dyn GradientFunction<T>> {
    Box::new(AddGradient)
}

pub fn sub_registerer<T: Scalar>() -> Box<dyn GradientFunction<T>> {
    Box::new(SubGradient)
}

pub fn mul_registerer<T: Scalar>() -> Box<dyn GradientFunction<T>> {
    Box::new(MulGradient)
}

pub fn neg_registerer<T: Scalar>() -> Box<dyn GradientFunction<T>> {
    Box::new(NegGradient)
}

pub fn exp_registerer<T: Scalar>() -> Box<dyn GradientFunction<T>> {
    Box::new(ExpGradient)
}

pub fn sqrt_registerer<T: Scalar>() -> Box<dyn GradientFunction<T>> {
    Box::new(SqrtGradient)
}

pub fn log1p_registerer<T: Scalar>() -> Box<dyn GradientFunction<T>> {
    Box::new(Log1pGradient)
}

pub fn div_no_nan_registerer<T: Scalar>() -> Box<dyn GradientFunction<T>> {
    Box::new(DivNoNanGradient)
}
