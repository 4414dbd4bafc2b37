//! Forward operations and the executor they run on.
//!
//! The differentiation core only depends on the `Executor` trait and on the
//! op-type names; `EagerExecutor` is the in-memory reference backend.

use crate::error::GradientError;
use crate::handle::{HandleId, TensorHandle};
use crate::scalar::Scalar;
use crate::value::TensorValue;

/// The supported elementwise operations.
///
/// `name()` returns the stable string key shared between forward ops and
/// their registered gradient rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpKind {
    AddV2,
    Sub,
    Mul,
    DivNoNan,
    Neg,
    Exp,
    Sqrt,
    Log1p,
}

impl OpKind {
    /// Stable op-type name used as the registry key.
    pub fn name(&self) -> &'static str {
        match self {
            OpKind::AddV2 => "AddV2",
            OpKind::Sub => "Sub",
            OpKind::Mul => "Mul",
            OpKind::DivNoNan => "DivNoNan",
            OpKind::Neg => "Neg",
            OpKind::Exp => "Exp",
            OpKind::Sqrt => "Sqrt",
            OpKind::Log1p => "Log1p",
        }
    }

    /// Parse an op-type name.
    ///
    /// # Errors
    ///
    /// Returns `GradientError::UnknownOpType` for unrecognized names.
    pub fn from_name(name: &str) -> Result<Self, GradientError> {
        match name {
            "AddV2" => Ok(OpKind::AddV2),
            "Sub" => Ok(OpKind::Sub),
            "Mul" => Ok(OpKind::Mul),
            "DivNoNan" => Ok(OpKind::DivNoNan),
            "Neg" => Ok(OpKind::Neg),
            "Exp" => Ok(OpKind::Exp),
            "Sqrt" => Ok(OpKind::Sqrt),
            "Log1p" => Ok(OpKind::Log1p),
            _ => Err(GradientError::UnknownOpType {
                name: name.to_string(),
            }),
        }
    }

    /// Number of operands the op consumes.
    pub fn arity(&self) -> usize {
        match self {
            OpKind::AddV2 | OpKind::Sub | OpKind::Mul | OpKind::DivNoNan => 2,
            OpKind::Neg | OpKind::Exp | OpKind::Sqrt | OpKind::Log1p => 1,
        }
    }
}

/// An op executor: creates handles and evaluates forward operations.
///
/// `RecordingContext` wraps any executor to intercept `execute` calls, so
/// model code written against this trait records transparently.
pub trait Executor<T: Scalar> {
    /// Materialize a value as a new handle.
    fn constant(&mut self, value: TensorValue<T>) -> TensorHandle<T>;

    /// Evaluate one forward operation.
    ///
    /// # Errors
    ///
    /// Returns `GradientError::ArityMismatch` for a wrong operand count and
    /// `GradientError::ShapeMismatch` for incompatible operand shapes.
    fn execute(
        &mut self,
        op: OpKind,
        inputs: &[TensorHandle<T>],
    ) -> Result<Vec<TensorHandle<T>>, GradientError>;
}

/// In-memory eager executor over dense values.
#[derive(Debug, Default)]
pub struct EagerExecutor {
    next_id: usize,
}

impl EagerExecutor {
    /// Create a fresh executor. Handle ids start at zero.
    pub fn new() -> Self {
        Self { next_id: 0 }
    }

    fn fresh_handle<T: Scalar>(&mut self, value: TensorValue<T>) -> TensorHandle<T> {
        let id = HandleId::new(self.next_id);
        self.next_id += 1;
        TensorHandle::new(id, value)
    }
}

impl<T: Scalar> Executor<T> for EagerExecutor {
    fn constant(&mut self, value: TensorValue<T>) -> TensorHandle<T> {
        self.fresh_handle(value)
    }

    fn execute(
        &mut self,
        op: OpKind,
        inputs: &[TensorHandle<T>],
    ) -> Result<Vec<TensorHandle<T>>, GradientError> {
        if inputs.len() != op.arity() {
            return Err(GradientError::ArityMismatch {
                op_type: op.name(),
                expected: op.arity(),
                actual: inputs.len(),
            });
        }
        let result = match op {
            OpKind::AddV2 => {
                TensorValue::apply_binary(inputs[0].value(), inputs[1].value(), |x, y| x + y)?
            }
            OpKind::Sub => {
                TensorValue::apply_binary(inputs[0].value(), inputs[1].value(), |x, y| x - y)?
            }
            OpKind::Mul => {
                TensorValue::apply_binary(inputs[0].value(), inputs[1].value(), |x, y| x * y)?
            }
            // Defined to be 0 where the denominator is exactly 0.
            OpKind::DivNoNan => {
                TensorValue::apply_binary(inputs[0].value(), inputs[1].value(), |x, y| {
                    if y == T::zero() { T::zero() } else { x / y }
                })?
            }
            OpKind::Neg => inputs[0].value().apply(|x| -x),
            OpKind::Exp => inputs[0].value().apply(|x| x.exp()),
            OpKind::Sqrt => inputs[0].value().apply(|x| x.sqrt()),
            OpKind::Log1p => inputs[0].value().apply(|x| x.ln_1p()),
        };
        Ok(vec![self.fresh_handle(result)])
    }
}
