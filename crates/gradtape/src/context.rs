//! Recording context: transparent interception of forward-op calls.

use crate::error::GradientError;
use crate::handle::TensorHandle;
use crate::ops::{Executor, OpKind};
use crate::scalar::Scalar;
use crate::tape::Tape;
use crate::value::TensorValue;

/// Executor wrapper that records every op call into a tape.
///
/// Forwards each call unchanged to the underlying executor, then appends an
/// operation record with the op type, input handles, output handles and the
/// forward values the gradient rules will need. Forward results are never
/// altered, and nothing is watched implicitly; watching stays caller-driven.
///
/// The tape is threaded explicitly through this wrapper rather than held as
/// ambient state, so recording is a visible data-flow dependency of the
/// forward pass.
#[derive(Debug)]
pub struct RecordingContext<'a, T: Scalar, E: Executor<T>> {
    inner: &'a mut E,
    tape: &'a mut Tape<T>,
}

impl<'a, T: Scalar, E: Executor<T>> RecordingContext<'a, T, E> {
    /// Bind an executor to a tape.
    pub fn new(inner: &'a mut E, tape: &'a mut Tape<T>) -> Self {
        Self { inner, tape }
    }

    /// Access the bound tape, e.g. to watch an intermediate result.
    pub fn tape_mut(&mut self) -> &mut Tape<T> {
        self.tape
    }
}

impl<T: Scalar, E: Executor<T>> Executor<T> for RecordingContext<'_, T, E> {
    fn constant(&mut self, value: TensorValue<T>) -> TensorHandle<T> {
        // Constants are not operations; nothing to record.
        self.inner.constant(value)
    }

    fn execute(
        &mut self,
        op: OpKind,
        inputs: &[TensorHandle<T>],
    ) -> Result<Vec<TensorHandle<T>>, GradientError> {
        let outputs = self.inner.execute(op, inputs)?;
        self.tape.record_operation(op.name(), inputs, &outputs)?;
        Ok(outputs)
    }
}
