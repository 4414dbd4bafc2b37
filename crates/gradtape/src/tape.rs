//! The gradient tape: operation recording and backward traversal.

use crate::error::GradientError;
use crate::handle::{HandleId, TensorHandle};
use crate::registry::GradientRegistry;
use crate::saved::SavedValue;
use crate::scalar::Scalar;
use crate::value::TensorValue;
use smallvec::SmallVec;
use std::collections::{HashMap, HashSet};

/// One recorded forward operation. Immutable once recorded.
///
/// Keeps the op-type name for registry lookup, the input/output handle ids
/// for the traversal, and the saved forward values for the gradient rules
/// (sqrt/exp/div gradients need values, not just shapes).
#[derive(Debug)]
pub struct OperationRecord<T: Scalar> {
    op_type: &'static str,
    input_ids: SmallVec<[HandleId; 4]>,
    output_ids: SmallVec<[HandleId; 2]>,
    inputs: Vec<SavedValue<T>>,
    outputs: Vec<SavedValue<T>>,
}

impl<T: Scalar> OperationRecord<T> {
    /// Op-type name (registry key).
    pub fn op_type(&self) -> &'static str {
        self.op_type
    }

    /// Ids of the operation's inputs, in call order.
    pub fn input_ids(&self) -> &[HandleId] {
        &self.input_ids
    }

    /// Ids of the operation's outputs, in production order.
    pub fn output_ids(&self) -> &[HandleId] {
        &self.output_ids
    }
}

/// Per-traversal gradient accumulation, keyed by handle id.
///
/// Summation of incoming contributions models the multivariate chain rule
/// when one tensor feeds multiple consumers. Created fresh for each
/// `compute_gradient` call and discarded afterwards.
#[derive(Debug)]
struct GradientAccumulator<T: Scalar> {
    grads: HashMap<HandleId, TensorValue<T>>,
}

impl<T: Scalar> GradientAccumulator<T> {
    fn new() -> Self {
        Self {
            grads: HashMap::new(),
        }
    }

    fn accumulate(&mut self, id: HandleId, grad: TensorValue<T>) -> Result<(), GradientError> {
        if let Some(existing) = self.grads.get_mut(&id) {
            *existing = TensorValue::apply_binary(existing, &grad, |a, b| a + b)?;
        } else {
            self.grads.insert(id, grad);
        }
        Ok(())
    }

    fn take(&mut self, id: HandleId) -> Option<TensorValue<T>> {
        self.grads.remove(&id)
    }

    fn peek(&self, id: HandleId) -> Option<&TensorValue<T>> {
        self.grads.get(&id)
    }
}

/// Records forward operations and replays them backward to compute
/// gradients.
///
/// A tape is explicit state threaded through the forward pass (via
/// [`RecordingContext`](crate::RecordingContext)) rather than ambient
/// global state. Recording and traversal are strictly sequential,
/// single-threaded phases.
///
/// A non-persistent tape may run `compute_gradient` exactly once; a
/// persistent tape keeps its records and allows repeated sequential calls.
///
/// # Example
///
/// ```
/// use gradtape::{EagerExecutor, Executor, GradientRegistry, OpKind,
///                RecordingContext, Tape, TensorValue};
///
/// let registry = GradientRegistry::with_builtins();
/// let mut exec = EagerExecutor::new();
/// let x = exec.constant(TensorValue::scalar(2.0f64));
///
/// let mut tape = Tape::new(false);
/// tape.watch(&x);
/// let y = {
///     let mut ctx = RecordingContext::new(&mut exec, &mut tape);
///     ctx.execute(OpKind::Sqrt, &[x.clone()]).unwrap().remove(0)
/// };
///
/// let grads = tape
///     .compute_gradient(&registry, &[y], &[x], &[])
///     .unwrap();
/// assert!((grads[0].data()[0] - 0.35355).abs() < 1e-4);
/// ```
#[derive(Debug)]
pub struct Tape<T: Scalar> {
    persistent: bool,
    watched: HashSet<HandleId>,
    records: Vec<OperationRecord<T>>,
    consumed: bool,
}

impl<T: Scalar> Tape<T> {
    /// Create a tape. `persistent` is fixed for the tape's lifetime.
    pub fn new(persistent: bool) -> Self {
        Self {
            persistent,
            watched: HashSet::new(),
            records: Vec::new(),
            consumed: false,
        }
    }

    /// Whether the recorded trace survives `compute_gradient`.
    pub fn persistent(&self) -> bool {
        self.persistent
    }

    /// Mark a handle as a gradient source. Idempotent, infallible.
    pub fn watch(&mut self, handle: &TensorHandle<T>) {
        self.watched.insert(handle.id());
    }

    /// Check whether a handle is watched.
    pub fn is_watched(&self, handle: &TensorHandle<T>) -> bool {
        self.watched.contains(&handle.id())
    }

    /// Number of recorded operations.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Append an operation record.
    ///
    /// Called by `RecordingContext` during the forward pass; user code does
    /// not record directly.
    ///
    /// # Errors
    ///
    /// Returns `GradientError::TapeConsumed` once a non-persistent tape has
    /// computed gradients.
    pub fn record_operation(
        &mut self,
        op_type: &'static str,
        inputs: &[TensorHandle<T>],
        outputs: &[TensorHandle<T>],
    ) -> Result<(), GradientError> {
        if self.consumed {
            return Err(GradientError::TapeConsumed);
        }
        self.records.push(OperationRecord {
            op_type,
            input_ids: inputs.iter().map(|h| h.id()).collect(),
            output_ids: outputs.iter().map(|h| h.id()).collect(),
            inputs: inputs.iter().map(|h| SavedValue::new(h.share_value())).collect(),
            outputs: outputs
                .iter()
                .map(|h| SavedValue::new(h.share_value()))
                .collect(),
        });
        Ok(())
    }

    /// Compute gradients of `targets` with respect to `sources`.
    ///
    /// `output_gradients` optionally seeds each target; when empty, every
    /// target is seeded with ones of its shape. The result holds one
    /// gradient per source, in source order; a watched source that did not
    /// influence any target yields zeros of its shape.
    ///
    /// # Errors
    ///
    /// * `TapeConsumed` — the tape is non-persistent and already ran.
    /// * `SeedCountMismatch` — a non-empty seed list whose length differs
    ///   from the target count.
    /// * `UnregisteredGradient` — a visited operation has no rule in
    ///   `registry`.
    /// * Rule-level errors (`ShapeMismatch`, `ArityMismatch`) propagate
    ///   without partial results.
    pub fn compute_gradient(
        &mut self,
        registry: &GradientRegistry<T>,
        targets: &[TensorHandle<T>],
        sources: &[TensorHandle<T>],
        output_gradients: &[TensorValue<T>],
    ) -> Result<Vec<TensorValue<T>>, GradientError> {
        if self.consumed {
            return Err(GradientError::TapeConsumed);
        }
        if !output_gradients.is_empty() && output_gradients.len() != targets.len() {
            return Err(GradientError::SeedCountMismatch {
                targets: targets.len(),
                seeds: output_gradients.len(),
            });
        }

        let source_ids: HashSet<HandleId> = sources.iter().map(|h| h.id()).collect();
        let target_ids: HashSet<HandleId> = targets.iter().map(|h| h.id()).collect();
        let kept = self.prune(&source_ids, &target_ids);

        let mut accumulator = GradientAccumulator::new();
        for (i, target) in targets.iter().enumerate() {
            let seed = if output_gradients.is_empty() {
                TensorValue::ones(target.shape())
            } else {
                output_gradients[i].clone()
            };
            accumulator.accumulate(target.id(), seed)?;
        }

        // Reverse recording order is a valid reverse-topological order
        // because recording order is forward-topological.
        for (index, record) in self.records.iter().enumerate().rev() {
            if !kept[index] {
                continue;
            }

            let mut grad_outputs = Vec::with_capacity(record.output_ids.len());
            for (id, saved) in record.output_ids.iter().zip(record.outputs.iter()) {
                // An output that is itself a requested source keeps its
                // entry so the final read-off still sees it.
                let grad = if source_ids.contains(id) {
                    accumulator.peek(*id).cloned()
                } else {
                    accumulator.take(*id)
                };
                grad_outputs.push(grad.unwrap_or_else(|| TensorValue::zeros(saved.shape())));
            }

            let factory = registry.lookup(record.op_type)?;
            let rule = factory();
            let input_grads = rule.gradient(&record.inputs, &record.outputs, &grad_outputs)?;
            if input_grads.len() != record.input_ids.len() {
                return Err(GradientError::ArityMismatch {
                    op_type: record.op_type,
                    expected: record.input_ids.len(),
                    actual: input_grads.len(),
                });
            }
            for (id, grad) in record.input_ids.iter().zip(input_grads) {
                if let Some(grad) = grad {
                    accumulator.accumulate(*id, grad)?;
                }
            }
        }

        let mut result = Vec::with_capacity(sources.len());
        for source in sources {
            let grad = accumulator
                .take(source.id())
                .unwrap_or_else(|| TensorValue::zeros(source.shape()));
            result.push(grad);
        }

        if !self.persistent {
            self.consumed = true;
        }
        Ok(result)
    }

    /// Restrict the record sequence to operations on some directed path
    /// from a source to a target.
    ///
    /// A record survives when at least one input is reachable from a source
    /// (forward sweep) and at least one output reaches a target (reverse
    /// sweep). Operations failing either test contribute nothing and are
    /// never visited, so their missing gradient rules are never an error.
    fn prune(&self, source_ids: &HashSet<HandleId>, target_ids: &HashSet<HandleId>) -> Vec<bool> {
        let mut from_source: HashSet<HandleId> = source_ids.clone();
        for record in &self.records {
            if record.input_ids.iter().any(|id| from_source.contains(id)) {
                from_source.extend(record.output_ids.iter().copied());
            }
        }

        let mut to_target: HashSet<HandleId> = target_ids.clone();
        let mut kept = vec![false; self.records.len()];
        for (index, record) in self.records.iter().enumerate().rev() {
            let reaches_target = record.output_ids.iter().any(|id| to_target.contains(id));
            let fed_by_source = record.input_ids.iter().any(|id| from_source.contains(id));
            if reaches_target && fed_by_source {
                to_target.extend(record.input_ids.iter().copied());
                kept[index] = true;
            }
        }
        kept
    }
}
