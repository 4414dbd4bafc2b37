//! Tensor handles: identity plus shared ownership of a computed value.

use crate::scalar::Scalar;
use crate::value::TensorValue;
use std::rc::Rc;

/// Unique identifier for a tensor handle.
///
/// Ids index into the executor's allocation sequence; the tape keys its
/// records, watched set and gradient accumulator by them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandleId(usize);

impl HandleId {
    /// Create a handle id. Executors allocate these sequentially.
    pub fn new(index: usize) -> Self {
        Self(index)
    }

    /// Get the internal index.
    pub fn index(&self) -> usize {
        self.0
    }
}

/// Reference to a tensor value plus its identity.
///
/// Cloning a handle shares the underlying value; the value is released when
/// the last handle (or tape record) referencing it is dropped.
#[derive(Debug, Clone)]
pub struct TensorHandle<T: Scalar> {
    id: HandleId,
    value: Rc<TensorValue<T>>,
}

impl<T: Scalar> TensorHandle<T> {
    /// Create a handle owning a freshly computed value.
    pub fn new(id: HandleId, value: TensorValue<T>) -> Self {
        Self {
            id,
            value: Rc::new(value),
        }
    }

    /// Handle identity.
    pub fn id(&self) -> HandleId {
        self.id
    }

    /// The computed value.
    pub fn value(&self) -> &TensorValue<T> {
        &self.value
    }

    /// Shared reference to the value, for saving into tape records.
    pub fn share_value(&self) -> Rc<TensorValue<T>> {
        Rc::clone(&self.value)
    }

    /// Shape of the value.
    pub fn shape(&self) -> &[usize] {
        self.value.shape()
    }

    /// Number of elements in the value.
    pub fn len(&self) -> usize {
        self.value.len()
    }

    /// Check if the value has zero elements.
    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }

    /// Underlying data slice.
    pub fn data(&self) -> &[T] {
        self.value.data()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handle_identity() {
        let h = TensorHandle::new(HandleId::new(7), TensorValue::scalar(2.0f64));
        assert_eq!(h.id().index(), 7);
        assert_eq!(h.data(), &[2.0]);
    }

    #[test]
    fn test_clone_shares_value() {
        let h1 = TensorHandle::new(HandleId::new(0), TensorValue::<f64>::ones(&[3]));
        let h2 = h1.clone();
        assert!(Rc::ptr_eq(&h1.value, &h2.value));
        assert_eq!(h1.id(), h2.id());
    }

    #[test]
    fn test_value_released_on_last_drop() {
        let h1 = TensorHandle::new(HandleId::new(0), TensorValue::<f64>::ones(&[3]));
        let shared = h1.share_value();
        assert_eq!(Rc::strong_count(&shared), 2);
        drop(h1);
        assert_eq!(Rc::strong_count(&shared), 1);
    }
}
