//! Forward values saved for the backward pass.

use crate::scalar::Scalar;
use crate::value::TensorValue;
use std::rc::Rc;

/// A forward-pass value retained by a tape record.
///
/// Uses `Rc` for cheap cloning within the single-threaded tape; saving an
/// operation's inputs and outputs never copies tensor data.
#[derive(Debug)]
pub struct SavedValue<T: Scalar> {
    data: Rc<TensorValue<T>>,
}

impl<T: Scalar> SavedValue<T> {
    /// Save a shared value.
    pub fn new(data: Rc<TensorValue<T>>) -> Self {
        Self { data }
    }

    /// Get the saved value.
    pub fn get(&self) -> &TensorValue<T> {
        &self.data
    }

    /// Shape of the saved value.
    pub fn shape(&self) -> &[usize] {
        self.data.shape()
    }
}

impl<T: Scalar> Clone for SavedValue<T> {
    fn clone(&self) -> Self {
        Self {
            data: Rc::clone(&self.data),
        }
    }
}
