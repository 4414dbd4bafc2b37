//! Registry mapping op-type names to gradient-rule factories.

use crate::error::GradientError;
use crate::rules::{self, GradientFactory};
use crate::scalar::Scalar;
use std::collections::HashMap;

/// Maps an op-type name to the factory producing its gradient rule.
///
/// Keys are the stable op-type strings shared with the forward ops
/// (`"AddV2"`, `"Exp"`, ...). Registering the same key twice fails; looking
/// up an absent key fails, which the tape traversal surfaces as a fatal
/// error for that `compute_gradient` call.
#[derive(Debug, Default)]
pub struct GradientRegistry<T: Scalar> {
    factories: HashMap<&'static str, GradientFactory<T>>,
}

impl<T: Scalar> GradientRegistry<T> {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Register a gradient-rule factory for an op type.
    ///
    /// # Errors
    ///
    /// Returns `GradientError::DuplicateRegistration` if the op type is
    /// already registered.
    pub fn register(
        &mut self,
        op_type: &'static str,
        factory: GradientFactory<T>,
    ) -> Result<(), GradientError> {
        if self.factories.contains_key(op_type) {
            return Err(GradientError::DuplicateRegistration {
                op_type: op_type.to_string(),
            });
        }
        self.factories.insert(op_type, factory);
        Ok(())
    }

    /// Look up the factory for an op type.
    ///
    /// # Errors
    ///
    /// Returns `GradientError::UnregisteredGradient` if absent.
    pub fn lookup(&self, op_type: &str) -> Result<GradientFactory<T>, GradientError> {
        self.factories
            .get(op_type)
            .copied()
            .ok_or_else(|| GradientError::UnregisteredGradient {
                op_type: op_type.to_string(),
            })
    }

    /// Check whether an op type has a registered rule.
    pub fn contains(&self, op_type: &str) -> bool {
        self.factories.contains_key(op_type)
    }

    /// Register every built-in gradient rule.
    ///
    /// # Errors
    ///
    /// Fails with `DuplicateRegistration` if any built-in op type was
    /// already registered.
    pub fn register_all(&mut self) -> Result<(), GradientError> {
        self.register("AddV2", rules::add_registerer)?;
        self.register("Sub", rules::sub_registerer)?;
        self.register("Mul", rules::mul_registerer)?;
        self.register("DivNoNan", rules::div_no_nan_registerer)?;
        self.register("Neg", rules::neg_registerer)?;
        self.register("Exp", rules::exp_registerer)?;
        self.register("Sqrt", rules::sqrt_registerer)?;
        self.register("Log1p", rules::log1p_registerer)?;
        Ok(())
    }

    /// Registry with every built-in rule installed.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry
            .register_all()
            .expect("fresh registry cannot hold duplicates");
        registry
    }
}
