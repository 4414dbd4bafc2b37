//! gradtape - tape-based reverse-mode automatic differentiation.
//!
//! Records a forward computation as a sequence of operations over
//! tensor-valued handles, then computes gradients of selected outputs with
//! respect to selected inputs by walking the recording backward and
//! invoking per-operation gradient rules.
//!
//! # Architecture
//!
//! ```text
//! Executor (EagerExecutor)  ──wrapped by──►  RecordingContext
//!        │                                         │ records into
//!        ▼                                         ▼
//!   TensorHandle ──► Rc<TensorValue>            Tape ──► [OperationRecord]
//!                                                  │
//!                                   compute_gradient(targets, sources)
//!                                                  │ looks up
//!                                                  ▼
//!                                        GradientRegistry ──► GradientFunction
//! ```
//!
//! # Example
//!
//! ```
//! use gradtape::{EagerExecutor, Executor, GradientRegistry, OpKind,
//!                RecordingContext, Tape, TensorValue};
//!
//! let registry = GradientRegistry::with_builtins();
//! let mut exec = EagerExecutor::new();
//! let x = exec.constant(TensorValue::scalar(2.0f64));
//! let y = exec.constant(TensorValue::scalar(2.0f64));
//!
//! let mut tape = Tape::new(false);
//! tape.watch(&x);
//! tape.watch(&y);
//!
//! // z = x + y, recorded while it executes.
//! let z = {
//!     let mut ctx = RecordingContext::new(&mut exec, &mut tape);
//!     ctx.execute(OpKind::AddV2, &[x.clone(), y.clone()])
//!         .unwrap()
//!         .remove(0)
//! };
//!
//! let grads = tape
//!     .compute_gradient(&registry, &[z], &[x, y], &[])
//!     .unwrap();
//! assert_eq!(grads[0].data(), &[1.0]);
//! assert_eq!(grads[1].data(), &[1.0]);
//! ```
//!
//! # Design notes
//!
//! - The tape is explicit, caller-owned state; recording is a visible
//!   data-flow dependency of the forward pass, not ambient global state.
//! - Handles and records reference values through `Rc`; a value lives until
//!   its last owner (handle or record) is dropped.
//! - Records and handles are linked by integer ids, so the backward
//!   traversal works over an arena of records instead of pointer chains.
//! - Single-threaded: recording and traversal are strictly sequential
//!   phases on one thread.

pub mod context;
pub mod error;
pub mod handle;
pub mod ops;
pub mod random;
pub mod registry;
pub mod rules;
pub mod saved;
pub mod scalar;
pub mod tape;
pub mod value;

pub use context::RecordingContext;
pub use error::GradientError;
pub use handle::{HandleId, TensorHandle};
pub use ops::{EagerExecutor, Executor, OpKind};
pub use random::{random_normal, random_uniform};
pub use registry::GradientRegistry;
pub use rules::{GradientFactory, GradientFunction};
pub use saved::SavedValue;
pub use scalar::Scalar;
pub use tape::{OperationRecord, Tape};
pub use value::TensorValue;
