//! Tape semantics: persistence, reuse, fan-out, pruning and watched sources.

use approx::assert_relative_eq;
use gradtape::{
    EagerExecutor, Executor, GradientError, GradientRegistry, OpKind, RecordingContext, Tape,
    TensorHandle, TensorValue,
};

fn scalar_handle(exec: &mut EagerExecutor, v: f64) -> TensorHandle<f64> {
    exec.constant(TensorValue::scalar(v))
}

#[test]
fn test_non_persistent_tape_single_use() {
    let registry = GradientRegistry::with_builtins();
    let mut exec = EagerExecutor::new();
    let x = scalar_handle(&mut exec, 2.0);

    let mut tape = Tape::new(false);
    tape.watch(&x);
    let y = {
        let mut ctx = RecordingContext::new(&mut exec, &mut tape);
        ctx.execute(OpKind::Exp, &[x.clone()]).unwrap().remove(0)
    };

    let first = tape
        .compute_gradient(&registry, &[y.clone()], &[x.clone()], &[])
        .unwrap();
    assert_relative_eq!(first[0].data()[0], 2.0f64.exp(), epsilon = 1e-12);

    let second = tape.compute_gradient(&registry, &[y], &[x], &[]);
    assert!(matches!(second, Err(GradientError::TapeConsumed)));
}

#[test]
fn test_persistent_tape_repeated_use() {
    let registry = GradientRegistry::with_builtins();
    let mut exec = EagerExecutor::new();
    let x = scalar_handle(&mut exec, 2.0);

    let mut tape = Tape::new(true);
    tape.watch(&x);
    let y = {
        let mut ctx = RecordingContext::new(&mut exec, &mut tape);
        ctx.execute(OpKind::Exp, &[x.clone()]).unwrap().remove(0)
    };

    let first = tape
        .compute_gradient(&registry, &[y.clone()], &[x.clone()], &[])
        .unwrap();
    let second = tape.compute_gradient(&registry, &[y], &[x], &[]).unwrap();
    assert_eq!(first[0].data(), second[0].data());
}

#[test]
fn test_watched_but_uninfluential_source_yields_zeros() {
    let registry = GradientRegistry::with_builtins();
    let mut exec = EagerExecutor::new();
    let x = scalar_handle(&mut exec, 2.0);
    let w = exec.constant(TensorValue::<f64>::ones(&[3]));

    let mut tape = Tape::new(false);
    tape.watch(&x);
    tape.watch(&w);
    let y = {
        let mut ctx = RecordingContext::new(&mut exec, &mut tape);
        ctx.execute(OpKind::Neg, &[x.clone()]).unwrap().remove(0)
    };

    let grads = tape
        .compute_gradient(&registry, &[y], &[x, w.clone()], &[])
        .unwrap();
    assert_eq!(grads[0].data(), &[-1.0]);
    // Zeros of the source's own shape, not an error.
    assert_eq!(grads[1].shape(), &[3]);
    assert_eq!(grads[1].data(), &[0.0, 0.0, 0.0]);
}

#[test]
fn test_fan_out_accumulates() {
    // z = x + x: both consumers contribute, d/dx = 2.
    let registry = GradientRegistry::with_builtins();
    let mut exec = EagerExecutor::new();
    let x = scalar_handle(&mut exec, 2.0);

    let mut tape = Tape::new(false);
    tape.watch(&x);
    let z = {
        let mut ctx = RecordingContext::new(&mut exec, &mut tape);
        ctx.execute(OpKind::AddV2, &[x.clone(), x.clone()])
            .unwrap()
            .remove(0)
    };

    let grads = tape.compute_gradient(&registry, &[z], &[x], &[]).unwrap();
    assert_eq!(grads[0].data(), &[2.0]);
}

#[test]
fn test_fan_out_across_operations() {
    // z = mul(x, x): d/dx = 2x = 4 at x = 2.
    let registry = GradientRegistry::with_builtins();
    let mut exec = EagerExecutor::new();
    let x = scalar_handle(&mut exec, 2.0);

    let mut tape = Tape::new(false);
    tape.watch(&x);
    let z = {
        let mut ctx = RecordingContext::new(&mut exec, &mut tape);
        ctx.execute(OpKind::Mul, &[x.clone(), x.clone()])
            .unwrap()
            .remove(0)
    };

    let grads = tape.compute_gradient(&registry, &[z], &[x], &[]).unwrap();
    assert_relative_eq!(grads[0].data()[0], 4.0, epsilon = 1e-12);
}

#[test]
fn test_unregistered_gradient_is_fatal() {
    let registry: GradientRegistry<f64> = GradientRegistry::new();
    let mut exec = EagerExecutor::new();
    let x = scalar_handle(&mut exec, 2.0);

    let mut tape = Tape::new(false);
    tape.watch(&x);
    let y = {
        let mut ctx = RecordingContext::new(&mut exec, &mut tape);
        ctx.execute(OpKind::Exp, &[x.clone()]).unwrap().remove(0)
    };

    let r = tape.compute_gradient(&registry, &[y], &[x], &[]);
    match r {
        Err(GradientError::UnregisteredGradient { op_type }) => assert_eq!(op_type, "Exp"),
        other => panic!("expected UnregisteredGradient, got {other:?}"),
    }
}

#[test]
fn test_side_computation_is_pruned() {
    // The Sqrt record touches neither source nor target and is skipped;
    // only Neg needs a registered rule.
    let mut registry: GradientRegistry<f64> = GradientRegistry::new();
    registry.register("Neg", gradtape::rules::neg_registerer).unwrap();

    let mut exec = EagerExecutor::new();
    let x = scalar_handle(&mut exec, 2.0);
    let unrelated = scalar_handle(&mut exec, 9.0);

    let mut tape = Tape::new(false);
    tape.watch(&x);
    let y = {
        let mut ctx = RecordingContext::new(&mut exec, &mut tape);
        let _side = ctx.execute(OpKind::Sqrt, &[unrelated]).unwrap();
        ctx.execute(OpKind::Neg, &[x.clone()]).unwrap().remove(0)
    };

    let grads = tape.compute_gradient(&registry, &[y], &[x], &[]).unwrap();
    assert_eq!(grads[0].data(), &[-1.0]);
}

#[test]
fn test_broadcast_scalar_receives_summed_gradient() {
    let registry = GradientRegistry::with_builtins();
    let mut exec = EagerExecutor::new();
    let v = exec.constant(TensorValue::from_vec(vec![1.0, 2.0, 3.0], &[3]).unwrap());
    let b = scalar_handle(&mut exec, 10.0);

    let mut tape = Tape::new(false);
    tape.watch(&v);
    tape.watch(&b);
    let out = {
        let mut ctx = RecordingContext::new(&mut exec, &mut tape);
        ctx.execute(OpKind::AddV2, &[v.clone(), b.clone()])
            .unwrap()
            .remove(0)
    };

    let grads = tape
        .compute_gradient(&registry, &[out], &[v, b], &[])
        .unwrap();
    assert_eq!(grads[0].data(), &[1.0, 1.0, 1.0]);
    // The broadcast scalar folds the three unit contributions together.
    assert_eq!(grads[1].data(), &[3.0]);
}

#[test]
fn test_chain_through_multiple_records() {
    // z = neg(exp(x)): dz/dx = -exp(2).
    let registry = GradientRegistry::with_builtins();
    let mut exec = EagerExecutor::new();
    let x = scalar_handle(&mut exec, 2.0);

    let mut tape = Tape::new(false);
    tape.watch(&x);
    let z = {
        let mut ctx = RecordingContext::new(&mut exec, &mut tape);
        let e = ctx.execute(OpKind::Exp, &[x.clone()]).unwrap().remove(0);
        ctx.execute(OpKind::Neg, &[e]).unwrap().remove(0)
    };

    let grads = tape.compute_gradient(&registry, &[z], &[x], &[]).unwrap();
    assert_relative_eq!(grads[0].data()[0], -2.0f64.exp(), epsilon = 1e-12);
}
