//! Capability traits for binding callbacks.
//!
//! Every callback slot of a binding is a small trait with a blanket impl for
//! the matching closure shape. The scheduler only ever talks to the traits,
//! so an absent optional callback is an absent trait object rather than a
//! truthiness check on a function field.
//!
//! All capabilities are `Send + Sync` because a [`Binder`](crate::Binder) may
//! be driven from a frame source running on another thread.

use std::sync::Arc;

/// Produces the current value of a binding.
///
/// Evaluators should be free of side effects. This is not enforced.
pub trait Evaluator<T>: Send + Sync {
    fn evaluate(&self) -> T;
}

impl<T, F> Evaluator<T> for F
where
    F: Fn() -> T + Send + Sync,
{
    fn evaluate(&self) -> T {
        self()
    }
}

/// Receives a binding's value whenever a change is detected.
pub trait Updater<T>: Send + Sync {
    fn update(&self, value: &T);
}

impl<T, F> Updater<T> for F
where
    F: Fn(&T) + Send + Sync,
{
    fn update(&self, value: &T) {
        self(value)
    }
}

/// Decides whether two observations of a binding are the same.
///
/// Returning `false` means "changed" and fires the update.
pub trait EqualityComparer<T>: Send + Sync {
    fn equals(&self, previous: &T, current: &T) -> bool;
}

impl<T, F> EqualityComparer<T> for F
where
    F: Fn(&T, &T) -> bool + Send + Sync,
{
    fn equals(&self, previous: &T, current: &T) -> bool {
        self(previous, current)
    }
}

/// Reports whether a binding should be retired.
///
/// Checked at the start of each reconciliation of the binding. Once it
/// returns `true` the binding is unregistered and never reconciled again.
pub trait RemovalPredicate: Send + Sync {
    fn should_remove(&self) -> bool;
}

impl<F> RemovalPredicate for F
where
    F: Fn() -> bool + Send + Sync,
{
    fn should_remove(&self) -> bool {
        self()
    }
}

/// Default comparer: `PartialEq`.
pub(crate) struct PartialEqComparer;

impl<T: PartialEq> EqualityComparer<T> for PartialEqComparer {
    fn equals(&self, previous: &T, current: &T) -> bool {
        previous == current
    }
}

/// Identity comparer for shared values.
///
/// Two observations are equal only when they point at the same allocation.
/// A value mutated in place behind the same `Arc` is therefore not detected,
/// while swapping in a fresh `Arc` with equal contents is.
pub fn by_pointer<T: ?Sized>(previous: &Arc<T>, current: &Arc<T>) -> bool {
    Arc::ptr_eq(previous, current)
}
