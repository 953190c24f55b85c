//! Binding Records
//!
//! A [`Binding`] is the caller-facing description of a binding: which
//! function to evaluate, what to do on change, and the optional comparer and
//! removal predicate. Registering it with a [`Binder`](crate::Binder) turns it
//! into a [`BindingRecord`], which additionally owns the last observed value.
//!
//! # Reconciliation
//!
//! One reconciliation of a record runs these steps:
//!
//! 1. If a removal predicate is attached and returns `true`, stop. The record
//!    reports [`Observation::Retired`] and the binder unregisters it. Nothing
//!    is evaluated and the last value is left alone.
//!
//! 2. Evaluate the current value.
//!
//! 3. If the record has never been observed, fire the update unconditionally
//!    and store the value. Every binding is synchronized with its consumer
//!    once, on the first pass after registration, even when the consumer
//!    already holds the same value.
//!
//! 4. Otherwise ask the comparer whether the last value and the current one
//!    are equal. If not, fire the update and store the current value.
//!
//! The last value only changes after the update returned, so a panicking
//! update is retried on the next pass.
//!
//! A record unregistered while it is being reconciled (from another thread,
//! or from its own evaluator) reports [`Observation::Unbound`] instead of
//! firing. An update that has already started runs to completion.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;

use super::capability::{EqualityComparer, Evaluator, PartialEqComparer, RemovalPredicate, Updater};
use super::id::BindingId;
use crate::error::Phase;

/// Result of reconciling a single record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Observation {
    /// The removal predicate fired; the record should be unregistered.
    Retired,

    /// First observation since registration. The update fired.
    First,

    /// The value changed. The update fired.
    Changed,

    /// The value is equal to the last observation. Nothing fired.
    Unchanged,

    /// The record was unregistered before its update could fire.
    Unbound,
}

impl Observation {
    /// Whether the update callback ran.
    pub fn fired(&self) -> bool {
        matches!(self, Observation::First | Observation::Changed)
    }
}

/// Type-erased view of a record, as stored in the registry.
///
/// The registry holds records of many different value types side by side;
/// this trait is the only thing the scheduler needs from them.
pub trait Reconcile: Send + Sync {
    /// Get the record's ID.
    fn id(&self) -> BindingId;

    /// Run one reconciliation step.
    ///
    /// `phase` is advanced as the step progresses so that a panic can be
    /// attributed to the callback that raised it.
    fn reconcile(&self, phase: &mut Phase) -> Observation;

    /// Whether this record has completed its first observation.
    fn is_synced(&self) -> bool;

    /// Mark the record as no longer registered. Called by the registry.
    fn mark_unbound(&self);

    /// Whether the record is still registered.
    fn is_live(&self) -> bool;
}

/// Description of a binding, before registration.
///
/// # Example
///
/// ```rust,ignore
/// let binding = Binding::new(move || title.get(), move |t: &String| label.set_text(t))
///     .remove_when(move || label.is_detached());
///
/// let id = binder.register(binding);
/// ```
pub struct Binding<T> {
    evaluator: Box<dyn Evaluator<T>>,
    updater: Box<dyn Updater<T>>,
    comparer: Box<dyn EqualityComparer<T>>,
    remover: Option<Box<dyn RemovalPredicate>>,
}

impl<T> Binding<T>
where
    T: PartialEq + Send + 'static,
{
    /// Create a binding that detects change with `PartialEq`.
    pub fn new<E, U>(evaluate: E, on_update: U) -> Self
    where
        E: Evaluator<T> + 'static,
        U: Updater<T> + 'static,
    {
        Self::with_comparer(evaluate, on_update, PartialEqComparer)
    }
}

impl<T> Binding<T>
where
    T: Send + 'static,
{
    /// Create a binding that detects change with a custom comparer.
    ///
    /// The comparer alone decides whether an update fires; `T` does not
    /// need to implement `PartialEq`.
    pub fn with_comparer<E, U, C>(evaluate: E, on_update: U, equals: C) -> Self
    where
        E: Evaluator<T> + 'static,
        U: Updater<T> + 'static,
        C: EqualityComparer<T> + 'static,
    {
        Self {
            evaluator: Box::new(evaluate),
            updater: Box::new(on_update),
            comparer: Box::new(equals),
            remover: None,
        }
    }

    /// Attach a removal predicate.
    pub fn remove_when<R>(mut self, should_remove: R) -> Self
    where
        R: RemovalPredicate + 'static,
    {
        self.remover = Some(Box::new(should_remove));
        self
    }

    pub(crate) fn into_record(self, id: BindingId) -> BindingRecord<T> {
        BindingRecord {
            id,
            evaluator: self.evaluator,
            updater: self.updater,
            comparer: self.comparer,
            remover: self.remover,
            last: Mutex::new(None),
            live: AtomicBool::new(true),
        }
    }
}

impl<T> Binding<T> {
    /// Whether a removal predicate is attached.
    pub fn has_remover(&self) -> bool {
        self.remover.is_some()
    }
}

impl<T> fmt::Debug for Binding<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binding")
            .field("has_remover", &self.remover.is_some())
            .finish_non_exhaustive()
    }
}

/// A registered binding.
///
/// Owned by the registry. `last` is `None` until the first observation.
pub struct BindingRecord<T> {
    id: BindingId,
    evaluator: Box<dyn Evaluator<T>>,
    updater: Box<dyn Updater<T>>,
    comparer: Box<dyn EqualityComparer<T>>,
    remover: Option<Box<dyn RemovalPredicate>>,
    last: Mutex<Option<T>>,
    live: AtomicBool,
}

impl<T> Reconcile for BindingRecord<T>
where
    T: Send + 'static,
{
    fn id(&self) -> BindingId {
        self.id
    }

    fn reconcile(&self, phase: &mut Phase) -> Observation {
        if !self.is_live() {
            return Observation::Unbound;
        }

        *phase = Phase::ShouldRemove;
        if let Some(remover) = &self.remover {
            if remover.should_remove() {
                return Observation::Retired;
            }
        }

        *phase = Phase::Evaluate;
        let current = self.evaluator.evaluate();

        let mut last = self.last.lock();
        let observation = match last.as_ref() {
            None => Observation::First,
            Some(previous) => {
                *phase = Phase::Compare;
                if self.comparer.equals(previous, &current) {
                    Observation::Unchanged
                } else {
                    Observation::Changed
                }
            }
        };

        if observation.fired() && !self.is_live() {
            return Observation::Unbound;
        }

        if observation.fired() {
            *phase = Phase::Update;
            self.updater.update(&current);
            *last = Some(current);
        }

        observation
    }

    fn is_synced(&self) -> bool {
        self.last.lock().is_some()
    }

    fn mark_unbound(&self) {
        self.live.store(false, Ordering::Release);
    }

    fn is_live(&self) -> bool {
        self.live.load(Ordering::Acquire)
    }
}

impl<T> fmt::Debug for BindingRecord<T>
where
    T: Send + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BindingRecord")
            .field("id", &self.id)
            .field("synced", &self.is_synced())
            .field("has_remover", &self.remover.is_some())
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicI32;
    use std::sync::Arc;

    fn reconcile(record: &dyn Reconcile) -> Observation {
        let mut phase = Phase::ShouldRemove;
        record.reconcile(&mut phase)
    }

    #[test]
    fn first_observation_always_fires() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = seen.clone();

        let record = Binding::new(|| 0, move |v: &i32| seen_clone.lock().push(*v))
            .into_record(BindingId::next());

        assert!(!record.is_synced());
        assert_eq!(reconcile(&record), Observation::First);
        assert!(record.is_synced());

        // Falsy-looking values are not special
        assert_eq!(*seen.lock(), vec![0]);
    }

    #[test]
    fn unchanged_value_does_not_fire() {
        let calls = Arc::new(AtomicI32::new(0));
        let calls_clone = calls.clone();

        let record = Binding::new(|| "hello", move |_: &&str| {
            calls_clone.fetch_add(1, Ordering::SeqCst);
        })
        .into_record(BindingId::next());

        assert_eq!(reconcile(&record), Observation::First);
        assert_eq!(reconcile(&record), Observation::Unchanged);
        assert_eq!(reconcile(&record), Observation::Unchanged);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn changed_value_fires() {
        let source = Arc::new(AtomicI32::new(1));
        let source_clone = source.clone();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = seen.clone();

        let record = Binding::new(
            move || source_clone.load(Ordering::SeqCst),
            move |v: &i32| seen_clone.lock().push(*v),
        )
        .into_record(BindingId::next());

        reconcile(&record);
        source.store(2, Ordering::SeqCst);
        assert_eq!(reconcile(&record), Observation::Changed);
        assert_eq!(*seen.lock(), vec![1, 2]);
    }

    #[test]
    fn custom_comparer_overrides_partial_eq() {
        let source = Arc::new(AtomicI32::new(1));
        let source_clone = source.clone();
        let calls = Arc::new(AtomicI32::new(0));
        let calls_clone = calls.clone();

        // Only parity matters
        let record = Binding::with_comparer(
            move || source_clone.load(Ordering::SeqCst),
            move |_: &i32| {
                calls_clone.fetch_add(1, Ordering::SeqCst);
            },
            |a: &i32, b: &i32| a % 2 == b % 2,
        )
        .into_record(BindingId::next());

        reconcile(&record);
        source.store(3, Ordering::SeqCst);
        assert_eq!(reconcile(&record), Observation::Unchanged);
        source.store(4, Ordering::SeqCst);
        assert_eq!(reconcile(&record), Observation::Changed);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn retired_record_skips_evaluation() {
        let evaluated = Arc::new(AtomicBool::new(false));
        let evaluated_clone = evaluated.clone();

        let record = Binding::new(
            move || {
                evaluated_clone.store(true, Ordering::SeqCst);
                1
            },
            |_: &i32| {},
        )
        .remove_when(|| true)
        .into_record(BindingId::next());

        assert_eq!(reconcile(&record), Observation::Retired);
        assert!(!evaluated.load(Ordering::SeqCst));
        assert!(!record.is_synced());
    }

    #[test]
    fn unbound_during_evaluate_does_not_fire() {
        let calls = Arc::new(AtomicI32::new(0));
        let calls_clone = calls.clone();
        let record: Arc<Mutex<Option<Arc<dyn Reconcile>>>> = Arc::new(Mutex::new(None));
        let record_clone = record.clone();

        // The evaluator unregisters its own record mid-reconcile
        let built: Arc<dyn Reconcile> = Arc::new(
            Binding::new(
                move || {
                    if let Some(r) = record_clone.lock().as_ref() {
                        r.mark_unbound();
                    }
                    1
                },
                move |_: &i32| {
                    calls_clone.fetch_add(1, Ordering::SeqCst);
                },
            )
            .into_record(BindingId::next()),
        );
        *record.lock() = Some(built.clone());

        assert_eq!(reconcile(built.as_ref()), Observation::Unbound);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(!built.is_synced());

        // Stays dead
        assert_eq!(reconcile(built.as_ref()), Observation::Unbound);
        *record.lock() = None;
    }

    #[test]
    fn debug_reports_remover() {
        let binding = Binding::new(|| 1, |_: &i32| {}).remove_when(|| false);
        assert!(binding.has_remover());
        assert_eq!(format!("{binding:?}"), "Binding { has_remover: true, .. }");
    }

    #[test]
    fn phase_tracks_progress() {
        let record = Binding::new(|| 1, |_: &i32| {}).into_record(BindingId::next());

        let mut phase = Phase::ShouldRemove;
        record.reconcile(&mut phase);
        assert_eq!(phase, Phase::Update);

        record.reconcile(&mut phase);
        assert_eq!(phase, Phase::Compare);
    }
}
