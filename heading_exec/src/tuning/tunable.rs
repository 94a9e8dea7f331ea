//! Live-reloadable named values

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::sync::{Mutex, MutexGuard, PoisonError};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A named value which can be changed externally while the loop is running.
///
/// The value and its changed flag sit behind the same lock, so a consumer
/// that sees the flag raised always reads the value that raised it. The
/// flag is edge-triggered: it is raised by each distinct update and cleared
/// by the first poll which observes it.
#[derive(Debug)]
pub struct TunableValue<T> {
    name: String,
    slot: Mutex<Slot<T>>
}

#[derive(Debug)]
struct Slot<T> {
    value: T,
    changed: bool
}

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// A type which can be held in a [`TunableValue`].
pub trait Tunable: Clone {
    /// True if setting `other` over `self` would not be an update.
    ///
    /// Unlike `PartialEq` a NaN is the same value as another NaN, so writing
    /// NaN twice only raises the changed flag once.
    fn same_value(&self, other: &Self) -> bool;
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Tunable for f64 {
    fn same_value(&self, other: &Self) -> bool {
        self == other || (self.is_nan() && other.is_nan())
    }
}

/// Types whose equality is already total.
macro_rules! impl_tunable_by_eq {
    ($($t:ty),*) => {
        $(
            impl Tunable for $t {
                fn same_value(&self, other: &Self) -> bool {
                    self == other
                }
            }
        )*
    };
}

impl_tunable_by_eq!(bool, i32, i64, u32, u64, String);

impl<T> TunableValue<T>
where
    T: Tunable
{
    /// Create a new tunable holding `initial`, with no pending change.
    pub fn new<S: Into<String>>(name: S, initial: T) -> Self {
        Self {
            name: name.into(),
            slot: Mutex::new(Slot {
                value: initial,
                changed: false
            })
        }
    }

    /// The name this value is registered under.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the latest value.
    pub fn get(&self) -> T {
        self.lock().value.clone()
    }

    /// Returns true if the value was updated since this was last asked,
    /// clearing the pending flag.
    pub fn has_changed(&self) -> bool {
        std::mem::replace(&mut self.lock().changed, false)
    }

    /// If the value was updated since last polled, clear the pending flag and
    /// return the new value.
    pub fn take_changed(&self) -> Option<T> {
        let mut slot = self.lock();

        if slot.changed {
            slot.changed = false;
            Some(slot.value.clone())
        }
        else {
            None
        }
    }

    /// Update the value. Only the external tuning collaborator should call
    /// this.
    ///
    /// Setting the value it already holds is not an update and leaves the
    /// flag as it was.
    pub fn set(&self, value: T) {
        let mut slot = self.lock();

        if !slot.value.same_value(&value) {
            slot.value = value;
            slot.changed = true;
        }
    }

    fn lock(&self) -> MutexGuard<'_, Slot<T>> {
        // A writer panicking mid-update can't leave the slot half written,
        // both fields are plain values.
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_initial_value_not_changed() {
        let t = TunableValue::new("Test.value", 1.5f64);
        assert_eq!(t.name(), "Test.value");
        assert_eq!(t.get(), 1.5);
        assert!(!t.has_changed());
        assert_eq!(t.take_changed(), None);
    }

    #[test]
    fn test_has_changed_is_edge_triggered() {
        let t = TunableValue::new("Test.value", 1.0f64);

        t.set(2.0);
        assert!(t.has_changed());
        assert!(!t.has_changed());
        assert!(!t.has_changed());
        assert_eq!(t.get(), 2.0);

        t.set(3.0);
        assert!(t.has_changed());
        assert!(!t.has_changed());
        assert_eq!(t.get(), 3.0);
    }

    #[test]
    fn test_multiple_updates_between_polls_raise_once() {
        let t = TunableValue::new("Test.value", 1.0f64);

        t.set(2.0);
        t.set(3.0);
        assert_eq!(t.take_changed(), Some(3.0));
        assert_eq!(t.take_changed(), None);
    }

    #[test]
    fn test_setting_same_value_is_not_an_update() {
        let t = TunableValue::new("Test.value", 1.0f64);

        t.set(1.0);
        assert!(!t.has_changed());

        t.set(4.0);
        t.set(4.0);
        assert!(t.has_changed());
        assert!(!t.has_changed());
    }

    #[test]
    fn test_repeated_nan_is_not_an_update() {
        let t = TunableValue::new("Test.value", f64::NAN);

        t.set(f64::NAN);
        assert!(!t.has_changed());

        t.set(1.0);
        assert!(t.has_changed());
        t.set(f64::NAN);
        t.set(f64::NAN);
        assert!(t.take_changed().unwrap().is_nan());
        assert!(t.take_changed().is_none());
    }

    #[test]
    fn test_update_from_other_thread() {
        let t = Arc::new(TunableValue::new("Test.value", 0.0f64));

        let writer = {
            let t = t.clone();
            thread::spawn(move || t.set(7.0))
        };
        writer.join().unwrap();

        assert_eq!(t.take_changed(), Some(7.0));
        assert_eq!(t.take_changed(), None);
    }
}
