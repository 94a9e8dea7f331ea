//! Process-wide registry of tunable values

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::debug;
use std::any::{Any, type_name};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

// Internal
use super::{Tunable, TunableValue, TuningError};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

type Entry = Arc<dyn Any + Send + Sync>;

/// Mapping from tunable name to live value.
///
/// The registry is shared between the external writer (a dashboard, a
/// network handler, ...) and the control loop. Readers get typed handles to
/// the individual values once at construction and poll those each cycle, so
/// the registry lock is never taken on the control path.
#[derive(Default)]
pub struct TuningRegistry {
    entries: Mutex<HashMap<String, Entry>>
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl TuningRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tunable, or get the existing one if a tunable of the same
    /// type is already registered under `name`.
    ///
    /// An existing tunable keeps its current value, `initial` is only used
    /// when the tunable is created.
    pub fn register<T>(
        &self, 
        name: &str, 
        initial: T
    ) -> Result<Arc<TunableValue<T>>, TuningError> 
    where
        T: Tunable + Send + Sync + 'static
    {
        let mut entries = self.lock();

        if let Some(entry) = entries.get(name) {
            return downcast(name, entry.clone());
        }

        debug!("Registering tunable \"{}\"", name);

        let tunable = Arc::new(TunableValue::new(name, initial));
        entries.insert(name.to_string(), tunable.clone());

        Ok(tunable)
    }

    /// Get the tunable registered under `name`.
    pub fn get<T>(&self, name: &str) -> Result<Arc<TunableValue<T>>, TuningError> 
    where
        T: Tunable + Send + Sync + 'static
    {
        match self.lock().get(name) {
            Some(entry) => downcast(name, entry.clone()),
            None => Err(TuningError::NotFound(name.to_string()))
        }
    }

    /// Update the tunable registered under `name`.
    pub fn set<T>(&self, name: &str, value: T) -> Result<(), TuningError> 
    where
        T: Tunable + Send + Sync + 'static
    {
        self.get::<T>(name)?.set(value);
        Ok(())
    }

    /// Names of all registered tunables, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.lock().keys().cloned().collect();
        names.sort();
        names
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Entry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

fn downcast<T>(name: &str, entry: Entry) -> Result<Arc<TunableValue<T>>, TuningError> 
where
    T: Tunable + Send + Sync + 'static
{
    entry
        .downcast::<TunableValue<T>>()
        .map_err(|_| TuningError::TypeMismatch {
            name: name.to_string(),
            expected: type_name::<T>()
        })
}
