use std::fmt;

use fxhash::FxHashMap;

use crate::error::StateError;

/// Number of key indices kept for built-in states. User keys start after it.
pub const RESERVED_KEY_COUNT: usize = 30;

/// Stable index of a named state slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StateKey(usize);

impl StateKey {
    const fn builtin(index: usize) -> Self {
        assert!(index < RESERVED_KEY_COUNT);
        StateKey(index)
    }

    pub const fn index(&self) -> usize {
        self.0
    }

    pub const fn is_reserved(&self) -> bool {
        self.0 < RESERVED_KEY_COUNT
    }
}

impl fmt::Display for StateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Running load at an activity, `Capacity`.
pub const LOAD: StateKey = StateKey::builtin(0);
/// Load on board when leaving the start anchor, route state, `Capacity`.
pub const LOAD_AT_BEGINNING: StateKey = StateKey::builtin(1);
/// Load on board when reaching the end anchor, route state, `Capacity`.
pub const LOAD_AT_END: StateKey = StateKey::builtin(2);
/// Componentwise maximum load over the whole route, route state, `Capacity`.
pub const MAX_LOAD: StateKey = StateKey::builtin(3);
/// Maximum load from the start anchor up to an activity, `Capacity`.
pub const PAST_MAX_LOAD: StateKey = StateKey::builtin(4);
/// Maximum load from an activity down to the end anchor, `Capacity`.
pub const FUTURE_MAX_LOAD: StateKey = StateKey::builtin(5);
/// Accumulated cost up to an activity, or total route cost as a route state, `f64`.
pub const COSTS: StateKey = StateKey::builtin(6);
/// Latest start that keeps every later time window reachable, `Timestamp`.
pub const LATEST_OPERATION_START_TIME: StateKey = StateKey::builtin(7);
/// Union of the skills required on the route, route state, `Skills`.
pub const SKILLS: StateKey = StateKey::builtin(8);

pub const BUILTIN_KEYS: &[(StateKey, &str)] = &[
    (LOAD, "load"),
    (LOAD_AT_BEGINNING, "load_at_beginning"),
    (LOAD_AT_END, "load_at_end"),
    (MAX_LOAD, "max_load"),
    (PAST_MAX_LOAD, "past_max_load"),
    (FUTURE_MAX_LOAD, "future_max_load"),
    (COSTS, "costs"),
    (LATEST_OPERATION_START_TIME, "latest_operation_start_time"),
    (SKILLS, "skills"),
];

/// Hands out stable key indices by name.
///
/// Built-in names occupy the reserved range and can never be obtained
/// through [`StateKeyRegistry::get_or_create_key`].
#[derive(Debug, Clone)]
pub struct StateKeyRegistry {
    names: Vec<Option<String>>,
    keys: FxHashMap<String, StateKey>,
}

impl StateKeyRegistry {
    pub fn with_reserved(builtins: &[(StateKey, &str)]) -> Self {
        let mut names = vec![None; RESERVED_KEY_COUNT];
        let mut keys = FxHashMap::default();

        for &(key, name) in builtins {
            debug_assert!(key.is_reserved(), "built-in key {name} outside the reserved range");
            debug_assert!(names[key.index()].is_none(), "built-in key {key} defined twice");

            names[key.index()] = Some(name.to_owned());
            keys.insert(name.to_owned(), key);
        }

        StateKeyRegistry { names, keys }
    }

    pub fn get_or_create_key(&mut self, name: &str) -> Result<StateKey, StateError> {
        if let Some(&key) = self.keys.get(name) {
            if key.is_reserved() {
                return Err(StateError::ReservedKeyName(name.to_owned()));
            }
            return Ok(key);
        }

        let key = StateKey(self.names.len());
        self.names.push(Some(name.to_owned()));
        self.keys.insert(name.to_owned(), key);

        Ok(key)
    }

    pub fn find_key(&self, name: &str) -> Option<StateKey> {
        self.keys.get(name).copied()
    }

    pub fn key_name(&self, key: StateKey) -> Option<&str> {
        self.names.get(key.index()).and_then(|name| name.as_deref())
    }

    pub fn is_registered(&self, key: StateKey) -> bool {
        self.key_name(key).is_some()
    }

    /// Size of the key axis, reserved range included.
    pub fn key_count(&self) -> usize {
        self.names.len()
    }
}

impl Default for StateKeyRegistry {
    fn default() -> Self {
        StateKeyRegistry::with_reserved(BUILTIN_KEYS)
    }
}
