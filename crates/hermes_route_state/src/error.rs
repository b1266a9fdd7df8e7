use thiserror::Error;

use crate::{
    problem::capacity::CapacityError,
    solution::{activity::ActivityIdx, route_id::RouteIdx},
};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StateError {
    #[error("state key name '{0}' is reserved for built-in states")]
    ReservedKeyName(String),
    #[error("state '{0}' is a built-in state and cannot be written from outside the crate")]
    ReservedKeyWrite(String),
    #[error("state key {0} was never registered")]
    UnknownKey(usize),
    #[error("activity index 0 is not a valid activity index")]
    UnindexedActivity,
    #[error("cannot store state '{key}' on route anchor {index}")]
    AnchorActivity { key: String, index: ActivityIdx },
    #[error("state '{key}' holds a value of type {actual}, but {expected} was requested")]
    TypeMismatch {
        key: String,
        expected: &'static str,
        actual: &'static str,
    },
    #[error("activity {activity} has no time window {index}")]
    TimeWindowOutOfBounds { activity: ActivityIdx, index: usize },
    #[error("route {route} has no '{key}' state, it must be computed before this update")]
    MissingRouteState { key: String, route: RouteIdx },
    #[error(transparent)]
    Capacity(#[from] CapacityError),
}
