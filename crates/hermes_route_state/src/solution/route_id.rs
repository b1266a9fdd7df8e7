use std::{
    fmt,
    sync::atomic::{AtomicUsize, Ordering},
};

static NEXT_ROUTE_IDX: AtomicUsize = AtomicUsize::new(0);

/// Identity of one route object, used to address route-level states.
///
/// Every route draws a fresh value when it is created or cloned, so two
/// routes never share states even when they hold the same activities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RouteIdx(usize);

impl RouteIdx {
    pub(crate) fn next() -> Self {
        RouteIdx(NEXT_ROUTE_IDX.fetch_add(1, Ordering::Relaxed))
    }

    pub fn get(&self) -> usize {
        self.0
    }
}

impl fmt::Display for RouteIdx {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
