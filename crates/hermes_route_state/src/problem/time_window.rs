use jiff::{SignedDuration, Timestamp};
use serde::{Deserialize, Serialize};

#[derive(Deserialize, Debug, Serialize, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    start: Option<Timestamp>,
    end: Option<Timestamp>,
}

impl TimeWindow {
    pub fn new(start: Option<Timestamp>, end: Option<Timestamp>) -> Self {
        TimeWindow { start, end }
    }

    pub fn from_iso(start: Option<&str>, end: Option<&str>) -> Self {
        let start_ts = start.map(|s| s.parse().expect("Error parsing ISO"));
        let end_ts = end.map(|e| e.parse().expect("Error parsing ISO"));
        TimeWindow {
            start: start_ts,
            end: end_ts,
        }
    }

    pub fn start(&self) -> Option<Timestamp> {
        self.start
    }

    pub fn end(&self) -> Option<Timestamp> {
        self.end
    }

    pub fn earliest(&self) -> Timestamp {
        self.start.unwrap_or(Timestamp::MIN)
    }

    pub fn latest(&self) -> Timestamp {
        self.end.unwrap_or(Timestamp::MAX)
    }

    pub fn is_empty(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }

    /// The window has not closed yet at `time`.
    pub fn is_open_at(&self, time: Timestamp) -> bool {
        time <= self.latest()
    }

    pub fn contains(&self, time: Timestamp) -> bool {
        self.earliest() <= time && time <= self.latest()
    }

    /// Earliest instant at or after `arrival` that lies inside the window, if it has not closed.
    pub fn earliest_start_from(&self, arrival: Timestamp) -> Option<Timestamp> {
        if self.is_open_at(arrival) {
            Some(arrival.max(self.earliest()))
        } else {
            None
        }
    }
}

/// Ordered, non-overlapping time windows of an activity.
#[derive(Deserialize, Debug, Serialize, Clone, Default, PartialEq, Eq)]
pub struct TimeWindows(Vec<TimeWindow>);

impl TimeWindows {
    pub fn new(mut windows: Vec<TimeWindow>) -> Self {
        windows.sort_by_key(|window| window.earliest());
        debug_assert!(
            windows
                .windows(2)
                .all(|pair| pair[0].latest() < pair[1].earliest()),
            "time windows must not overlap"
        );
        TimeWindows(windows)
    }

    pub fn single(window: TimeWindow) -> Self {
        TimeWindows(vec![window])
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.iter().all(TimeWindow::is_empty)
    }

    pub fn get(&self, index: usize) -> Option<&TimeWindow> {
        self.0.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TimeWindow> {
        self.0.iter()
    }

    /// Start of the first window, or `Timestamp::MIN` when unconstrained.
    pub fn earliest(&self) -> Timestamp {
        self.0
            .first()
            .map(TimeWindow::earliest)
            .unwrap_or(Timestamp::MIN)
    }

    /// End of the last window, or `Timestamp::MAX` when unconstrained.
    pub fn latest(&self) -> Timestamp {
        self.0
            .last()
            .map(TimeWindow::latest)
            .unwrap_or(Timestamp::MAX)
    }

    /// First window that has not closed yet at `time`.
    pub fn first_open_at(&self, time: Timestamp) -> Option<&TimeWindow> {
        self.0.iter().find(|window| window.is_open_at(time))
    }

    pub fn waiting_duration(&self, arrival: Timestamp) -> SignedDuration {
        match self.first_open_at(arrival) {
            Some(window) if arrival < window.earliest() => window.earliest().duration_since(arrival),
            _ => SignedDuration::ZERO,
        }
    }
}

impl From<Vec<TimeWindow>> for TimeWindows {
    fn from(windows: Vec<TimeWindow>) -> Self {
        TimeWindows::new(windows)
    }
}

#[derive(Default)]
pub struct TimeWindowBuilder {
    start: Option<Timestamp>,
    end: Option<Timestamp>,
}

impl TimeWindowBuilder {
    pub fn with_start(mut self, start: Timestamp) -> Self {
        self.start = Some(start);
        self
    }

    pub fn with_iso_start(mut self, start: &str) -> Self {
        self.start = Some(start.parse().expect("Error parsing ISO"));
        self
    }

    pub fn with_end(mut self, end: Timestamp) -> Self {
        self.end = Some(end);
        self
    }

    pub fn with_iso_end(mut self, end: &str) -> Self {
        self.end = Some(end.parse().expect("Error parsing ISO"));
        self
    }

    pub fn build(self) -> TimeWindow {
        TimeWindow {
            start: self.start,
            end: self.end,
        }
    }
}
