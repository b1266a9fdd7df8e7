use jiff::{SignedDuration, Timestamp};

/// Logs how long `$block` took at debug level.
#[macro_export]
macro_rules! timer_debug {
    ($msg:literal, $block:expr) => {{
        let now = jiff::Timestamp::now();
        let result = $block;
        let elapsed = jiff::Timestamp::now().duration_since(now);

        tracing::debug!("{}: took {:?}", $msg, elapsed);

        result
    }};
}

/// `time + duration`, clamped to the representable range.
pub(crate) fn saturating_add(time: Timestamp, duration: SignedDuration) -> Timestamp {
    time.checked_add(duration).unwrap_or(if duration.is_negative() {
        Timestamp::MIN
    } else {
        Timestamp::MAX
    })
}

/// `time - duration`, clamped to the representable range.
pub(crate) fn saturating_sub(time: Timestamp, duration: SignedDuration) -> Timestamp {
    time.checked_sub(duration).unwrap_or(if duration.is_negative() {
        Timestamp::MAX
    } else {
        Timestamp::MIN
    })
}
