/// Highest percentage published while bytes are still in flight.
///
/// 100 is reserved for the confirmed-success transition.
pub const IN_FLIGHT_CAP: u8 = 99;

/// Integer percentage of `sent` over `total`, rounded down and clamped to 100.
///
/// An empty payload reports 0; its completion is signalled by the caller.
pub fn percent_of(sent: u64, total: u64) -> u8 {
    if total == 0 {
        return 0;
    }
    let pct = (u128::from(sent) * 100 / u128::from(total)).min(100);
    pct as u8
}

/// Turns a stream of `(sent, total)` pairs into monotonic percentages.
///
/// Only strictly increasing values are published, so a transport that
/// reports every few kilobytes does not flood the tracker with identical
/// updates, and a late or reordered report can never move progress back.
#[derive(Debug, Clone, Default)]
pub struct ProgressCoalescer {
    last: u8,
}

impl ProgressCoalescer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a transport report. Returns the percentage to publish, if any.
    pub fn observe(&mut self, sent: u64, total: u64) -> Option<u8> {
        let pct = percent_of(sent, total).min(IN_FLIGHT_CAP);
        if pct > self.last {
            self.last = pct;
            Some(pct)
        } else {
            None
        }
    }

    /// Last published percentage.
    pub fn last(&self) -> u8 {
        self.last
    }
}
