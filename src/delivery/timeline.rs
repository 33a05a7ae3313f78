//! Laying scenario outputs out in one delivery order

use chrono::TimeDelta;

use crate::domain::events::ScheduledEvent;

/// Seconds between the last delivery of one composed sequence and the
/// first delivery of the next.
pub const COMPOSE_GAP_SECS: i64 = 1;

/// Events ordered by processing time
///
/// The sort is stable: events with equal processing time keep the order in
/// which they were supplied, scenario by scenario and then in authoring
/// order within each scenario. Event time never takes part in ordering.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Timeline {
    events: Vec<ScheduledEvent>,
}

impl Timeline {
    pub fn merge<I>(sequences: I) -> Self
    where
        I: IntoIterator,
        I::Item: IntoIterator<Item = ScheduledEvent>,
    {
        let mut events: Vec<ScheduledEvent> = sequences.into_iter().flatten().collect();
        events.sort_by_key(ScheduledEvent::processing_time);
        Self { events }
    }

    /// Runs sequences back-to-back: each sequence is delayed, when needed,
    /// so that it starts [`COMPOSE_GAP_SECS`] after the previous one ends. Order
    /// inside a sequence is the same as [`Timeline::merge`] would give it.
    pub fn compose<I>(sequences: I) -> Self
    where
        I: IntoIterator,
        I::Item: IntoIterator<Item = ScheduledEvent>,
    {
        let gap = TimeDelta::seconds(COMPOSE_GAP_SECS);
        let mut previous_end: Option<chrono::NaiveDateTime> = None;
        let shifted: Vec<Vec<ScheduledEvent>> = sequences
            .into_iter()
            .map(|sequence| {
                let events: Vec<ScheduledEvent> = sequence.into_iter().collect();
                let (Some(start), Some(end)) = (
                    events.iter().map(ScheduledEvent::processing_time).min(),
                    events.iter().map(ScheduledEvent::processing_time).max(),
                ) else {
                    return events;
                };

                let offset = previous_end
                    .map(|previous| {
                        (previous + gap - start.into_inner()).max(TimeDelta::zero())
                    })
                    .unwrap_or_else(TimeDelta::zero);
                previous_end = Some(end.into_inner() + offset);

                if offset.is_zero() {
                    events
                } else {
                    events.iter().map(|event| event.shifted(offset)).collect()
                }
            })
            .collect();

        Self::merge(shifted)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ScheduledEvent> {
        self.events.iter()
    }

    pub fn as_slice(&self) -> &[ScheduledEvent] {
        &self.events
    }
}

impl IntoIterator for Timeline {
    type Item = ScheduledEvent;
    type IntoIter = std::vec::IntoIter<ScheduledEvent>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.into_iter()
    }
}

impl<'a> IntoIterator for &'a Timeline {
    type Item = &'a ScheduledEvent;
    type IntoIter = std::slice::Iter<'a, ScheduledEvent>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.iter()
    }
}
