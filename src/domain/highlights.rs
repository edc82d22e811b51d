//! Grouping of detection events into highlight windows.

use super::events::DetectionEvent;
use serde::Serialize;

/// Padding and merge thresholds, all in seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AggregationParams {
    /// Padding before the event that opens a window.
    pub lead_buffer: f64,
    /// Padding after the latest event of a window.
    pub trail_buffer: f64,
    /// Largest gap between a window's end and the next event that still merges.
    pub merge_gap: f64,
    /// Shorter windows are dropped.
    pub min_duration: f64,
}

impl Default for AggregationParams {
    fn default() -> Self {
        Self {
            lead_buffer: 7.0,
            trail_buffer: 10.0,
            merge_gap: 10.0,
            min_duration: 10.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HighlightWindow {
    pub start: f64,
    pub end: f64,
}

impl HighlightWindow {
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

/// Single forward pass over time-ordered events, holding at most one open
/// window at a time.
#[derive(Debug)]
pub struct HighlightAggregator {
    params: AggregationParams,
    open: Option<HighlightWindow>,
    emitted: Vec<HighlightWindow>,
    last_timestamp: f64,
}

impl HighlightAggregator {
    pub fn new(params: AggregationParams) -> Self {
        Self {
            params,
            open: None,
            emitted: Vec::new(),
            last_timestamp: f64::NEG_INFINITY,
        }
    }

    /// Feed the next event. Timestamps must be non-decreasing.
    pub fn push(&mut self, event: &DetectionEvent) {
        let t = event.timestamp;
        debug_assert!(
            t >= self.last_timestamp,
            "events out of order: {} after {}",
            t,
            self.last_timestamp
        );
        self.last_timestamp = t;

        match self.open.as_mut() {
            // Assignment rather than max: ordered input keeps `end` monotonic.
            Some(window) if t <= window.end + self.params.merge_gap => {
                window.end = t + self.params.trail_buffer;
            }
            _ => {
                self.flush();
                self.open = Some(self.open_at(t));
            }
        }
    }

    /// Flush the open window and return everything emitted so far.
    pub fn finish(mut self) -> Vec<HighlightWindow> {
        self.flush();
        self.emitted
    }

    fn open_at(&self, t: f64) -> HighlightWindow {
        HighlightWindow {
            start: (t - self.params.lead_buffer).max(0.0),
            end: t + self.params.trail_buffer,
        }
    }

    fn flush(&mut self) {
        if let Some(window) = self.open.take() {
            if window.duration() >= self.params.min_duration {
                self.emitted.push(window);
            }
        }
    }
}

/// Aggregate a full, time-ordered event sequence.
pub fn aggregate(events: &[DetectionEvent], params: AggregationParams) -> Vec<HighlightWindow> {
    let mut aggregator = HighlightAggregator::new(params);
    for event in events {
        aggregator.push(event);
    }
    aggregator.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn events_at(timestamps: &[f64]) -> Vec<DetectionEvent> {
        timestamps
            .iter()
            .map(|&t| DetectionEvent::new("kill", t))
            .collect()
    }

    fn windows(timestamps: &[f64]) -> Vec<(f64, f64)> {
        aggregate(&events_at(timestamps), AggregationParams::default())
            .iter()
            .map(|w| (w.start, w.end))
            .collect()
    }

    #[test]
    fn test_merges_close_events_and_splits_far_ones() {
        assert_eq!(windows(&[5.0, 12.0, 40.0]), vec![(0.0, 22.0), (33.0, 50.0)]);
    }

    #[test]
    fn test_single_event_near_start() {
        assert_eq!(windows(&[2.0]), vec![(0.0, 12.0)]);
        assert_eq!(windows(&[0.5]), vec![(0.0, 10.5)]);
    }

    #[test]
    fn test_single_event_mid_video() {
        assert_eq!(windows(&[100.0]), vec![(93.0, 110.0)]);
    }

    #[test]
    fn test_empty_sequence() {
        assert!(windows(&[]).is_empty());
    }

    #[test]
    fn test_merge_boundary_is_inclusive() {
        // First window ends at 10, so an event at exactly 20 still merges.
        assert_eq!(windows(&[0.0, 20.0]), vec![(0.0, 30.0)]);
        assert_eq!(windows(&[0.0, 20.5]), vec![(0.0, 10.0), (13.5, 30.5)]);
    }

    #[test]
    fn test_same_timestamp_events_share_window() {
        let events = vec![
            DetectionEvent::new("kill", 30.0),
            DetectionEvent::new("tower", 30.0),
            DetectionEvent::new("lord", 30.0),
        ];
        let result = aggregate(&events, AggregationParams::default());
        assert_eq!(result, vec![HighlightWindow { start: 23.0, end: 40.0 }]);
    }

    #[test]
    fn test_short_windows_are_dropped() {
        let params = AggregationParams {
            lead_buffer: 1.0,
            trail_buffer: 2.0,
            merge_gap: 1.0,
            min_duration: 10.0,
        };
        // [4,7] too short; [19,30] grows through merges to 11s and is kept.
        let result = aggregate(&events_at(&[5.0, 20.0, 22.0, 25.0, 28.0]), params);
        assert_eq!(result, vec![HighlightWindow { start: 19.0, end: 30.0 }]);
    }

    #[test]
    fn test_windows_ordered_non_overlapping_and_long_enough() {
        let mut timestamps = Vec::new();
        let mut t = 0.0;
        for step in [0.3, 4.0, 25.0, 1.5, 33.0, 0.0, 9.9, 21.0, 60.0, 2.5, 2.5, 45.0] {
            t += step;
            timestamps.push(t);
        }
        let result = aggregate(&events_at(&timestamps), AggregationParams::default());

        assert!(!result.is_empty());
        for window in &result {
            assert!(window.start >= 0.0);
            assert!(window.duration() >= 10.0);
        }
        for pair in result.windows(2) {
            assert!(pair[0].end < pair[1].start, "{:?} overlaps {:?}", pair[0], pair[1]);
        }
    }

    #[test]
    fn test_aggregation_is_repeatable() {
        let events = events_at(&[1.0, 3.0, 50.0, 51.0, 120.0]);
        let first = aggregate(&events, AggregationParams::default());
        let second = aggregate(&events, AggregationParams::default());
        assert_eq!(first, second);
    }

    #[test]
    fn test_incremental_push_matches_batch() {
        let events = events_at(&[5.0, 12.0, 40.0]);
        let mut aggregator = HighlightAggregator::new(AggregationParams::default());
        for event in &events {
            aggregator.push(event);
        }
        assert_eq!(
            aggregator.finish(),
            aggregate(&events, AggregationParams::default())
        );
    }
}
