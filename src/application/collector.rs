use super::detection::DetectionAdapter;
use super::frame_source::FrameSource;
use crate::domain::{DetectionEvent, HighlightError};
use crate::ports::{Detector, SeekableVideo};
use tracing::debug;

/// Scan the whole video and emit one event per detection, stamped with the
/// time of its frame. Events come out in non-decreasing timestamp order.
pub fn collect_events<V, D>(
    source: &mut FrameSource<V>,
    adapter: &DetectionAdapter<'_, D>,
) -> Result<Vec<DetectionEvent>, HighlightError>
where
    V: SeekableVideo,
    D: Detector,
{
    let mut events = Vec::new();

    while let Some(sample) = source.next_sample()? {
        let detections = adapter.detect(&sample.frame)?;
        if !detections.is_empty() {
            debug!(
                frame = sample.index,
                timestamp = sample.timestamp,
                count = detections.len(),
                "detections on frame"
            );
        }
        events.extend(
            detections
                .iter()
                .map(|d| DetectionEvent::new(d.label.clone(), sample.timestamp)),
        );
        source.advance(!detections.is_empty())?;
    }

    Ok(events)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::detection::DetectorFailure;
    use crate::application::frame_source::tests::{frame_index, ScriptedVideo};
    use crate::domain::{Detection, SamplingMode};
    use crate::ports::detector::MockDetector;
    use std::sync::Mutex;

    fn scripted_detector(hits: &'static [(u64, &'static [&'static str])]) -> Mutex<MockDetector> {
        let mut mock = MockDetector::new();
        mock.expect_detect().returning(move |frame, _| {
            let index = frame_index(frame);
            Ok(hits
                .iter()
                .find(|(i, _)| *i == index)
                .map(|(_, labels)| labels.iter().map(|l| Detection::new(*l, 0.9)).collect())
                .unwrap_or_default())
        });
        Mutex::new(mock)
    }

    #[test]
    fn test_one_event_per_detected_class() {
        let detector = scripted_detector(&[(2, &["kill", "tower", "lord"])]);
        let adapter = DetectionAdapter::new(&detector, 0.5, DetectorFailure::Abort);
        let mut source =
            FrameSource::new(ScriptedVideo::new(2.0, 4), SamplingMode::Adaptive, 1.5).unwrap();

        let events = collect_events(&mut source, &adapter).unwrap();

        assert_eq!(
            events,
            vec![
                DetectionEvent::new("kill", 1.0),
                DetectionEvent::new("tower", 1.0),
                DetectionEvent::new("lord", 1.0),
            ]
        );
    }

    #[test]
    fn test_detection_drives_sampling_cadence() {
        // Frame 0 hits, so the sampler jumps to 3; frames 3 and 4 are read one
        // by one; frame 4 hits and the jump to 7 runs off the end.
        let detector = scripted_detector(&[(0, &["kill"]), (4, &["kill"])]);
        let adapter = DetectionAdapter::new(&detector, 0.5, DetectorFailure::Abort);
        let mut source =
            FrameSource::new(ScriptedVideo::new(2.0, 6), SamplingMode::Adaptive, 1.5).unwrap();

        let events = collect_events(&mut source, &adapter).unwrap();

        assert_eq!(source.sampled(), 3);
        let timestamps: Vec<f64> = events.iter().map(|e| e.timestamp).collect();
        assert_eq!(timestamps, vec![0.0, 2.0]);
    }

    #[test]
    fn test_no_detections_yields_no_events() {
        let detector = scripted_detector(&[]);
        let adapter = DetectionAdapter::new(&detector, 0.5, DetectorFailure::Abort);
        let mut source =
            FrameSource::new(ScriptedVideo::new(2.0, 5), SamplingMode::Adaptive, 1.5).unwrap();

        assert!(collect_events(&mut source, &adapter).unwrap().is_empty());
        assert_eq!(source.sampled(), 5);
    }

    #[test]
    fn test_detector_error_aborts_collection() {
        let mut mock = MockDetector::new();
        mock.expect_detect().returning(|_, _| Err("gpu lost".into()));
        let detector = Mutex::new(mock);
        let adapter = DetectionAdapter::new(&detector, 0.5, DetectorFailure::Abort);
        let mut source =
            FrameSource::new(ScriptedVideo::new(2.0, 5), SamplingMode::Adaptive, 1.5).unwrap();

        let result = collect_events(&mut source, &adapter);
        assert!(matches!(result, Err(HighlightError::Processing(_))));
    }
}
