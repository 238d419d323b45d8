//! Checkpoint assembly: attaches an estimated time of arrival to each
//! segmentation mark, assuming a uniform average speed for the whole route.
//! A simplification, not a traffic-aware ETA.

use shared::Checkpoint;

use crate::error::InvalidInput;
use crate::segmenter::CheckpointMark;

/// Turn segmentation marks into checkpoints with elapsed-time estimates.
///
/// Hours accumulate at full precision from the kilometre deltas between
/// consecutive marks and are rounded to 2 decimals only at emission.
pub fn assemble(
    marks: &[CheckpointMark],
    average_speed_kmh: f64,
) -> Result<Vec<Checkpoint>, InvalidInput> {
    if !(average_speed_kmh > 0.0) || !average_speed_kmh.is_finite() {
        return Err(InvalidInput::InvalidSpeed(average_speed_kmh));
    }

    let mut checkpoints = Vec::with_capacity(marks.len());
    let mut elapsed_hours = 0.0;
    let mut previous_km = 0.0;

    for mark in marks {
        elapsed_hours += (mark.km - previous_km) / average_speed_kmh;
        previous_km = mark.km;
        checkpoints.push(Checkpoint {
            position: mark.position,
            km: mark.km,
            eta_hours: round_to_2(elapsed_hours),
        });
    }

    Ok(checkpoints)
}

fn round_to_2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::Coordinate;

    fn mark(km: f64) -> CheckpointMark {
        CheckpointMark {
            position: Coordinate { lat: 0.0, lon: 0.0 },
            km,
        }
    }

    #[test]
    fn rejects_zero_speed() {
        let result = assemble(&[mark(10.0)], 0.0);
        assert_eq!(result, Err(InvalidInput::InvalidSpeed(0.0)));
    }

    #[test]
    fn rejects_negative_speed() {
        let result = assemble(&[mark(10.0)], -60.0);
        assert_eq!(result, Err(InvalidInput::InvalidSpeed(-60.0)));
    }

    #[test]
    fn rejects_non_finite_speed() {
        assert!(assemble(&[mark(10.0)], f64::NAN).is_err());
        assert!(assemble(&[mark(10.0)], f64::INFINITY).is_err());
    }

    #[test]
    fn empty_marks_yield_empty_checkpoints() {
        assert_eq!(assemble(&[], 60.0).unwrap(), vec![]);
    }

    #[test]
    fn eta_is_rounded_to_two_decimals() {
        let marks = [mark(10.0), mark(20.0), mark(30.0)];
        let checkpoints = assemble(&marks, 60.0).unwrap();

        let etas: Vec<f64> = checkpoints.iter().map(|c| c.eta_hours).collect();
        // 10/60 = 0.1666.., 20/60 = 0.3333.., 30/60 = 0.5
        assert_eq!(etas, vec![0.17, 0.33, 0.5]);
    }

    #[test]
    fn eta_is_monotonic_and_proportional_to_distance() {
        let marks: Vec<CheckpointMark> = (1..=25).map(|n| mark(n as f64 * 7.5)).collect();
        let speed = 85.0;
        let checkpoints = assemble(&marks, speed).unwrap();

        let mut previous = 0.0;
        for checkpoint in &checkpoints {
            assert!(checkpoint.eta_hours >= previous);
            previous = checkpoint.eta_hours;
            // Rounding at emission keeps each value within 0.01 h of km/speed.
            assert!((checkpoint.eta_hours - checkpoint.km / speed).abs() <= 0.0051);
        }
    }

    #[test]
    fn accumulation_does_not_compound_rounding_error() {
        // 1.234 km steps at 60 km/h: per-step time is 0.02057 h. Emitting
        // round(cumulative) must track the exact cumulative, not the sum of
        // per-step rounded values.
        let marks: Vec<CheckpointMark> = (1..=100).map(|n| mark(n as f64 * 1.234)).collect();
        let checkpoints = assemble(&marks, 60.0).unwrap();

        let last = checkpoints.last().unwrap();
        let exact = 100.0 * 1.234 / 60.0;
        assert!((last.eta_hours - exact).abs() <= 0.005 + 1e-9);
    }
}
