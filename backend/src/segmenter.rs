//! Route-checkpoint segmentation.
//!
//! Walks a polyline accumulating great-circle distance and emits a synthetic
//! checkpoint every `interval_km` kilometres, interpolating a new vertex
//! whenever a boundary falls inside a segment. The input is never mutated;
//! the returned polyline is the input extended with the interpolated
//! vertices, so later rendering stays geometrically consistent with the
//! recorded kilometre markers.

use shared::Coordinate;

use crate::error::InvalidInput;

const EARTH_RADIUS_KM: f64 = 6_371.0;

/// A checkpoint position with its chainage, before ETA assembly.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CheckpointMark {
    pub position: Coordinate,
    /// Cumulative distance from the origin, km, rounded to 1 decimal.
    pub km: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Segmentation {
    pub checkpoints: Vec<CheckpointMark>,
    /// The original polyline with every checkpoint inserted as a vertex.
    pub polyline: Vec<Coordinate>,
}

/// Subdivide `polyline` into checkpoints spaced `interval_km` apart.
///
/// Checkpoint positions are linearly interpolated in coordinate space, an
/// approximation acceptable at checkpoint spacing scale (segments are short
/// relative to Earth's curvature); distances are haversine. Only
/// full-interval boundaries emit a checkpoint: a remainder shorter than the
/// interval at the end of the path produces no trailing marker.
pub fn segment(
    polyline: &[Coordinate],
    interval_km: f64,
) -> Result<Segmentation, InvalidInput> {
    if polyline.len() < 2 {
        return Err(InvalidInput::PolylineTooShort(polyline.len()));
    }
    if !(interval_km > 0.0) || !interval_km.is_finite() {
        return Err(InvalidInput::InvalidInterval(interval_km));
    }

    let mut points = polyline.to_vec();
    let mut checkpoints = Vec::new();
    // Full-precision accumulators; rounding happens only at emission.
    let mut walked_km = 0.0; // origin -> points[i]
    let mut since_last_km = 0.0; // last checkpoint -> points[i]
    let mut i = 0;

    while i + 1 < points.len() {
        let segment_km = haversine_km(points[i], points[i + 1]);

        // Duplicate consecutive coordinates contribute nothing and must not
        // reach the interpolation division below.
        if segment_km == 0.0 {
            i += 1;
            continue;
        }

        if since_last_km + segment_km < interval_km {
            since_last_km += segment_km;
            walked_km += segment_km;
            i += 1;
            continue;
        }

        // A boundary falls inside this segment, or exactly at its end.
        let excess_km = (since_last_km + segment_km) - interval_km;
        let traversed_km = segment_km - excess_km;
        let factor = (traversed_km / segment_km).clamp(0.0, 1.0);
        let boundary_km = walked_km + traversed_km;

        let position = if factor < 1.0 {
            let point = points[i].interpolate(points[i + 1], factor);
            // Inserted as a real vertex: the next iteration walks the
            // remainder of the split segment from here, so a single long
            // segment can still yield several checkpoints.
            points.insert(i + 1, point);
            point
        } else {
            // The boundary sits exactly on an existing vertex; reuse it
            // rather than inserting a duplicate.
            points[i + 1]
        };

        checkpoints.push(CheckpointMark {
            position,
            km: round_to_1(boundary_km),
        });

        walked_km = boundary_km;
        since_last_km = 0.0;
        i += 1;
    }

    Ok(Segmentation {
        checkpoints,
        polyline: points,
    })
}

/// Great-circle distance in kilometres.
pub fn haversine_km(a: Coordinate, b: Coordinate) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let dlat = (b.lat - a.lat).to_radians();
    let dlon = (b.lon - a.lon).to_radians();

    let sin_dlat = (dlat / 2.0).sin();
    let sin_dlon = (dlon / 2.0).sin();

    let h = sin_dlat * sin_dlat + lat1.cos() * lat2.cos() * sin_dlon * sin_dlon;
    2.0 * EARTH_RADIUS_KM * h.sqrt().asin()
}

/// Haversine length of a path, segment by segment.
pub fn path_length_km(path: &[Coordinate]) -> f64 {
    path.windows(2).map(|w| haversine_km(w[0], w[1])).sum()
}

fn round_to_1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coord(lat: f64, lon: f64) -> Coordinate {
        Coordinate { lat, lon }
    }

    /// A meridian polyline at the equator; 0.01 deg of latitude is ~1.112 km.
    fn meridian(lats: &[f64]) -> Vec<Coordinate> {
        lats.iter().map(|&lat| coord(lat, 0.0)).collect()
    }

    #[test]
    fn rejects_single_point_polyline() {
        let result = segment(&meridian(&[0.0]), 10.0);
        assert_eq!(result, Err(InvalidInput::PolylineTooShort(1)));
    }

    #[test]
    fn rejects_empty_polyline() {
        let result = segment(&[], 10.0);
        assert_eq!(result, Err(InvalidInput::PolylineTooShort(0)));
    }

    #[test]
    fn rejects_zero_interval() {
        let result = segment(&meridian(&[0.0, 0.1]), 0.0);
        assert_eq!(result, Err(InvalidInput::InvalidInterval(0.0)));
    }

    #[test]
    fn rejects_negative_interval() {
        let result = segment(&meridian(&[0.0, 0.1]), -5.0);
        assert_eq!(result, Err(InvalidInput::InvalidInterval(-5.0)));
    }

    #[test]
    fn rejects_non_finite_interval() {
        assert!(segment(&meridian(&[0.0, 0.1]), f64::NAN).is_err());
        assert!(segment(&meridian(&[0.0, 0.1]), f64::INFINITY).is_err());
    }

    #[test]
    fn path_shorter_than_interval_yields_no_checkpoints() {
        // ~5.6 km, interval 10 km.
        let path = meridian(&[0.0, 0.05]);
        let result = segment(&path, 10.0).unwrap();
        assert!(result.checkpoints.is_empty());
        assert_eq!(result.polyline, path);
    }

    #[test]
    fn path_equal_to_interval_yields_checkpoint_at_endpoint() {
        let start = coord(0.0, 0.0);
        let end = coord(0.1, 0.0);
        let interval = haversine_km(start, end);

        let result = segment(&[start, end], interval).unwrap();

        assert_eq!(result.checkpoints.len(), 1);
        assert_eq!(result.checkpoints[0].position, end);
        // Boundary on an existing vertex: nothing is inserted.
        assert_eq!(result.polyline.len(), 2);
    }

    #[test]
    fn single_long_segment_gets_one_interior_checkpoint() {
        // ~18.9 km north-south at the equator, interval 10 km: exactly one
        // checkpoint near km 10, one inserted vertex, not two.
        let path = meridian(&[0.0, 0.17]);
        let result = segment(&path, 10.0).unwrap();

        assert_eq!(result.checkpoints.len(), 1);
        assert_eq!(result.checkpoints[0].km, 10.0);
        assert_eq!(result.polyline.len(), 3);
        assert_eq!(result.polyline[1], result.checkpoints[0].position);
        // The interpolated vertex sits between the endpoints.
        assert!(result.polyline[1].lat > 0.0 && result.polyline[1].lat < 0.17);
    }

    #[test]
    fn long_segment_yields_multiple_checkpoints() {
        // ~44.5 km in a single segment, interval 10 km.
        let path = meridian(&[0.0, 0.40]);
        let result = segment(&path, 10.0).unwrap();

        let kms: Vec<f64> = result.checkpoints.iter().map(|c| c.km).collect();
        assert_eq!(kms, vec![10.0, 20.0, 30.0, 40.0]);
        assert_eq!(result.polyline.len(), 2 + 4);
    }

    #[test]
    fn checkpoints_cross_segment_boundaries() {
        // Three ~5.6 km segments, interval 10 km: the first boundary falls
        // inside the second segment.
        let path = meridian(&[0.0, 0.05, 0.10, 0.15]);
        let result = segment(&path, 10.0).unwrap();

        assert_eq!(result.checkpoints.len(), 1);
        assert_eq!(result.checkpoints[0].km, 10.0);
        assert_eq!(result.polyline.len(), 5);
    }

    #[test]
    fn duplicate_consecutive_points_are_skipped() {
        let path = meridian(&[0.0, 0.05, 0.05, 0.17]);
        let result = segment(&path, 10.0).unwrap();

        assert_eq!(result.checkpoints.len(), 1);
        assert_eq!(result.checkpoints[0].km, 10.0);
    }

    #[test]
    fn input_polyline_is_not_mutated() {
        let path = meridian(&[0.0, 0.40]);
        let snapshot = path.clone();
        let _ = segment(&path, 10.0).unwrap();
        assert_eq!(path, snapshot);
    }

    #[test]
    fn extended_polyline_preserves_endpoints() {
        let path = meridian(&[0.0, 0.12, 0.40]);
        let result = segment(&path, 10.0).unwrap();
        assert_eq!(result.polyline.first(), path.first());
        assert_eq!(result.polyline.last(), path.last());
    }

    #[test]
    fn walking_extended_polyline_reproduces_checkpoint_kilometres() {
        let path = meridian(&[0.0, 0.07, 0.21, 0.40]);
        let result = segment(&path, 10.0).unwrap();
        assert!(!result.checkpoints.is_empty());

        for mark in &result.checkpoints {
            let vertex = result
                .polyline
                .iter()
                .position(|p| *p == mark.position)
                .expect("checkpoint is a vertex of the extended polyline");
            let walked = path_length_km(&result.polyline[..=vertex]);
            assert!(
                (walked - mark.km).abs() < 1e-3,
                "walked {walked} km, recorded {} km",
                mark.km
            );
        }
    }

    #[test]
    fn resegmenting_extended_polyline_is_idempotent() {
        let path = meridian(&[0.0, 0.07, 0.21, 0.40]);
        let first = segment(&path, 10.0).unwrap();
        let second = segment(&first.polyline, 10.0).unwrap();

        let first_kms: Vec<f64> = first.checkpoints.iter().map(|c| c.km).collect();
        let second_kms: Vec<f64> = second.checkpoints.iter().map(|c| c.km).collect();
        assert_eq!(first_kms, second_kms);

        for (a, b) in first.checkpoints.iter().zip(&second.checkpoints) {
            assert!((a.position.lat - b.position.lat).abs() < 1e-6);
            assert!((a.position.lon - b.position.lon).abs() < 1e-6);
        }
    }

    #[test]
    fn test_haversine_same_point() {
        let point = coord(45.0, 5.0);
        assert_eq!(haversine_km(point, point), 0.0);
    }

    #[test]
    fn test_haversine_symmetry() {
        let a = coord(45.0, 5.0);
        let b = coord(46.0, 6.0);
        assert_eq!(haversine_km(a, b), haversine_km(b, a));
    }

    #[test]
    fn test_haversine_known_distance() {
        // Paris to London, ~343 km.
        let paris = coord(48.8566, 2.3522);
        let london = coord(51.5074, -0.1278);
        let dist = haversine_km(paris, london);
        assert!((dist - 343.0).abs() < 5.0);
    }

    #[test]
    fn test_path_length_degenerate() {
        assert_eq!(path_length_km(&[]), 0.0);
        assert_eq!(path_length_km(&[coord(45.0, 5.0)]), 0.0);
    }

    // Property-based tests using proptest
    mod proptests {
        use super::*;
        use proptest::prelude::*;

        // A ~50 km square; keeps generated paths at a realistic route scale.
        fn valid_coord() -> impl Strategy<Value = Coordinate> {
            (44.0..=44.5, 4.0..=4.5).prop_map(|(lat, lon)| Coordinate { lat, lon })
        }

        proptest! {
            #[test]
            fn prop_checkpoint_kilometres_are_interval_multiples(
                coords in prop::collection::vec(valid_coord(), 2..12),
                interval in 0.5f64..50.0
            ) {
                let result = segment(&coords, interval).unwrap();
                for (n, mark) in result.checkpoints.iter().enumerate() {
                    let expected = (n as f64 + 1.0) * interval;
                    // 1-decimal rounding at emission allows up to 0.05 km.
                    prop_assert!((mark.km - expected).abs() < 0.051);
                }
            }

            #[test]
            fn prop_checkpoint_kilometres_strictly_increase(
                coords in prop::collection::vec(valid_coord(), 2..12),
                interval in 0.5f64..50.0
            ) {
                let result = segment(&coords, interval).unwrap();
                for pair in result.checkpoints.windows(2) {
                    prop_assert!(pair[1].km > pair[0].km);
                }
            }

            #[test]
            fn prop_checkpoints_stay_within_path_length(
                coords in prop::collection::vec(valid_coord(), 2..12),
                interval in 0.5f64..50.0
            ) {
                let result = segment(&coords, interval).unwrap();
                let total = path_length_km(&result.polyline);
                if let Some(last) = result.checkpoints.last() {
                    prop_assert!(last.km <= total + 0.051);
                }
            }

            #[test]
            fn prop_extension_preserves_endpoints_and_grows(
                coords in prop::collection::vec(valid_coord(), 2..12),
                interval in 0.5f64..50.0
            ) {
                let result = segment(&coords, interval).unwrap();
                prop_assert_eq!(result.polyline.first(), coords.first());
                prop_assert_eq!(result.polyline.last(), coords.last());
                prop_assert!(result.polyline.len() >= coords.len());
            }

            #[test]
            fn prop_every_checkpoint_is_a_vertex(
                coords in prop::collection::vec(valid_coord(), 2..12),
                interval in 0.5f64..50.0
            ) {
                let result = segment(&coords, interval).unwrap();
                for mark in &result.checkpoints {
                    prop_assert!(result.polyline.contains(&mark.position));
                }
            }

            #[test]
            fn prop_duplicate_points_never_break_segmentation(
                coords in prop::collection::vec(valid_coord(), 2..8),
                interval in 0.5f64..50.0
            ) {
                // Double every vertex: zero-length segments everywhere.
                let mut doubled = Vec::with_capacity(coords.len() * 2);
                for c in &coords {
                    doubled.push(*c);
                    doubled.push(*c);
                }
                let plain = segment(&coords, interval).unwrap();
                let with_dups = segment(&doubled, interval).unwrap();

                let plain_kms: Vec<f64> = plain.checkpoints.iter().map(|c| c.km).collect();
                let dup_kms: Vec<f64> = with_dups.checkpoints.iter().map(|c| c.km).collect();
                prop_assert_eq!(plain_kms, dup_kms);
            }
        }
    }
}
