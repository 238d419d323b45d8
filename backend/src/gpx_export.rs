use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use geo_types::Point;
use gpx::{Gpx, GpxVersion, Track, TrackSegment, Waypoint};

use crate::error::PlanError;
use shared::{Checkpoint, Coordinate};

/// Encode a planned route as a base64 GPX 1.1 document: one track for the
/// extended polyline plus a named waypoint per checkpoint.
pub fn encode_route_as_gpx(
    path: &[Coordinate],
    checkpoints: &[Checkpoint],
) -> Result<String, PlanError> {
    let mut gpx = Gpx {
        version: GpxVersion::Gpx11,
        creator: Some("waymark".into()),
        ..Default::default()
    };
    let mut track = Track {
        name: Some("waymark route".into()),
        ..Default::default()
    };

    let mut segment = TrackSegment::new();
    for waypoint in path.iter().map(|c| to_waypoint(*c)) {
        segment.points.push(waypoint);
    }
    track.segments.push(segment);
    gpx.tracks.push(track);

    for checkpoint in checkpoints {
        let mut waypoint = to_waypoint(checkpoint.position);
        waypoint.name = Some(format!("KM {:.1}", checkpoint.km));
        waypoint.description = Some(format!("ETA {:.2} h", checkpoint.eta_hours));
        gpx.waypoints.push(waypoint);
    }

    let mut buffer = Vec::new();
    gpx::write(&gpx, &mut buffer)?;
    Ok(BASE64.encode(buffer))
}

fn to_waypoint(coord: Coordinate) -> Waypoint {
    Waypoint::new(Point::new(coord.lon, coord.lat))
}
