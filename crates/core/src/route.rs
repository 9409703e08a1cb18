//! Greedy nearest-neighbor route building
//!
//! Produces a circular visiting order: start, every candidate once, start again.
//! This is a heuristic, not an optimal tour. Each step scans every remaining
//! candidate, so the cost is O(n²); fine for the tens of stops a day holds,
//! not for large point sets.

use serde::{Deserialize, Serialize};

use crate::errors::CoreError;
use crate::geo::GeoPoint;

/// An ordered, closed route that starts and ends at the same point
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RoutePoints")]
pub struct Route {
    points: Vec<GeoPoint>,
}

#[derive(Deserialize)]
struct RoutePoints {
    points: Vec<GeoPoint>,
}

impl TryFrom<RoutePoints> for Route {
    type Error = CoreError;

    fn try_from(raw: RoutePoints) -> Result<Self, Self::Error> {
        match (raw.points.first(), raw.points.last()) {
            (Some(first), Some(last)) if raw.points.len() >= 2 && first == last => {
                Ok(Route { points: raw.points })
            }
            _ => Err(CoreError::OpenRoute {
                len: raw.points.len(),
            }),
        }
    }
}

impl Route {
    /// All points in visiting order, including the start at both ends
    pub fn points(&self) -> &[GeoPoint] {
        &self.points
    }

    /// The start/end point
    pub fn start(&self) -> &GeoPoint {
        &self.points[0]
    }

    /// Visited candidates in order, without the start at either end
    pub fn stops(&self) -> &[GeoPoint] {
        &self.points[1..self.points.len() - 1]
    }

    /// Number of points including both copies of the start
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// A route always holds at least the start twice, so this is `false`
    /// for every route that can be built
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Consecutive point pairs with their distance in kilometres
    pub fn legs(&self) -> impl Iterator<Item = (&GeoPoint, &GeoPoint, f64)> {
        self.points
            .windows(2)
            .map(|pair| (&pair[0], &pair[1], pair[0].distance_km(&pair[1])))
    }

    /// Total length of the closed tour in kilometres
    pub fn total_distance_km(&self) -> f64 {
        self.legs().map(|(_, _, d)| d).sum()
    }

    /// Consume the route, returning its points
    pub fn into_points(self) -> Vec<GeoPoint> {
        self.points
    }
}

/// Build a closed route visiting every candidate once, nearest first.
///
/// Ties are broken in favour of the candidate that appears first in
/// `candidates`. The start may or may not also appear in `candidates`;
/// it is treated like any other candidate if it does.
pub fn nearest_neighbor_route(start: &GeoPoint, candidates: &[GeoPoint]) -> Route {
    let mut points = Vec::with_capacity(candidates.len() + 2);
    points.push(start.clone());

    // Indices into `candidates`, kept in input order so ties resolve stably
    let mut remaining: Vec<usize> = (0..candidates.len()).collect();
    let mut current = start;

    while !remaining.is_empty() {
        let mut best_pos = 0;
        let mut best_dist = f64::INFINITY;

        for (pos, &idx) in remaining.iter().enumerate() {
            let d = current.distance_km(&candidates[idx]);
            if d < best_dist {
                best_dist = d;
                best_pos = pos;
            }
        }

        let idx = remaining.remove(best_pos);
        current = &candidates[idx];
        points.push(current.clone());
    }

    points.push(start.clone());
    Route { points }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(name: &str, lng: f64) -> GeoPoint {
        GeoPoint::new(name, 0.0, lng)
    }

    #[test]
    fn test_nearest_candidate_visited_first() {
        let s = point("S", 0.0);
        let a = point("A", 1.0);
        let b = point("B", 2.0);
        let c = point("C", 3.0);

        let route = nearest_neighbor_route(&s, &[b.clone(), c.clone(), a.clone()]);

        assert_eq!(route.len(), 5);
        assert_eq!(route.points()[1], a);
        assert_eq!(route.start(), &s);
        assert_eq!(route.points().last(), Some(&s));

        let names: Vec<&str> = route.stops().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["A", "B", "C"]);
    }

    #[test]
    fn test_every_candidate_appears_once() {
        let s = GeoPoint::new("Hotel", 48.8566, 2.3522);
        let candidates = vec![
            GeoPoint::new("Louvre", 48.8606, 2.3376),
            GeoPoint::new("Eiffel Tower", 48.8584, 2.2945),
            GeoPoint::new("Notre-Dame", 48.8530, 2.3499),
            GeoPoint::new("Sacre-Coeur", 48.8867, 2.3431),
            GeoPoint::new("Pantheon", 48.8462, 2.3464),
        ];

        let route = nearest_neighbor_route(&s, &candidates);
        assert_eq!(route.len(), candidates.len() + 2);

        for c in &candidates {
            let count = route.stops().iter().filter(|p| p.name == c.name).count();
            assert_eq!(count, 1, "{} visited {} times", c.name, count);
        }
    }

    #[test]
    fn test_ties_resolve_to_earlier_candidate() {
        let s = point("S", 0.0);
        let east = point("East", 1.0);
        let west = point("West", -1.0);

        let route = nearest_neighbor_route(&s, &[east.clone(), west.clone()]);
        assert_eq!(route.points()[1], east);

        let route = nearest_neighbor_route(&s, &[west.clone(), east.clone()]);
        assert_eq!(route.points()[1], west);
    }

    #[test]
    fn test_empty_candidates() {
        let s = point("S", 0.0);
        let route = nearest_neighbor_route(&s, &[]);

        assert_eq!(route.len(), 2);
        assert!(route.stops().is_empty());
        assert_eq!(route.total_distance_km(), 0.0);
    }

    #[test]
    fn test_start_in_candidates_is_visited_at_zero_distance() {
        let s = point("S", 0.0);
        let a = point("A", 1.0);

        let route = nearest_neighbor_route(&s, &[a.clone(), s.clone()]);
        assert_eq!(route.len(), 4);
        assert_eq!(route.points()[1], s);
        assert_eq!(route.points()[2], a);
    }

    #[test]
    fn test_total_distance_is_sum_of_legs() {
        let s = point("S", 0.0);
        let route = nearest_neighbor_route(&s, &[point("A", 1.0), point("B", 2.0)]);

        // Out to B and back again
        let expected = 2.0 * s.distance_km(&point("B", 2.0));
        assert!((route.total_distance_km() - expected).abs() < 1e-6);
        assert_eq!(route.legs().count(), 3);
    }

    #[test]
    fn test_deserialize_round_trip() {
        let route = nearest_neighbor_route(&point("S", 0.0), &[point("A", 1.0)]);
        let json = serde_json::to_string(&route).unwrap();
        assert_eq!(serde_json::from_str::<Route>(&json).unwrap(), route);
    }

    #[test]
    fn test_deserialize_rejects_open_routes() {
        assert!(serde_json::from_str::<Route>(r#"{"points":[]}"#).is_err());

        let single = serde_json::json!({"points": [point("S", 0.0)]});
        assert!(serde_json::from_value::<Route>(single).is_err());

        let open = serde_json::json!({"points": [point("S", 0.0), point("A", 1.0)]});
        assert!(serde_json::from_value::<Route>(open).is_err());
    }
}
