use std::fmt::Display;

use geo::{Distance as _, Geodesic, Point};
use itertools::Itertools;
use thiserror::Error;
use tracing::{debug, trace};
use uom::si::f64::Length;
use uom::si::length::meter;

use crate::navigation::NavigationLibrary;
use crate::procedure::{ProcedureResolver, ResolveError};
use crate::route::{classify, RouteSegment, RouteSegmentError};
use crate::waypoint::{LegWaypoint, ProcedureWaypointModel, Waypoint as _, WaypointModel};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LegError {
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
    #[error(transparent)]
    MalformedRouteSegment(#[from] RouteSegmentError),
    #[error("unknown fix: {0}")]
    UnknownFix(String),
    #[error("unknown procedure: {0}")]
    UnknownProcedure(String),
    #[error(transparent)]
    Resolve(#[from] ResolveError),
}

pub type LegResult<T> = Result<T, LegError>;

/// One route segment of a flight plan, resolved into the waypoints an
/// aircraft flies through in order.
///
/// Waypoints are never removed: consuming one advances a cursor, so the
/// already flown part of the leg stays available for display.
#[derive(Clone, Debug)]
pub struct LegModel<'nav, N: NavigationLibrary + ?Sized> {
    route: String,
    runway: String,
    segment: RouteSegment,
    library: &'nav N,
    waypoints: Vec<LegWaypoint>,
    cursor: usize,
}

fn validate_route(route: &str) -> LegResult<()> {
    if route.trim().is_empty() {
        return Err(LegError::InvalidParameter(
            "route segment must not be empty".to_string(),
        ));
    }
    Ok(())
}

fn validate_runway(runway: &str) -> LegResult<()> {
    if runway.trim().is_empty() {
        return Err(LegError::InvalidParameter(
            "runway must not be empty".to_string(),
        ));
    }
    Ok(())
}

impl<'nav, N: NavigationLibrary + ?Sized> LegModel<'nav, N> {
    pub fn new(route: &str, runway: &str, library: &'nav N) -> LegResult<Self> {
        validate_route(route)?;
        validate_runway(runway)?;

        let mut leg = Self {
            route: route.to_string(),
            runway: runway.to_string(),
            segment: classify(route)?,
            library,
            waypoints: Vec::new(),
            cursor: 0,
        };
        leg.waypoints = leg.build_waypoint_collection(&leg.segment)?;
        debug!("{} ({}): {leg}", leg.route, leg.runway);

        Ok(leg)
    }

    /// Rebuilds the leg from `route`, discarding every waypoint of the
    /// previous one. On error the leg is left as it was.
    pub fn init(&mut self, route: &str) -> LegResult<()> {
        validate_route(route)?;
        let segment = classify(route)?;
        let waypoints = self.build_waypoint_collection(&segment)?;

        self.route = route.to_string();
        self.segment = segment;
        self.waypoints = waypoints;
        self.cursor = 0;
        debug!("{} ({}): rebuilt {self}", self.route, self.runway);

        Ok(())
    }

    pub fn route(&self) -> &str {
        &self.route
    }

    pub fn runway(&self) -> &str {
        &self.runway
    }

    pub fn segment(&self) -> &RouteSegment {
        &self.segment
    }

    pub fn current_waypoint(&self) -> Option<&LegWaypoint> {
        self.waypoints.get(self.cursor)
    }

    /// Waypoints not flown yet, starting with the current one.
    pub fn waypoint_collection(&self) -> &[LegWaypoint] {
        &self.waypoints[self.cursor..]
    }

    pub fn consumed_waypoints(&self) -> &[LegWaypoint] {
        &self.waypoints[..self.cursor]
    }

    pub fn all_waypoints(&self) -> &[LegWaypoint] {
        &self.waypoints
    }

    pub fn is_complete(&self) -> bool {
        self.cursor >= self.waypoints.len()
    }

    /// Called once the aircraft has passed the current waypoint; returns it.
    pub fn consume_waypoint(&mut self) -> Option<&LegWaypoint> {
        let passed = self.waypoints.get(self.cursor)?;
        self.cursor += 1;
        trace!(
            "{}: passed {}, next {}",
            self.route,
            passed.name(),
            self.waypoints
                .get(self.cursor)
                .map_or("none", |next| next.name())
        );
        Some(passed)
    }

    /// Geodesic distance from `from` through every remaining waypoint.
    pub fn remaining_distance(&self, from: Point) -> Length {
        let meters: f64 = std::iter::once(from)
            .chain(self.waypoint_collection().iter().map(|wpt| wpt.position()))
            .tuple_windows()
            .map(|(a, b)| Geodesic::distance(a, b))
            .sum();
        Length::new::<meter>(meters)
    }

    fn build_waypoint_collection(&self, segment: &RouteSegment) -> LegResult<Vec<LegWaypoint>> {
        Ok(match segment {
            RouteSegment::Direct { fix_name } => self
                .build_waypoint_for_direct_route(fix_name)?
                .into_iter()
                .map(LegWaypoint::from)
                .collect(),
            RouteSegment::Procedure {
                entry,
                procedure,
                exit,
            } => self
                .build_waypoint_collection_for_procedure_route(entry, procedure, exit)?
                .into_iter()
                .map(LegWaypoint::from)
                .collect(),
        })
    }

    fn build_waypoint_for_direct_route(&self, fix_name: &str) -> LegResult<Vec<WaypointModel>> {
        self.library
            .find_fix_by_name(fix_name)
            .map(|fix| vec![WaypointModel::from_fix(fix)])
            .ok_or_else(|| LegError::UnknownFix(fix_name.to_string()))
    }

    fn build_waypoint_collection_for_procedure_route(
        &self,
        entry: &str,
        procedure: &str,
        exit: &str,
    ) -> LegResult<Vec<ProcedureWaypointModel>> {
        let procedure = self
            .library
            .find_procedure_by_name(procedure)
            .ok_or_else(|| LegError::UnknownProcedure(procedure.to_string()))?;

        Ok(ProcedureResolver::new(&self.runway).resolve(procedure, entry, exit)?)
    }
}

impl<N: NavigationLibrary + ?Sized> Display for LegModel<'_, N> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            self.waypoint_collection()
                .iter()
                .map(|wpt| wpt.name())
                .join(" ")
        )
    }
}

#[cfg(test)]
mod test {
    use geo::point;
    use uom::si::length::nautical_mile;

    use crate::fixture::klas;
    use crate::navigation::{NavigationData, NavigationLibrary as _};
    use crate::procedure::ResolveError;
    use crate::route::{RouteSegment, RouteSegmentError};
    use crate::waypoint::{LegWaypoint, TransitionRef, Waypoint as _};

    use super::{LegError, LegModel};

    const DIRECT: &str = "COWBY";
    const PROCEDURE: &str = "DAG.KEPEC3.KLAS";
    const RUNWAY: &str = "19L";

    fn names(waypoints: &[LegWaypoint]) -> Vec<&str> {
        waypoints.iter().map(|wpt| wpt.name()).collect()
    }

    #[test]
    fn test_invalid_parameters() {
        let data = klas();

        assert!(matches!(
            LegModel::new("", RUNWAY, &data),
            Err(LegError::InvalidParameter(_))
        ));
        assert!(matches!(
            LegModel::new("   ", RUNWAY, &data),
            Err(LegError::InvalidParameter(_))
        ));
        assert!(matches!(
            LegModel::new(PROCEDURE, "", &data),
            Err(LegError::InvalidParameter(_))
        ));
        assert!(matches!(
            LegModel::new(DIRECT, " ", &data),
            Err(LegError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_valid_parameters() {
        let data = klas();

        assert!(LegModel::new(PROCEDURE, RUNWAY, &data).is_ok());
        assert!(LegModel::new(DIRECT, RUNWAY, &data).is_ok());
        assert!(LegModel::new(DIRECT, "1", &data).is_ok());
        // any non-blank runway is accepted, the procedure decides if it serves it
        assert!(LegModel::new(DIRECT, "H1", &data).is_ok());
        assert!(LegModel::new(DIRECT, "NW", &data).is_ok());
        assert!(matches!(
            LegModel::new(PROCEDURE, "H1", &data),
            Err(LegError::Resolve(ResolveError::RunwayMismatch { .. }))
        ));
    }

    #[test]
    fn test_current_waypoint_is_first() {
        let data = klas();
        let leg = LegModel::new(PROCEDURE, RUNWAY, &data).unwrap();

        assert_eq!(leg.current_waypoint(), leg.waypoint_collection().first());
        assert_eq!(leg.current_waypoint().unwrap().name(), "DAG");
        assert_eq!(
            leg.segment(),
            &RouteSegment::Procedure {
                entry: "DAG".to_string(),
                procedure: "KEPEC3".to_string(),
                exit: "KLAS".to_string(),
            }
        );
    }

    #[test]
    fn test_direct_route() {
        let data = klas();
        let leg = LegModel::new(DIRECT, RUNWAY, &data).unwrap();

        let result = leg.build_waypoint_for_direct_route(DIRECT).unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].name(), "COWBY");
        assert_eq!(
            result[0].position(),
            data.find_fix_by_name("COWBY").unwrap().coordinate
        );
        assert!(result[0].restrictions().is_empty());

        assert_eq!(leg.waypoint_collection().len(), 1);
        assert!(matches!(
            leg.current_waypoint(),
            Some(LegWaypoint::Direct(wpt)) if wpt.name() == "COWBY"
        ));
    }

    #[test]
    fn test_procedure_route() {
        let data = klas();
        let leg = LegModel::new(PROCEDURE, RUNWAY, &data).unwrap();

        let result = leg
            .build_waypoint_collection_for_procedure_route("DAG", "KEPEC3", "KLAS")
            .unwrap();
        assert_eq!(
            result.iter().map(|wpt| wpt.name()).collect::<Vec<_>>(),
            ["DAG", "MISEN", "CLARR", "SKEBR", "KEPEC", "IPUMY", "NIPZO", "SUNST"]
        );
        assert!(leg
            .waypoint_collection()
            .iter()
            .all(|wpt| matches!(wpt, LegWaypoint::Procedure(_))));
        assert!(leg
            .waypoint_collection()
            .windows(2)
            .all(|pair| !pair[0].same_fix(&pair[1])));
        assert_eq!(
            leg.waypoint_collection()
                .last()
                .and_then(LegWaypoint::as_procedure)
                .map(|wpt| wpt.transition()),
            Some(&TransitionRef::Exit("19L".to_string()))
        );
        assert_eq!(leg.to_string(), "DAG MISEN CLARR SKEBR KEPEC IPUMY NIPZO SUNST");
    }

    #[test]
    fn test_resolution_errors() {
        let data = klas();

        assert_eq!(
            LegModel::new("DAG.KEPEC3", RUNWAY, &data).unwrap_err(),
            LegError::MalformedRouteSegment(RouteSegmentError::Malformed {
                segment: "DAG.KEPEC3".to_string(),
                reason: "expected 1 or 3 tokens, found 2".to_string(),
            })
        );
        assert_eq!(
            LegModel::new("WHOAA", RUNWAY, &data).unwrap_err(),
            LegError::UnknownFix("WHOAA".to_string())
        );
        assert_eq!(
            LegModel::new("DAG.KEPEC4.KLAS", RUNWAY, &data).unwrap_err(),
            LegError::UnknownProcedure("KEPEC4".to_string())
        );
        assert!(matches!(
            LegModel::new("BLD.KEPEC3.KLAS", RUNWAY, &data),
            Err(LegError::Resolve(ResolveError::UnknownTransition { .. }))
        ));
        assert!(matches!(
            LegModel::new(PROCEDURE, "01R", &data),
            Err(LegError::Resolve(ResolveError::RunwayMismatch { .. }))
        ));
        assert!(matches!(
            LegModel::new("BADEN.KEPEC3.KLAS", RUNWAY, &data),
            Err(LegError::Resolve(ResolveError::EmptyTransition { .. }))
        ));
    }

    #[test]
    fn test_init_replaces_collection() {
        let data = klas();
        let mut leg = LegModel::new(PROCEDURE, RUNWAY, &data).unwrap();
        leg.consume_waypoint();

        leg.init("KLAS.BOACH6.HEC").unwrap();
        assert_eq!(leg.route(), "KLAS.BOACH6.HEC");
        assert_eq!(
            names(leg.waypoint_collection()),
            ["RW19L", "TRALR", "BOACH", "HEC"]
        );
        assert!(leg.consumed_waypoints().is_empty());
        assert_eq!(leg.all_waypoints().len(), 4);

        leg.init(DIRECT).unwrap();
        assert_eq!(names(leg.waypoint_collection()), ["COWBY"]);
        assert_eq!(leg.current_waypoint().unwrap().name(), "COWBY");
    }

    #[test]
    fn test_failed_init_keeps_previous() {
        let data = klas();
        let mut leg = LegModel::new(PROCEDURE, RUNWAY, &data).unwrap();
        leg.consume_waypoint();
        let before = leg.waypoint_collection().to_vec();

        assert!(matches!(
            leg.init("DAG.KEPEC3"),
            Err(LegError::MalformedRouteSegment(_))
        ));
        assert!(matches!(leg.init("WHOAA"), Err(LegError::UnknownFix(_))));
        assert!(matches!(leg.init(""), Err(LegError::InvalidParameter(_))));

        assert_eq!(leg.route(), PROCEDURE);
        assert_eq!(leg.waypoint_collection(), before.as_slice());
        assert_eq!(leg.current_waypoint().unwrap().name(), "MISEN");
    }

    #[test]
    fn test_consume_all_waypoints() {
        let data = klas();
        let mut leg = LegModel::new(PROCEDURE, RUNWAY, &data).unwrap();
        let total = leg.waypoint_collection().len();

        for consumed in 1..=total {
            assert_eq!(leg.current_waypoint(), leg.waypoint_collection().first());
            assert!(leg.consume_waypoint().is_some());
            assert_eq!(leg.consumed_waypoints().len(), consumed);
            assert_eq!(leg.is_complete(), consumed == total);
        }

        assert!(leg.current_waypoint().is_none());
        assert!(leg.waypoint_collection().is_empty());
        assert!(leg.consume_waypoint().is_none());
        assert_eq!(leg.consumed_waypoints().len(), total);
        assert_eq!(leg.to_string(), "");
    }

    #[test]
    fn test_remaining_distance() {
        let data = klas();
        let mut leg = LegModel::new("KLAS.COWBY1.COWBY", RUNWAY, &data).unwrap();
        let rw19l = data.find_fix_by_name("RW19L").unwrap().coordinate;

        let full = leg.remaining_distance(rw19l);
        leg.consume_waypoint();
        leg.consume_waypoint();
        let tralr = data.find_fix_by_name("TRALR").unwrap().coordinate;
        let last = leg.remaining_distance(tralr);

        assert!(full > last);
        // TRALR to COWBY is about 37.6nm
        assert!((last.get::<nautical_mile>() - 37.6).abs() < 0.5, "{last:?}");
        leg.consume_waypoint();
        assert_eq!(
            leg.remaining_distance(point! { x: -115.0, y: 36.0 }).get::<nautical_mile>(),
            0.0
        );
    }

    #[test]
    fn test_shared_library() {
        let data = klas();
        let library: &dyn crate::navigation::NavigationLibrary = &data;
        let arrival = LegModel::new(PROCEDURE, RUNWAY, library).unwrap();
        let departure = LegModel::new("KLAS.BOACH6.TNP", "25R", library).unwrap();

        assert_eq!(arrival.waypoint_collection().len(), 8);
        assert_eq!(departure.waypoint_collection().len(), 5);
        assert_eq!(departure.runway(), "25R");

        let resolved = std::thread::scope(|scope| {
            let data: &NavigationData = &data;
            [PROCEDURE, DIRECT, "KLAS.COWBY1.COWBY"]
                .map(|route| {
                    scope.spawn(move || LegModel::new(route, RUNWAY, data).unwrap().to_string())
                })
                .map(|handle| handle.join().unwrap())
        });
        assert_eq!(
            resolved,
            [
                "DAG MISEN CLARR SKEBR KEPEC IPUMY NIPZO SUNST",
                "COWBY",
                "RW19L TRALR COWBY",
            ]
        );
    }
}
