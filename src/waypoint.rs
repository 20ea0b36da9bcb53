use std::fmt::Display;

use bevy_reflect::Reflect;
use geo::Point;
use serde::Serialize;

use crate::navigation::{Fix, ProcedureFix, TransitionSide};
use crate::restriction::Restrictions;
use crate::DegMinSecExt as _;

/// Anything an aircraft can be guided to.
pub trait Waypoint {
    fn name(&self) -> &str;
    fn position(&self) -> Point;
    fn restrictions(&self) -> &Restrictions;

    /// Merge equality: only the fix matters, not what is attached to it.
    fn same_fix(&self, other: &dyn Waypoint) -> bool {
        self.name() == other.name()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct WaypointModel {
    name: String,
    position: Point,
    restrictions: Restrictions,
}

impl WaypointModel {
    pub fn new(name: impl Into<String>, position: Point, restrictions: Restrictions) -> Self {
        Self {
            name: name.into(),
            position,
            restrictions,
        }
    }

    pub fn from_fix(fix: &Fix) -> Self {
        Self::new(fix.designator.clone(), fix.coordinate, Restrictions::default())
    }
}

impl Waypoint for WaypointModel {
    fn name(&self) -> &str {
        &self.name
    }

    fn position(&self) -> Point {
        self.position
    }

    fn restrictions(&self) -> &Restrictions {
        &self.restrictions
    }
}

impl Display for WaypointModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.name, self.position.deg_min_sec_fmt())?;
        if !self.restrictions.is_empty() {
            write!(f, " {}", self.restrictions)?;
        }
        Ok(())
    }
}

/// Which part of a procedure a waypoint was taken from.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Reflect, Serialize)]
pub enum TransitionRef {
    Entry(String),
    Body,
    Exit(String),
}

impl TransitionRef {
    pub fn new(side: TransitionSide, key: &str) -> Self {
        match side {
            TransitionSide::Entry => Self::Entry(key.to_string()),
            TransitionSide::Exit => Self::Exit(key.to_string()),
        }
    }
}

impl Display for TransitionRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransitionRef::Entry(key) => write!(f, "entry transition {key}"),
            TransitionRef::Body => f.write_str("body"),
            TransitionRef::Exit(key) => write!(f, "exit transition {key}"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ProcedureWaypointModel {
    waypoint: WaypointModel,
    procedure: String,
    transition: TransitionRef,
}

impl ProcedureWaypointModel {
    pub fn new(procedure: &str, transition: TransitionRef, definition: &ProcedureFix) -> Self {
        Self {
            waypoint: WaypointModel::new(
                definition.fix.designator.clone(),
                definition.fix.coordinate,
                definition.restrictions.clone(),
            ),
            procedure: procedure.to_string(),
            transition,
        }
    }

    pub fn procedure(&self) -> &str {
        &self.procedure
    }

    pub fn transition(&self) -> &TransitionRef {
        &self.transition
    }
}

impl Waypoint for ProcedureWaypointModel {
    fn name(&self) -> &str {
        self.waypoint.name()
    }

    fn position(&self) -> Point {
        self.waypoint.position()
    }

    fn restrictions(&self) -> &Restrictions {
        self.waypoint.restrictions()
    }
}

impl Display for ProcedureWaypointModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({} {})", self.waypoint, self.procedure, self.transition)
    }
}

/// A waypoint as held by a leg.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum LegWaypoint {
    Direct(WaypointModel),
    Procedure(ProcedureWaypointModel),
}

impl LegWaypoint {
    pub fn as_procedure(&self) -> Option<&ProcedureWaypointModel> {
        match self {
            LegWaypoint::Direct(_) => None,
            LegWaypoint::Procedure(waypoint) => Some(waypoint),
        }
    }
}

impl Waypoint for LegWaypoint {
    fn name(&self) -> &str {
        match self {
            LegWaypoint::Direct(waypoint) => waypoint.name(),
            LegWaypoint::Procedure(waypoint) => waypoint.name(),
        }
    }

    fn position(&self) -> Point {
        match self {
            LegWaypoint::Direct(waypoint) => waypoint.position(),
            LegWaypoint::Procedure(waypoint) => waypoint.position(),
        }
    }

    fn restrictions(&self) -> &Restrictions {
        match self {
            LegWaypoint::Direct(waypoint) => waypoint.restrictions(),
            LegWaypoint::Procedure(waypoint) => waypoint.restrictions(),
        }
    }
}

impl From<WaypointModel> for LegWaypoint {
    fn from(waypoint: WaypointModel) -> Self {
        LegWaypoint::Direct(waypoint)
    }
}

impl From<ProcedureWaypointModel> for LegWaypoint {
    fn from(waypoint: ProcedureWaypointModel) -> Self {
        LegWaypoint::Procedure(waypoint)
    }
}

impl Display for LegWaypoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LegWaypoint::Direct(waypoint) => Display::fmt(waypoint, f),
            LegWaypoint::Procedure(waypoint) => Display::fmt(waypoint, f),
        }
    }
}
