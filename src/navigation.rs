use std::collections::HashMap;
use std::fmt::Display;
use std::io;
use std::path::Path;

use bevy_derive::{Deref, DerefMut};
use bevy_reflect::Reflect;
use geo::Point;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::position::{CoordinateError, RawPosition};
use crate::read_to_string;
use crate::restriction::{RestrictionError, Restrictions};
use crate::DegMinSecExt as _;

/// Read-only store of fixes and procedures that legs resolve against.
pub trait NavigationLibrary {
    fn find_fix_by_name(&self, name: &str) -> Option<&Fix>;
    fn find_procedure_by_name(&self, name: &str) -> Option<&Procedure>;
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Fix {
    pub designator: String,
    pub coordinate: Point,
}

impl Display for Fix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {}",
            self.designator,
            self.coordinate.deg_min_sec_fmt()
        )
    }
}

/// A fix as published within a procedure, together with the restrictions the
/// procedure attaches to it.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ProcedureFix {
    pub fix: Fix,
    pub restrictions: Restrictions,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Reflect, Serialize)]
pub enum ProcedureKind {
    Sid,
    Star,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Reflect, Serialize)]
pub enum TransitionSide {
    Entry,
    Exit,
}

impl Display for TransitionSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            TransitionSide::Entry => "entry",
            TransitionSide::Exit => "exit",
        })
    }
}

/// Transition key (fix designator or runway) -> ordered waypoints
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deref, DerefMut)]
pub struct Transitions(pub HashMap<String, Vec<ProcedureFix>>);

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Procedure {
    pub name: String,
    pub description: Option<String>,
    pub kind: ProcedureKind,
    pub airport: Option<String>,
    pub body: Vec<ProcedureFix>,
    pub entries: Transitions,
    pub exits: Transitions,
}

impl Procedure {
    /// SIDs start at a runway and STARs end at one.
    pub fn runway_keyed(&self, side: TransitionSide) -> bool {
        matches!(
            (self.kind, side),
            (ProcedureKind::Sid, TransitionSide::Entry) | (ProcedureKind::Star, TransitionSide::Exit)
        )
    }

    pub fn transitions(&self, side: TransitionSide) -> &Transitions {
        match side {
            TransitionSide::Entry => &self.entries,
            TransitionSide::Exit => &self.exits,
        }
    }

    pub fn entry_transition(&self, key: &str) -> Option<&[ProcedureFix]> {
        self.entries.get(key).map(Vec::as_slice)
    }

    pub fn exit_transition(&self, key: &str) -> Option<&[ProcedureFix]> {
        self.exits.get(key).map(Vec::as_slice)
    }

    /// The body fix a procedure without transitions on `side` starts or ends at.
    pub fn boundary_fix(&self, side: TransitionSide) -> Option<&ProcedureFix> {
        match side {
            TransitionSide::Entry => self.body.first(),
            TransitionSide::Exit => self.body.last(),
        }
    }
}

#[derive(Error, Debug)]
pub enum NavigationDataError {
    #[error("failed to read navigation data: {0}")]
    FileRead(#[from] io::Error),
    #[error("failed to deserialize navigation data: {0}")]
    Deserialize(#[from] serde_json::Error),
    #[error("fix {designator}: {source}")]
    Coordinate {
        designator: String,
        source: CoordinateError,
    },
    #[error("{procedure} {designator}: {source}")]
    Restriction {
        procedure: String,
        designator: String,
        source: RestrictionError,
    },
}

pub type NavigationDataResult = Result<NavigationData, NavigationDataError>;

#[derive(Deserialize)]
#[serde(untagged)]
enum RawWaypoint {
    Name(String),
    Restricted(String, String),
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawProcedure {
    name: Option<String>,
    #[serde(default)]
    rwy: HashMap<String, Vec<RawWaypoint>>,
    #[serde(default)]
    body: Vec<RawWaypoint>,
    #[serde(default)]
    entry_points: HashMap<String, Vec<RawWaypoint>>,
    #[serde(default)]
    exit_points: HashMap<String, Vec<RawWaypoint>>,
}

#[derive(Deserialize)]
struct RawAirport {
    icao: String,
    #[serde(default)]
    fixes: HashMap<String, RawPosition>,
    #[serde(default)]
    sids: HashMap<String, RawProcedure>,
    #[serde(default)]
    stars: HashMap<String, RawProcedure>,
}

/// In-memory navigation library for one airport.
#[derive(Clone, Debug, Default, Serialize)]
pub struct NavigationData {
    pub icao: String,
    pub fixes: HashMap<String, Fix>,
    pub procedures: HashMap<String, Procedure>,
}

impl NavigationLibrary for NavigationData {
    fn find_fix_by_name(&self, name: &str) -> Option<&Fix> {
        self.fixes.get(name)
    }

    fn find_procedure_by_name(&self, name: &str) -> Option<&Procedure> {
        self.procedures.get(name)
    }
}

impl NavigationData {
    pub fn parse(content: &[u8]) -> NavigationDataResult {
        let unparsed_file = read_to_string(content)?;
        let raw: RawAirport = serde_json::from_str(&unparsed_file)?;

        let fixes = raw
            .fixes
            .into_iter()
            .map(|(designator, position)| {
                position
                    .to_point()
                    .map(|coordinate| {
                        (
                            designator.clone(),
                            Fix {
                                designator: designator.clone(),
                                coordinate,
                            },
                        )
                    })
                    .map_err(|source| NavigationDataError::Coordinate { designator, source })
            })
            .collect::<Result<HashMap<_, _>, _>>()?;

        let mut data = NavigationData {
            icao: raw.icao,
            fixes,
            procedures: HashMap::new(),
        };

        let raw_procedures = raw
            .sids
            .into_iter()
            .map(|(name, sid)| (ProcedureKind::Sid, name, sid))
            .chain(
                raw.stars
                    .into_iter()
                    .map(|(name, star)| (ProcedureKind::Star, name, star)),
            );
        for (kind, name, raw_procedure) in raw_procedures {
            let procedure = data.convert_procedure(kind, name, raw_procedure)?;
            if let Some(overwritten) = data.procedures.insert(procedure.name.clone(), procedure) {
                warn!("{}: duplicate procedure {}", data.icao, overwritten.name);
            }
        }

        debug!(
            "{}: loaded {} fixes and {} procedures",
            data.icao,
            data.fixes.len(),
            data.procedures.len()
        );

        Ok(data)
    }

    pub fn from_path(path: impl AsRef<Path>) -> NavigationDataResult {
        Self::parse(&fs_err::read(path.as_ref())?)
    }

    fn convert_procedure(
        &self,
        kind: ProcedureKind,
        name: String,
        raw: RawProcedure,
    ) -> Result<Procedure, NavigationDataError> {
        let (entries, exits, unused) = match kind {
            ProcedureKind::Sid => (raw.rwy, raw.exit_points, raw.entry_points),
            ProcedureKind::Star => (raw.entry_points, raw.rwy, raw.exit_points),
        };
        if !unused.is_empty() {
            warn!("{} {name}: ignoring transitions not applicable to a {kind:?}", self.icao);
        }

        let convert_transitions = |transitions: HashMap<String, Vec<RawWaypoint>>| {
            transitions
                .into_iter()
                .map(|(key, waypoints)| {
                    self.convert_waypoints(&name, &key, waypoints)
                        .map(|waypoints| (key, waypoints))
                })
                .collect::<Result<HashMap<_, _>, _>>()
                .map(Transitions)
        };

        Ok(Procedure {
            body: self.convert_waypoints(&name, "body", raw.body)?,
            entries: convert_transitions(entries)?,
            exits: convert_transitions(exits)?,
            description: raw.name,
            kind,
            airport: Some(self.icao.clone()),
            name,
        })
    }

    fn convert_waypoints(
        &self,
        procedure: &str,
        transition: &str,
        waypoints: Vec<RawWaypoint>,
    ) -> Result<Vec<ProcedureFix>, NavigationDataError> {
        waypoints
            .into_iter()
            .filter_map(|raw| {
                let (designator, restrictions) = match raw {
                    RawWaypoint::Name(designator) => (designator, None),
                    RawWaypoint::Restricted(designator, restrictions) => {
                        (designator, Some(restrictions))
                    }
                };
                let (designator, fly_over) = match designator.strip_prefix('^') {
                    Some(stripped) => (stripped.to_string(), true),
                    None => (designator, false),
                };

                let Some(fix) = self.find_fix_by_name(&designator) else {
                    warn!(
                        "{} {procedure} {transition}: waypoint {designator} not found",
                        self.icao
                    );
                    return None;
                };

                let restrictions = restrictions
                    .map_or(Ok(Restrictions::default()), |restrictions| {
                        Restrictions::parse(&restrictions)
                    })
                    .map(|restrictions| restrictions.with_fly_over(fly_over))
                    .map_err(|source| NavigationDataError::Restriction {
                        procedure: procedure.to_string(),
                        designator: designator.clone(),
                        source,
                    });

                Some(restrictions.map(|restrictions| ProcedureFix {
                    fix: fix.clone(),
                    restrictions,
                }))
            })
            .collect()
    }
}
