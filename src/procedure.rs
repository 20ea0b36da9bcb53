use thiserror::Error;
use tracing::{debug, trace};

use crate::navigation::{Procedure, TransitionSide};
use crate::waypoint::{ProcedureWaypointModel, TransitionRef, Waypoint as _};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("{procedure}: no {side} transition for {token}")]
    UnknownTransition {
        procedure: String,
        side: TransitionSide,
        token: String,
    },
    #[error("{procedure}: {side} transition {token} not available for runway {runway}")]
    RunwayMismatch {
        procedure: String,
        side: TransitionSide,
        token: String,
        runway: String,
    },
    #[error("{procedure}: {transition} has no waypoints")]
    EmptyTransition {
        procedure: String,
        transition: TransitionRef,
    },
}

/// Assembles the waypoints of a procedure for a given runway.
#[derive(Clone, Copy, Debug)]
pub struct ProcedureResolver<'a> {
    runway: &'a str,
}

impl<'a> ProcedureResolver<'a> {
    pub fn new(runway: &'a str) -> Self {
        Self { runway }
    }

    /// Entry transition, body and exit transition in flying order, with the
    /// fix at each junction merged if both sides publish it. The later
    /// sub-sequence's restrictions are kept for a merged fix.
    pub fn resolve(
        &self,
        procedure: &Procedure,
        entry: &str,
        exit: &str,
    ) -> Result<Vec<ProcedureWaypointModel>, ResolveError> {
        let entry_waypoints = self.transition(procedure, TransitionSide::Entry, entry)?;
        let exit_waypoints = self.transition(procedure, TransitionSide::Exit, exit)?;
        let body_waypoints = procedure
            .body
            .iter()
            .map(|definition| {
                ProcedureWaypointModel::new(&procedure.name, TransitionRef::Body, definition)
            })
            .collect();

        let waypoints = [entry_waypoints, body_waypoints, exit_waypoints]
            .into_iter()
            .fold(Vec::new(), append_merged);

        if waypoints.is_empty() {
            return Err(ResolveError::EmptyTransition {
                procedure: procedure.name.clone(),
                transition: TransitionRef::Body,
            });
        }

        debug!(
            "{entry}.{}.{exit} ({}): {} waypoints",
            procedure.name,
            self.runway,
            waypoints.len()
        );

        Ok(waypoints)
    }

    fn transition(
        &self,
        procedure: &Procedure,
        side: TransitionSide,
        token: &str,
    ) -> Result<Vec<ProcedureWaypointModel>, ResolveError> {
        let transitions = procedure.transitions(side);
        let unknown = || ResolveError::UnknownTransition {
            procedure: procedure.name.clone(),
            side,
            token: token.to_string(),
        };
        let mismatch = || ResolveError::RunwayMismatch {
            procedure: procedure.name.clone(),
            side,
            token: token.to_string(),
            runway: self.runway.to_string(),
        };

        // without published transitions the procedure starts or ends at its
        // boundary fix, which is then the only acceptable token
        if transitions.is_empty() {
            return match procedure.boundary_fix(side) {
                Some(boundary) if boundary.fix.designator == token => Ok(Vec::new()),
                _ => Err(unknown()),
            };
        }

        let runway_keyed = procedure.runway_keyed(side);
        let (key, definitions) = match transitions.get_key_value(token) {
            Some((key, _)) if runway_keyed && key != self.runway => return Err(mismatch()),
            Some(transition) => transition,
            None if runway_keyed => transitions.get_key_value(self.runway).ok_or_else(mismatch)?,
            None => return Err(unknown()),
        };

        if definitions.is_empty() {
            return Err(ResolveError::EmptyTransition {
                procedure: procedure.name.clone(),
                transition: TransitionRef::new(side, key),
            });
        }

        Ok(definitions
            .iter()
            .map(|definition| {
                ProcedureWaypointModel::new(
                    &procedure.name,
                    TransitionRef::new(side, key),
                    definition,
                )
            })
            .collect())
    }
}

fn append_merged(
    mut waypoints: Vec<ProcedureWaypointModel>,
    next: Vec<ProcedureWaypointModel>,
) -> Vec<ProcedureWaypointModel> {
    if let (Some(last), Some(first)) = (waypoints.last(), next.first()) {
        if last.same_fix(first) {
            trace!(
                "merging {} ({} -> {})",
                first.name(),
                last.transition(),
                first.transition()
            );
            waypoints.pop();
        }
    }
    waypoints.extend(next);
    waypoints
}
