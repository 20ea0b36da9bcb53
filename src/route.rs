use std::fmt::Display;
use std::str::FromStr;

use bevy_reflect::Reflect;
use pest::Parser;
use pest_derive::Parser;
use serde::Serialize;
use thiserror::Error;

#[derive(Parser)]
#[grammar = "pest/route.pest"]
pub struct RouteParser;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RouteSegmentError {
    #[error("malformed route segment {segment:?}: {reason}")]
    Malformed { segment: String, reason: String },
}

/// One leg of a flight plan route, either `FIX` or `ENTRY.PROCEDURE.EXIT`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Reflect, Serialize)]
pub enum RouteSegment {
    Direct {
        fix_name: String,
    },
    Procedure {
        entry: String,
        procedure: String,
        exit: String,
    },
}

pub fn classify(segment: &str) -> Result<RouteSegment, RouteSegmentError> {
    let malformed = |reason: String| RouteSegmentError::Malformed {
        segment: segment.to_string(),
        reason,
    };

    let tokens = RouteParser::parse(Rule::route, segment)
        .map_err(|e| malformed(e.variant.message().into_owned()))?
        .next()
        .unwrap()
        .into_inner()
        .filter(|pair| pair.as_rule() == Rule::token)
        .map(|pair| pair.as_str().to_string())
        .collect::<Vec<_>>();

    match <[String; 3]>::try_from(tokens) {
        Ok([entry, procedure, exit]) => Ok(RouteSegment::Procedure {
            entry,
            procedure,
            exit,
        }),
        Err(tokens) => match <[String; 1]>::try_from(tokens) {
            Ok([fix_name]) => Ok(RouteSegment::Direct { fix_name }),
            Err(tokens) => Err(malformed(format!(
                "expected 1 or 3 tokens, found {}",
                tokens.len()
            ))),
        },
    }
}

impl FromStr for RouteSegment {
    type Err = RouteSegmentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        classify(s)
    }
}

impl Display for RouteSegment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RouteSegment::Direct { fix_name } => f.write_str(fix_name),
            RouteSegment::Procedure {
                entry,
                procedure,
                exit,
            } => write!(f, "{entry}.{procedure}.{exit}"),
        }
    }
}
