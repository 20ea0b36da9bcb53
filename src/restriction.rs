use std::fmt::Display;

use itertools::Itertools;
use pest::{iterators::Pair, Parser};
use pest_derive::Parser;
use serde::Serialize;
use thiserror::Error;
use uom::si::f64::{Length, Velocity};
use uom::si::length::foot;
use uom::si::velocity::knot;

#[derive(Parser)]
#[grammar = "pest/restriction.pest"]
pub struct RestrictionParser;

#[derive(Error, Debug)]
pub enum RestrictionError {
    #[error("failed to parse restriction: {0}")]
    Parse(#[from] pest::error::Error<Rule>),
    #[error("conflicting restrictions: {0}")]
    Conflicting(String),
}

/// An inclusive window a value has to stay within. `min == max` is an "at"
/// restriction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct Window<Q> {
    pub min: Option<Q>,
    pub max: Option<Q>,
}

pub type AltitudeRestriction = Window<Length>;
pub type SpeedRestriction = Window<Velocity>;

impl<Q: PartialOrd + Copy> Window<Q> {
    pub fn at(value: Q) -> Self {
        Self {
            min: Some(value),
            max: Some(value),
        }
    }

    pub fn at_or_above(value: Q) -> Self {
        Self {
            min: Some(value),
            max: None,
        }
    }

    pub fn at_or_below(value: Q) -> Self {
        Self {
            min: None,
            max: Some(value),
        }
    }

    pub fn permits(&self, value: Q) -> bool {
        self.min.is_none_or(|min| value >= min) && self.max.is_none_or(|max| value <= max)
    }

    fn combine(self, other: Self) -> Option<Self> {
        let min = match (self.min, other.min) {
            (Some(_), Some(_)) => return None,
            (min, other_min) => min.or(other_min),
        };
        let max = match (self.max, other.max) {
            (Some(_), Some(_)) => return None,
            (max, other_max) => max.or(other_max),
        };
        match (min, max) {
            (Some(min), Some(max)) if min > max => None,
            _ => Some(Self { min, max }),
        }
    }
}

/// Constraints a procedure publishes for one of its waypoints.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Restrictions {
    pub altitude: Option<AltitudeRestriction>,
    pub speed: Option<SpeedRestriction>,
    pub fly_over: bool,
}

enum Bound {
    At,
    AtOrAbove,
    AtOrBelow,
}

fn parse_term<Q: PartialOrd + Copy>(pair: Pair<Rule>, unit: impl Fn(f64) -> Q) -> Window<Q> {
    let mut term = pair.into_inner();
    let value = unit(term.next().unwrap().as_str().parse().unwrap());
    let bound = term.next().map_or(Bound::At, |bound| match bound.as_str() {
        "+" => Bound::AtOrAbove,
        _ => Bound::AtOrBelow,
    });
    match bound {
        Bound::At => Window::at(value),
        Bound::AtOrAbove => Window::at_or_above(value),
        Bound::AtOrBelow => Window::at_or_below(value),
    }
}

fn merge_term<Q: PartialOrd + Copy>(
    existing: Option<Window<Q>>,
    term: Window<Q>,
    input: &str,
) -> Result<Option<Window<Q>>, RestrictionError> {
    match existing {
        None => Ok(Some(term)),
        Some(existing) => existing
            .combine(term)
            .map(Some)
            .ok_or_else(|| RestrictionError::Conflicting(input.to_string())),
    }
}

impl Restrictions {
    /// Parses the `A80+|S250` notation: altitudes in hundreds of feet, speeds
    /// in knots, `+` for at or above and `-` for at or below.
    pub fn parse(input: &str) -> Result<Self, RestrictionError> {
        let pairs = RestrictionParser::parse(Rule::restrictions, input)?
            .next()
            .unwrap()
            .into_inner();

        pairs.fold(Ok(Self::default()), |acc, pair| {
            let mut restrictions = acc?;
            match pair.as_rule() {
                Rule::altitude => {
                    let term = parse_term(pair, |hundreds| Length::new::<foot>(hundreds * 100.0));
                    restrictions.altitude = merge_term(restrictions.altitude, term, input)?;
                }
                Rule::speed => {
                    let term = parse_term(pair, Velocity::new::<knot>);
                    restrictions.speed = merge_term(restrictions.speed, term, input)?;
                }
                Rule::EOI => (),
                rule => unreachable!("{rule:?}"),
            }
            Ok(restrictions)
        })
    }

    #[must_use]
    pub fn with_fly_over(mut self, fly_over: bool) -> Self {
        self.fly_over = fly_over;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.altitude.is_none() && self.speed.is_none() && !self.fly_over
    }
}

fn window_terms<Q: Copy + PartialEq>(
    prefix: char,
    window: &Window<Q>,
    value: impl Fn(Q) -> u32,
) -> Vec<String> {
    match (window.min, window.max) {
        (Some(min), Some(max)) if min == max => vec![format!("{prefix}{}", value(min))],
        (min, max) => min
            .map(|min| format!("{prefix}{}+", value(min)))
            .into_iter()
            .chain(max.map(|max| format!("{prefix}{}-", value(max))))
            .collect(),
    }
}

impl Display for Restrictions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let altitude = self.altitude.iter().flat_map(|altitude| {
            window_terms('A', altitude, |length| (length.get::<foot>() / 100.0).round() as u32)
        });
        let speed = self.speed.iter().flat_map(|speed| {
            window_terms('S', speed, |velocity| velocity.get::<knot>().round() as u32)
        });
        write!(
            f,
            "{}{}",
            if self.fly_over { "^" } else { "" },
            altitude.chain(speed).join("|")
        )
    }
}
