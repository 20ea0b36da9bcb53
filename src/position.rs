use geo::{point, Point};
use pest::{iterators::Pair, Parser};
use pest_derive::Parser;
use serde::Deserialize;
use thiserror::Error;

use crate::{DegMinSec, DegMinSecExt as _};

#[derive(Parser)]
#[grammar = "pest/position.pest"]
pub struct PositionParser;

#[derive(Error, Debug)]
pub enum CoordinateError {
    #[error("failed to parse coordinate: {0}")]
    Parse(#[from] pest::error::Error<Rule>),
    #[error("coordinate out of range: {0}")]
    OutOfRange(String),
}

/// A latitude/longitude pair as it appears in navigation data, either as
/// `["N36d08m36.59", "W114d24m31.33"]` or as `[36.1435, -114.4087]`.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum RawPosition {
    Decimal(f64, f64),
    DegMinSec(String, String),
}

impl RawPosition {
    pub fn to_point(&self) -> Result<Point, CoordinateError> {
        match self {
            Self::Decimal(lat, lng) => {
                check_range(*lat, 90.0, "latitude")?;
                check_range(*lng, 180.0, "longitude")?;
                Ok(point! { x: *lng, y: *lat })
            }
            Self::DegMinSec(lat, lng) => {
                let (lat_sign, lat) = parse_part(Rule::latitude, lat, 90)?;
                let (lng_sign, lng) = parse_part(Rule::longitude, lng, 180)?;
                let unsigned = Point::from_deg_min_sec(lat, lng);
                Ok(point! { x: lng_sign * unsigned.x(), y: lat_sign * unsigned.y() })
            }
        }
    }
}

fn check_range(value: f64, limit: f64, what: &str) -> Result<(), CoordinateError> {
    if value.is_finite() && value.abs() <= limit {
        Ok(())
    } else {
        Err(CoordinateError::OutOfRange(format!("{what} {value}")))
    }
}

fn hemisphere_sign(pair: &Pair<Rule>) -> f64 {
    match pair.as_str() {
        "S" | "s" | "W" | "w" => -1.0,
        _ => 1.0,
    }
}

/// Parses one half of a position, returning the hemisphere sign separately so
/// that values below one degree south or west keep their sign.
fn parse_part(
    rule: Rule,
    input: &str,
    max_degrees: i16,
) -> Result<(f64, DegMinSec), CoordinateError> {
    let mut part = PositionParser::parse(rule, input)?
        .next()
        .unwrap()
        .into_inner();
    let sign = hemisphere_sign(&part.next().unwrap());
    let degrees: i16 = part.next().unwrap().as_str().parse().unwrap();
    let minutes: u8 = part.next().unwrap().as_str().parse().unwrap();
    let seconds: f64 = part
        .find(|pair| pair.as_rule() == Rule::seconds)
        .map_or(0.0, |pair| pair.as_str().parse().unwrap());

    if minutes >= 60 || seconds >= 60.0 {
        return Err(CoordinateError::OutOfRange(input.to_string()));
    }
    if f64::from(degrees) + f64::from(minutes) / 60.0 + seconds / 3600.0 > f64::from(max_degrees) {
        return Err(CoordinateError::OutOfRange(input.to_string()));
    }

    Ok((sign, (degrees, minutes, seconds)))
}
