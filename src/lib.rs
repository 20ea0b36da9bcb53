use std::io;

use geo::{Coord, Point};
use tracing::warn;

pub mod leg;
pub mod navigation;
pub mod position;
pub mod procedure;
pub mod restriction;
pub mod route;
pub mod waypoint;

pub use leg::{LegError, LegModel};
pub use navigation::{Fix, NavigationData, NavigationLibrary, Procedure};
pub use route::RouteSegment;
pub use waypoint::{LegWaypoint, ProcedureWaypointModel, Waypoint, WaypointModel};

fn read_to_string(contents: &[u8]) -> Result<String, io::Error> {
    String::from_utf8(contents.to_vec()).or_else(|_| {
        let (string, _, errors) = encoding_rs::WINDOWS_1252.decode(contents);
        if errors {
            warn!("errors while decoding win-1252");
        }
        Ok(string.to_string())
    })
}

// deg, min, sec with the hemisphere already folded into the sign of deg
type DegMinSec = (i16, u8, f64);

fn decimal_to_dms(decimal: f64, is_latitude: bool) -> (u8, u8, f64, char) {
    let degrees = decimal as i16;
    let minutes = (decimal.abs().fract() * 60.0) as u8;
    let seconds = (decimal.abs() - decimal.abs().floor() - f64::from(minutes) / 60.) * 3600.0;

    let direction = match (is_latitude, decimal.is_sign_negative()) {
        (true, false) => 'N',
        (true, true) => 'S',
        (false, false) => 'E',
        (false, true) => 'W',
    };

    (degrees.unsigned_abs() as u8, minutes, seconds, direction)
}

pub trait DegMinSecExt {
    fn from_deg_min_sec(lat: DegMinSec, lng: DegMinSec) -> Self;
    fn lat_deg_min_sec_fmt(&self) -> String;
    fn lng_deg_min_sec_fmt(&self) -> String;
    fn deg_min_sec_fmt(&self) -> String {
        format!(
            "{} {}",
            self.lat_deg_min_sec_fmt(),
            self.lng_deg_min_sec_fmt()
        )
    }
}

fn dms_fmt((deg, min, sec, direction): (u8, u8, f64, char)) -> String {
    let carry_rounded_sec = (sec - 60.).abs() < 0.000_001;
    let min = min + u8::from(carry_rounded_sec);
    let sec = if carry_rounded_sec { 0.0 } else { sec };
    format!("{direction}{deg:03}.{min:02}.{sec:06.3}")
}

impl DegMinSecExt for Coord {
    fn from_deg_min_sec(lat: DegMinSec, lng: DegMinSec) -> Self {
        let to_decimal = |(deg, min, sec): DegMinSec| {
            let deg = f64::from(deg);
            deg + deg.signum() * (f64::from(min) / 60.0 + sec / 3600.0)
        };
        Self {
            y: to_decimal(lat),
            x: to_decimal(lng),
        }
    }

    fn lat_deg_min_sec_fmt(&self) -> String {
        dms_fmt(decimal_to_dms(self.y, true))
    }

    fn lng_deg_min_sec_fmt(&self) -> String {
        dms_fmt(decimal_to_dms(self.x, false))
    }
}
impl DegMinSecExt for Point {
    fn from_deg_min_sec(lat: DegMinSec, lng: DegMinSec) -> Self {
        Coord::from_deg_min_sec(lat, lng).into()
    }

    fn lat_deg_min_sec_fmt(&self) -> String {
        self.0.lat_deg_min_sec_fmt()
    }

    fn lng_deg_min_sec_fmt(&self) -> String {
        self.0.lng_deg_min_sec_fmt()
    }
}


#[cfg(test)]
mod test {
    use geo::Coord;

    use crate::{read_to_string, DegMinSecExt as _};

    #[test]
    fn test_dms_roundtrip() {
        let lat = (36, 8, 36.59);
        let lng = (-114, 24, 31.33);
        let coord = Coord::from_deg_min_sec(lat, lng);
        let expected = 36.143_497_222_222_22;
        assert!(
            (coord.y - expected).abs() < 1e-12,
            "left: {:?} not equal right: {:?}",
            coord.y,
            expected
        );
        let expected = -114.408_702_777_777_78;
        assert!(
            (coord.x - expected).abs() < 1e-12,
            "left: {:?} not equal right: {:?}",
            coord.x,
            expected
        );
        assert_eq!(coord.deg_min_sec_fmt(), "N036.08.36.590 W114.24.31.330");
    }

    #[test]
    fn test_read_win1252() {
        assert_eq!(read_to_string(b"K\xc4LAS").unwrap(), "KÄLAS");
        assert_eq!(read_to_string("KLAS".as_bytes()).unwrap(), "KLAS");
    }
}
