use std::{env::args, io};

use fms_legs::{LegModel, NavigationData, Waypoint as _};
use geo::LineString;
use geojson::{Feature, Geometry, JsonObject, Value};

fn main() {
    tracing_subscriber::fmt().with_writer(io::stderr).init();
    let mut args = args().skip(1);
    let path = args.next().expect("missing argument: path to airport .json");
    let route = args.next().expect("missing argument: route segment");
    let runway = args.next().expect("missing argument: runway");

    let data = NavigationData::from_path(path).expect("unsuccessful parse");
    let leg = LegModel::new(&route, &runway, &data).expect("unresolvable leg");

    let line: LineString = leg
        .waypoint_collection()
        .iter()
        .map(|wpt| wpt.position())
        .collect();
    let mut properties = JsonObject::new();
    properties.insert("route".to_string(), route.clone().into());
    properties.insert("runway".to_string(), runway.clone().into());
    properties.insert("waypoints".to_string(), leg.to_string().into());
    let feature = Feature {
        geometry: Some(Geometry::new(Value::from(&line))),
        properties: Some(properties),
        ..Default::default()
    };

    println!("{}", serde_json::to_string(&feature).unwrap());
}
