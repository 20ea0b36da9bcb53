use std::{env::args, io};

use fms_legs::{LegModel, NavigationData};

fn main() {
    tracing_subscriber::fmt().with_writer(io::stderr).init();
    let mut args = args().skip(1);
    let path = args.next().expect("missing argument: path to airport .json");
    let route = args.next().expect("missing argument: route segment");
    let runway = args.next().expect("missing argument: runway");

    let data = NavigationData::from_path(path).expect("unsuccessful parse");
    let mut leg = match LegModel::new(&route, &runway, &data) {
        Ok(leg) => leg,
        Err(e) => {
            eprintln!("{e}");
            return;
        }
    };

    println!("{}", serde_json::to_string(leg.all_waypoints()).unwrap());
    while let Some(waypoint) = leg.consume_waypoint() {
        println!("{waypoint}");
    }
}
