use std::{env::args_os, io};

use fms_legs::NavigationData;

fn main() {
    tracing_subscriber::fmt().with_writer(io::stderr).init();
    let path = args_os()
        .nth(1)
        .expect("missing argument: path to airport .json");
    let data = NavigationData::from_path(path).expect("unsuccessful parse");

    println!("{}", serde_json::to_string(&data).unwrap());
}
