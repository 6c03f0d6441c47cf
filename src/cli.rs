use clap::{Arg, ArgAction, Command};

pub fn build_cli() -> Command {
    Command::new("ptzcal")
        .version("0.1.0")
        .author("PTZCal Developers")
        .about("Configuration utility for PTZ camera calibration at sports venues.")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Sets a custom settings file")
                .action(ArgAction::Set)
        )
        .arg(
            Arg::new("debug")
                .short('d')
                .long("debug")
                .help("Enable debug logging")
                .action(ArgAction::SetTrue)
        )
        .subcommand(
            Command::new("show")
                .about("Prints the current calibration document for a target")
                .arg(Arg::new("target").long("target").value_name("NAME").help("Document target: 'main' (default) or 'modified'").action(ArgAction::Set))
        )
        .subcommand(
            Command::new("import")
                .about("Imports a calibration file into both the main and modified targets")
                .arg(Arg::new("file").short('f').long("file").value_name("FILE").required(true).help("JSON calibration file to import").action(ArgAction::Set))
        )
        .subcommand(
            Command::new("export")
                .about("Exports the modified document to a timestamped local file")
                .arg(Arg::new("output").short('o').long("output").value_name("DIR").help("Output directory for the exported file").action(ArgAction::Set))
        )
        .subcommand(
            Command::new("format")
                .about("Rewrites a stored document in canonical pretty-printed form")
                .arg(Arg::new("target").long("target").value_name("NAME").help("Document target: 'main' (default) or 'modified'").action(ArgAction::Set))
        )
        .subcommand(
            Command::new("set-calibration")
                .about("Replaces the recorded pan/tilt for an existing camera landmark")
                .arg(Arg::new("camera").long("camera").value_name("ID").required(true).help("Camera id").action(ArgAction::Set))
                .arg(Arg::new("landmark").long("landmark").value_name("ID").required(true).help("Landmark id").action(ArgAction::Set))
                .arg(Arg::new("pan").long("pan").value_name("DEG").required(true).help("Pan setpoint, -55 to 55").value_parser(clap::value_parser!(f64)).action(ArgAction::Set))
                .arg(Arg::new("tilt").long("tilt").value_name("DEG").required(true).help("Tilt setpoint, -20 to 20").value_parser(clap::value_parser!(f64)).action(ArgAction::Set))
                .arg(Arg::new("target").long("target").value_name("NAME").help("Document target: 'main' (default) or 'modified'").action(ArgAction::Set))
        )
        .subcommand(
            Command::new("set-field")
                .about("Replaces or creates a top-level document field")
                .arg(Arg::new("field").long("field").value_name("NAME").required(true).help("Top-level field name").action(ArgAction::Set))
                .arg(Arg::new("value").long("value").value_name("JSON").required(true).help("New value as JSON (bare text is treated as a string)").action(ArgAction::Set))
                .arg(Arg::new("target").long("target").value_name("NAME").help("Document target: 'main' (default) or 'modified'").action(ArgAction::Set))
        )
        .subcommand(
            Command::new("set-path")
                .about("Replaces a nested value addressed by a dot-separated path")
                .arg(Arg::new("path").long("path").value_name("DOT.PATH").required(true).help("Dot-separated path; intermediate segments must exist").action(ArgAction::Set))
                .arg(Arg::new("value").long("value").value_name("JSON").required(true).help("New value as JSON (bare text is treated as a string)").action(ArgAction::Set))
                .arg(Arg::new("target").long("target").value_name("NAME").help("Document target: 'main' (default) or 'modified'").action(ArgAction::Set))
        )
        .subcommand(
            Command::new("move")
                .about("Sends a pan/tilt/zoom setpoint to a camera through the vendor proxy")
                .arg(Arg::new("camera").long("camera").value_name("N").required(true).help("Camera number, e.g. 1 or camera1").action(ArgAction::Set))
                .arg(Arg::new("pan").long("pan").value_name("DEG").required(true).help("Pan setpoint, -55 to 55").value_parser(clap::value_parser!(f64)).action(ArgAction::Set))
                .arg(Arg::new("tilt").long("tilt").value_name("DEG").required(true).help("Tilt setpoint, -20 to 20").value_parser(clap::value_parser!(f64)).action(ArgAction::Set))
                .arg(Arg::new("zoom").long("zoom").value_name("STEPS").help("Zoom setpoint, 0 to 16000 (default 12000)").value_parser(clap::value_parser!(f64)).action(ArgAction::Set))
                .arg(Arg::new("venue").long("venue").value_name("N").help("Venue number (default from settings)").action(ArgAction::Set))
        )
        .subcommand(
            Command::new("enclosure")
                .about("Opens or closes camera enclosures through the vendor proxy")
                .arg(Arg::new("action").long("action").value_name("ACTION").required(true).help("Action to perform: 'open' or 'close'").action(ArgAction::Set))
                .arg(Arg::new("cameras").long("cameras").value_name("CAM_IDS").help("Comma-separated camera ids (default: all cameras with an IP)").action(ArgAction::Set))
                .arg(Arg::new("venue").long("venue").value_name("N").help("Venue number (default from settings)").action(ArgAction::Set))
        )
        .subcommand(
            Command::new("verify-landmarks")
                .about("Runs the landmark verification script and prints in-range pan/tilt values")
                .arg(Arg::new("camera").long("camera").value_name("N").required(true).help("Camera number, e.g. 1 or camera1").action(ArgAction::Set))
        )
        .subcommand(
            Command::new("check-calibration")
                .about("Runs the calibration check script and prints its report")
                .arg(Arg::new("camera").long("camera").value_name("N").required(true).help("Camera number, e.g. 1 or camera1").action(ArgAction::Set))
        )
}
