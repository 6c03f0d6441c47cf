pub mod config_io_op;
pub mod ptz_control_op;
pub mod script_op;
pub mod update_op;
