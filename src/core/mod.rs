pub mod config_store;
pub mod document;
pub mod update_protocol;
pub mod validation;
