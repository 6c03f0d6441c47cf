pub mod blob_store;
pub mod local_file_store;
