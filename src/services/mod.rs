pub mod database;
pub mod file;
