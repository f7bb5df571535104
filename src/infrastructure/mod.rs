pub mod bootstrap;
pub mod config;
pub mod db;
pub mod geocoding;
pub mod sheet;
