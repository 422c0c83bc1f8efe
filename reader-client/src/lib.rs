pub mod billing;
pub mod db;
pub mod domain;
pub mod zones;
