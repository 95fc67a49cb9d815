pub mod pause_types;
pub mod teams;
pub mod users;
