pub mod pause_type;
