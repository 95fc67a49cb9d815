pub mod actor;
pub mod controllers;
pub mod error;
pub mod jwt;
pub mod util;

pub use actor::Actor;
pub use error::Error;
pub use jwt::Jwt;
