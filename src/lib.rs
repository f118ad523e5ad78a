mod claims;
mod config;
mod devices;
mod error;
mod filters;
mod health;
mod routes;
#[cfg(test)]
mod test_support;
mod types;
mod validation;

pub use claims::*;
pub use config::*;
pub use devices::*;
pub use error::*;
pub use filters::*;
pub use health::*;
pub use routes::*;
pub use types::*;
pub use validation::*;
