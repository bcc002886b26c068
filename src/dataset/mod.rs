pub mod error;
pub mod lazy;
pub mod resolver;
