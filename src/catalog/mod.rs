pub mod error;
pub mod fetcher;
pub mod filter;
pub mod flatten;
