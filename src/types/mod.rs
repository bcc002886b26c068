pub mod catalog;
pub mod distribution;
pub mod localized;
