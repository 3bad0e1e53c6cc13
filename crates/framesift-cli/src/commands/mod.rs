pub mod analyze;
pub mod common;
pub mod config;
pub mod convert;
pub mod decide;
pub mod info;
pub mod pipeline;
