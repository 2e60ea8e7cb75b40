//! CLI command modules

pub mod clear;
pub mod daemon;
pub mod init;
pub mod run;
pub mod status;
