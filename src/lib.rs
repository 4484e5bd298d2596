pub mod app;
pub mod assembly;
pub mod config;
pub mod contigs;
pub mod dedup;
pub mod domain;
pub mod error;
pub mod fs_util;
pub mod names;
pub mod output;
pub mod strain;
