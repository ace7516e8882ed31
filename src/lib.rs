#![forbid(unsafe_code)]

pub mod build;
pub mod cli;
pub mod config;
pub mod dom;
pub mod fetch;
pub mod formats;
pub mod generate;
pub mod logging;
pub mod normalize;
pub mod page;
pub mod render;
pub mod slug;
