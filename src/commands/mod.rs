// src/commands/mod.rs
//! Command handlers for the krawler CLI

mod list;

pub use list::{cmd_distros, cmd_list, ListOptions};
