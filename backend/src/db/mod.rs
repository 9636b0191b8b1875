// src/db/mod.rs

//! Queries shared by several handlers.

pub mod questions;
pub mod sessions;
