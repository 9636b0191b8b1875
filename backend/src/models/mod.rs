// src/models/mod.rs

pub mod attempt;
pub mod question;
pub mod rk;
pub mod session;
pub mod user;
