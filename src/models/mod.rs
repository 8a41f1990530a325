// src/models/mod.rs

pub mod expertise;
pub mod question;
pub mod request;
pub mod session;
