//! User records, persistence and the register/login use cases.

pub mod dto;
pub mod handlers;
pub mod model;
pub mod repo;
pub mod service;
