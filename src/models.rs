// src/models.rs

pub mod auth;
pub mod invoice;
pub mod registry;
pub mod reports;
