// src/handlers.rs

pub mod auth;
pub mod exports;
pub mod invoices;
pub mod mail;
pub mod registry;
pub mod reports;
pub mod users;
