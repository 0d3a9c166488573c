// src/services.rs

pub mod auth;
pub mod document_service;
pub mod export_service;
pub mod invoice_service;
pub mod mail_service;
pub mod registry_service;
pub mod report_service;
pub mod user_service;
