// src/db.rs

pub mod report_query;
pub mod user_repo;
pub use user_repo::UserRepository;
pub mod registry_repo;
pub use registry_repo::RegistryRepository;
pub mod report_repo;
pub use report_repo::ReportRepository;
