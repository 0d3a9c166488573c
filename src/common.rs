// src/common.rs

pub mod db_utils;
pub mod error;
pub mod i18n;
pub mod query;
