pub mod access;
pub mod app_config;
pub mod catalog;
pub mod constants;
pub mod content;
pub mod db;
pub mod error;
pub mod notes;
pub mod orm;
pub mod search;
pub mod stats;
pub mod storage;
pub mod students;
pub mod web;
