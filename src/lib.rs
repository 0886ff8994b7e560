pub mod admission;
pub mod aspect;
pub mod cache;
pub mod config;
pub mod error;
pub mod generator;
pub mod render;
pub mod routes;
pub mod storage;
pub mod themes;
pub mod types;
