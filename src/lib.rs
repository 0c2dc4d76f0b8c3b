pub mod auth;
pub mod cli;
pub mod commands;
pub mod firestore;
pub mod model;
pub mod sanitize;
pub mod storage;
pub mod store;
pub mod telemetry;
pub mod util;
pub mod walk;
pub mod writer;
