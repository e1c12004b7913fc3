//! PDFExtract Server Library
//!
//! PDF upload → page rasterization → Gemini Vision text extraction →
//! SQLite history. The main server binary is in main.rs; the library
//! target exposes the modules for integration tests.

pub mod config;
pub mod db;
pub mod error;
pub mod pdf;
pub mod routes;
pub mod state;
pub mod vision;
