//! HTTP API for trial matching.
//!
//! ## Starting the Server
//!
//! ```text
//! # Start on default port 8080
//! trial-matcher serve
//!
//! # Custom store and port
//! trial-matcher serve --store trials.json --port 3000
//!
//! # Bind to all interfaces
//! trial-matcher serve --address 0.0.0.0
//! ```
//!
//! ## API Endpoints
//!
//! - `POST /api/match` - Rank trials for `{"description": ...}` or `{"codes": [...]}`
//! - `GET /api/trials` - List trials with criteria counts
//! - `GET /api/trials/{id}` - One trial with its criteria
//! - `GET /api/stats` - Store statistics

pub mod server;
