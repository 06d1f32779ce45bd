#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![deny(unreachable_pub)]
#![deny(clippy::correctness)]
#![deny(clippy::suspicious)]
#![deny(clippy::style)]
#![deny(clippy::complexity)]
#![deny(clippy::perf)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::cast_possible_truncation)]

//! The axum HTTP adapter for the GOTV+ broadcast relay: route handlers,
//! CLI/configuration, and the error-to-status-code mapping. The binary
//! target (`main.rs`) just wires this up to a `TcpListener`.

pub mod cli;
pub mod error;
pub mod routes;
