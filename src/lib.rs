//! MedAssist is a terminal client for the HemaV MedAssist retrieval-augmented
//! question-answering service.
//!
//! The crate is organized around a small set of collaborating layers:
//! - [`core`] owns the headless view-model: the chat session, its transcript,
//!   the processing gate that keeps at most one query in flight, the
//!   credential store, the health probe, and navigation/layout state.
//! - [`api`] defines the wire payloads of the backend's `/api/query` and
//!   `/api/health` endpoints and the HTTP client that speaks them.
//! - [`ui`] holds the rendering adapters: HTML markup for transcripts and the
//!   full-screen terminal interface with its event loop.
//! - [`cli`] parses command-line arguments and dispatches to the chat loop or
//!   to one-shot commands.
//!
//! The binary (`src/main.rs`) routes straight into [`crate::cli::main`].

pub mod api;
pub mod cli;
pub mod core;
pub mod ui;
pub mod utils;
