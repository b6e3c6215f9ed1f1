//! Rendering adapters and the full-screen terminal interface.
//!
//! - [`html`] renders a transcript as markup with the escaping rules of the
//!   web client.
//! - [`chat_loop`] runs the interactive session; [`renderer`], [`markdown`]
//!   and [`wrap`] turn the session into terminal frames.
//!
//! Everything here reads [`crate::core`] state; none of it decides what the
//! session does.

pub mod chat_loop;
pub mod html;
pub mod markdown;
pub mod renderer;
pub mod theme;
pub mod wrap;
