//! dtoregen: regenerate C# DTOs and their mappers from entities without losing hand-written code.
//!
//! A generated file carries marker comments around the places a developer may add code. When the
//! entity changes, [`merge::merge`] rebuilds the file from fresh metadata and carries over whatever
//! the previous file held inside those markers: extra DTO members, extra selector entries, and
//! extra mapping statements. Everything outside the markers is regenerated.
//!
//! ```text
//! metadata ──► skeleton ─┐
//!                        ├─► merged DtoFile ──► render
//! previous ──► parse ──► locate regions ──► rewrite
//! ```

pub mod config;
pub mod error;
pub mod formats;
pub mod markers;
pub mod merge;
pub mod metadata;
pub mod render;
pub mod rewrite;
pub mod skeleton;
pub mod span;
pub mod syntax;

pub use error::{Error, Result};
pub use merge::{merge, RewriteResult};
