//! Format trait and implementations for the languages regenerated files are written in.
//!
//! A format binds a tree-sitter grammar together with the queries the rest of the crate runs over
//! it, so nothing outside this module needs to know which grammar crate is in use.

pub mod csharp;

/// Grammar and queries for one source language.
pub trait Format {
    /// Tree-sitter language used to parse sources in this format.
    fn language(&self) -> tree_sitter::Language;
    /// Query capturing every comment node as `@comment`.
    fn comment_query(&self) -> &str;
}
