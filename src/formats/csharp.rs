//! C# format implementation using tree-sitter-c-sharp.
//!
//! Both entity sources and generated DTO files are parsed with this grammar. Marker delimiters
//! are ordinary single-line comments, which the grammar exposes as `comment` extras.

use crate::formats::Format;

/// Tree-sitter grammar and queries for C# sources.
pub struct CSharpFormat;

impl Format for CSharpFormat {
    fn language(&self) -> tree_sitter::Language {
        tree_sitter_c_sharp::LANGUAGE.into()
    }

    fn comment_query(&self) -> &'static str {
        "(comment) @comment"
    }
}
