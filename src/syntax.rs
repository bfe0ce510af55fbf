//! Owned syntax trees for parsed C# sources.
//!
//! Tree-sitter trees borrow their parser and source; the regenerator wants plain data it can hold
//! on to while it classifies and splices. Parsing therefore converts the tree once into
//! [`SyntaxNode`]s that carry their grammar kind, the field they occupy in their parent, and a
//! byte [`Span`] into the original text.

use crate::error::{Artifact, Error, Result};
use crate::formats::Format;
use crate::span::Span;
use log::trace;
use streaming_iterator::StreamingIterator;
use tree_sitter::{Node, Parser, Query, QueryCursor, TreeCursor};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Coarse classification of a node, independent of the grammar's fine-grained kinds.
pub enum NodeCategory {
    /// Members and types: properties, fields, methods, classes.
    Declaration,
    /// Anything producing a value, including initializer entries.
    Expression,
    /// Statements and blocks inside a method body.
    Statement,
    /// Comments.
    Trivia,
    /// Punctuation, identifiers in declaration position, lists and other structure.
    Other,
}

#[derive(Debug, Clone)]
/// Immutable CST node with exact source location.
pub struct SyntaxNode {
    /// Grammar kind, e.g. `property_declaration`.
    pub kind: String,
    /// Field name this node occupies in its parent, e.g. `name`.
    pub field: Option<&'static str>,
    /// Byte range in the parsed source.
    pub span: Span,
    /// Whether the node is named (as opposed to anonymous punctuation).
    pub is_named: bool,
    /// Child nodes in source order, comments included.
    pub children: Vec<SyntaxNode>,
}

impl SyntaxNode {
    fn from_cursor(cursor: &mut TreeCursor<'_>) -> Self {
        let node = cursor.node();
        let field = cursor.field_name();
        let mut children = Vec::new();

        if cursor.goto_first_child() {
            loop {
                children.push(Self::from_cursor(cursor));
                if !cursor.goto_next_sibling() {
                    break;
                }
            }
            cursor.goto_parent();
        }

        Self {
            kind: node.kind().to_string(),
            field,
            span: Span::new(node.start_byte(), node.end_byte()),
            is_named: node.is_named(),
            children,
        }
    }

    #[must_use]
    /// Coarse category used by logging and by callers that only care about node families.
    pub fn category(&self) -> NodeCategory {
        let kind = self.kind.as_str();
        if kind == "comment" {
            NodeCategory::Trivia
        } else if kind == "block" || kind.ends_with("_statement") {
            NodeCategory::Statement
        } else if kind.ends_with("_declaration") {
            NodeCategory::Declaration
        } else if kind.ends_with("_expression") || kind.ends_with("_literal") {
            NodeCategory::Expression
        } else {
            NodeCategory::Other
        }
    }

    #[must_use]
    /// Whether this node is a comment.
    pub fn is_comment(&self) -> bool {
        self.category() == NodeCategory::Trivia
    }

    #[must_use]
    /// Source text covered by this node.
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        &source[self.span.start..self.span.end]
    }

    /// Named children, comments included, in source order.
    pub fn named_children(&self) -> impl Iterator<Item = &SyntaxNode> {
        self.children.iter().filter(|c| c.is_named)
    }

    #[must_use]
    /// First direct child of the given kind.
    pub fn child_of_kind(&self, kind: &str) -> Option<&SyntaxNode> {
        self.children.iter().find(|c| c.kind == kind)
    }

    #[must_use]
    /// Direct child occupying the given grammar field.
    pub fn child_by_field(&self, field: &str) -> Option<&SyntaxNode> {
        self.children.iter().find(|c| c.field == Some(field))
    }

    #[must_use]
    /// Text of the node's `name` field, if it has one.
    pub fn name<'a>(&self, source: &'a str) -> Option<&'a str> {
        self.child_by_field("name").map(|n| n.text(source))
    }

    #[must_use]
    /// Find all nodes of a specific kind, in document order.
    pub fn find_by_kind(&self, kind: &str) -> Vec<&SyntaxNode> {
        let mut result = Vec::new();
        self.find_by_kind_recursive(kind, &mut result);
        result
    }

    fn find_by_kind_recursive<'a>(&'a self, kind: &str, result: &mut Vec<&'a SyntaxNode>) {
        if self.kind == kind {
            result.push(self);
        }
        for child in &self.children {
            child.find_by_kind_recursive(kind, result);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// One using directive, e.g. `System.Linq`, `static System.Math` or `Json = System.Text.Json`.
pub struct UsingDirective<'a> {
    /// Declared with the `global` modifier.
    pub global: bool,
    /// Text between `using` and `;`.
    pub target: &'a str,
}

#[derive(Debug)]
/// A parsed source file.
pub struct SourceTree {
    /// Root node (`compilation_unit` for C#).
    pub root: SyntaxNode,
    /// Original source text.
    pub source: String,
    /// Spans of every comment, in document order.
    pub comments: Vec<Span>,
}

impl SourceTree {
    #[must_use]
    /// Extract a slice of source by span.
    pub fn slice(&self, span: Span) -> &str {
        &self.source[span.start..span.end]
    }

    /// Comments in document order together with their text.
    pub fn comment_texts(&self) -> impl Iterator<Item = (Span, &str)> {
        self.comments.iter().map(|&span| (span, self.slice(span)))
    }

    #[must_use]
    /// Class declarations that are not nested inside another type, in document order.
    pub fn top_level_classes(&self) -> Vec<&SyntaxNode> {
        fn collect<'a>(node: &'a SyntaxNode, out: &mut Vec<&'a SyntaxNode>) {
            match node.kind.as_str() {
                "class_declaration" => out.push(node),
                "struct_declaration" | "record_declaration" | "interface_declaration" => {}
                _ => node.children.iter().for_each(|c| collect(c, out)),
            }
        }
        let mut out = Vec::new();
        collect(&self.root, &mut out);
        out
    }

    #[must_use]
    /// Name of the first namespace declared in the file, block-scoped or file-scoped.
    pub fn namespace(&self) -> Option<&str> {
        ["namespace_declaration", "file_scoped_namespace_declaration"]
            .iter()
            .filter_map(|kind| self.root.find_by_kind(kind).into_iter().next())
            .min_by_key(|node| node.span.start)
            .and_then(|node| node.name(&self.source))
    }

    #[must_use]
    /// The file's using directives in document order.
    ///
    /// The target is everything between the `using` keyword and the semicolon, so `static` and
    /// alias forms keep their full text.
    pub fn usings(&self) -> Vec<UsingDirective<'_>> {
        self.root
            .find_by_kind("using_directive")
            .into_iter()
            .filter_map(|node| {
                let keyword = node.child_of_kind("using")?;
                let end = node.child_of_kind(";").map_or(node.span.end, |semi| semi.span.start);
                let target = self.source[keyword.span.end..end].trim();
                (!target.is_empty()).then_some(UsingDirective {
                    global: node.child_of_kind("global").is_some(),
                    target,
                })
            })
            .collect()
    }
}

/// Tree-sitter parser bound to one [`Format`].
pub struct SourceParser {
    parser: Parser,
    comment_query: Query,
}

impl SourceParser {
    /// Create a parser for the given format.
    ///
    /// # Errors
    ///
    /// Returns an error if the grammar cannot be loaded or the format's queries do not compile.
    pub fn new(format: &impl Format) -> Result<Self> {
        let language = format.language();
        let mut parser = Parser::new();
        parser.set_language(&language)?;
        let comment_query = Query::new(&language, format.comment_query())?;

        Ok(Self {
            parser,
            comment_query,
        })
    }

    /// Parse `source` into an owned tree.
    ///
    /// Tree-sitter recovers from syntax errors, but a tree rebuilt around an error could place
    /// marker comments and members at the wrong offsets, so any error node is fatal.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Parse`] naming `artifact` if the source does not parse cleanly.
    pub fn parse(&mut self, source: &str, artifact: Artifact) -> Result<SourceTree> {
        let tree = self
            .parser
            .parse(source, None)
            .ok_or_else(|| Error::Parse {
                artifact,
                detail: "parser produced no tree".to_string(),
            })?;

        let root_node = tree.root_node();
        if root_node.has_error() {
            let detail = first_error(root_node).map_or_else(
                || "syntax error".to_string(),
                |node| {
                    let pos = node.start_position();
                    format!("syntax error near line {}, column {}", pos.row + 1, pos.column + 1)
                },
            );
            return Err(Error::Parse { artifact, detail });
        }

        let mut comments = Vec::new();
        let mut cursor = QueryCursor::new();
        let mut matches = cursor.matches(&self.comment_query, root_node, source.as_bytes());
        while let Some(m) = matches.next() {
            for capture in m.captures {
                comments.push(Span::new(capture.node.start_byte(), capture.node.end_byte()));
            }
        }
        comments.sort_unstable();
        comments.dedup();

        let root = SyntaxNode::from_cursor(&mut root_node.walk());
        trace!(
            "parsed {artifact}: {} bytes, {} comments",
            source.len(),
            comments.len()
        );

        Ok(SourceTree {
            root,
            source: source.to_string(),
            comments,
        })
    }
}

fn first_error(node: Node<'_>) -> Option<Node<'_>> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    let mut cursor = node.walk();
    let children: Vec<Node<'_>> = node.children(&mut cursor).collect();
    children
        .into_iter()
        .filter(|child| child.has_error())
        .find_map(first_error)
}

#[cfg(test)]
#[path = "tests/syntax.rs"]
mod tests;
