//! The preservation pass over a previously generated file.
//!
//! The previous tree is traversed once. Each family contributes one candidate sequence:
//!
//! - member declarations of every class that is not a mapper,
//! - the entries of the mapper's selector initializer list,
//! - the statements of `MapToModel`.
//!
//! A [`FamilyPolicy`] classifies each candidate against its family's region and rebuilds the
//! sequence from the kept nodes. Marker comments never survive into preserved text. Counts and
//! first/last boundaries accumulate in a [`RewriteStats`] value that the pass returns rather than
//! stores.

use crate::markers::{is_marker_comment, MarkerFamily, Regions};
use crate::span::{is_custom, Region, Span};
use crate::syntax::{SourceTree, SyntaxNode};
use log::trace;
use serde::Serialize;

/// Name of the mapper method whose statements form the statement family.
pub const MAP_TO_MODEL: &str = "MapToModel";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
/// Position marker for a preserved node: where it was, and where it ended up.
pub struct NodeRef {
    /// Span of the node in the previous source.
    pub span: Span,
    /// Index within its family's sequence in the merged tree.
    pub position: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
/// First and last preserved node of one family.
pub struct Boundary {
    /// Earliest preserved node in traversal order.
    pub first: Option<NodeRef>,
    /// Latest preserved node in traversal order.
    pub last: Option<NodeRef>,
}

impl Boundary {
    #[must_use]
    /// First and last of `kept`, positioned by their index.
    pub fn of(kept: &[PreservedNode]) -> Self {
        let at = |position: usize| NodeRef {
            span: kept[position].span,
            position,
        };
        Self {
            first: (!kept.is_empty()).then(|| at(0)),
            last: kept.len().checked_sub(1).map(at),
        }
    }

    #[must_use]
    /// Move both references `offset` places further into their sequence.
    pub fn shifted(self, offset: usize) -> Self {
        let shift = |r: NodeRef| NodeRef {
            position: r.position + offset,
            ..r
        };
        Self {
            first: self.first.map(shift),
            last: self.last.map(shift),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
/// Accumulator threaded through the pass.
pub struct RewriteStats {
    /// Declarations kept from non-mapper classes.
    pub custom_declarations: usize,
    /// Boundary of kept declarations.
    pub declarations: Boundary,
    /// Boundary of kept selector entries.
    pub selectors: Boundary,
    /// Boundary of kept `MapToModel` statements.
    pub statements: Boundary,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// A node that survived classification, ready to be spliced.
pub struct PreservedNode {
    /// Span of the node itself (without attached comments) in the previous source.
    pub span: Span,
    /// Declared or assigned name, when the node has one.
    pub name: Option<String>,
    /// Text with marker comments removed and indentation made relative to the first line.
    pub text: String,
    /// Text of the node alone, without the comments attached to it.
    pub code: String,
}

#[derive(Debug, Clone, Copy)]
/// A node eligible for preservation plus the comments that travel with it.
pub struct Candidate<'t> {
    /// The node being classified.
    pub node: &'t SyntaxNode,
    /// Start of the text to carry over, earlier than the node when comments lead it.
    pub text_start: usize,
    /// End of the text to carry over, later than the node when a comment trails it.
    pub text_end: usize,
}

impl<'t> Candidate<'t> {
    fn bare(node: &'t SyntaxNode) -> Self {
        Self {
            node,
            text_start: node.span.start,
            text_end: node.span.end,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Per-family classify-and-filter rule.
pub enum FamilyPolicy {
    /// Drop generated declarations, keep and count custom ones.
    Declarations,
    /// Rebuild the initializer list from its custom entries, normalising their formatting.
    SelectorList,
    /// Drop generated statements, keep custom ones with their comments.
    StatementList,
}

impl FamilyPolicy {
    #[must_use]
    /// Marker family whose region this policy classifies against.
    pub fn family(self) -> MarkerFamily {
        match self {
            Self::Declarations => MarkerFamily::Declarations,
            Self::SelectorList => MarkerFamily::SelectorList,
            Self::StatementList => MarkerFamily::StatementList,
        }
    }

    /// Keep the candidates classified custom under `region`, in order, and record them in `stats`.
    pub fn filter(
        self,
        tree: &SourceTree,
        candidates: &[Candidate<'_>],
        region: Option<Region>,
        stats: &mut RewriteStats,
    ) -> Vec<PreservedNode> {
        let family = self.family();
        let kept: Vec<PreservedNode> = candidates
            .iter()
            .filter(|c| {
                let keep = is_custom(c.node.span, region);
                trace!(
                    "{family}: {} {} at {}..{}",
                    if keep { "keeping" } else { "dropping" },
                    c.node.kind,
                    c.node.span.start,
                    c.node.span.end
                );
                keep
            })
            .map(|c| self.preserve(tree, c))
            .collect();

        let boundary = Boundary::of(&kept);
        match self {
            Self::Declarations => {
                stats.custom_declarations = kept.len();
                stats.declarations = boundary;
            }
            Self::SelectorList => stats.selectors = boundary,
            Self::StatementList => stats.statements = boundary,
        }
        kept
    }

    fn preserve(self, tree: &SourceTree, candidate: &Candidate<'_>) -> PreservedNode {
        let node = candidate.node;
        let with_trivia = Span::new(candidate.text_start, candidate.text_end);
        // Selector entries lose their surrounding trivia; the renderer re-adds one separator.
        let (name, span) = match self {
            Self::Declarations => (declared_name(tree, node), with_trivia),
            Self::SelectorList => (assigned_name(tree, node), node.span),
            Self::StatementList => (None, with_trivia),
        };

        let stripped = strip_markers(&tree.source, span, &tree.comments);
        let code = strip_markers(&tree.source, node.span, &tree.comments);
        PreservedNode {
            span: node.span,
            name,
            text: relative_indent(stripped.trim(), column_of(&tree.source, span.start)),
            code: code.trim().to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
/// Everything the pass preserved from one previous tree.
pub struct Rewrite {
    /// Custom declarations of non-mapper classes.
    pub declarations: Vec<PreservedNode>,
    /// Custom selector entries; `None` when the previous file has no initializer list at all.
    pub selectors: Option<Vec<PreservedNode>>,
    /// Custom `MapToModel` statements.
    pub statements: Vec<PreservedNode>,
    /// Counts and boundaries.
    pub stats: RewriteStats,
}

/// Run the preservation pass over `tree`.
///
/// Classes whose name contains `mapper_marker` contribute the selector and statement families;
/// all other classes contribute declarations. A family without a region keeps nothing.
#[must_use]
pub fn rewrite(tree: &SourceTree, regions: &Regions, mapper_marker: &str) -> Rewrite {
    let mut declarations = Vec::new();
    let mut selector_list: Option<&SyntaxNode> = None;
    let mut statements = Vec::new();

    for class in tree.top_level_classes() {
        let Some(body) = class.child_of_kind("declaration_list") else {
            continue;
        };
        let is_mapper = class
            .name(&tree.source)
            .is_some_and(|name| name.contains(mapper_marker));

        if !is_mapper {
            declarations.extend(with_comments(tree, body));
            continue;
        }

        if selector_list.is_none() {
            selector_list = body
                .find_by_kind("object_creation_expression")
                .into_iter()
                .find_map(|creation| creation.child_of_kind("initializer_expression"));
        }

        for method in body
            .named_children()
            .filter(|m| m.kind == "method_declaration")
            .filter(|m| m.name(&tree.source) == Some(MAP_TO_MODEL))
        {
            if let Some(block) = method.child_of_kind("block") {
                statements.extend(with_comments(tree, block));
            }
        }
    }

    let mut stats = RewriteStats::default();
    let declarations = FamilyPolicy::Declarations.filter(
        tree,
        &declarations,
        regions.declarations,
        &mut stats,
    );
    let selectors = selector_list.map(|list| {
        let entries: Vec<Candidate<'_>> = list
            .named_children()
            .filter(|n| !n.is_comment())
            .map(Candidate::bare)
            .collect();
        FamilyPolicy::SelectorList.filter(tree, &entries, regions.selectors, &mut stats)
    });
    let statements =
        FamilyPolicy::StatementList.filter(tree, &statements, regions.statements, &mut stats);

    Rewrite {
        declarations,
        selectors,
        statements,
        stats,
    }
}

/// Named children of `container` as candidates, with non-marker comments attached.
///
/// A run of comments directly above a node leads it; a comment on the same line after a node
/// trails it. Marker comments are never attached.
fn with_comments<'t>(tree: &SourceTree, container: &'t SyntaxNode) -> Vec<Candidate<'t>> {
    let source = tree.source.as_str();
    let mut candidates: Vec<Candidate<'t>> = Vec::new();
    let mut leading: Option<Span> = None;

    for child in container.named_children() {
        if !child.is_comment() {
            let mut candidate = Candidate::bare(child);
            if let Some(run) = leading.take() {
                if only_whitespace(&source[run.end..child.span.start]) {
                    candidate.text_start = run.start;
                }
            }
            candidates.push(candidate);
            continue;
        }

        if is_marker_comment(child.text(source)) {
            leading = None;
            continue;
        }

        if let Some(previous) = candidates.last_mut() {
            let gap = &source[previous.text_end..child.span.start];
            if leading.is_none() && !gap.contains('\n') && only_whitespace(gap) {
                previous.text_end = child.span.end;
                continue;
            }
        }

        leading = match leading {
            Some(run) if only_whitespace(&source[run.end..child.span.start]) => {
                Some(Span::new(run.start, child.span.end))
            }
            _ => Some(child.span),
        };
    }

    candidates
}

fn only_whitespace(text: &str) -> bool {
    text.chars().all(char::is_whitespace)
}

/// Copy `span` of `source`, removing every marker comment inside it.
///
/// A marker alone on its line takes the whole line with it; an inline marker leaves the rest of
/// its line untouched.
fn strip_markers(source: &str, span: Span, comments: &[Span]) -> String {
    let mut out = String::with_capacity(span.len());
    let mut cursor = span.start;

    for comment in comments
        .iter()
        .filter(|c| span.contains(**c) && is_marker_comment(&source[c.start..c.end]))
    {
        let line_start = source[..comment.start].rfind('\n').map_or(0, |i| i + 1);
        let line_end = source[comment.end..]
            .find('\n')
            .map_or(source.len(), |i| comment.end + i + 1);
        let alone = only_whitespace(&source[line_start..comment.start])
            && only_whitespace(&source[comment.end..line_end]);

        let (cut_start, cut_end) = if alone && line_start >= cursor && line_end <= span.end {
            (line_start, line_end)
        } else {
            (comment.start, comment.end)
        };
        out.push_str(&source[cursor..cut_start]);
        cursor = cut_end;
    }

    out.push_str(&source[cursor..span.end]);
    out
}

/// Column (in bytes) at which `offset` sits on its line.
fn column_of(source: &str, offset: usize) -> usize {
    offset - source[..offset].rfind('\n').map_or(0, |i| i + 1)
}

/// Remove up to `column` leading whitespace characters from every line after the first.
fn relative_indent(text: &str, column: usize) -> String {
    text.lines()
        .enumerate()
        .map(|(i, line)| {
            if i == 0 {
                return line.trim_end().to_string();
            }
            let strip = line
                .char_indices()
                .take(column)
                .take_while(|(_, c)| c.is_whitespace())
                .last()
                .map_or(0, |(idx, c)| idx + c.len_utf8());
            line[strip..].trim_end().to_string()
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn declared_name(tree: &SourceTree, node: &SyntaxNode) -> Option<String> {
    node.name(&tree.source)
        .or_else(|| {
            node.find_by_kind("variable_declarator")
                .into_iter()
                .next()
                .and_then(|declarator| {
                    declarator.name(&tree.source).or_else(|| {
                        declarator
                            .child_of_kind("identifier")
                            .map(|i| i.text(&tree.source))
                    })
                })
        })
        .map(ToString::to_string)
}

fn assigned_name(tree: &SourceTree, node: &SyntaxNode) -> Option<String> {
    if node.kind != "assignment_expression" {
        return None;
    }
    node.child_by_field("left")
        .or_else(|| node.named_children().next())
        .map(|left| left.text(&tree.source).trim().to_string())
}

#[cfg(test)]
#[path = "tests/rewrite.rs"]
mod tests;
