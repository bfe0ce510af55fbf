//! The merge driver: skeleton from metadata, custom content from the previous file.
//!
//! Without a previous file the skeleton is returned as-is. With one, the previous file is parsed,
//! each family's region is located, the preservation pass runs once, and the preserved nodes are
//! spliced after the generated entries of their family. When a preserved node shares its name
//! (or, for statements, its code) with a generated one, the generated one is dropped so nothing
//! appears twice. The base mapper call is the exception: it always stays first and preserved
//! copies of it are dropped instead.

use crate::error::{Artifact, Result};
use crate::formats::csharp::CSharpFormat;
use crate::markers::Regions;
use crate::metadata::EntityMetadata;
use crate::render::render;
use crate::rewrite::{rewrite, Boundary, PreservedNode};
use crate::skeleton::{self, DtoFile, GenerationOptions, Member, Origin};
use crate::syntax::SourceParser;
use log::{debug, info};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
/// Output of one merge.
pub struct RewriteResult {
    #[serde(skip)]
    /// The merged tree.
    pub file: DtoFile,
    /// Number of custom declarations carried over into the DTO class.
    pub custom_declarations: usize,
    /// First and last preserved DTO member, positioned within the DTO's members.
    pub declarations: Boundary,
    /// First and last preserved selector entry, positioned within the selector list.
    pub selectors: Boundary,
    /// First and last preserved statement, positioned within `MapToModel`.
    pub statements: Boundary,
}

impl RewriteResult {
    fn fresh(file: DtoFile) -> Self {
        Self {
            file,
            custom_declarations: 0,
            declarations: Boundary::default(),
            selectors: Boundary::default(),
            statements: Boundary::default(),
        }
    }

    #[must_use]
    /// Render the merged tree as C# source.
    pub fn render(&self, indent_width: usize) -> String {
        render(&self.file, indent_width)
    }
}

/// Generate the file for `metadata`, keeping the custom content of `previous` if given.
///
/// # Errors
///
/// Returns an error if the metadata is invalid or the previous file does not parse.
pub fn merge(
    metadata: &EntityMetadata,
    previous: Option<&str>,
    options: &GenerationOptions,
) -> Result<RewriteResult> {
    metadata.validate()?;
    let mut file = skeleton::build(metadata, options);

    let Some(previous) = previous else {
        debug!("no previous file for {}, generating fresh", metadata.name);
        return Ok(RewriteResult::fresh(file));
    };

    let mut parser = SourceParser::new(&CSharpFormat)?;
    let tree = parser.parse(previous, Artifact::PreviousDto)?;
    let regions = Regions::locate_all(&tree);
    let preserved = rewrite(&tree, &regions, &options.mapper_marker);

    if options.namespace.is_none() {
        if let Some(namespace) = tree.namespace() {
            file.namespace = namespace.to_string();
        }
    }
    for using in tree.usings() {
        let target = if using.global {
            &mut file.global_usings
        } else {
            &mut file.usings
        };
        if !target.iter().any(|u| u == using.target) {
            target.push(using.target.to_string());
        }
    }

    let stats = preserved.stats;
    let same_name = |m: &Member, p: &PreservedNode| p.name.is_some() && m.name == p.name;
    let same_code = |m: &Member, p: &PreservedNode| normalized(&m.text) == normalized(&p.code);

    // The base mapper call is always synthesized first; preserved copies of it are dropped.
    let mut statements = preserved.statements;
    if let Some(base) = &file.mapper.base_mapper {
        let delegation = normalized(&base.delegation());
        statements.retain(|p| {
            let duplicate = normalized(&p.code) == delegation;
            if duplicate {
                debug!("dropping preserved copy of {}", base.delegation());
            }
            !duplicate
        });
    }
    let statement_boundary = Boundary::of(&statements);

    let declaration_offset = splice(&mut file.dto.members, preserved.declarations, same_name);
    let selector_offset = splice(
        &mut file.mapper.selectors,
        preserved.selectors.unwrap_or_default(),
        same_name,
    );
    let statement_offset = splice(&mut file.mapper.statements, statements, same_code);

    info!(
        "{}: kept {} custom declarations, {} selector entries, {} statements",
        file.dto.name,
        stats.custom_declarations,
        file.mapper.selectors.iter().filter(|m| m.is_custom()).count(),
        file.mapper.statements.iter().filter(|m| m.is_custom()).count()
    );

    Ok(RewriteResult {
        file,
        custom_declarations: stats.custom_declarations,
        declarations: stats.declarations.shifted(declaration_offset),
        selectors: stats.selectors.shifted(selector_offset),
        statements: statement_boundary.shifted(statement_offset),
    })
}

/// Append `preserved` after the generated entries, dropping generated entries it replaces.
///
/// Returns the index the first preserved entry lands at.
fn splice(
    members: &mut Vec<Member>,
    preserved: Vec<PreservedNode>,
    same: impl Fn(&Member, &PreservedNode) -> bool,
) -> usize {
    members.retain(|m| {
        let replaced = preserved.iter().any(|p| same(m, p));
        if replaced {
            debug!("custom code replaces generated {:?}", m.name.as_deref().unwrap_or(&m.text));
        }
        !replaced
    });
    let offset = members.len();
    members.extend(preserved.into_iter().map(|p| Member {
        name: p.name,
        text: p.text,
        origin: Origin::Custom { span: p.span },
    }));
    offset
}

fn normalized(text: &str) -> String {
    text.chars().filter(|c| !c.is_whitespace()).collect()
}

#[cfg(test)]
#[path = "tests/merge.rs"]
mod tests;
