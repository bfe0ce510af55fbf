//! Marker vocabulary and the locator that turns marker comments into regions.
//!
//! Each family of custom content is delimited by a pair of single-line comments. Input files use
//! the scanning pairs (`////BCPS/` ... `////ECPS/` and friends); files written by this tool carry a
//! distinct output-facing sentinel pair per family so that the next regeneration can find the
//! custom block again without the scanning literals ever appearing in output.

use crate::span::Region;
use crate::syntax::SourceTree;
use log::debug;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Begin and end delimiter literals of one family.
pub struct MarkerPair {
    /// Literal opening the custom region.
    pub begin: &'static str,
    /// Literal closing the custom region.
    pub end: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
/// The three independent kinds of preserved content.
pub enum MarkerFamily {
    /// Member declarations of the DTO class.
    Declarations,
    /// Entries of the mapper's selector initializer list.
    SelectorList,
    /// Statements of the mapper's `MapToModel` method.
    StatementList,
}

impl MarkerFamily {
    /// All families, in the order they are located and reported.
    pub const ALL: [Self; 3] = [Self::Declarations, Self::SelectorList, Self::StatementList];

    #[must_use]
    /// Pair searched for in previously generated files.
    pub const fn scanning(self) -> MarkerPair {
        match self {
            Self::Declarations => MarkerPair {
                begin: "////BCPS/",
                end: "////ECPS/",
            },
            Self::SelectorList => MarkerPair {
                begin: "////BCSS/",
                end: "////ECSS/",
            },
            Self::StatementList => MarkerPair {
                begin: "////BCMS/",
                end: "////ECMS/",
            },
        }
    }

    #[must_use]
    /// Pair written around preserved content in generated output.
    pub const fn sentinel(self) -> MarkerPair {
        match self {
            Self::Declarations => MarkerPair {
                begin: "////BCC/",
                end: "////ECC/",
            },
            Self::SelectorList => MarkerPair {
                begin: "////BCCS/",
                end: "////ECCS/",
            },
            Self::StatementList => MarkerPair {
                begin: "////BCCM/",
                end: "////ECCM/",
            },
        }
    }
}

impl fmt::Display for MarkerFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Declarations => write!(f, "declarations"),
            Self::SelectorList => write!(f, "selector list"),
            Self::StatementList => write!(f, "mapping statements"),
        }
    }
}

#[must_use]
/// Whether a comment's text contains any delimiter literal, scanning or sentinel.
pub fn is_marker_comment(text: &str) -> bool {
    MarkerFamily::ALL.iter().any(|family| {
        let (scan, out) = (family.scanning(), family.sentinel());
        [scan.begin, scan.end, out.begin, out.end]
            .iter()
            .any(|token| text.contains(token))
    })
}

/// Locate the custom region of `family` in a previously generated tree.
///
/// The region spans from the end of the first comment containing the begin literal to the start
/// of the first comment containing the end literal. The family's sentinel pair is only consulted
/// when neither scanning literal appears at all, so a half-present scanning pair still counts as
/// absent.
#[must_use]
pub fn locate(tree: &SourceTree, family: MarkerFamily) -> Option<Region> {
    let scanning = family.scanning();
    let mentions_scanning = tree
        .comment_texts()
        .any(|(_, text)| text.contains(scanning.begin) || text.contains(scanning.end));
    let pair = if mentions_scanning {
        scanning
    } else {
        family.sentinel()
    };

    let region = locate_pair(tree, pair);
    match region {
        Some(r) => debug!("{family}: custom region {}..{}", r.begin, r.end),
        None => debug!("{family}: no usable {}/{} pair", pair.begin, pair.end),
    }
    region
}

fn locate_pair(tree: &SourceTree, pair: MarkerPair) -> Option<Region> {
    let begin = tree
        .comment_texts()
        .find(|(_, text)| text.contains(pair.begin))
        .map(|(span, _)| span.end)?;
    let end = tree
        .comment_texts()
        .find(|(_, text)| text.contains(pair.end))
        .map(|(span, _)| span.start)?;
    Region::new(begin, end)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
/// Located regions of all three families for one previous tree.
pub struct Regions {
    /// Region of [`MarkerFamily::Declarations`].
    pub declarations: Option<Region>,
    /// Region of [`MarkerFamily::SelectorList`].
    pub selectors: Option<Region>,
    /// Region of [`MarkerFamily::StatementList`].
    pub statements: Option<Region>,
}

impl Regions {
    #[must_use]
    /// Run the locator once per family.
    pub fn locate_all(tree: &SourceTree) -> Self {
        Self {
            declarations: locate(tree, MarkerFamily::Declarations),
            selectors: locate(tree, MarkerFamily::SelectorList),
            statements: locate(tree, MarkerFamily::StatementList),
        }
    }

    #[must_use]
    /// Region of a single family.
    pub fn get(&self, family: MarkerFamily) -> Option<Region> {
        match family {
            MarkerFamily::Declarations => self.declarations,
            MarkerFamily::SelectorList => self.selectors,
            MarkerFamily::StatementList => self.statements,
        }
    }
}

#[cfg(test)]
#[path = "tests/markers.rs"]
mod tests;
