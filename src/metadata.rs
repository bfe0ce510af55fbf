//! Entity metadata: the names, types and relations a DTO is generated from.
//!
//! Metadata is either decoded from JSON or extracted from the entity's C# source. Extraction is
//! deliberately shallow: it reads the first top-level class, its base class, and its public
//! instance properties, and classifies each property type as a plain value, a collection
//! navigation, or a single navigation.

use crate::error::{Artifact, Error, Result};
use crate::formats::csharp::CSharpFormat;
use crate::syntax::{SourceParser, SourceTree, SyntaxNode};
use log::debug;
use serde::{Deserialize, Serialize};

const SIMPLE_TYPES: [&str; 21] = [
    "bool",
    "byte",
    "sbyte",
    "char",
    "decimal",
    "double",
    "float",
    "int",
    "uint",
    "long",
    "ulong",
    "short",
    "ushort",
    "string",
    "object",
    "DateTime",
    "DateTimeOffset",
    "DateOnly",
    "TimeOnly",
    "TimeSpan",
    "Guid",
];

const COLLECTION_TYPES: [&str; 8] = [
    "ICollection",
    "IEnumerable",
    "IList",
    "List",
    "HashSet",
    "ISet",
    "IReadOnlyCollection",
    "IReadOnlyList",
];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
/// How a property relates to other entities.
pub enum Relation {
    #[default]
    /// Plain value copied as-is.
    Simple,
    /// Navigation to one related entity, flattened into the DTO when its metadata is known.
    Single {
        /// Name of the related entity class.
        entity: String,
    },
    /// Navigation to many related entities, mapped through the related entity's mapper.
    Collection {
        /// Name of the element entity class.
        entity: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// One property of an entity.
pub struct PropertyMetadata {
    /// Property identifier.
    pub name: String,
    #[serde(rename = "type")]
    /// C# type as written in the entity.
    pub type_name: String,
    #[serde(default)]
    /// Relation classification of the type.
    pub relation: Relation,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// Metadata of the related entity for single navigations, used to flatten its properties.
    pub related: Option<Box<EntityMetadata>>,
}

impl PropertyMetadata {
    #[must_use]
    /// Build a property, classifying its type by name alone.
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        let type_name = type_name.into();
        Self {
            name: name.into(),
            relation: classify(&type_name, false),
            type_name,
            related: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
/// Everything the skeleton builder needs to know about an entity.
pub struct EntityMetadata {
    /// Entity class name.
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// Namespace the entity lives in.
    pub namespace: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// Entity base class, if it derives from another entity.
    pub base_class: Option<String>,
    #[serde(default)]
    /// Public properties in declaration order.
    pub properties: Vec<PropertyMetadata>,
    #[serde(default)]
    /// Using directives of the entity source, needed for its property types.
    pub usings: Vec<String>,
}

impl EntityMetadata {
    /// Decode metadata from JSON and validate it.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or names invalid identifiers.
    pub fn from_json(json: &str) -> Result<Self> {
        let metadata: Self = serde_json::from_str(json)?;
        metadata.validate()?;
        Ok(metadata)
    }

    /// Extract metadata from the C# source of an entity.
    ///
    /// # Errors
    ///
    /// Returns an error if the source does not parse or declares no class.
    pub fn from_source(source: &str) -> Result<Self> {
        let mut parser = SourceParser::new(&CSharpFormat)?;
        let tree = parser.parse(source, Artifact::Entity)?;
        let class = tree
            .top_level_classes()
            .into_iter()
            .next()
            .ok_or(Error::MissingClass(Artifact::Entity))?;

        let name = class
            .name(&tree.source)
            .ok_or(Error::MissingClass(Artifact::Entity))?
            .to_string();
        let properties = class
            .child_of_kind("declaration_list")
            .map(|body| {
                body.named_children()
                    .filter(|m| m.kind == "property_declaration")
                    .filter_map(|m| extract_property(&tree, m))
                    .collect()
            })
            .unwrap_or_default();

        let metadata = Self {
            base_class: extract_base_class(&tree, class),
            namespace: tree.namespace().map(ToString::to_string),
            usings: tree
                .usings()
                .into_iter()
                .filter(|u| !u.global)
                .map(|u| u.target.to_string())
                .collect(),
            name,
            properties,
        };
        debug!(
            "extracted entity {} with {} properties",
            metadata.name,
            metadata.properties.len()
        );
        metadata.validate()?;
        Ok(metadata)
    }

    /// Attach metadata of related entities to the single navigations that refer to them.
    pub fn attach_related(&mut self, related: &[EntityMetadata]) {
        for property in &mut self.properties {
            if let Relation::Single { entity } = &property.relation {
                if property.related.is_none() {
                    if let Some(found) = related.iter().find(|r| &r.name == entity) {
                        property.related = Some(Box::new(found.clone()));
                    }
                }
            }
        }
    }

    /// Check that every name can be emitted as C# without breaking the generated file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidMetadata`] describing the first offending value.
    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: String| Error::InvalidMetadata {
            artifact: Artifact::Metadata,
            reason,
        };

        if !is_identifier(&self.name) {
            return Err(invalid(format!("entity name {:?} is not an identifier", self.name)));
        }
        if let Some(base) = &self.base_class {
            if !is_identifier(base) {
                return Err(invalid(format!("base class {base:?} is not an identifier")));
            }
        }
        for property in &self.properties {
            if !is_identifier(&property.name) {
                return Err(invalid(format!(
                    "property name {:?} on {} is not an identifier",
                    property.name, self.name
                )));
            }
            if !is_type_name(&property.type_name) {
                return Err(invalid(format!(
                    "property {}.{} has unusable type {:?}",
                    self.name, property.name, property.type_name
                )));
            }
            if let Relation::Single { entity } | Relation::Collection { entity } =
                &property.relation
            {
                if !is_identifier(entity) {
                    return Err(invalid(format!(
                        "property {}.{} relates to {entity:?}, which is not an identifier",
                        self.name, property.name
                    )));
                }
            }
            if let Some(related) = &property.related {
                related.validate()?;
            }
        }
        Ok(())
    }
}

fn extract_property(tree: &SourceTree, node: &SyntaxNode) -> Option<PropertyMetadata> {
    let modifiers: Vec<&str> = node
        .children
        .iter()
        .filter(|c| c.kind == "modifier")
        .map(|c| c.text(&tree.source))
        .collect();
    if !modifiers.contains(&"public") || modifiers.contains(&"static") {
        return None;
    }

    let name = node.name(&tree.source)?;
    let type_name = node.child_by_field("type")?.text(&tree.source).trim();
    let navigation = modifiers.contains(&"virtual");

    Some(PropertyMetadata {
        name: name.to_string(),
        type_name: type_name.to_string(),
        relation: classify(type_name, navigation),
        related: None,
    })
}

fn extract_base_class(tree: &SourceTree, class: &SyntaxNode) -> Option<String> {
    let first = class.child_of_kind("base_list")?.named_children().next()?;
    let text = first.text(&tree.source).trim();
    let looks_like_interface = text.len() > 1
        && text.starts_with('I')
        && text[1..].starts_with(|c: char| c.is_ascii_uppercase());
    (!looks_like_interface && is_identifier(text)).then(|| text.to_string())
}

/// Classify a property type.
///
/// Generic collections of an entity are collection navigations regardless of modifiers. Any other
/// non-primitive type is only treated as a navigation when the property is `virtual`, so enums
/// and value objects stay plain values.
#[must_use]
pub fn classify(type_name: &str, navigation: bool) -> Relation {
    let bare = type_name.trim().trim_end_matches('?');

    if let Some((outer, inner)) = split_generic(bare) {
        let outer = outer.rsplit('.').next().unwrap_or(outer);
        if COLLECTION_TYPES.contains(&outer) && is_identifier(inner) && !is_simple(inner) {
            return Relation::Collection {
                entity: inner.to_string(),
            };
        }
        return Relation::Simple;
    }

    if navigation && is_identifier(bare) && !is_simple(bare) {
        Relation::Single {
            entity: bare.to_string(),
        }
    } else {
        Relation::Simple
    }
}

fn is_simple(type_name: &str) -> bool {
    let bare = type_name.trim_end_matches('?');
    SIMPLE_TYPES.contains(&bare) || bare.starts_with("System.") || bare.ends_with("[]")
}

fn split_generic(type_name: &str) -> Option<(&str, &str)> {
    let open = type_name.find('<')?;
    let inner = type_name.strip_suffix('>')?;
    Some((&type_name[..open], inner[open + 1..].trim()))
}

#[must_use]
/// Whether `text` is a plain C# identifier (ASCII letters, digits, underscore; no leading digit).
pub fn is_identifier(text: &str) -> bool {
    let mut chars = text.chars();
    chars
        .next()
        .is_some_and(|c| c == '_' || c.is_ascii_alphabetic())
        && chars.all(|c| c == '_' || c.is_ascii_alphanumeric())
}

fn is_type_name(text: &str) -> bool {
    !text.trim().is_empty()
        && text
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "_.<>,?[] ".contains(c))
}

#[cfg(test)]
#[path = "tests/metadata.rs"]
mod tests;
