//! The generated structure of a DTO file and the builder that fills it from metadata.
//!
//! A [`DtoFile`] holds one DTO class and its mapper. Every member, selector entry and mapping
//! statement is a [`Member`] tagged with its [`Origin`], so the renderer can bracket custom content
//! with sentinel markers and callers can tell generated from preserved nodes.

use crate::config::Config;
use crate::metadata::{EntityMetadata, PropertyMetadata, Relation};
use crate::span::Span;
use log::debug;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "origin", rename_all = "snake_case")]
/// Where a member of the merged tree came from.
pub enum Origin {
    /// Synthesized from metadata during this regeneration.
    Generated,
    /// Preserved from the previous file.
    Custom {
        /// Span of the preserved node in the previous source.
        span: Span,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
/// One entry of a generated sequence: a declaration, a selector entry, or a statement.
pub struct Member {
    /// Declared or assigned name, used to keep custom and generated entries from colliding.
    pub name: Option<String>,
    /// Source text without indentation on the first line and without a list separator.
    pub text: String,
    #[serde(flatten)]
    /// Generated or preserved.
    pub origin: Origin,
}

impl Member {
    fn generated(name: Option<&str>, text: String) -> Self {
        Self {
            name: name.map(ToString::to_string),
            text,
            origin: Origin::Generated,
        }
    }

    #[must_use]
    /// Whether this member was preserved from a previous file.
    pub fn is_custom(&self) -> bool {
        matches!(self.origin, Origin::Custom { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
/// The generated DTO class.
pub struct DtoClass {
    /// Class name.
    pub name: String,
    /// Base DTO class, when the entity has a base class.
    pub base: Option<String>,
    /// Property declarations followed by preserved custom declarations.
    pub members: Vec<Member>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
/// A mapper instance held by the generated mapper: the base-class mapper or a related one.
pub struct MapperRef {
    /// Mapper class name.
    pub type_name: String,
    /// Private field holding the instance.
    pub field: String,
}

impl MapperRef {
    #[must_use]
    /// The `MapToModel` call that hands the base-class properties to this mapper.
    pub fn delegation(&self) -> String {
        format!("this.{}.MapToModel(dto, model);", self.field)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
/// The generated mapper class.
pub struct MapperClass {
    /// Class name.
    pub name: String,
    /// Generic base class, e.g. `MapperBase`.
    pub base_type: String,
    /// Entity class name.
    pub entity: String,
    /// DTO class name.
    pub dto: String,
    /// Delegation target for the entity's base class.
    pub base_mapper: Option<MapperRef>,
    /// Fields holding related mappers.
    pub fields: Vec<Member>,
    /// Entries of the selector initializer list.
    pub selectors: Vec<Member>,
    /// Statements of `MapToModel`.
    pub statements: Vec<Member>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
/// A complete generated file.
pub struct DtoFile {
    /// Targets of `global using` directives carried over from a previous file.
    pub global_usings: Vec<String>,
    /// Namespaces imported at the top of the file.
    pub usings: Vec<String>,
    /// Namespace both classes are declared in.
    pub namespace: String,
    /// DTO class.
    pub dto: DtoClass,
    /// Mapper class.
    pub mapper: MapperClass,
}

#[derive(Debug, Clone)]
/// Naming and layout choices for one generation.
pub struct GenerationOptions {
    /// Explicit DTO class name; defaults to entity name plus suffix.
    pub dto_name: Option<String>,
    /// Explicit base DTO class name; defaults to base class name plus suffix.
    pub base_dto_name: Option<String>,
    /// Explicit namespace; defaults to the previous file's or the entity's plus `.DTO`.
    pub namespace: Option<String>,
    /// Suffix forming DTO names from entity names.
    pub dto_suffix: String,
    /// Suffix forming mapper names from entity names.
    pub mapper_suffix: String,
    /// Name fragment identifying mapper classes in previous files.
    pub mapper_marker: String,
    /// Generic base class of generated mappers.
    pub mapper_base: String,
    /// Namespaces every generated file imports.
    pub usings: Vec<String>,
    /// Spaces per indentation level.
    pub indent_width: usize,
}

impl From<&Config> for GenerationOptions {
    fn from(config: &Config) -> Self {
        Self {
            dto_name: None,
            base_dto_name: None,
            namespace: None,
            dto_suffix: config.dto_suffix.clone(),
            mapper_suffix: config.mapper_suffix.clone(),
            mapper_marker: config.mapper_marker.clone(),
            mapper_base: config.mapper_base.clone(),
            usings: config.usings.clone(),
            indent_width: config.indent_width,
        }
    }
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

impl GenerationOptions {
    fn dto_name_for(&self, entity: &str) -> String {
        format!("{entity}{}", self.dto_suffix)
    }

    fn mapper_name_for(&self, entity: &str) -> String {
        format!("{entity}{}", self.mapper_suffix)
    }
}

/// Private field name holding an instance of `type_name`, e.g. `_orderLineMapper`.
fn field_name(type_name: &str) -> String {
    let mut chars = type_name.chars();
    chars.next().map_or_else(String::new, |first| {
        format!("_{}{}", first.to_ascii_lowercase(), chars.as_str())
    })
}

/// Build the generated file for `metadata` with no custom content.
#[must_use]
pub fn build(metadata: &EntityMetadata, options: &GenerationOptions) -> DtoFile {
    let entity = metadata.name.as_str();
    let dto_name = options
        .dto_name
        .clone()
        .unwrap_or_else(|| options.dto_name_for(entity));

    let base_mapper = metadata.base_class.as_deref().map(|base| {
        let type_name = options.mapper_name_for(base);
        MapperRef {
            field: field_name(&type_name),
            type_name,
        }
    });
    let base_dto = metadata.base_class.as_deref().map(|base| {
        options
            .base_dto_name
            .clone()
            .unwrap_or_else(|| options.dto_name_for(base))
    });

    let mut members = Vec::new();
    let mut fields = Vec::new();
    let mut selectors = Vec::new();
    let mut statements = Vec::new();

    if let Some(base) = &base_mapper {
        fields.push(mapper_field(base));
        statements.push(Member::generated(None, base.delegation()));
    }

    for property in &metadata.properties {
        let name = property.name.as_str();
        match &property.relation {
            Relation::Simple => {
                members.push(Member::generated(
                    Some(name),
                    auto_property(&property.type_name, name),
                ));
                selectors.push(Member::generated(Some(name), format!("{name} = p.{name}")));
                statements.push(Member::generated(
                    Some(name),
                    format!("model.{name} = dto.{name};"),
                ));
            }
            Relation::Collection { entity: element } => {
                let mapper_type = options.mapper_name_for(element);
                let related = MapperRef {
                    field: field_name(&mapper_type),
                    type_name: mapper_type,
                };
                if !fields.iter().any(|f| f.name.as_deref() == Some(related.field.as_str())) {
                    fields.push(mapper_field(&related));
                }
                let element_dto = options.dto_name_for(element);
                members.push(Member::generated(
                    Some(name),
                    auto_property(&format!("IEnumerable<{element_dto}>"), name),
                ));
                selectors.push(Member::generated(
                    Some(name),
                    format!(
                        "{name} = p.{name}.AsQueryable().Select(this.{}.SelectorExpression)",
                        related.field
                    ),
                ));
            }
            Relation::Single { entity: target } => {
                flatten_single(property, target, &mut members, &mut selectors);
            }
        }
    }

    let namespace = options.namespace.clone().unwrap_or_else(|| {
        metadata
            .namespace
            .as_deref()
            .map_or_else(|| "DTO".to_string(), |ns| format!("{ns}.DTO"))
    });

    let mut usings: Vec<String> = Vec::new();
    let candidates = options
        .usings
        .iter()
        .chain(metadata.namespace.iter())
        .chain(metadata.usings.iter());
    for using in candidates {
        if !usings.contains(using) {
            usings.push(using.clone());
        }
    }

    DtoFile {
        global_usings: Vec::new(),
        usings,
        namespace,
        dto: DtoClass {
            name: dto_name.clone(),
            base: base_dto,
            members,
        },
        mapper: MapperClass {
            name: options.mapper_name_for(entity),
            base_type: options.mapper_base.clone(),
            entity: entity.to_string(),
            dto: dto_name,
            base_mapper,
            fields,
            selectors,
            statements,
        },
    }
}

fn flatten_single(
    property: &PropertyMetadata,
    target: &str,
    members: &mut Vec<Member>,
    selectors: &mut Vec<Member>,
) {
    let Some(related) = &property.related else {
        debug!(
            "skipping navigation {} to {target}: no metadata for the related entity",
            property.name
        );
        return;
    };

    let navigation = property.name.as_str();
    for inner in related
        .properties
        .iter()
        .filter(|p| p.relation == Relation::Simple)
    {
        let flat = format!("{navigation}{}", inner.name);
        members.push(Member::generated(
            Some(&flat),
            auto_property(&inner.type_name, &flat),
        ));
        selectors.push(Member::generated(
            Some(&flat),
            format!(
                "{flat} = p.{navigation} != null ? p.{navigation}.{} : default({})",
                inner.name, inner.type_name
            ),
        ));
    }
}

fn auto_property(type_name: &str, name: &str) -> String {
    format!("public {type_name} {name} {{ get; set; }}")
}

fn mapper_field(mapper: &MapperRef) -> Member {
    Member::generated(
        Some(&mapper.field),
        format!(
            "private {0} {1} = new {0}();",
            mapper.type_name, mapper.field
        ),
    )
}

#[cfg(test)]
#[path = "tests/skeleton.rs"]
mod tests;
