use super::{build, field_name, GenerationOptions, MapperRef, Origin};
use crate::metadata::{EntityMetadata, PropertyMetadata, Relation};

fn texts(members: &[super::Member]) -> Vec<&str> {
    members.iter().map(|m| m.text.as_str()).collect()
}

fn product() -> EntityMetadata {
    EntityMetadata {
        name: "Product".to_string(),
        namespace: Some("Shop.Domain".to_string()),
        properties: vec![
            PropertyMetadata::new("Id", "int"),
            PropertyMetadata::new("Name", "string"),
        ],
        ..EntityMetadata::default()
    }
}

#[test]
fn test_field_name_is_camel_cased_with_underscore() {
    assert_eq!(field_name("OrderLineMapper"), "_orderLineMapper");
    assert_eq!(field_name(""), "");
}

#[test]
fn test_simple_properties_fill_all_three_families() {
    let file = build(&product(), &GenerationOptions::default());

    assert_eq!(file.dto.name, "ProductDTO");
    assert_eq!(file.mapper.name, "ProductMapper");
    assert_eq!(
        texts(&file.dto.members),
        vec![
            "public int Id { get; set; }",
            "public string Name { get; set; }"
        ]
    );
    assert_eq!(texts(&file.mapper.selectors), vec!["Id = p.Id", "Name = p.Name"]);
    assert_eq!(
        texts(&file.mapper.statements),
        vec!["model.Id = dto.Id;", "model.Name = dto.Name;"]
    );
    assert!(file
        .dto
        .members
        .iter()
        .all(|m| m.origin == Origin::Generated));
}

#[test]
fn test_namespace_defaults() {
    let file = build(&product(), &GenerationOptions::default());
    assert_eq!(file.namespace, "Shop.Domain.DTO");

    let mut metadata = product();
    metadata.namespace = None;
    assert_eq!(build(&metadata, &GenerationOptions::default()).namespace, "DTO");

    let options = GenerationOptions {
        namespace: Some("Api".to_string()),
        ..GenerationOptions::default()
    };
    assert_eq!(build(&product(), &options).namespace, "Api");
}

#[test]
fn test_usings_are_deduplicated_in_order() {
    let mut metadata = product();
    metadata.usings = vec!["System".to_string(), "Shop.Common".to_string()];
    let file = build(&metadata, &GenerationOptions::default());

    assert_eq!(
        file.usings,
        vec![
            "System",
            "System.Collections.Generic",
            "System.Linq",
            "System.Linq.Expressions",
            "Shop.Domain",
            "Shop.Common"
        ]
    );
}

#[test]
fn test_base_class_delegation() {
    let mut metadata = product();
    metadata.base_class = Some("AuditedEntity".to_string());
    let file = build(&metadata, &GenerationOptions::default());

    assert_eq!(file.dto.base.as_deref(), Some("AuditedEntityDTO"));
    assert_eq!(
        file.mapper.base_mapper,
        Some(MapperRef {
            type_name: "AuditedEntityMapper".to_string(),
            field: "_auditedEntityMapper".to_string(),
        })
    );
    assert_eq!(
        file.mapper.statements[0].text,
        "this._auditedEntityMapper.MapToModel(dto, model);"
    );
    assert_eq!(
        file.mapper.fields[0].text,
        "private AuditedEntityMapper _auditedEntityMapper = new AuditedEntityMapper();"
    );
}

#[test]
fn test_explicit_names_override_suffixes() {
    let mut metadata = product();
    metadata.base_class = Some("AuditedEntity".to_string());
    let options = GenerationOptions {
        dto_name: Some("ProductModel".to_string()),
        base_dto_name: Some("AuditedModel".to_string()),
        ..GenerationOptions::default()
    };
    let file = build(&metadata, &options);

    assert_eq!(file.dto.name, "ProductModel");
    assert_eq!(file.mapper.dto, "ProductModel");
    assert_eq!(file.dto.base.as_deref(), Some("AuditedModel"));
}

#[test]
fn test_collection_gets_one_mapper_field() {
    let mut metadata = product();
    metadata
        .properties
        .push(PropertyMetadata::new("Tags", "ICollection<Tag>"));
    metadata
        .properties
        .push(PropertyMetadata::new("FeaturedTags", "List<Tag>"));
    let file = build(&metadata, &GenerationOptions::default());

    assert_eq!(
        texts(&file.mapper.fields),
        vec!["private TagMapper _tagMapper = new TagMapper();"]
    );
    assert!(texts(&file.dto.members).contains(&"public IEnumerable<TagDTO> Tags { get; set; }"));
    assert!(texts(&file.mapper.selectors)
        .contains(&"Tags = p.Tags.AsQueryable().Select(this._tagMapper.SelectorExpression)"));
    assert_eq!(file.mapper.statements.len(), 2);
}

#[test]
fn test_single_navigation_is_flattened() {
    let category = EntityMetadata {
        name: "Category".to_string(),
        properties: vec![
            PropertyMetadata::new("Title", "string"),
            PropertyMetadata::new("Items", "ICollection<Product>"),
        ],
        ..EntityMetadata::default()
    };
    let mut navigation = PropertyMetadata::new("Category", "Category");
    navigation.relation = Relation::Single {
        entity: "Category".to_string(),
    };
    navigation.related = Some(Box::new(category));

    let mut metadata = product();
    metadata.properties.push(navigation);
    let file = build(&metadata, &GenerationOptions::default());

    assert!(texts(&file.dto.members).contains(&"public string CategoryTitle { get; set; }"));
    assert!(!texts(&file.dto.members)
        .iter()
        .any(|t| t.contains("CategoryItems")));
    assert!(texts(&file.mapper.selectors).contains(
        &"CategoryTitle = p.Category != null ? p.Category.Title : default(string)"
    ));
    assert!(file.mapper.fields.is_empty());
}

#[test]
fn test_single_navigation_without_metadata_is_skipped() {
    let mut navigation = PropertyMetadata::new("Supplier", "Supplier");
    navigation.relation = Relation::Single {
        entity: "Supplier".to_string(),
    };
    let mut metadata = product();
    metadata.properties.push(navigation);
    let file = build(&metadata, &GenerationOptions::default());

    assert_eq!(file.dto.members.len(), 2);
    assert_eq!(file.mapper.selectors.len(), 2);
}
