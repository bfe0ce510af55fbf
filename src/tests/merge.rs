use super::merge;
use crate::error::{Artifact, Error};
use crate::markers::MarkerFamily;
use crate::metadata::{EntityMetadata, PropertyMetadata, Relation};
use crate::skeleton::GenerationOptions;

const PREVIOUS: &str = r"using System;
using System.Collections.Generic;
using System.Linq;
using System.Linq.Expressions;
using Shop.Domain;
using Shop.Extras;

namespace Shop.Dto
{
    public class OrderDTO
    {
        public int Id { get; set; }
        public DateTime? Date { get; set; }
        ////BCPS/
        /// <summary>Computed on the client.</summary>
        public int CustomProperty { get; set; }
        ////ECPS/
    }

    public class OrderMapper : MapperBase<Order, OrderDTO>
    {
        public override Expression<Func<Order, OrderDTO>> SelectorExpression
        {
            get
            {
                Expression<Func<Order, OrderDTO>> selector = p => new OrderDTO()
                {
                    Id = p.Id,
                    Date = p.Date,
                    ////BCSS/
                    CustomProperty = p.Lines.Count(),
                    ////ECSS/
                };
                return selector;
            }
        }

        public override void MapToModel(OrderDTO dto, Order model)
        {
            model.Id = dto.Id;
            model.Date = dto.Date;
            ////BCMS/
            // keep audit trail
            model.Touched = true;
            ////ECMS/
        }
    }
}
";

fn order(with_date: bool) -> EntityMetadata {
    let mut properties = vec![PropertyMetadata::new("Id", "int")];
    if with_date {
        properties.push(PropertyMetadata::new("Date", "DateTime?"));
    }
    EntityMetadata {
        name: "Order".to_string(),
        namespace: Some("Shop.Domain".to_string()),
        properties,
        ..EntityMetadata::default()
    }
}

fn full_entity() -> EntityMetadata {
    let customer = EntityMetadata {
        name: "Customer".to_string(),
        properties: vec![
            PropertyMetadata::new("Email", "string"),
            PropertyMetadata::new("Rating", "int?"),
        ],
        ..EntityMetadata::default()
    };
    let mut navigation = PropertyMetadata::new("Customer", "Customer");
    navigation.relation = Relation::Single {
        entity: "Customer".to_string(),
    };
    navigation.related = Some(Box::new(customer));

    EntityMetadata {
        name: "Order".to_string(),
        namespace: Some("Shop.Domain".to_string()),
        base_class: Some("EntityBase".to_string()),
        properties: vec![
            PropertyMetadata::new("Id", "int"),
            PropertyMetadata::new("Date", "DateTime?"),
            navigation,
            PropertyMetadata::new("Lines", "ICollection<OrderLine>"),
        ],
        usings: vec!["System".to_string()],
    }
}

fn between<'a>(text: &'a str, begin: &str, end: &str) -> &'a str {
    let start = text.find(begin).unwrap() + begin.len();
    let stop = text.find(end).unwrap();
    &text[start..stop]
}

#[test]
fn test_fresh_generation_without_previous() {
    let options = GenerationOptions::default();
    let result = merge(&order(true), None, &options).unwrap();
    let text = result.render(4);

    assert_eq!(result.custom_declarations, 0);
    assert!(result.declarations.first.is_none());
    assert!(text.contains("namespace Shop.Domain.DTO"));
    assert!(text.contains("using Shop.Domain;"));
    assert!(text.contains("public class OrderDTO\n"));
    assert!(text.contains("        public DateTime? Date { get; set; }\n"));
    assert!(text.contains("                    Date = p.Date,\n"));
    assert!(text.contains("            model.Date = dto.Date;\n"));
    assert!(text.contains("public class OrderMapper : MapperBase<Order, OrderDTO>"));
    assert!(text.contains("return selector;"));
    assert_eq!(between(&text, "////BCC/", "////ECC/").trim(), "");
}

#[test]
fn test_custom_property_survives_and_removed_property_disappears() {
    let options = GenerationOptions::default();
    let result = merge(&order(false), Some(PREVIOUS), &options).unwrap();
    let text = result.render(4);

    assert!(text.contains("public int CustomProperty { get; set; }"));
    assert!(text.contains("/// <summary>Computed on the client.</summary>"));
    assert!(!text.contains("Date"), "dropped property must not survive:\n{text}");

    let custom = between(&text, "////BCC/", "////ECC/");
    assert!(custom.contains("public int CustomProperty { get; set; }"));
    assert!(!custom.contains("public int Id"));

    assert_eq!(result.custom_declarations, 1);
    let first = result.declarations.first.unwrap();
    assert_eq!(first.position, 1, "custom member follows the generated Id");
    assert_eq!(result.declarations.last, Some(first));
    assert_eq!(
        &PREVIOUS[first.span.start..first.span.end],
        "public int CustomProperty { get; set; }"
    );
}

#[test]
fn test_custom_selector_entry_follows_generated_entries() {
    let options = GenerationOptions::default();
    let result = merge(&order(true), Some(PREVIOUS), &options).unwrap();
    let text = result.render(4);

    let id = text.find("Id = p.Id,").unwrap();
    let date = text.find("Date = p.Date,").unwrap();
    let custom = text.find("CustomProperty = p.Lines.Count(),").unwrap();
    assert!(id < date && date < custom);
    assert_eq!(text.matches("Date = p.Date").count(), 1);

    let selectors = &result.file.mapper.selectors;
    assert_eq!(selectors.len(), 3);
    assert!(selectors[2].is_custom());
    assert_eq!(result.selectors.first.map(|r| r.position), Some(2));
}

#[test]
fn test_custom_statements_kept_with_their_comments() {
    let options = GenerationOptions::default();
    let result = merge(&order(false), Some(PREVIOUS), &options).unwrap();
    let text = result.render(4);

    assert!(text.contains("            // keep audit trail\n            model.Touched = true;\n"));
    assert!(!text.contains("model.Date"));
    assert_eq!(result.statements.first.map(|r| r.position), Some(1));
}

#[test]
fn test_scanning_markers_never_reach_output() {
    let options = GenerationOptions::default();
    let text = merge(&order(true), Some(PREVIOUS), &options)
        .unwrap()
        .render(4);

    for family in MarkerFamily::ALL {
        let pair = family.scanning();
        assert!(!text.contains(pair.begin), "{} leaked", pair.begin);
        assert!(!text.contains(pair.end), "{} leaked", pair.end);
        assert_eq!(text.matches(family.sentinel().begin).count(), 1);
        assert_eq!(text.matches(family.sentinel().end).count(), 1);
    }
}

#[test]
fn test_previous_namespace_and_usings_are_kept() {
    let options = GenerationOptions::default();
    let text = merge(&order(true), Some(PREVIOUS), &options)
        .unwrap()
        .render(4);

    assert!(text.contains("namespace Shop.Dto\n"));
    assert!(text.contains("using Shop.Extras;"));
    assert_eq!(text.matches("using System.Linq;").count(), 1);
}

#[test]
fn test_explicit_namespace_wins_over_previous() {
    let options = GenerationOptions {
        namespace: Some("Shop.Api.Models".to_string()),
        ..GenerationOptions::default()
    };
    let text = merge(&order(true), Some(PREVIOUS), &options)
        .unwrap()
        .render(4);
    assert!(text.contains("namespace Shop.Api.Models\n"));
}

#[test]
fn test_half_marker_pair_equals_fresh_generation() {
    let previous = PREVIOUS.replace("        ////ECPS/\n", "");
    let options = GenerationOptions::default();

    let fresh = merge(&order(true), None, &options).unwrap();
    let merged = merge(&order(true), Some(&previous), &options).unwrap();

    assert_eq!(merged.custom_declarations, 0);
    assert_eq!(merged.file.dto.members, fresh.file.dto.members);
    assert!(!merged.render(4).contains("CustomProperty { get; set; }"));
}

#[test]
fn test_remerging_fresh_output_is_idempotent() {
    let options = GenerationOptions::default();
    let fresh = merge(&full_entity(), None, &options).unwrap().render(4);
    let again = merge(&full_entity(), Some(&fresh), &options)
        .unwrap()
        .render(4);

    assert_eq!(fresh, again);
}

#[test]
fn test_custom_code_is_stable_across_generations() {
    let options = GenerationOptions::default();
    let first = merge(&order(true), Some(PREVIOUS), &options)
        .unwrap()
        .render(4);
    let second = merge(&order(true), Some(&first), &options).unwrap();

    assert_eq!(second.render(4), first);
    assert_eq!(second.custom_declarations, 1);
}

#[test]
fn test_base_class_wiring() {
    let options = GenerationOptions::default();
    let result = merge(&full_entity(), Some(PREVIOUS), &options).unwrap();
    let text = result.render(4);

    assert!(text.contains("public class OrderDTO : EntityBaseDTO\n"));
    assert!(text.contains("private EntityBaseMapper _entityBaseMapper = new EntityBaseMapper();"));
    assert!(text.contains("return selector.MergeWith(this._entityBaseMapper.SelectorExpression);"));

    let delegation = text
        .find("this._entityBaseMapper.MapToModel(dto, model);")
        .unwrap();
    let generated = text.find("model.Id = dto.Id;").unwrap();
    let custom = text.find("model.Touched = true;").unwrap();
    assert!(delegation < generated && generated < custom);
}

#[test]
fn test_delegation_call_is_never_duplicated() {
    let options = GenerationOptions::default();
    let fresh = merge(&full_entity(), None, &options).unwrap().render(4);
    let again = merge(&full_entity(), Some(&fresh), &options)
        .unwrap()
        .render(4);

    assert_eq!(again.matches(".MapToModel(dto, model);").count(), 1);
}

#[test]
fn test_relations_are_expanded() {
    let options = GenerationOptions::default();
    let text = merge(&full_entity(), None, &options).unwrap().render(4);

    assert!(text.contains("public string CustomerEmail { get; set; }"));
    assert!(text.contains(
        "CustomerRating = p.Customer != null ? p.Customer.Rating : default(int?),"
    ));
    assert!(text.contains("public IEnumerable<OrderLineDTO> Lines { get; set; }"));
    assert!(text.contains("private OrderLineMapper _orderLineMapper = new OrderLineMapper();"));
    assert!(text.contains(
        "Lines = p.Lines.AsQueryable().Select(this._orderLineMapper.SelectorExpression),"
    ));
    assert!(!text.contains("model.Lines"));
    assert!(!text.contains("model.Customer"));
}

#[test]
fn test_custom_declaration_replaces_generated_namesake() {
    let previous = PREVIOUS.replace(
        "        ////ECPS/\n",
        "        [Required]\n        public int Id { get; set; }\n        ////ECPS/\n",
    );
    let options = GenerationOptions::default();
    let result = merge(&order(true), Some(&previous), &options).unwrap();
    let text = result.render(4);

    assert_eq!(text.matches("public int Id { get; set; }").count(), 1);
    let custom = between(&text, "////BCC/", "////ECC/");
    assert!(custom.contains("[Required]"));
    assert_eq!(result.custom_declarations, 2);
    assert_eq!(result.declarations.first.map(|r| r.position), Some(1));
    assert_eq!(result.declarations.last.map(|r| r.position), Some(2));
}

#[test]
fn test_mapper_declarations_are_never_preserved() {
    let previous = r"namespace Shop.Dto
{
    public class OrderDTO
    {
        public int Id { get; set; }
    }

    public class OrderMapper : MapperBase<Order, OrderDTO>
    {
        ////BCPS/
        private readonly Clock _clock = new Clock();
        ////ECPS/
    }
}
";
    let options = GenerationOptions::default();
    let result = merge(&order(true), Some(previous), &options).unwrap();

    assert_eq!(result.custom_declarations, 0);
    assert!(!result.render(4).contains("_clock"));
}

#[test]
fn test_unparseable_previous_file_is_fatal() {
    let options = GenerationOptions::default();
    let err = merge(&order(true), Some("public class OrderDTO {"), &options).unwrap_err();

    assert!(matches!(
        err,
        Error::Parse {
            artifact: Artifact::PreviousDto,
            ..
        }
    ));
}

#[test]
fn test_invalid_metadata_is_fatal() {
    let mut metadata = order(true);
    metadata.properties.push(PropertyMetadata::new("Bad Name", "int"));
    let err = merge(&metadata, None, &GenerationOptions::default()).unwrap_err();
    assert!(matches!(err, Error::InvalidMetadata { .. }));
}

#[test]
fn test_preserved_base_call_does_not_displace_the_synthesized_one() {
    let previous = PREVIOUS.replace(
        "            ////BCMS/\n",
        "            ////BCMS/\n            this._entityBaseMapper.MapToModel(dto, model);\n",
    );
    let options = GenerationOptions::default();
    let result = merge(&full_entity(), Some(&previous), &options).unwrap();

    let statements = &result.file.mapper.statements;
    assert_eq!(
        statements[0].text,
        "this._entityBaseMapper.MapToModel(dto, model);"
    );
    assert!(!statements[0].is_custom());
    assert_eq!(statements.iter().filter(|m| m.is_custom()).count(), 1);
    assert_eq!(result.statements.first.map(|r| r.position), Some(3));

    let text = result.render(4);
    assert_eq!(text.matches(".MapToModel(dto, model);").count(), 1);
    assert!(text.contains("model.Touched = true;"));
}

#[test]
fn test_commented_custom_statement_replaces_generated_twin() {
    let previous = PREVIOUS.replace(
        "            ////ECMS/\n",
        "            // set by hand\n            model.Id = dto.Id;\n            ////ECMS/\n",
    );
    let options = GenerationOptions::default();
    let text = merge(&order(true), Some(&previous), &options)
        .unwrap()
        .render(4);

    assert_eq!(text.matches("model.Id = dto.Id;").count(), 1);
    let custom = between(&text, "////BCCM/", "////ECCM/");
    assert!(custom.contains("// set by hand\n            model.Id = dto.Id;"));
}

#[test]
fn test_global_and_static_usings_survive_regeneration() {
    let previous = format!("global using Shop.Shared;\nusing static System.Math;\n{PREVIOUS}");
    let options = GenerationOptions::default();
    let first = merge(&order(true), Some(&previous), &options)
        .unwrap()
        .render(4);

    assert!(first.starts_with("global using Shop.Shared;\nusing System;\n"));
    assert!(first.contains("\nusing static System.Math;\n"));
    assert!(!first.contains("using global"));

    let second = merge(&order(true), Some(&first), &options).unwrap();
    assert_eq!(second.render(4), first);
    assert_eq!(second.file.global_usings, vec!["Shop.Shared"]);
}
