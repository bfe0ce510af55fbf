//! Renders a [`DtoFile`] to C# source text.
//!
//! Layout is fixed: generated entries first, then the custom block of each family bracketed by
//! that family's sentinel pair. The sentinels are always written, even around an empty block, so
//! a developer knows where hand-written code belongs and the next regeneration can find it.

use crate::markers::{MarkerFamily, MarkerPair};
use crate::skeleton::{DtoClass, DtoFile, MapperClass, Member};

struct Writer {
    out: String,
    unit: String,
}

impl Writer {
    fn new(indent_width: usize) -> Self {
        Self {
            out: String::new(),
            unit: " ".repeat(indent_width),
        }
    }

    /// Write `text` at `depth`. Continuation lines keep their indentation relative to the first.
    fn line(&mut self, depth: usize, text: &str) {
        let indent = self.unit.repeat(depth);
        for line in text.lines() {
            if !line.trim().is_empty() {
                self.out.push_str(&indent);
                self.out.push_str(line.trim_end());
            }
            self.out.push('\n');
        }
        if text.is_empty() {
            self.out.push('\n');
        }
    }

    fn blank(&mut self) {
        self.out.push('\n');
    }

    /// Generated entries, then the custom ones between the family's sentinels.
    fn sequence(&mut self, depth: usize, members: &[Member], sentinel: MarkerPair, sep: &str) {
        for member in members.iter().filter(|m| !m.is_custom()) {
            self.line(depth, &format!("{}{sep}", member.text));
        }
        self.line(depth, sentinel.begin);
        for member in members.iter().filter(|m| m.is_custom()) {
            self.line(depth, &format!("{}{sep}", member.text));
        }
        self.line(depth, sentinel.end);
    }
}

#[must_use]
/// Render `file` as C# source using `indent_width` spaces per level.
pub fn render(file: &DtoFile, indent_width: usize) -> String {
    let mut w = Writer::new(indent_width);

    for using in &file.global_usings {
        w.line(0, &format!("global using {using};"));
    }
    for using in &file.usings {
        w.line(0, &format!("using {using};"));
    }
    if !file.usings.is_empty() || !file.global_usings.is_empty() {
        w.blank();
    }

    w.line(0, &format!("namespace {}", file.namespace));
    w.line(0, "{");
    render_dto(&mut w, &file.dto);
    w.blank();
    render_mapper(&mut w, &file.mapper);
    w.line(0, "}");

    w.out
}

fn render_dto(w: &mut Writer, dto: &DtoClass) {
    match &dto.base {
        Some(base) => w.line(1, &format!("public class {} : {base}", dto.name)),
        None => w.line(1, &format!("public class {}", dto.name)),
    }
    w.line(1, "{");
    w.sequence(
        2,
        &dto.members,
        MarkerFamily::Declarations.sentinel(),
        "",
    );
    w.line(1, "}");
}

fn render_mapper(w: &mut Writer, mapper: &MapperClass) {
    let (entity, dto) = (&mapper.entity, &mapper.dto);
    let expression_type = format!("Expression<Func<{entity}, {dto}>>");

    w.line(
        1,
        &format!(
            "public class {} : {}<{entity}, {dto}>",
            mapper.name, mapper.base_type
        ),
    );
    w.line(1, "{");

    for field in &mapper.fields {
        w.line(2, &field.text);
    }
    if !mapper.fields.is_empty() {
        w.blank();
    }

    w.line(
        2,
        &format!("public override {expression_type} SelectorExpression"),
    );
    w.line(2, "{");
    w.line(3, "get");
    w.line(3, "{");
    w.line(4, &format!("{expression_type} selector = p => new {dto}()"));
    w.line(4, "{");
    w.sequence(
        5,
        &mapper.selectors,
        MarkerFamily::SelectorList.sentinel(),
        ",",
    );
    w.line(4, "};");
    match &mapper.base_mapper {
        Some(base) => w.line(
            4,
            &format!(
                "return selector.MergeWith(this.{}.SelectorExpression);",
                base.field
            ),
        ),
        None => w.line(4, "return selector;"),
    }
    w.line(3, "}");
    w.line(2, "}");
    w.blank();

    w.line(
        2,
        &format!("public override void MapToModel({dto} dto, {entity} model)"),
    );
    w.line(2, "{");
    w.sequence(
        3,
        &mapper.statements,
        MarkerFamily::StatementList.sentinel(),
        "",
    );
    w.line(2, "}");
    w.line(1, "}");
}

#[cfg(test)]
#[path = "tests/render.rs"]
mod tests;
