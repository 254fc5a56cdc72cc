//! Form field primitives: what a renderer needs to draw one input.
//!
//! Stateless. A field's props are derived from the resource definition, the
//! draft, and the view mode each time the form is drawn.

use crate::record::Draft;
use crate::resource::{FieldKind, Resource};
use crate::views::detail::DetailMode;

#[cfg(test)]
#[path = "form_test.rs"]
mod tests;

/// Widget a field renders as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Widget {
    Input,
    TextArea,
    Checkbox,
    Select,
    File,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldProps {
    pub name: &'static str,
    pub label: &'static str,
    pub value: String,
    pub widget: Widget,
    /// HTML-style input type hint (`text`, `number`, `date`).
    pub input_type: &'static str,
    pub options: &'static [&'static str],
    pub required: bool,
    pub read_only: bool,
}

/// Props for every field of `resource`. View mode and unwritable resources
/// lock every field; edit mode also locks create-only fields.
#[must_use]
pub fn form_fields(resource: &Resource, draft: &Draft, mode: DetailMode) -> Vec<FieldProps> {
    let locked = mode == DetailMode::View || !resource.writable;
    resource
        .fields
        .iter()
        .map(|spec| {
            let (widget, input_type, options): (Widget, &'static str, &'static [&'static str]) = match spec.kind {
                FieldKind::Text => (Widget::Input, "text", &[]),
                FieldKind::TextArea => (Widget::TextArea, "text", &[]),
                FieldKind::Integer | FieldKind::Decimal => (Widget::Input, "number", &[]),
                FieldKind::Date => (Widget::Input, "date", &[]),
                FieldKind::Boolean => (Widget::Checkbox, "checkbox", &[]),
                FieldKind::Select(opts) => (Widget::Select, "text", opts),
                FieldKind::Image => (Widget::File, "file", &[]),
            };
            FieldProps {
                name: spec.name,
                label: spec.label,
                value: draft.text(spec.name),
                widget,
                input_type,
                options,
                required: spec.required,
                read_only: locked || spec.read_only || (spec.create_only && mode == DetailMode::Edit),
            }
        })
        .collect()
}
