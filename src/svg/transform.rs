//! Accessibility and sanitization rewrite of one vector document.
//!
//! Steps, in order, over the parsed tree:
//!
//! 1. collect `<style>` rules into a [`StyleRuleMap`]
//! 2. replace every `class` with the resolved inline `style`
//! 3. drop every `data-*` attribute
//! 4. replace any `<title>` of the root with a single injected one,
//!    referenced by `aria-labelledby`
//!
//! A stylesheet that fails to parse fails the whole document: passing it
//! through would publish an icon whose classes resolve to nothing.

use super::TransformError;
use super::ast::{Attr, Document};
use super::style::{StyleRuleMap, parse_inline_style};

/// Id of the injected title element (before id prefixing).
pub const TITLE_ID: &str = "icon-name";

/// Rewrite markup, injecting `label` as the document title.
pub fn rewrite(markup: &str, label: &str) -> Result<String, TransformError> {
    let mut doc = Document::parse(markup)?;
    rewrite_document(&mut doc, label)?;
    Ok(doc.to_markup())
}

/// In-place rewrite of a parsed document.
pub fn rewrite_document(doc: &mut Document, label: &str) -> Result<(), TransformError> {
    let root = doc.root();
    if !doc.is_element(root, "svg") {
        let name = doc.name(root).unwrap_or_default().to_string();
        return Err(TransformError::NotSvg(name));
    }

    let rules = StyleRuleMap::from_document(doc)?;
    for id in doc.descendants() {
        inline_class_styles(doc, id, &rules);
        doc.retain_attrs(id, |attr| !is_data_attr(&attr.name));
    }

    inject_title(doc, label);
    Ok(())
}

/// Replace `class` by the resolved declarations, keeping inline style last.
fn inline_class_styles(doc: &mut Document, id: usize, rules: &StyleRuleMap) {
    let Some(class) = doc.remove_attr(id, "class") else {
        return;
    };
    let Some(mut declarations) = rules.resolve_classes(&class) else {
        return;
    };
    if let Some(inline) = doc.attr(id, "style") {
        declarations.extend(&parse_inline_style(inline));
    }
    doc.set_attr(id, "style", declarations.to_style());
}

#[inline]
fn is_data_attr(name: &str) -> bool {
    name.strip_prefix("data-").is_some_and(|rest| !rest.is_empty())
}

/// Make the root carry exactly one title, as its first child.
fn inject_title(doc: &mut Document, label: &str) {
    let root = doc.root();
    let stale: Vec<_> = doc
        .children(root)
        .iter()
        .copied()
        .filter(|&child| doc.is_element(child, "title"))
        .collect();
    for child in stale {
        doc.detach(child);
    }

    let title = doc.create_element(
        "title",
        vec![Attr {
            name: "id".into(),
            value: TITLE_ID.into(),
        }],
    );
    let text = doc.create_text(label);
    doc.append_child(title, text);
    doc.insert_child(root, 0, title);
    doc.set_attr(root, "aria-labelledby", TITLE_ID);
}
