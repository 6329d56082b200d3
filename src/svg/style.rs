//! Embedded stylesheet resolution.
//!
//! Vendor exports style shapes through `<style>` blocks and `class`
//! attributes (`.cls-1{fill:#0078d4}`). Downstream consumers embed many
//! icons on one page, where those class names collide, so the rules are
//! flattened into a selector -> declaration map and inlined per element.
//!
//! Repeated selectors follow the cascade for a single origin: a later
//! declaration of the same property replaces the earlier value in place,
//! new properties are appended.

use lightningcss::properties::Property;
use lightningcss::rules::CssRule;
use lightningcss::stylesheet::{ParserOptions, PrinterOptions, StyleSheet};
use lightningcss::traits::ToCss;
use rustc_hash::FxHashMap;

use super::TransformError;
use super::ast::Document;

/// Ordered `property: value` pairs of one selector.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Declarations(Vec<(String, String)>);

impl Declarations {
    /// Add a declaration; an existing property is overridden in place.
    pub fn set(&mut self, property: &str, value: &str) {
        match self.0.iter_mut().find(|(name, _)| name == property) {
            Some(slot) => slot.1 = value.to_string(),
            None => self.0.push((property.to_string(), value.to_string())),
        }
    }

    pub fn extend(&mut self, other: &Declarations) {
        for (property, value) in &other.0 {
            self.set(property, value);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Render as an inline style string (`fill: red; stroke: none;`).
    pub fn to_style(&self) -> String {
        self.0
            .iter()
            .map(|(property, value)| format!("{property}: {value};"))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Selector -> flattened declarations of one document's stylesheets.
#[derive(Debug, Clone, Default)]
pub struct StyleRuleMap {
    rules: FxHashMap<String, Declarations>,
}

impl StyleRuleMap {
    /// Collect the rules of every `<style>` element in the document.
    pub fn from_document(doc: &Document) -> Result<Self, TransformError> {
        let mut map = Self::default();
        for id in doc.descendants() {
            if doc.is_element(id, "style") {
                map.add_stylesheet(&doc.text_content(id))?;
            }
        }
        Ok(map)
    }

    /// Parse one stylesheet and merge its style rules.
    ///
    /// At-rules (`@media`, `@font-face`, ...) cannot be inlined and are ignored.
    pub fn add_stylesheet(&mut self, css: &str) -> Result<(), TransformError> {
        if css.trim().is_empty() {
            return Ok(());
        }
        let sheet = StyleSheet::parse(css, ParserOptions::default())
            .map_err(|err| TransformError::Css(err.to_string()))?;

        for rule in &sheet.rules.0 {
            let CssRule::Style(style) = rule else {
                continue;
            };

            let mut declarations = Declarations::default();
            let block = &style.declarations;
            for property in block
                .declarations
                .iter()
                .chain(block.important_declarations.iter())
            {
                let (name, value) = render_property(property)?;
                declarations.set(&name, &value);
            }

            for selector in style.selectors.0.iter() {
                let key = selector
                    .to_css_string(PrinterOptions::default())
                    .map_err(|err| TransformError::Css(err.to_string()))?;
                self.rules.entry(key).or_default().extend(&declarations);
            }
        }
        Ok(())
    }

    pub fn get(&self, selector: &str) -> Option<&Declarations> {
        self.rules.get(selector)
    }

    /// Resolve a `class` attribute value, class by class in order.
    ///
    /// Returns `None` when no class has a rule.
    pub fn resolve_classes(&self, class_attr: &str) -> Option<Declarations> {
        let mut resolved = Declarations::default();
        let mut matched = false;
        for class in class_attr.split_whitespace() {
            if let Some(declarations) = self.rules.get(&format!(".{class}")) {
                resolved.extend(declarations);
                matched = true;
            }
        }
        matched.then_some(resolved)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

fn render_property(property: &Property<'_>) -> Result<(String, String), TransformError> {
    let name = property.property_id().name().to_string();
    let value = property
        .value_to_css_string(PrinterOptions::default())
        .map_err(|err| TransformError::Css(err.to_string()))?;
    Ok((name, value))
}

/// Parse an inline `style` attribute into declarations.
///
/// Used to keep an element's own inline style after class styles.
pub fn parse_inline_style(style: &str) -> Declarations {
    let mut declarations = Declarations::default();
    for item in style.split(';') {
        if let Some((property, value)) = item.split_once(':') {
            let (property, value) = (property.trim(), value.trim());
            if !property.is_empty() && !value.is_empty() {
                declarations.set(property, value);
            }
        }
    }
    declarations
}
