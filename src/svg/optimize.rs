//! Structural optimization using usvg.
//!
//! usvg does the heavy lifting: it resolves remaining styles into
//! presentation attributes, converts basic shapes to paths, drops
//! non-rendering nodes and rounds numbers. Around it this pass:
//!
//! - keeps the source root `viewBox` verbatim (derived from the size only
//!   when the source has none)
//! - drops root `width`/`height` so consumers size icons with their own CSS
//! - carries the title and `aria-labelledby` over, since usvg discards them
//! - drops the empty `<defs/>` usvg always writes
//! - prefixes every id so icons embedded on one page never collide
//!
//! usvg flattens the viewBox into a transform on a wrapper group. The root
//! size is pinned to the viewBox size first, so that wrapper holds at most a
//! translation, which is removed again once the viewBox is restored.
//!
//! Text is rejected: usvg is built without font support and would silently
//! drop every `<text>` element.
//!
//! The output is a fixed point: optimizing it again returns it unchanged.

use rustc_hash::FxHashMap;

use super::TransformError;
use super::ast::{Attr, Document, NodeId};

/// Options for the optimization pass
#[derive(Debug, Clone)]
pub struct OptimizeOptions {
    /// Decimal places kept for coordinates and transforms.
    pub precision: u8,
    /// Prefix applied to every internal id (`None` keeps ids as they are).
    pub id_prefix: Option<String>,
}

impl Default for OptimizeOptions {
    fn default() -> Self {
        Self {
            precision: 3,
            id_prefix: None,
        }
    }
}

/// Accessible title carried across the usvg round trip.
struct Title {
    attrs: Vec<Attr>,
    text: String,
}

/// Source root `viewBox`, raw and parsed.
struct ViewBox {
    raw: String,
    x: f64,
    y: f64,
    width: f64,
    height: f64,
}

impl ViewBox {
    fn parse(raw: &str) -> Option<Self> {
        let mut numbers = split_numbers(raw);
        let view_box = Self {
            raw: raw.to_string(),
            x: numbers.next()??,
            y: numbers.next()??,
            width: numbers.next()??,
            height: numbers.next()??,
        };
        let valid = numbers.next().is_none() && view_box.width > 0.0 && view_box.height > 0.0;
        valid.then_some(view_box)
    }
}

/// Optimize markup.
pub fn optimize(markup: &str, options: &OptimizeOptions) -> Result<String, TransformError> {
    let mut source = Document::parse(markup)?;
    if source
        .descendants()
        .into_iter()
        .any(|id| source.is_element(id, "text"))
    {
        return Err(TransformError::Optimize(
            "<text> cannot be converted without fonts".into(),
        ));
    }

    let source_root = source.root();
    let title = find_title(&source);
    let labelled_by = source
        .attr(source_root, "aria-labelledby")
        .map(str::to_string);
    let view_box = source.attr(source_root, "viewBox").and_then(ViewBox::parse);
    if let Some(view_box) = &view_box {
        source.set_attr(source_root, "width", view_box.width.to_string());
        source.set_attr(source_root, "height", view_box.height.to_string());
    }
    let input = source.to_markup();

    let usvg_options = usvg::Options::default();
    let tree = usvg::Tree::from_data(input.as_bytes(), &usvg_options)
        .map_err(|err| TransformError::Optimize(err.to_string()))?;

    let write_options = usvg::WriteOptions {
        indent: usvg::Indent::None,
        coordinates_precision: options.precision,
        transforms_precision: options.precision,
        ..Default::default()
    };
    let written = tree.to_string(&write_options);

    let mut doc = Document::parse(&written)?;
    let root = doc.root();
    drop_empty_defs(&mut doc);
    let restored = view_box
        .as_ref()
        .is_some_and(|view_box| restore_viewbox(&mut doc, root, view_box, options.precision));
    drop_dimensions(&mut doc, root, restored);

    if let Some(title) = title {
        let node = doc.create_element("title", title.attrs);
        let text = doc.create_text(&title.text);
        doc.append_child(node, text);
        doc.insert_child(root, 0, node);
    }
    if let Some(labelled_by) = labelled_by {
        doc.set_attr(root, "aria-labelledby", labelled_by);
    }

    if let Some(prefix) = &options.id_prefix {
        prefix_ids(&mut doc, prefix);
    }

    Ok(doc.to_markup())
}

fn find_title(doc: &Document) -> Option<Title> {
    let id = doc
        .children(doc.root())
        .iter()
        .copied()
        .find(|&child| doc.is_element(child, "title"))?;
    Some(Title {
        attrs: doc.attrs(id).to_vec(),
        text: doc.text_content(id),
    })
}

/// Numbers of a list attribute (`viewBox`, `matrix(...)` arguments).
fn split_numbers(value: &str) -> impl Iterator<Item = Option<f64>> + '_ {
    value
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|part| !part.is_empty())
        .map(|part| part.parse().ok())
}

fn drop_empty_defs(doc: &mut Document) {
    let empty: Vec<NodeId> = doc
        .descendants()
        .into_iter()
        .filter(|&id| doc.is_element(id, "defs"))
        .filter(|&id| doc.children(id).iter().all(|&child| doc.name(child).is_none()))
        .collect();
    for id in empty {
        doc.detach(id);
    }
}

/// Put the source viewBox back, removing the translation usvg added for it.
///
/// Returns `false` when the written tree does not have the expected shape;
/// usvg's own viewBox and transform are then kept as written.
fn restore_viewbox(doc: &mut Document, root: NodeId, view_box: &ViewBox, precision: u8) -> bool {
    let tolerance = 10f64.powi(-i32::from(precision));
    let expected = [1.0, 0.0, 0.0, 1.0, -view_box.x, -view_box.y];
    let is_identity = expected[4].abs() <= tolerance && expected[5].abs() <= tolerance;

    let elements: Vec<NodeId> = doc
        .children(root)
        .iter()
        .copied()
        .filter(|&child| doc.name(child).is_some() && !doc.is_element(child, "defs"))
        .collect();
    let wrapper = match elements.as_slice() {
        [only] if doc.is_element(*only, "g") => doc
            .attr(*only, "transform")
            .and_then(parse_matrix)
            .map(|matrix| (*only, matrix)),
        _ => None,
    };

    match wrapper {
        Some((group, matrix)) => {
            let matches = matrix
                .iter()
                .zip(expected)
                .all(|(found, wanted)| (found - wanted).abs() <= tolerance);
            if !matches {
                return false;
            }
            doc.remove_attr(group, "transform");
            if doc.attrs(group).is_empty() {
                unwrap_group(doc, root, group);
            }
        }
        None if !is_identity => return false,
        None => {}
    }

    doc.set_attr(root, "viewBox", view_box.raw.clone());
    true
}

fn parse_matrix(value: &str) -> Option<[f64; 6]> {
    let args = value.trim().strip_prefix("matrix(")?.strip_suffix(')')?;
    let mut numbers = split_numbers(args);
    let mut matrix = [0.0; 6];
    for slot in &mut matrix {
        *slot = numbers.next()??;
    }
    numbers.next().is_none().then_some(matrix)
}

/// Replace `group` with its children.
fn unwrap_group(doc: &mut Document, root: NodeId, group: NodeId) {
    let Some(index) = doc.children(root).iter().position(|&child| child == group) else {
        return;
    };
    let moved = doc.children(group).to_vec();
    doc.detach(group);
    for (offset, child) in moved.into_iter().enumerate() {
        doc.insert_child(root, index + offset, child);
    }
}

/// Drop root `width`/`height`, deriving a viewBox from them if none is kept.
fn drop_dimensions(doc: &mut Document, root: NodeId, view_box_kept: bool) {
    let width = doc.remove_attr(root, "width");
    let height = doc.remove_attr(root, "height");
    if !view_box_kept
        && doc.attr(root, "viewBox").is_none()
        && let (Some(width), Some(height)) = (width, height)
    {
        doc.set_attr(root, "viewBox", format!("0 0 {width} {height}"));
    }
}

// ============================================================================
// Id prefixing
// ============================================================================

/// Attributes holding a whitespace-separated list of id references.
const ID_LIST_ATTRS: &[&str] = &["aria-labelledby", "aria-describedby"];

/// Prefix every id not already prefixed, rewriting references to it.
pub fn prefix_ids(doc: &mut Document, prefix: &str) {
    let elements: Vec<NodeId> = doc
        .descendants()
        .into_iter()
        .filter(|&id| doc.name(id).is_some())
        .collect();

    let mut renamed: FxHashMap<String, String> = FxHashMap::default();
    for &id in &elements {
        if let Some(old) = doc.attr(id, "id")
            && !old.starts_with(prefix)
        {
            let new = format!("{prefix}{old}");
            renamed.insert(old.to_string(), new.clone());
            doc.set_attr(id, "id", new);
        }
    }
    if renamed.is_empty() {
        return;
    }

    for &id in &elements {
        let Some(attrs) = doc.attrs_mut(id) else {
            continue;
        };
        for attr in attrs.iter_mut() {
            if let Some(value) = rewrite_references(&attr.name, &attr.value, &renamed) {
                attr.value = value;
            }
        }
    }
}

/// New attribute value if it references a renamed id.
fn rewrite_references(
    name: &str,
    value: &str,
    renamed: &FxHashMap<String, String>,
) -> Option<String> {
    if name == "href" || name == "xlink:href" {
        let target = value.strip_prefix('#')?;
        return renamed.get(target).map(|new| format!("#{new}"));
    }

    if ID_LIST_ATTRS.contains(&name) {
        let mut changed = false;
        let tokens: Vec<&str> = value
            .split_whitespace()
            .map(|token| match renamed.get(token) {
                Some(new) => {
                    changed = true;
                    new.as_str()
                }
                None => token,
            })
            .collect();
        return changed.then(|| tokens.join(" "));
    }

    if !value.contains("url(#") {
        return None;
    }
    let mut out = String::with_capacity(value.len() + 16);
    let mut rest = value;
    let mut changed = false;
    while let Some(start) = rest.find("url(#") {
        let (head, tail) = rest.split_at(start + "url(#".len());
        out.push_str(head);
        let end = tail.find(')').unwrap_or(tail.len());
        let target = &tail[..end];
        match renamed.get(target) {
            Some(new) => {
                out.push_str(new);
                changed = true;
            }
            None => out.push_str(target),
        }
        rest = &tail[end..];
    }
    out.push_str(rest);
    changed.then_some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRANSFORMED: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 24 24" width="48" height="48" aria-labelledby="icon-name"><title id="icon-name">AWS Lambda</title><defs><linearGradient id="grad" x1="0" y1="0" x2="1" y2="1"><stop offset="0" stop-color="#c8511b"/><stop offset="1" stop-color="#f90"/></linearGradient></defs><rect id="bg" x="2" y="2" width="20" height="20" style="fill: url(#grad);"/><path d="M4.123456 4L20 20" style="stroke: #000; stroke-width: 1.5;"/></svg>"##;

    fn options() -> OptimizeOptions {
        OptimizeOptions {
            precision: 3,
            id_prefix: Some("aws-lambda__".into()),
        }
    }

    #[test]
    fn test_viewbox_kept_dimensions_dropped() {
        let markup = optimize(TRANSFORMED, &options()).unwrap();
        let doc = Document::parse(&markup).unwrap();
        let root = doc.root();
        assert!(doc.attr(root, "viewBox").is_some());
        assert_eq!(doc.attr(root, "width"), None);
        assert_eq!(doc.attr(root, "height"), None);
    }

    #[test]
    fn test_title_survives_and_ids_prefixed() {
        let markup = optimize(TRANSFORMED, &options()).unwrap();
        let doc = Document::parse(&markup).unwrap();
        let root = doc.root();

        let first = doc.children(root)[0];
        assert!(doc.is_element(first, "title"));
        assert_eq!(doc.text_content(first), "AWS Lambda");
        assert_eq!(doc.attr(first, "id"), Some("aws-lambda__icon-name"));
        assert_eq!(doc.attr(root, "aria-labelledby"), Some("aws-lambda__icon-name"));

        for id in doc.descendants() {
            if let Some(value) = doc.attr(id, "id") {
                assert!(value.starts_with("aws-lambda__"), "{value} not prefixed");
            }
        }
        assert!(!markup.contains("style="));
    }

    const SCALED: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 24 24" width="48" height="48" aria-labelledby="icon-name"><title id="icon-name">GCP Storage</title><rect id="bg" x="2" y="2" width="20" height="20" style="fill: #4285f4;"/><path d="M4.123456 4L20 20" stroke="#000" stroke-width="1.5"/></svg>"##;

    const OFFSET: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" viewBox="-2 -2 28 28" width="56" height="56"><path d="M0 0L24 24" stroke="#000"/></svg>"##;

    fn root_view_box(markup: &str) -> Option<String> {
        let doc = Document::parse(markup).unwrap();
        doc.attr(doc.root(), "viewBox").map(str::to_string)
    }

    #[test]
    fn test_source_viewbox_kept_when_size_differs() {
        let markup = optimize(SCALED, &options()).unwrap();
        assert_eq!(root_view_box(&markup).as_deref(), Some("0 0 24 24"));
        assert!(!markup.contains("transform="), "{markup}");
        assert!(markup.contains("4.123"), "{markup}");
        assert!(!markup.contains("8.247"), "{markup}");
    }

    #[test]
    fn test_source_viewbox_kept_with_offset_origin() {
        let markup = optimize(OFFSET, &options()).unwrap();
        assert_eq!(root_view_box(&markup).as_deref(), Some("-2 -2 28 28"));
        assert!(!markup.contains("transform="), "{markup}");
        assert!(!markup.contains("width="), "{markup}");
    }

    #[test]
    fn test_viewbox_derived_without_source_viewbox() {
        let sized = r##"<svg xmlns="http://www.w3.org/2000/svg" width="16" height="16"><path d="M0 0L16 16" stroke="#000"/></svg>"##;
        let markup = optimize(sized, &options()).unwrap();
        assert_eq!(root_view_box(&markup).as_deref(), Some("0 0 16 16"));
    }

    #[test]
    fn test_text_is_rejected() {
        let lettered = r##"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 24 24"><title id="icon-name">AWS EC2</title><text x="2" y="20">EC2</text></svg>"##;
        assert!(matches!(
            optimize(lettered, &options()),
            Err(TransformError::Optimize(_))
        ));
    }

    #[test]
    fn test_empty_defs_dropped() {
        let markup = optimize(SCALED, &options()).unwrap();
        assert!(!markup.contains("<defs/>"), "{markup}");
        assert!(!markup.contains("<defs></defs>"), "{markup}");

        let gradient = optimize(TRANSFORMED, &options()).unwrap();
        assert!(gradient.contains("<defs>"), "{gradient}");
    }

    #[test]
    fn test_idempotent() {
        for fixture in [SCALED, OFFSET] {
            let once = optimize(fixture, &options()).unwrap();
            let twice = optimize(&once, &options()).unwrap();
            assert_eq!(once, twice);
            assert_eq!(root_view_box(&once), root_view_box(fixture));
        }
    }

    #[test]
    fn test_parse_matrix() {
        assert_eq!(
            parse_matrix("matrix(1 0 0 1 2 -2.5)"),
            Some([1.0, 0.0, 0.0, 1.0, 2.0, -2.5])
        );
        assert_eq!(parse_matrix("matrix(1,0,0,1,0,0)"), Some([1.0, 0.0, 0.0, 1.0, 0.0, 0.0]));
        assert_eq!(parse_matrix("translate(2 2)"), None);
        assert_eq!(parse_matrix("matrix(1 0 0 1 0)"), None);
    }

    #[test]
    fn test_unparseable_document_is_error() {
        let err = optimize("<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"0\"/>", &options());
        assert!(err.is_err());
    }

    #[test]
    fn test_rewrite_references() {
        let mut renamed = FxHashMap::default();
        renamed.insert("a".to_string(), "p__a".to_string());

        assert_eq!(rewrite_references("href", "#a", &renamed), Some("#p__a".into()));
        assert_eq!(rewrite_references("xlink:href", "#b", &renamed), None);
        assert_eq!(
            rewrite_references("fill", "url(#a)", &renamed),
            Some("url(#p__a)".into())
        );
        assert_eq!(
            rewrite_references("style", "fill: url(#a); stroke: url(#b)", &renamed),
            Some("fill: url(#p__a); stroke: url(#b)".into())
        );
        assert_eq!(
            rewrite_references("aria-labelledby", "a b", &renamed),
            Some("p__a b".into())
        );
        assert_eq!(rewrite_references("d", "M0 0", &renamed), None);
    }

    #[test]
    fn test_prefix_ids_skips_prefixed() {
        let mut doc = Document::parse(
            r##"<svg><g id="p__done"/><g id="a" fill="url(#a)"/><use href="#a"/></svg>"##,
        )
        .unwrap();
        prefix_ids(&mut doc, "p__");
        assert_eq!(
            doc.to_markup(),
            r##"<svg><g id="p__done"/><g id="p__a" fill="url(#p__a)"/><use href="#p__a"/></svg>"##
        );
    }
}
