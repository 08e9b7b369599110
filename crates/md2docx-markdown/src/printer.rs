//! Debug rendering of a tree.
//!
//! One node per line, indented two spaces per depth:
//! `kind{key=value,...}` with keys sorted, followed by ` data{...}` when
//! transforms attached metadata.

use std::collections::BTreeMap;
use std::fmt::Write;

use crate::node::{Data, NodeId, NodeKind};
use crate::tree::Tree;

/// Render the subtree under `node`.
#[must_use]
pub fn print_tree(tree: &Tree, node: NodeId) -> String {
    let mut out = String::new();
    print_node(tree, node, 0, &mut out);
    out
}

fn print_node(tree: &Tree, node: NodeId, depth: usize, out: &mut String) {
    for _ in 0..depth {
        out.push_str("  ");
    }
    let kind = tree.kind(node);
    out.push_str(kind.name());
    write_fields(&kind_fields(kind), out);

    let data = data_fields(tree.data(node));
    if !data.is_empty() {
        out.push_str(" data");
        write_fields(&data, out);
    }
    out.push('\n');

    for &child in tree.children(node) {
        print_node(tree, child, depth + 1, out);
    }
}

fn write_fields(fields: &BTreeMap<String, String>, out: &mut String) {
    if fields.is_empty() {
        return;
    }
    out.push('{');
    for (i, (key, value)) in fields.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        let _ = write!(out, "{key}={}", value.replace('\n', "\\n"));
    }
    out.push('}');
}

fn kind_fields(kind: &NodeKind) -> BTreeMap<String, String> {
    let mut fields = BTreeMap::new();
    let mut set = |key: &str, value: String| {
        fields.insert(key.to_owned(), value);
    };

    match kind {
        NodeKind::Heading { depth } => set("depth", depth.to_string()),
        NodeKind::List { ordered, start } => {
            set("ordered", ordered.to_string());
            if let Some(start) = start.filter(|_| *ordered) {
                set("start", start.to_string());
            }
        }
        NodeKind::ListItem { checked: Some(checked) } => set("checked", checked.to_string()),
        NodeKind::Text(value)
        | NodeKind::InlineCode(value)
        | NodeKind::Html(value)
        | NodeKind::Toml(value) => set("value", value.clone()),
        NodeKind::Code { lang, value } => {
            if let Some(lang) = lang {
                set("lang", lang.clone());
            }
            set("value", value.clone());
        }
        NodeKind::Image { url, alt, title } => {
            set("url", url.clone());
            set("alt", alt.clone());
            if let Some(title) = title {
                set("title", title.clone());
            }
        }
        NodeKind::Link { url, title } => {
            set("url", url.clone());
            if let Some(title) = title {
                set("title", title.clone());
            }
        }
        NodeKind::FootnoteReference(label) | NodeKind::FootnoteDefinition(label) => {
            set("label", label.clone());
        }
        NodeKind::TextDirective(directive)
        | NodeKind::LeafDirective(directive)
        | NodeKind::ContainerDirective(directive) => {
            set("name", directive.name.clone());
            for (key, value) in &directive.attributes {
                set(key, value.clone());
            }
        }
        _ => {}
    }
    fields
}

fn data_fields(data: &Data) -> BTreeMap<String, String> {
    let mut fields = data.attrs.clone();
    if let Some(id) = &data.id {
        fields.insert("id".to_owned(), id.clone());
    }
    if let Some(class) = &data.class {
        fields.insert("class".to_owned(), class.clone());
    }
    if let Some(image) = &data.image {
        let mut summary = format!("{} bytes", image.contents.len());
        if let Some(meta) = &image.meta {
            let _ = write!(summary, " {}x{} {}", meta.width, meta.height, meta.extension);
        }
        fields.insert("image".to_owned(), summary);
    }
    fields
}
