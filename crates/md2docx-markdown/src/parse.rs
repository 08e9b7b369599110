//! Markdown source to [`Tree`].
//!
//! Parsing runs in two passes. A line scanner first carves out the syntax
//! `CommonMark` does not know about: `+++` TOML blocks, `:::` containers and
//! whole-line `::` leaf directives. Everything between those lines is handed
//! to `pulldown-cmark` and converted into nodes. Inline `:name[..]{..}`
//! directives are then split out of the resulting text nodes, or gathered
//! across sibling nodes when their content holds formatting.

use std::collections::VecDeque;

use pulldown_cmark::{CodeBlockKind, Event, HeadingLevel, Options, Tag};

use crate::directive::{
    BlockDirective, DirectiveArgs, InlinePiece, close_inline, open_inline, parse_block_line,
    parse_braces, split_inline,
};
use crate::fence::FenceTracker;
use crate::node::{NodeId, NodeKind};
use crate::tree::Tree;

/// Turns markdown source into nodes of a tree.
pub trait Parser {
    /// Parse `source` into `tree`, returning the new root node.
    fn parse(&self, tree: &mut Tree, source: &str) -> NodeId;
}

/// `CommonMark` + GFM tables, strikethrough, footnotes and task lists, with
/// directives and TOML blocks.
#[derive(Debug, Clone, Copy)]
pub struct MarkdownParser {
    options: Options,
}

impl Default for MarkdownParser {
    fn default() -> Self {
        Self {
            options: Options::ENABLE_TABLES
                | Options::ENABLE_STRIKETHROUGH
                | Options::ENABLE_FOOTNOTES
                | Options::ENABLE_TASKLISTS,
        }
    }
}

impl MarkdownParser {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Parser for MarkdownParser {
    fn parse(&self, tree: &mut Tree, source: &str) -> NodeId {
        let root = tree.alloc(NodeKind::Root);
        // Open containers with their fence length; the root has none.
        let mut open: Vec<(NodeId, usize)> = vec![(root, 0)];
        let mut fence = FenceTracker::new();
        let mut chunk = String::new();
        let mut lines = source.lines();

        while let Some(line) = lines.next() {
            let in_code = fence.in_fence();
            if fence.update(line) || in_code {
                push_line(&mut chunk, line);
                continue;
            }

            let parent = open.last().map_or(root, |&(id, _)| id);

            if open.len() == 1 && line.trim_end() == "+++" {
                self.flush(tree, parent, &mut chunk);
                let mut body = String::new();
                for line in lines.by_ref() {
                    if line.trim_end() == "+++" {
                        break;
                    }
                    push_line(&mut body, line);
                }
                tree.append_new(root, NodeKind::Toml(body));
                continue;
            }

            match parse_block_line(line) {
                Some(BlockDirective::Leaf { directive, content }) => {
                    self.flush(tree, parent, &mut chunk);
                    let leaf = tree.append_new(parent, NodeKind::LeafDirective(directive));
                    self.parse_inline(tree, leaf, &content);
                }
                Some(BlockDirective::ContainerStart {
                    directive,
                    colon_count,
                }) => {
                    self.flush(tree, parent, &mut chunk);
                    let container =
                        tree.append_new(parent, NodeKind::ContainerDirective(directive));
                    open.push((container, colon_count));
                }
                Some(BlockDirective::ContainerEnd { colon_count })
                    if open.len() > 1 && open.last().is_some_and(|&(_, n)| colon_count >= n) =>
                {
                    self.flush(tree, parent, &mut chunk);
                    open.pop();
                }
                _ => push_line(&mut chunk, line),
            }
        }

        let parent = open.last().map_or(root, |&(id, _)| id);
        self.flush(tree, parent, &mut chunk);
        root
    }
}

impl MarkdownParser {
    fn flush(&self, tree: &mut Tree, parent: NodeId, chunk: &mut String) {
        if !chunk.trim().is_empty() {
            self.parse_blocks(tree, parent, chunk);
        }
        chunk.clear();
    }

    /// Parse `source` as block content appended under `parent`.
    fn parse_blocks(&self, tree: &mut Tree, parent: NodeId, source: &str) {
        let first_new = tree.children(parent).len();
        let mut builder = Builder::new(tree, parent);
        for event in pulldown_cmark::Parser::new_ext(source, self.options) {
            builder.event(event);
        }
        self.split_directives(tree, parent, first_new);
    }

    /// Parse `source` as phrasing content appended under `parent`.
    fn parse_inline(&self, tree: &mut Tree, parent: NodeId, source: &str) {
        if source.trim().is_empty() {
            return;
        }
        let holder = tree.alloc(NodeKind::Root);
        self.parse_blocks(tree, holder, source);
        for block in std::mem::take(&mut tree[holder].children) {
            if *tree.kind(block) == NodeKind::Paragraph {
                let inline = std::mem::take(&mut tree[block].children);
                tree[parent].children.extend(inline);
            } else {
                tree.append(parent, block);
            }
        }
    }

    /// Replace text children (from index `from`) containing inline
    /// directives, recursing into every other child.
    fn split_directives(&self, tree: &mut Tree, parent: NodeId, from: usize) {
        let tail = tree[parent].children.split_off(from);
        let mut children = Vec::with_capacity(tail.len());

        for child in tail {
            let pieces = match tree.kind(child) {
                NodeKind::Text(text) if text.contains(':') => split_inline(text),
                _ => Vec::new(),
            };
            if !matches!(tree.kind(child), NodeKind::Text(_)) {
                self.split_directives(tree, child, 0);
            }
            if pieces.len() <= 1 {
                children.push(child);
                continue;
            }
            for piece in pieces {
                match piece {
                    InlinePiece::Text(text) => children.push(tree.alloc(NodeKind::Text(text))),
                    InlinePiece::Directive { directive, content } => {
                        let node = tree.alloc(NodeKind::TextDirective(directive));
                        self.parse_inline(tree, node, &content);
                        children.push(node);
                    }
                }
            }
        }

        let children = join_spanning(tree, children);
        tree[parent].children.extend(children);
    }
}

/// Gather inline directives whose `[..]` content crosses sibling nodes,
/// as in `:sup[**x**]`, into one directive node.
///
/// Unclosed openers stay text.
fn join_spanning(tree: &mut Tree, nodes: Vec<NodeId>) -> Vec<NodeId> {
    let mut pending: VecDeque<NodeId> = nodes.into();
    let mut out = Vec::with_capacity(pending.len());

    while let Some(node) = pending.pop_front() {
        let NodeKind::Text(text) = tree.kind(node) else {
            out.push(node);
            continue;
        };
        let Some(open) = open_inline(text) else {
            out.push(node);
            continue;
        };

        let mut depth = open.depth;
        let close = pending.iter().enumerate().find_map(|(i, &next)| match tree.kind(next) {
            NodeKind::Text(text) => close_inline(text, &mut depth)
                .map(|at| (i, text[..at].to_owned(), text[at + 1..].to_owned())),
            _ => None,
        });
        let Some((index, inner, after)) = close else {
            out.push(node);
            continue;
        };

        let prefix = open.prefix.to_owned();
        let partial = open.partial.to_owned();
        let name = open.name.to_owned();
        let (attrs, attrs_len) = parse_braces(&after);
        let tail = after[attrs_len..].to_owned();
        let (directive, _) = DirectiveArgs::parse("", attrs).into_directive(&name);

        let mut content = Vec::new();
        if !partial.is_empty() {
            content.push(tree.alloc(NodeKind::Text(partial)));
        }
        content.extend(pending.drain(..index));
        pending.pop_front();
        if !inner.is_empty() {
            content.push(tree.alloc(NodeKind::Text(inner)));
        }

        if !prefix.is_empty() {
            out.push(tree.alloc(NodeKind::Text(prefix)));
        }
        let directive = tree.alloc(NodeKind::TextDirective(directive));
        tree[directive].children = content;
        out.push(directive);
        if !tail.is_empty() {
            pending.push_front(tree.alloc(NodeKind::Text(tail)));
        }
    }
    out
}

fn push_line(buf: &mut String, line: &str) {
    buf.push_str(line);
    buf.push('\n');
}

fn heading_depth(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

/// An open element: a node, or a tag with no node of its own.
#[derive(Debug, Clone, Copy)]
enum Frame {
    Node(NodeId),
    Transparent,
}

/// Builds nodes from a `pulldown-cmark` event stream.
struct Builder<'t> {
    tree: &'t mut Tree,
    parent: NodeId,
    stack: Vec<Frame>,
    /// Open image collecting its alt text.
    image: Option<NodeId>,
    /// Open code block collecting its value.
    code: Option<NodeId>,
}

impl<'t> Builder<'t> {
    fn new(tree: &'t mut Tree, parent: NodeId) -> Self {
        Self {
            tree,
            parent,
            stack: vec![Frame::Node(parent)],
            image: None,
            code: None,
        }
    }

    fn current(&self) -> NodeId {
        self.stack
            .iter()
            .rev()
            .find_map(|frame| match frame {
                Frame::Node(id) => Some(*id),
                Frame::Transparent => None,
            })
            .unwrap_or(self.parent)
    }

    fn event(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.start(tag),
            Event::End(_) => self.end(),
            Event::Text(text) | Event::InlineMath(text) | Event::DisplayMath(text) => {
                self.text(&text);
            }
            Event::Code(code) => {
                if let Some(image) = self.image {
                    push_alt(self.tree, image, &code);
                } else {
                    self.leaf(NodeKind::InlineCode(code.into_string()));
                }
            }
            Event::Html(html) | Event::InlineHtml(html) => {
                self.leaf(NodeKind::Html(html.trim_end().to_owned()));
            }
            Event::FootnoteReference(label) => {
                self.leaf(NodeKind::FootnoteReference(label.into_string()));
            }
            Event::SoftBreak => self.text("\n"),
            Event::HardBreak => self.leaf(NodeKind::Break),
            Event::Rule => self.leaf(NodeKind::ThematicBreak),
            Event::TaskListMarker(checked) => self.task_marker(checked),
        }
    }

    fn start(&mut self, tag: Tag<'_>) {
        if self.image.is_some() {
            self.stack.push(Frame::Transparent);
            return;
        }

        let kind = match tag {
            Tag::Paragraph => NodeKind::Paragraph,
            Tag::Heading { level, .. } => NodeKind::Heading {
                depth: heading_depth(level),
            },
            Tag::BlockQuote(_) => NodeKind::Blockquote,
            Tag::CodeBlock(kind) => {
                let lang = match kind {
                    CodeBlockKind::Fenced(info) => info
                        .split_whitespace()
                        .next()
                        .map(str::to_owned),
                    CodeBlockKind::Indented => None,
                };
                NodeKind::Code {
                    lang,
                    value: String::new(),
                }
            }
            Tag::List(start) => NodeKind::List {
                ordered: start.is_some(),
                start,
            },
            Tag::Item => NodeKind::ListItem { checked: None },
            Tag::FootnoteDefinition(label) => NodeKind::FootnoteDefinition(label.into_string()),
            Tag::Table(_) => NodeKind::Table,
            Tag::TableHead | Tag::TableRow => NodeKind::TableRow,
            Tag::TableCell => NodeKind::TableCell,
            Tag::Emphasis => NodeKind::Emphasis,
            Tag::Strong => NodeKind::Strong,
            Tag::Strikethrough => NodeKind::Delete,
            Tag::Link {
                dest_url, title, ..
            } => NodeKind::Link {
                url: dest_url.into_string(),
                title: non_empty(&title),
            },
            Tag::Image {
                dest_url, title, ..
            } => NodeKind::Image {
                url: dest_url.into_string(),
                alt: String::new(),
                title: non_empty(&title),
            },
            _ => {
                self.stack.push(Frame::Transparent);
                return;
            }
        };

        let id = self.tree.append_new(self.current(), kind);
        match self.tree.kind(id) {
            NodeKind::Image { .. } => self.image = Some(id),
            NodeKind::Code { .. } => self.code = Some(id),
            _ => {}
        }
        self.stack.push(Frame::Node(id));
    }

    fn end(&mut self) {
        if self.stack.len() <= 1 {
            return;
        }
        let Some(Frame::Node(id)) = self.stack.pop() else {
            return;
        };

        if self.image == Some(id) {
            self.image = None;
        }
        if self.code == Some(id) {
            self.code = None;
            if let NodeKind::Code { value, .. } = &mut self.tree[id].kind
                && value.ends_with('\n')
            {
                value.pop();
            }
        }
        if matches!(self.tree.kind(id), NodeKind::ListItem { .. }) {
            self.wrap_inline_children(id);
        }
    }

    fn leaf(&mut self, kind: NodeKind) {
        let parent = self.current();
        self.tree.append_new(parent, kind);
    }

    fn text(&mut self, text: &str) {
        if let Some(image) = self.image {
            push_alt(self.tree, image, text);
            return;
        }
        if let Some(code) = self.code {
            if let NodeKind::Code { value, .. } = &mut self.tree[code].kind {
                value.push_str(text);
            }
            return;
        }

        let parent = self.current();
        if let Some(&last) = self.tree.children(parent).last()
            && let NodeKind::Text(existing) = &mut self.tree[last].kind
        {
            existing.push_str(text);
            return;
        }
        self.tree.append_new(parent, NodeKind::Text(text.to_owned()));
    }

    fn task_marker(&mut self, checked: bool) {
        let item = self.stack.iter().rev().find_map(|frame| match frame {
            Frame::Node(id) if matches!(self.tree.kind(*id), NodeKind::ListItem { .. }) => {
                Some(*id)
            }
            _ => None,
        });
        if let Some(item) = item {
            self.tree[item].kind = NodeKind::ListItem {
                checked: Some(checked),
            };
        }
    }

    /// Tight list items hold phrasing content directly; group each run of
    /// it into a paragraph.
    fn wrap_inline_children(&mut self, item: NodeId) {
        let children = std::mem::take(&mut self.tree[item].children);
        let mut wrapped = Vec::with_capacity(children.len());
        let mut paragraph: Option<NodeId> = None;

        for child in children {
            if !self.tree.kind(child).is_inline() {
                paragraph = None;
                wrapped.push(child);
                continue;
            }
            let target = match paragraph {
                Some(id) => id,
                None => {
                    let id = self.tree.alloc(NodeKind::Paragraph);
                    wrapped.push(id);
                    paragraph = Some(id);
                    id
                }
            };
            self.tree.append(target, child);
        }

        self.tree[item].children = wrapped;
    }
}

fn push_alt(tree: &mut Tree, image: NodeId, text: &str) {
    if let NodeKind::Image { alt, .. } = &mut tree[image].kind {
        alt.push_str(text);
    }
}

fn non_empty(s: &str) -> Option<String> {
    (!s.is_empty()).then(|| s.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::Directive;
    use crate::printer::print_tree;
    use pretty_assertions::assert_eq;

    fn parse(source: &str) -> (Tree, NodeId) {
        let mut tree = Tree::new();
        let root = MarkdownParser::new().parse(&mut tree, source);
        (tree, root)
    }

    fn print(source: &str) -> String {
        let (tree, root) = parse(source);
        print_tree(&tree, root)
    }

    #[test]
    fn test_heading_and_paragraph() {
        assert_eq!(
            print("# Title\n\nHello *world*\n"),
            "root
  heading{depth=1}
    text{value=Title}
  paragraph
    text{value=Hello }
    emphasis
      text{value=world}
"
        );
    }

    #[test]
    fn test_soft_breaks_merge_into_text() {
        assert_eq!(
            print("one\ntwo\n"),
            "root
  paragraph
    text{value=one\\ntwo}
"
        );
    }

    #[test]
    fn test_toml_block() {
        let (tree, root) = parse("# A\n\n+++\n[page.size]\norientation = \"landscape\"\n+++\n\nB\n");
        let kinds: Vec<&str> = tree
            .children(root)
            .iter()
            .map(|&id| tree.kind(id).name())
            .collect();

        assert_eq!(kinds, vec!["heading", "toml", "paragraph"]);
        assert_eq!(
            tree.kind(tree.children(root)[1]),
            &NodeKind::Toml("[page.size]\norientation = \"landscape\"\n".to_owned())
        );
    }

    #[test]
    fn test_leaf_directive_with_inline_content() {
        let (tree, root) = parse("![a](a.png)\n::caption[**Bold** caption]{#fig-1 type=Figure}\n");
        let children = tree.children(root);

        assert_eq!(children.len(), 2);
        assert_eq!(
            tree.kind(children[1]),
            &NodeKind::LeafDirective(
                Directive::new("caption")
                    .with_attribute("id", "fig-1")
                    .with_attribute("type", "Figure")
            )
        );
        assert_eq!(tree.text_content(children[1]), "Bold caption");
        assert_eq!(tree.kind(tree.children(children[1])[0]), &NodeKind::Strong);
    }

    #[test]
    fn test_container_directive_wraps_table() {
        assert_eq!(
            print(":::table{orientation=landscape}\n| A | B |\n|---|---|\n| 1 | 2 |\n:::\n\nafter\n"),
            "root
  containerDirective{name=table,orientation=landscape}
    table
      tableRow
        tableCell
          text{value=A}
        tableCell
          text{value=B}
      tableRow
        tableCell
          text{value=1}
        tableCell
          text{value=2}
  paragraph
    text{value=after}
"
        );
    }

    #[test]
    fn test_directives_inside_code_are_code() {
        let (tree, root) = parse("```\n::embed{url=a.md}\n+++\n```\n");
        let children = tree.children(root);

        assert_eq!(children.len(), 1);
        assert_eq!(
            tree.kind(children[0]),
            &NodeKind::Code {
                lang: None,
                value: "::embed{url=a.md}\n+++".to_owned(),
            }
        );
    }

    #[test]
    fn test_inline_directive_in_heading() {
        assert_eq!(
            print("# 一级标题:attr{#h1}\n"),
            "root
  heading{depth=1}
    text{value=一级标题}
    textDirective{id=h1,name=attr}
"
        );
    }

    #[test]
    fn test_inline_directive_with_formatted_content() {
        assert_eq!(
            print("x:sup[**y** z]{.c} after :sub[2]\n"),
            "root
  paragraph
    text{value=x}
    textDirective{class=c,name=sup}
      strong
        text{value=y}
      text{value= z}
    text{value= after }
    textDirective{name=sub}
      text{value=2}
"
        );
    }

    #[test]
    fn test_unclosed_spanning_directive_stays_text() {
        assert_eq!(
            print("x:sup[**y**\n"),
            "root
  paragraph
    text{value=x:sup[}
    strong
      text{value=y}
"
        );
    }

    #[test]
    fn test_inline_directive_in_table_cell() {
        assert_eq!(
            print("| A:attr{colspan=2} |\n|---|\n| x |\n"),
            "root
  table
    tableRow
      tableCell
        text{value=A}
        textDirective{colspan=2,name=attr}
    tableRow
      tableCell
        text{value=x}
"
        );
    }

    #[test]
    fn test_tight_list_items_get_paragraphs() {
        assert_eq!(
            print("- [x] done\n  - nested\n"),
            "root
  list{ordered=false}
    listItem{checked=true}
      paragraph
        text{value=done}
      list{ordered=false}
        listItem
          paragraph
            text{value=nested}
"
        );
    }

    #[test]
    fn test_image_alt_and_code_lang() {
        assert_eq!(
            print("![a *b*](x.png \"T\")\n\n```rust ignore\nfn main() {}\n```\n"),
            "root
  paragraph
    image{alt=a b,title=T,url=x.png}
  code{lang=rust,value=fn main() {}}
"
        );
    }

    #[test]
    fn test_unclosed_container_runs_to_end() {
        let (tree, root) = parse(":::table\n| A |\n|---|\n");
        let container = tree.children(root)[0];

        assert_eq!(tree.children(root).len(), 1);
        assert_eq!(tree.kind(tree.children(container)[0]), &NodeKind::Table);
    }
}
