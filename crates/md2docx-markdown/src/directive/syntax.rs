//! Directive syntax parsing.
//!
//! Block forms (`::leaf`, `:::container`, closing `:::`) are recognized on
//! whole lines before `CommonMark` parsing. Inline forms are split out of
//! text nodes afterwards.

use super::DirectiveArgs;
use crate::node::Directive;

/// A directive occupying a whole line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum BlockDirective {
    /// `::name[content]{attrs}`
    Leaf { directive: Directive, content: String },
    /// `:::name{attrs}`
    ContainerStart { directive: Directive, colon_count: usize },
    /// `:::`
    ContainerEnd { colon_count: usize },
}

/// A piece of text after inline directives are split out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum InlinePiece {
    Text(String),
    Directive { directive: Directive, content: String },
}

/// Parse a line as a block directive.
///
/// A leaf directive must span the whole line; anything after its closing
/// brace makes the line ordinary text.
pub(crate) fn parse_block_line(line: &str) -> Option<BlockDirective> {
    let trimmed = line.trim();
    let colon_count = trimmed.chars().take_while(|&c| c == ':').count();
    if colon_count < 2 {
        return None;
    }

    let after_colons = &trimmed[colon_count..];
    if after_colons.trim().is_empty() {
        return (colon_count >= 3).then_some(BlockDirective::ContainerEnd { colon_count });
    }

    let (name, rest) = split_name(after_colons)?;
    let (content, consumed) = parse_brackets(rest);
    let rest = &rest[consumed..];
    let (attrs, consumed) = parse_braces(rest);
    let rest = &rest[consumed..];

    if colon_count == 2 {
        if !rest.trim().is_empty() {
            return None;
        }
        let (directive, content) = DirectiveArgs::parse(content, attrs).into_directive(name);
        return Some(BlockDirective::Leaf { directive, content });
    }

    // Container labels (`:::name[label]`) are accepted and dropped.
    let (directive, _) = DirectiveArgs::parse(content, attrs).into_directive(name);
    Some(BlockDirective::ContainerStart {
        directive,
        colon_count,
    })
}

/// Split inline directives out of a text run.
///
/// A directive needs at least one of `[..]` or `{..}` directly after its name,
/// so ordinary colons (`10:30`, `https://`, `note: x`) stay text.
pub(crate) fn split_inline(text: &str) -> Vec<InlinePiece> {
    let mut pieces = Vec::new();
    let mut last = 0;
    let mut search = 0;

    while let Some(offset) = text[search..].find(':') {
        let start = search + offset;
        search = start + 1;

        if text[..start].ends_with(':') || text[start + 1..].starts_with(':') {
            continue;
        }
        let Some((name, rest)) = split_name(&text[start + 1..]) else {
            continue;
        };
        let (content, content_len) = parse_brackets(rest);
        let (attrs, attrs_len) = parse_braces(&rest[content_len..]);
        if content_len == 0 && attrs_len == 0 {
            continue;
        }

        if start > last {
            pieces.push(InlinePiece::Text(text[last..start].to_owned()));
        }
        let (directive, content) = DirectiveArgs::parse(content, attrs).into_directive(name);
        pieces.push(InlinePiece::Directive { directive, content });

        last = start + 1 + name.len() + content_len + attrs_len;
        search = last;
    }

    if last < text.len() {
        pieces.push(InlinePiece::Text(text[last..].to_owned()));
    }
    pieces
}

/// An inline directive whose `[` is still open at the end of a text run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct OpenInline<'a> {
    /// Text before the directive's colon.
    pub prefix: &'a str,
    pub name: &'a str,
    /// Content after the `[` up to the end of the run.
    pub partial: &'a str,
    /// Bracket depth at the end of the run, at least 1.
    pub depth: usize,
}

/// Find an inline directive left open at the end of `text`, as in
/// `see :sup[` when the content continues in formatted siblings.
pub(crate) fn open_inline(text: &str) -> Option<OpenInline<'_>> {
    let mut search = 0;
    while let Some(offset) = text[search..].find(':') {
        let start = search + offset;
        search = start + 1;

        if text[..start].ends_with(':') || text[start + 1..].starts_with(':') {
            continue;
        }
        let Some((name, rest)) = split_name(&text[start + 1..]) else {
            continue;
        };
        let Some(partial) = rest.strip_prefix('[') else {
            continue;
        };
        let mut depth = 1;
        if close_inline(partial, &mut depth).is_none() {
            return Some(OpenInline {
                prefix: &text[..start],
                name,
                partial,
                depth,
            });
        }
    }
    None
}

/// Byte offset of the `]` that brings `depth` to zero, updating `depth` for
/// every bracket seen when there is none.
pub(crate) fn close_inline(text: &str, depth: &mut usize) -> Option<usize> {
    for (i, c) in text.char_indices() {
        match c {
            '[' => *depth += 1,
            ']' => {
                *depth -= 1;
                if *depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Split a directive name off the front of `s`.
///
/// Names start with a letter and continue with letters, digits, `-` or `_`.
fn split_name(s: &str) -> Option<(&str, &str)> {
    if !s.chars().next().is_some_and(char::is_alphabetic) {
        return None;
    }
    let end = s
        .find(|c: char| !(c.is_alphanumeric() || c == '-' || c == '_'))
        .unwrap_or(s.len());
    Some((&s[..end], &s[end..]))
}

/// Parse content from brackets: `[content]`
///
/// Returns (content, `bytes_consumed`); nothing is consumed if unbalanced.
fn parse_brackets(s: &str) -> (&str, usize) {
    parse_balanced(s, '[', ']')
}

/// Parse attributes from braces: `{#id .class key="value"}`
///
/// Returns (attributes without braces, `bytes_consumed`).
pub(crate) fn parse_braces(s: &str) -> (&str, usize) {
    parse_balanced(s, '{', '}')
}

fn parse_balanced(s: &str, open: char, close: char) -> (&str, usize) {
    if !s.starts_with(open) {
        return ("", 0);
    }

    let mut depth = 0usize;
    for (i, c) in s.char_indices() {
        if c == open {
            depth += 1;
        } else if c == close {
            depth -= 1;
            if depth == 0 {
                return (&s[1..i], i + 1);
            }
        }
    }
    ("", 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn directive(name: &str, attrs: &[(&str, &str)]) -> Directive {
        attrs
            .iter()
            .fold(Directive::new(name), |d, (k, v)| d.with_attribute(*k, *v))
    }

    #[test]
    fn test_leaf_line() {
        assert_eq!(
            parse_block_line("::caption[Results]{#fig-1 type=Figure}"),
            Some(BlockDirective::Leaf {
                directive: directive("caption", &[("id", "fig-1"), ("type", "Figure")]),
                content: "Results".to_owned(),
            })
        );
    }

    #[test]
    fn test_leaf_without_content() {
        assert_eq!(
            parse_block_line("::embed{url=./sub.md}"),
            Some(BlockDirective::Leaf {
                directive: directive("embed", &[("url", "./sub.md")]),
                content: String::new(),
            })
        );
    }

    #[test]
    fn test_leaf_with_trailing_text_is_not_a_directive() {
        assert_eq!(parse_block_line("::embed{url=a.md} trailing"), None);
    }

    #[test]
    fn test_container_lines() {
        assert_eq!(
            parse_block_line(":::table{orientation=landscape}"),
            Some(BlockDirective::ContainerStart {
                directive: directive("table", &[("orientation", "landscape")]),
                colon_count: 3,
            })
        );
        assert_eq!(
            parse_block_line("::::"),
            Some(BlockDirective::ContainerEnd { colon_count: 4 })
        );
    }

    #[test]
    fn test_not_block_directives() {
        assert_eq!(parse_block_line("::"), None);
        assert_eq!(parse_block_line(":single"), None);
        assert_eq!(parse_block_line("::1abc"), None);
        assert_eq!(parse_block_line("plain text"), None);
    }

    #[test]
    fn test_split_inline() {
        assert_eq!(
            split_inline("一级标题:attr{#h1}"),
            vec![
                InlinePiece::Text("一级标题".to_owned()),
                InlinePiece::Directive {
                    directive: directive("attr", &[("id", "h1")]),
                    content: String::new(),
                },
            ]
        );
    }

    #[test]
    fn test_split_inline_with_content_and_tail() {
        assert_eq!(
            split_inline("H:sub[2]O"),
            vec![
                InlinePiece::Text("H".to_owned()),
                InlinePiece::Directive {
                    directive: directive("sub", &[]),
                    content: "2".to_owned(),
                },
                InlinePiece::Text("O".to_owned()),
            ]
        );
    }

    #[test]
    fn test_split_inline_ignores_plain_colons() {
        for text in ["at 10:30", "see https://example.com", "note: this", "a::b{c}"] {
            assert_eq!(split_inline(text), vec![InlinePiece::Text(text.to_owned())]);
        }
    }

    #[test]
    fn test_split_inline_unbalanced() {
        assert_eq!(
            split_inline("x:attr{open"),
            vec![InlinePiece::Text("x:attr{open".to_owned())]
        );
    }

    #[test]
    fn test_nested_brackets() {
        assert_eq!(parse_brackets("[a [b] c] rest"), ("a [b] c", 9));
        assert_eq!(parse_braces("{a}"), ("a", 3));
        assert_eq!(parse_braces("{a"), ("", 0));
    }

    #[test]
    fn test_open_inline() {
        assert_eq!(
            open_inline("x :sup["),
            Some(OpenInline {
                prefix: "x ",
                name: "sup",
                partial: "",
                depth: 1,
            })
        );
        assert_eq!(
            open_inline("a:sub[[b").map(|open| (open.partial, open.depth)),
            Some(("[b", 2))
        );
        assert_eq!(open_inline("H:sub[2]O"), None);
        assert_eq!(open_inline("10:30 [x"), None);
    }

    #[test]
    fn test_close_inline() {
        let mut depth = 2;
        assert_eq!(close_inline("a] b", &mut depth), None);
        assert_eq!(depth, 1);
        assert_eq!(close_inline("c]{.x}", &mut depth), Some(1));
    }
}
