//! Simple selectors for exclusion lists.
//!
//! Supported: `tag`, `*`, `#id`, `.class`, `[attr]`, `[attr=value]` and any
//! compound of those (`div.menu[data-open]`), joined into a list with `,`.
//! Combinators are not supported; ancestor matching is done with
//! [`SelectorList::closest`] instead.

use std::iter::Peekable;
use std::str::Chars;

use crate::{Error, Node, NodeId, NodeTree, Result};

#[derive(Clone, Debug, PartialEq, Eq)]
enum Part {
    Tag(String),
    Id(String),
    Class(String),
    Attr { name: String, value: Option<String> },
}

/// One compound selector. An empty part list is the universal selector.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Selector {
    parts: Vec<Part>,
}

impl Selector {
    pub fn parse(src: &str) -> Result<Self> {
        let trimmed = src.trim();
        let invalid = |reason: &str| Error::InvalidSelector {
            selector: src.to_string(),
            reason: reason.to_string(),
        };
        if trimmed.is_empty() {
            return Err(invalid("empty selector"));
        }

        let mut parts = Vec::new();
        let mut chars = trimmed.chars().peekable();

        if chars.peek() == Some(&'*') {
            chars.next();
        } else if chars.peek().is_some_and(|c| is_ident_char(*c)) {
            parts.push(Part::Tag(ident(&mut chars)));
        }

        while let Some(c) = chars.next() {
            match c {
                '#' => {
                    let name = ident(&mut chars);
                    if name.is_empty() {
                        return Err(invalid("expected id after `#`"));
                    }
                    parts.push(Part::Id(name));
                }
                '.' => {
                    let name = ident(&mut chars);
                    if name.is_empty() {
                        return Err(invalid("expected class after `.`"));
                    }
                    parts.push(Part::Class(name));
                }
                '[' => parts.push(attr(&mut chars).map_err(|r| invalid(r))?),
                c if c.is_whitespace() || matches!(c, '>' | '+' | '~') => {
                    return Err(invalid("combinators are not supported"));
                }
                _ => return Err(invalid("unexpected character")),
            }
        }

        Ok(Self { parts })
    }

    pub fn matches(&self, node: &Node) -> bool {
        self.parts.iter().all(|p| match p {
            Part::Tag(t) => node.tag.eq_ignore_ascii_case(t),
            Part::Id(id) => node.id.as_deref() == Some(id.as_str()),
            Part::Class(c) => node.has_class(c),
            Part::Attr { name, value } => match (node.attr_value(name), value) {
                (Some(_), None) => true,
                (Some(actual), Some(expected)) => actual == expected,
                (None, _) => false,
            },
        })
    }
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '-' || c == '_'
}

fn ident(chars: &mut Peekable<Chars<'_>>) -> String {
    let mut out = String::new();
    while let Some(&c) = chars.peek() {
        if !is_ident_char(c) {
            break;
        }
        out.push(c);
        chars.next();
    }
    out
}

fn attr(chars: &mut Peekable<Chars<'_>>) -> std::result::Result<Part, &'static str> {
    let name = ident(chars);
    if name.is_empty() {
        return Err("expected attribute name after `[`");
    }
    match chars.next() {
        Some(']') => Ok(Part::Attr { name, value: None }),
        Some('=') => {
            let value = match chars.peek() {
                Some(&q @ ('"' | '\'')) => {
                    chars.next();
                    let mut v = String::new();
                    loop {
                        match chars.next() {
                            Some(c) if c == q => break,
                            Some(c) => v.push(c),
                            None => return Err("unterminated quoted value"),
                        }
                    }
                    v
                }
                _ => ident(chars),
            };
            match chars.next() {
                Some(']') => Ok(Part::Attr {
                    name,
                    value: Some(value),
                }),
                _ => Err("expected `]`"),
            }
        }
        _ => Err("expected `]` or `=`"),
    }
}

/// Split on commas outside `[...]` and quoted attribute values.
fn split_top_level(src: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let (mut start, mut depth) = (0, 0u32);
    let mut quote: Option<char> = None;
    for (i, c) in src.char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(c),
            (None, '[') => depth += 1,
            (None, ']') => depth = depth.saturating_sub(1),
            (None, ',') if depth == 0 => {
                out.push(&src[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    out.push(&src[start..]);
    out
}

/// Comma-separated selector list, e.g. `.ant-select, [data-keep-open]`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SelectorList {
    selectors: Vec<Selector>,
}

impl SelectorList {
    pub fn parse(src: &str) -> Result<Self> {
        let selectors = split_top_level(src)
            .into_iter()
            .map(Selector::parse)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { selectors })
    }

    /// Build a list from separate selector strings; each may itself contain commas.
    pub fn from_strs<S: AsRef<str>>(items: &[S]) -> Result<Self> {
        let mut selectors = Vec::new();
        for s in items {
            selectors.extend(Self::parse(s.as_ref())?.selectors);
        }
        Ok(Self { selectors })
    }

    pub fn is_empty(&self) -> bool {
        self.selectors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.selectors.len()
    }

    /// Does `id` itself match any selector?
    pub fn matches(&self, tree: &NodeTree, id: NodeId) -> bool {
        tree.get(id)
            .is_some_and(|node| self.selectors.iter().any(|s| s.matches(node)))
    }

    /// Nearest node in `id`'s ancestor chain (inclusive) matching any selector.
    pub fn closest(&self, tree: &NodeTree, id: NodeId) -> Option<NodeId> {
        if self.is_empty() {
            return None;
        }
        tree.self_and_ancestors(id).find(|n| self.matches(tree, *n))
    }
}
