//! Text format for configuration documents.
//!
//! ```text
//! // comment
//! PART
//! {
//!     name = probe
//!     MODULE { name = ModuleCommand }
//! }
//! ```
//!
//! Braces may share a line with a node name or sit on their own line. A
//! line holding `=` is a key/value pair split on the first `=`; both sides
//! are trimmed. Any other non-empty text names the node opened by the next
//! `{`.

use crate::error::CodecError;
use crate::node::Node;

enum Token<'a> {
    Open,
    Close,
    Pair(&'a str, &'a str),
    Name(&'a str),
}

fn strip_comment(line: &str) -> &str {
    match line.find("//") {
        Some(i) => &line[..i],
        None => line,
    }
}

fn tokenize(line: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut start = 0;
    for (i, c) in line.char_indices() {
        if c == '{' || c == '}' {
            push_text(&mut tokens, &line[start..i]);
            tokens.push(if c == '{' { Token::Open } else { Token::Close });
            start = i + 1;
        }
    }
    push_text(&mut tokens, &line[start..]);
    tokens
}

fn push_text<'a>(tokens: &mut Vec<Token<'a>>, text: &'a str) {
    let text = text.trim();
    if text.is_empty() {
        return;
    }
    match text.split_once('=') {
        Some((key, value)) => tokens.push(Token::Pair(key.trim(), value.trim())),
        None => tokens.push(Token::Name(text)),
    }
}

/// Parse a document file into its root nodes.
pub fn parse_document(text: &str) -> Result<Vec<Node>, CodecError> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut roots = Vec::new();
    let mut open: Vec<Node> = Vec::new();
    let mut pending: Option<(String, usize)> = None;

    for (index, raw) in text.lines().enumerate() {
        let line = index + 1;
        for token in tokenize(strip_comment(raw)) {
            match token {
                Token::Open => {
                    let (name, _) = pending.take().ok_or(CodecError::MissingNodeName { line })?;
                    open.push(Node::new(name));
                }
                Token::Close => {
                    if let Some((name, line)) = pending.take() {
                        return Err(CodecError::DanglingName { line, name });
                    }
                    let node = open.pop().ok_or(CodecError::UnexpectedClose { line })?;
                    match open.last_mut() {
                        Some(parent) => parent.add_node(node),
                        None => roots.push(node),
                    }
                }
                Token::Pair(key, value) => {
                    if let Some((name, line)) = pending.take() {
                        return Err(CodecError::DanglingName { line, name });
                    }
                    open.last_mut()
                        .ok_or(CodecError::ValueAtTopLevel { line })?
                        .add_value(key, value);
                }
                Token::Name(name) => {
                    if let Some((name, line)) = pending.take() {
                        return Err(CodecError::DanglingName { line, name });
                    }
                    pending = Some((name.to_string(), line));
                }
            }
        }
    }

    if let Some((name, line)) = pending {
        return Err(CodecError::DanglingName { line, name });
    }
    if let Some(innermost) = open.last() {
        return Err(CodecError::UnclosedNode {
            open: open.len(),
            name: innermost.name.clone(),
        });
    }
    Ok(roots)
}

/// Parse text that must hold exactly one root node.
pub fn parse_node(text: &str) -> Result<Node, CodecError> {
    let mut roots = parse_document(text)?;
    match roots.len() {
        1 => Ok(roots.remove(0)),
        0 => Err(CodecError::MissingNodeName { line: 1 }),
        _ => Err(CodecError::DanglingName {
            line: 1,
            name: roots.remove(1).name,
        }),
    }
}

/// Pretty-print a node, tab indented, braces on their own lines.
pub fn to_text(node: &Node) -> String {
    let mut out = String::new();
    write_node(&mut out, node, 0);
    out
}

/// Pretty-print a sequence of root nodes.
pub fn document_to_text(nodes: &[Node]) -> String {
    let mut out = String::new();
    for node in nodes {
        write_node(&mut out, node, 0);
    }
    out
}

fn write_node(out: &mut String, node: &Node, depth: usize) {
    indent(out, depth);
    out.push_str(&node.name);
    out.push('\n');
    indent(out, depth);
    out.push_str("{\n");
    for value in &node.values {
        indent(out, depth + 1);
        out.push_str(&value.name);
        out.push_str(" = ");
        out.push_str(&value.value);
        out.push('\n');
    }
    for child in &node.nodes {
        write_node(out, child, depth + 1);
    }
    indent(out, depth);
    out.push_str("}\n");
}

fn indent(out: &mut String, depth: usize) {
    for _ in 0..depth {
        out.push('\t');
    }
}
