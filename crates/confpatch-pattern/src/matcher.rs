//! Root-patch node matching and `:HAS[...]` constraint evaluation.

use confpatch_tree::Node;

use crate::brackets::{find_clause, is_bracket_balanced, matching_close, split_top_level};
use crate::error::PatternError;
use crate::select::matching_children;
use crate::wildcard::{value_matches, Wildcard};

/// Evaluate a constraint string against `node`.
///
/// Clauses are split on `,` and `&` outside brackets and must all hold.
/// Whitespace is ignored and an empty constraint is always satisfied.
///
/// - `@TYPE[name]:HAS[...]` some child matches (and satisfies the nested constraint)
/// - `!TYPE[name]:HAS[...]` no child does
/// - `#key[value]` some `key` value matches (`<N`/`>N` compare numerically)
/// - `~key[]` there is no `key`; `~key[value]` no `key` value matches
pub fn check_constraints(node: &Node, constraints: &str) -> bool {
    let constraints: String = constraints.chars().filter(|c| !c.is_whitespace()).collect();
    if constraints.is_empty() {
        return true;
    }
    split_top_level(&constraints, &[',', '&'])
        .into_iter()
        .all(|clause| check_clause(node, clause))
}

fn check_clause(node: &Node, clause: &str) -> bool {
    if clause.is_empty() {
        return true;
    }

    let (head, nested) = match find_clause(clause, "HAS") {
        Some((whole, inner)) => (&clause[..whole.start], &clause[inner]),
        None => (clause, ""),
    };

    let mut chars = head.chars();
    let sigil = match chars.next() {
        Some(c) => c,
        None => return false,
    };
    let body = chars.as_str();
    let (key, value) = match body.find('[') {
        Some(open) => {
            let close = matching_close(body, open).unwrap_or(body.len());
            (&body[..open], Some(&body[open + 1..close]))
        }
        None => (body, None),
    };

    match sigil {
        '@' | '!' => {
            let any = matching_children(node, key, value)
                .into_iter()
                .any(|i| check_constraints(&node.nodes[i], nested));
            if sigil == '@' {
                any
            } else {
                !any
            }
        }
        '#' => {
            let found = match value {
                None => node.has_value(key),
                Some(pattern) => node.values_named(key).any(|v| value_matches(v, pattern)),
            };
            found && check_constraints(node, nested)
        }
        '~' => {
            let absent = match value {
                None | Some("") => !node.has_value(key),
                Some(pattern) => !node.values_named(key).any(|v| value_matches(v, pattern)),
            };
            absent && check_constraints(node, nested)
        }
        _ => false,
    }
}

/// Selects the catalog documents a root patch applies to.
///
/// Parsed from a root patch name with its command sigil, pass specifier and
/// `:NEEDS` clause already removed: `TYPE[p1,p2|p3]:HAS[...]`. The type
/// is compared exactly; the optional name patterns are wildcard-matched
/// against the document's `name` key, any one sufficing.
#[derive(Debug, Clone)]
pub struct NodeMatcher {
    node_type: String,
    name_patterns: Option<Vec<Wildcard>>,
    constraints: String,
}

impl NodeMatcher {
    pub fn parse(name: &str) -> Result<Self, PatternError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(PatternError::EmptyName);
        }
        if !is_bracket_balanced(name) {
            return Err(PatternError::UnbalancedBrackets(name.to_string()));
        }

        let (head, constraints) = match find_clause(name, "HAS") {
            Some((whole, inner)) => {
                if whole.start == 0 || whole.end != name.len() {
                    return Err(PatternError::MalformedSelector(name.to_string()));
                }
                (&name[..whole.start], name[inner].to_string())
            }
            None => (name, String::new()),
        };

        let (node_type, name_patterns) = match head.find('[') {
            None => (head.trim(), None),
            Some(open) => {
                if matching_close(head, open) != Some(head.len() - 1) {
                    return Err(PatternError::MalformedSelector(name.to_string()));
                }
                let patterns = head[open + 1..head.len() - 1]
                    .split([',', '|'])
                    .map(str::trim)
                    .map(Wildcard::new)
                    .collect::<Result<Vec<_>, _>>()?;
                (head[..open].trim(), Some(patterns))
            }
        };
        if node_type.is_empty() {
            return Err(PatternError::MalformedSelector(name.to_string()));
        }

        Ok(Self {
            node_type: node_type.to_string(),
            name_patterns,
            constraints,
        })
    }

    pub fn is_match(&self, node: &Node) -> bool {
        if node.name != self.node_type {
            return false;
        }
        if let Some(patterns) = &self.name_patterns {
            let name = match node.value("name") {
                Some(name) => name,
                None => return false,
            };
            if !patterns.iter().any(|p| p.is_match(name)) {
                return false;
            }
        }
        check_constraints(node, &self.constraints)
    }

    pub fn node_type(&self) -> &str {
        &self.node_type
    }

    pub fn name_patterns(&self) -> Option<Vec<&str>> {
        self.name_patterns
            .as_ref()
            .map(|patterns| patterns.iter().map(Wildcard::pattern).collect())
    }

    pub fn constraints(&self) -> &str {
        &self.constraints
    }
}
