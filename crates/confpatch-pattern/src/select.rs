//! Child and key selectors used inside patch bodies.
//!
//! Child selectors look like `MODULE[ModuleEngines*],1:HAS[#thrust[>100]]`;
//! key selectors like `size,0[1, ]`. Selection always happens in two
//! phases: collect the indices of every match, then pick from that list.

use confpatch_tree::Node;

use crate::brackets::{find_clause, is_bracket_balanced, matching_close, split_top_level};
use crate::error::PatternError;
use crate::matcher::check_constraints;
use crate::wildcard::wildcard_match;

/// Which of several matches to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Index {
    /// The nth match; negative counts from the end.
    At(i64),
    /// Every match.
    All,
}

impl Index {
    pub fn parse(s: &str) -> Option<Index> {
        let s = s.trim();
        if s == "*" {
            return Some(Index::All);
        }
        s.parse::<i64>().ok().map(Index::At)
    }

    /// Pick from a list of candidate positions.
    pub fn pick(&self, matches: &[usize]) -> Vec<usize> {
        match *self {
            Index::All => matches.to_vec(),
            Index::At(n) => resolve_position(n, matches.len())
                .map(|i| vec![matches[i]])
                .unwrap_or_default(),
        }
    }
}

/// Map a possibly negative position onto `0..len`.
pub fn resolve_position(n: i64, len: usize) -> Option<usize> {
    let len = len as i64;
    let i = if n < 0 { len + n } else { n };
    (0..len).contains(&i).then_some(i as usize)
}

/// Positions of children whose name wildcard-matches `node_type` and, when
/// given, whose `name` key wildcard-matches `name`.
pub fn matching_children(node: &Node, node_type: &str, name: Option<&str>) -> Vec<usize> {
    node.nodes
        .iter()
        .enumerate()
        .filter(|(_, child)| wildcard_match(&child.name, node_type))
        .filter(|(_, child)| match name {
            None => true,
            Some(pattern) => child
                .value("name")
                .map(|v| wildcard_match(v, pattern))
                .unwrap_or(false),
        })
        .map(|(i, _)| i)
        .collect()
}

/// Positions of keys whose name wildcard-matches `pattern`.
pub fn matching_values(node: &Node, pattern: &str) -> Vec<usize> {
    node.values
        .iter()
        .enumerate()
        .filter(|(_, v)| wildcard_match(&v.name, pattern))
        .map(|(i, _)| i)
        .collect()
}

/// Selector for child nodes: `TYPE[name],index:HAS[constraints]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChildSelector {
    pub node_type: String,
    pub name: Option<String>,
    pub index: Option<Index>,
    pub constraint: Option<String>,
}

impl ChildSelector {
    /// Parse a selector with its command sigil already removed.
    pub fn parse(selector: &str) -> Result<Self, PatternError> {
        if !is_bracket_balanced(selector) {
            return Err(PatternError::UnbalancedBrackets(selector.to_string()));
        }

        let (rest, constraint) = match find_clause(selector, "HAS") {
            Some((whole, inner)) => (
                format!("{}{}", &selector[..whole.start], &selector[whole.end..]),
                Some(selector[inner].to_string()),
            ),
            None => (selector.to_string(), None),
        };

        let parts = split_top_level(&rest, &[',']);
        let (head, index) = match parts.as_slice() {
            [head] => (*head, None),
            [head, index] => {
                let parsed = Index::parse(index).ok_or_else(|| PatternError::InvalidIndex {
                    index: index.to_string(),
                    name: selector.to_string(),
                })?;
                (*head, Some(parsed))
            }
            _ => return Err(PatternError::MalformedSelector(selector.to_string())),
        };

        let (node_type, name) = split_type_and_name(head)
            .ok_or_else(|| PatternError::MalformedSelector(selector.to_string()))?;
        if node_type.is_empty() {
            return Err(PatternError::MalformedSelector(selector.to_string()));
        }

        Ok(Self {
            node_type,
            name,
            index,
            constraint,
        })
    }

    /// `TYPE,*` and `TYPE:HAS[...]` address every match.
    pub fn selects_all(&self) -> bool {
        self.index == Some(Index::All) || self.constraint.is_some()
    }

    /// Whether `node` itself has the selected type, name and constraint.
    pub fn matches(&self, node: &Node) -> bool {
        wildcard_match(&node.name, &self.node_type)
            && match &self.name {
                None => true,
                Some(pattern) => node
                    .value("name")
                    .map(|v| wildcard_match(v, pattern))
                    .unwrap_or(false),
            }
            && self
                .constraint
                .as_deref()
                .map(|c| check_constraints(node, c))
                .unwrap_or(true)
    }

    /// All children matching type and name, ignoring index and constraint.
    pub fn candidates(&self, node: &Node) -> Vec<usize> {
        matching_children(node, &self.node_type, self.name.as_deref())
    }

    /// Children this selector addresses in `node`.
    ///
    /// With a constraint, every candidate satisfying it; with `,*`, every
    /// candidate; otherwise the single candidate at the index (default 0).
    pub fn select(&self, node: &Node) -> Vec<usize> {
        let candidates = self.candidates(node);
        match &self.constraint {
            Some(constraint) => candidates
                .into_iter()
                .filter(|&i| check_constraints(&node.nodes[i], constraint))
                .collect(),
            None => self.index.unwrap_or(Index::At(0)).pick(&candidates),
        }
    }

    /// A single child: the indexed candidate, or with a constraint the
    /// first satisfying candidate at or after the index.
    pub fn select_one(&self, node: &Node) -> Option<usize> {
        let candidates = self.candidates(node);
        let start = match self.index {
            Some(Index::At(n)) => resolve_position(n, candidates.len())?,
            _ => 0,
        };
        match &self.constraint {
            Some(constraint) => candidates[start..]
                .iter()
                .copied()
                .find(|&i| check_constraints(&node.nodes[i], constraint)),
            None => candidates.get(start).copied(),
        }
    }
}

/// Split `TYPE[name]` into its type and optional name pattern.
fn split_type_and_name(head: &str) -> Option<(String, Option<String>)> {
    let head = head.trim();
    match head.find('[') {
        None => Some((head.to_string(), None)),
        Some(open) => {
            let close = matching_close(head, open)?;
            if close != head.len() - 1 {
                return None;
            }
            Some((
                head[..open].trim().to_string(),
                Some(head[open + 1..close].trim().to_string()),
            ))
        }
    }
}

/// Element addressing inside a delimited value: `[position,separator]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VectorIndex {
    pub position: Index,
    pub separator: char,
}

/// Selector for keys: `name[,index][[position[,separator]]]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeySelector {
    pub name: String,
    pub index: Option<Index>,
    pub vector: Option<VectorIndex>,
}

impl KeySelector {
    /// Parse a key selector with its command and operator already removed.
    pub fn parse(selector: &str) -> Result<Self, PatternError> {
        let selector = selector.trim();
        if !is_bracket_balanced(selector) {
            return Err(PatternError::UnbalancedBrackets(selector.to_string()));
        }

        let (head, vector) = match selector.find('[') {
            Some(open) if selector.ends_with(']') => {
                let inner = &selector[open + 1..selector.len() - 1];
                let (position, separator) = match inner.split_once(',') {
                    Some((position, separator)) => {
                        (position, separator.chars().next().unwrap_or(','))
                    }
                    None => (inner, ','),
                };
                let position = Index::parse(position).ok_or_else(|| PatternError::InvalidIndex {
                    index: position.to_string(),
                    name: selector.to_string(),
                })?;
                (
                    &selector[..open],
                    Some(VectorIndex {
                        position,
                        separator,
                    }),
                )
            }
            Some(_) => return Err(PatternError::MalformedSelector(selector.to_string())),
            None => (selector, None),
        };

        let (name, index) = match head.rsplit_once(',') {
            Some((name, tail)) => match Index::parse(tail) {
                Some(index) => (name, Some(index)),
                None => (head, None),
            },
            None => (head, None),
        };

        let name = name.trim();
        if name.is_empty() {
            return Err(PatternError::MalformedSelector(selector.to_string()));
        }
        Ok(Self {
            name: name.to_string(),
            index,
            vector,
        })
    }

    pub fn has_wildcards(&self) -> bool {
        self.name.contains('*') || self.name.contains('?')
    }

    /// Positions of keys this selector addresses (index default 0).
    pub fn select(&self, node: &Node) -> Vec<usize> {
        let matches = matching_values(node, &self.name);
        self.index.unwrap_or(Index::At(0)).pick(&matches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn part() -> Node {
        Node::new("PART")
            .with_value("name", "probe")
            .with_value("tag", "a")
            .with_value("tag", "b")
            .with_value("tags", "c")
            .with_node(Node::new("MODULE").with_value("name", "ModuleEngines"))
            .with_node(Node::new("MODULE").with_value("name", "ModuleCommand"))
            .with_node(
                Node::new("MODULE")
                    .with_value("name", "ModuleEnginesFX")
                    .with_value("thrust", "200"),
            )
            .with_node(Node::new("RESOURCE").with_value("name", "Fuel"))
    }

    #[test]
    fn test_child_selector_parse_forms() {
        let s = ChildSelector::parse("MODULE").unwrap();
        assert_eq!((s.node_type.as_str(), s.name.as_deref(), s.index), ("MODULE", None, None));

        let s = ChildSelector::parse("MODULE[ModuleEngines*],1").unwrap();
        assert_eq!(s.name.as_deref(), Some("ModuleEngines*"));
        assert_eq!(s.index, Some(Index::At(1)));

        let s = ChildSelector::parse("MODULE,*").unwrap();
        assert_eq!(s.index, Some(Index::All));
        assert!(s.selects_all());

        let s = ChildSelector::parse("MODULE:HAS[#thrust[>100]]").unwrap();
        assert_eq!(s.constraint.as_deref(), Some("#thrust[>100]"));
        assert!(s.selects_all());
    }

    #[test]
    fn test_child_selector_errors() {
        assert!(ChildSelector::parse("MODULE,x").is_err());
        assert!(ChildSelector::parse("MODULE[a]b").is_err());
        assert!(ChildSelector::parse("[a]").is_err());
        assert!(ChildSelector::parse("MODULE[a").is_err());
    }

    #[test]
    fn test_child_select_indexed() {
        let node = part();
        let s = ChildSelector::parse("MODULE[ModuleEngines*],1").unwrap();
        assert_eq!(s.select(&node), vec![2]);
        let s = ChildSelector::parse("MODULE,-1").unwrap();
        assert_eq!(s.select(&node), vec![2]);
        let s = ChildSelector::parse("MODULE,5").unwrap();
        assert!(s.select(&node).is_empty());
    }

    #[test]
    fn test_child_select_all_and_constraint() {
        let node = part();
        assert_eq!(ChildSelector::parse("MODULE,*").unwrap().select(&node), vec![0, 1, 2]);
        let s = ChildSelector::parse("MODULE:HAS[#thrust[>100]]").unwrap();
        assert_eq!(s.select(&node), vec![2]);
        assert_eq!(s.select_one(&node), Some(2));
    }

    #[test]
    fn test_matches_node_itself() {
        let node = part();
        assert!(ChildSelector::parse("PART[probe]").unwrap().matches(&node));
        assert!(ChildSelector::parse("P*:HAS[@RESOURCE[Fuel]]").unwrap().matches(&node));
        assert!(!ChildSelector::parse("PART[other]").unwrap().matches(&node));
    }

    #[test]
    fn test_wildcard_type() {
        let node = part();
        let s = ChildSelector::parse("RES*").unwrap();
        assert_eq!(s.select(&node), vec![3]);
    }

    #[test]
    fn test_key_selector_forms() {
        let k = KeySelector::parse("size,0[1]").unwrap();
        assert_eq!(k.name, "size");
        assert_eq!(k.index, Some(Index::At(0)));
        assert_eq!(
            k.vector,
            Some(VectorIndex {
                position: Index::At(1),
                separator: ','
            })
        );

        let k = KeySelector::parse("size[*, ]").unwrap();
        assert_eq!(k.index, None);
        assert_eq!(
            k.vector,
            Some(VectorIndex {
                position: Index::All,
                separator: ' '
            })
        );

        let k = KeySelector::parse("tag,*").unwrap();
        assert_eq!(k.index, Some(Index::All));

        let k = KeySelector::parse("title,with,comma").unwrap();
        assert_eq!(k.name, "title,with,comma");
        assert_eq!(k.index, None);
    }

    #[test]
    fn test_key_select() {
        let node = part();
        assert_eq!(KeySelector::parse("tag,1").unwrap().select(&node), vec![2]);
        assert_eq!(KeySelector::parse("tag,*").unwrap().select(&node), vec![1, 2]);
        assert_eq!(KeySelector::parse("tag*,*").unwrap().select(&node), vec![1, 2, 3]);
        assert!(KeySelector::parse("tag,4").unwrap().select(&node).is_empty());
    }

    #[test]
    fn test_resolve_position() {
        assert_eq!(resolve_position(0, 3), Some(0));
        assert_eq!(resolve_position(-1, 3), Some(2));
        assert_eq!(resolve_position(3, 3), None);
        assert_eq!(resolve_position(-4, 3), None);
    }
}
