//! Key edits.

use confpatch_pattern::select::{matching_values, resolve_position};
use confpatch_pattern::{Command, Index, KeySelector, Operator, VectorIndex};
use confpatch_tree::{Node, Value};

use crate::path::{resolve_value, split_elements, NodeStack};

use super::arith;
use super::error::EditError;
use super::interpolate::interpolate;
use super::{MergeContext, PendingWrite};

/// Apply `operator` to an existing value, optionally to one or every
/// element of a delimited value.
pub fn combine(
    old: &str,
    operator: Operator,
    vector: Option<VectorIndex>,
    new: &str,
) -> Result<String, EditError> {
    let VectorIndex {
        position,
        separator,
    } = match vector {
        Some(vector) => vector,
        None => return arith::apply(operator, old, new),
    };

    let mut parts: Vec<String> = split_elements(old, separator)
        .into_iter()
        .map(str::to_string)
        .collect();
    let positions: Vec<usize> = match position {
        Index::All => (0..parts.len()).collect(),
        Index::At(n) => vec![resolve_position(n, parts.len()).ok_or_else(|| {
            EditError::VectorIndexOutOfRange {
                index: n,
                value: old.to_string(),
            }
        })?],
    };
    for p in positions {
        parts[p] = arith::apply(operator, &parts[p], new)?;
    }
    Ok(parts.join(&separator.to_string()))
}

fn reject_operator(command: Command, operator: Operator) -> Result<(), EditError> {
    if operator.is_assign() {
        Ok(())
    } else {
        Err(EditError::InvalidModifier {
            command,
            modifier: "an operator",
        })
    }
}

fn reject_vector(command: Command, selector: &KeySelector) -> Result<(), EditError> {
    match selector.vector {
        None => Ok(()),
        Some(_) => Err(EditError::InvalidModifier {
            command,
            modifier: "a vector index",
        }),
    }
}

fn reject_index(command: Command, selector: &KeySelector) -> Result<(), EditError> {
    match selector.index {
        None => Ok(()),
        Some(_) => Err(EditError::InvalidModifier {
            command,
            modifier: "an index",
        }),
    }
}

fn reject_wildcards(command: Command, selector: &KeySelector) -> Result<(), EditError> {
    if selector.has_wildcards() {
        Err(EditError::InvalidModifier {
            command,
            modifier: "wildcards",
        })
    } else {
        Ok(())
    }
}

/// Apply one patch key to `node`. Returns the number of keys changed.
pub(super) fn edit_value(
    stack: &NodeStack<'_>,
    node: &mut Node,
    patch: &Value,
    ctx: &mut MergeContext<'_>,
) -> Result<usize, EditError> {
    let (command, rest) = Command::parse(&patch.name);
    let catalog = ctx.catalog();

    if command == Command::Special {
        let (operator, path) = Operator::parse(rest);
        let write = {
            let frame = stack.replace_top(&*node);
            let new = interpolate(&patch.value, &frame, catalog)?;
            let target = resolve_value(&frame, catalog, path)?;
            let value = combine(&target.value, operator, target.vector, &new)?;
            PendingWrite {
                location: target.location,
                key: target.key,
                value,
            }
        };
        ctx.push_write(write);
        return Ok(1);
    }

    if command == Command::Delete {
        return delete_values(node, rest);
    }

    let new = {
        let frame = stack.replace_top(&*node);
        interpolate(&patch.value, &frame, catalog)?
    };
    edit_with_value(node, command, rest, new, stack.is_root())
}

fn delete_values(node: &mut Node, rest: &str) -> Result<usize, EditError> {
    let (operator, name) = Operator::parse(rest);
    reject_operator(Command::Delete, operator)?;
    let selector = KeySelector::parse(name)?;
    reject_vector(Command::Delete, &selector)?;

    let mut doomed = match selector.index {
        Some(index) => index.pick(&matching_values(node, &selector.name)),
        None if selector.has_wildcards() => matching_values(node, &selector.name),
        None => return Ok(node.remove_values(&selector.name)),
    };
    doomed.sort_unstable();
    for &i in doomed.iter().rev() {
        node.values.remove(i);
    }
    Ok(doomed.len())
}

/// Commands that take the (interpolated) patch value.
fn edit_with_value(
    node: &mut Node,
    command: Command,
    rest: &str,
    new: String,
    at_root: bool,
) -> Result<usize, EditError> {
    match command {
        Command::Insert => {
            let (operator, name) = Operator::parse(rest);
            reject_operator(command, operator)?;
            let selector = KeySelector::parse(name)?;
            reject_vector(command, &selector)?;
            match selector.index {
                None => node.add_value(selector.name, new),
                Some(Index::At(n)) if n >= 0 => node.insert_value(n as usize, selector.name, new),
                Some(_) => {
                    return Err(EditError::InvalidModifier {
                        command,
                        modifier: "a wildcard or negative index",
                    })
                }
            }
            Ok(1)
        }

        Command::Replace => {
            let (operator, name) = Operator::parse(rest);
            reject_operator(command, operator)?;
            let selector = KeySelector::parse(name)?;
            reject_index(command, &selector)?;
            reject_vector(command, &selector)?;
            reject_wildcards(command, &selector)?;
            node.remove_values(&selector.name);
            node.add_value(selector.name, new);
            Ok(1)
        }

        Command::Create => {
            let (operator, name) = Operator::parse(rest);
            reject_operator(command, operator)?;
            let selector = KeySelector::parse(name)?;
            reject_index(command, &selector)?;
            reject_vector(command, &selector)?;
            reject_wildcards(command, &selector)?;
            if node.has_value(&selector.name) {
                return Ok(0);
            }
            node.add_value(selector.name, new);
            Ok(1)
        }

        Command::Edit | Command::Copy => {
            let (operator, name) = Operator::parse(rest);
            let selector = KeySelector::parse(name)?;
            let matches = matching_values(node, &selector.name);
            if matches.is_empty() {
                return Ok(0);
            }
            let targets = selector.index.unwrap_or(Index::At(0)).pick(&matches);
            if targets.is_empty() {
                let index = match selector.index {
                    Some(Index::At(n)) => n,
                    _ => 0,
                };
                return Err(EditError::IndexOutOfRange {
                    index,
                    matches: matches.len(),
                });
            }

            // Compute every result first so a failing element leaves all keys untouched.
            let results = targets
                .iter()
                .map(|&i| combine(&node.values[i].value, operator, selector.vector, &new))
                .collect::<Result<Vec<_>, _>>()?;
            for (&i, value) in targets.iter().zip(results) {
                if command == Command::Edit {
                    node.values[i].value = value;
                } else {
                    let name = node.values[i].name.clone();
                    node.add_value(name, value);
                }
            }
            Ok(targets.len())
        }

        Command::Rename => {
            if at_root {
                return Err(EditError::RenameRoot);
            }
            node.name = new;
            Ok(1)
        }

        Command::Paste | Command::Special | Command::Delete => Err(EditError::InvalidCommand {
            command,
            kind: "key",
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn part() -> Node {
        Node::new("PART")
            .with_value("name", "probe")
            .with_value("size", "10,20,30")
            .with_value("tag", "a")
            .with_value("tag", "b")
            .with_value("mass", "2")
    }

    fn edit(node: &mut Node, name: &str, value: &str, at_root: bool) -> Result<usize, EditError> {
        let (command, rest) = Command::parse(name);
        if command == Command::Delete {
            return delete_values(node, rest);
        }
        edit_with_value(node, command, rest, value.to_string(), at_root)
    }

    #[test]
    fn test_vector_index_add() {
        let mut node = part();
        edit(&mut node, "@size,0[1] +", "5", true).unwrap();
        assert_eq!(node.value("size"), Some("10,25,30"));
    }

    #[test]
    fn test_vector_every_element() {
        let mut node = part();
        edit(&mut node, "@size[*] *", "2", true).unwrap();
        assert_eq!(node.value("size"), Some("20,40,60"));
    }

    #[test]
    fn test_vector_out_of_range_keeps_value() {
        let mut node = part();
        let err = edit(&mut node, "@size[3]", "1", true).unwrap_err();
        assert!(matches!(err, EditError::VectorIndexOutOfRange { index: 3, .. }));
        assert_eq!(node.value("size"), Some("10,20,30"));
    }

    #[test]
    fn test_edit_first_and_indexed_and_all() {
        let mut node = part();
        edit(&mut node, "@tag", "x", true).unwrap();
        assert_eq!(node.values_named("tag").collect::<Vec<_>>(), vec!["x", "b"]);
        edit(&mut node, "@tag,-1", "y", true).unwrap();
        assert_eq!(node.values_named("tag").collect::<Vec<_>>(), vec!["x", "y"]);
        assert_eq!(edit(&mut node, "@tag,*", "z", true).unwrap(), 2);
        assert_eq!(node.values_named("tag").collect::<Vec<_>>(), vec!["z", "z"]);
    }

    #[test]
    fn test_edit_index_out_of_range() {
        let mut node = part();
        assert!(matches!(
            edit(&mut node, "@tag,2", "x", true),
            Err(EditError::IndexOutOfRange { index: 2, matches: 2 })
        ));
        assert_eq!(edit(&mut node, "@missing", "x", true).unwrap(), 0);
    }

    #[test]
    fn test_maths_failure_keeps_value() {
        let mut node = part();
        assert!(edit(&mut node, "@name *", "2", true).is_err());
        assert_eq!(node.value("name"), Some("probe"));
        edit(&mut node, "@mass *", "2.5", true).unwrap();
        assert_eq!(node.value("mass"), Some("5"));
    }

    #[test]
    fn test_copy_appends() {
        let mut node = part();
        edit(&mut node, "+mass +", "1", true).unwrap();
        assert_eq!(node.values_named("mass").collect::<Vec<_>>(), vec!["2", "3"]);
    }

    #[test]
    fn test_insert_rules() {
        let mut node = part();
        edit(&mut node, "tag,1", "mid", true).unwrap();
        assert_eq!(node.values_named("tag").collect::<Vec<_>>(), vec!["a", "mid", "b"]);
        edit(&mut node, "cost", "100", true).unwrap();
        assert_eq!(node.value("cost"), Some("100"));
        assert!(matches!(
            edit(&mut node, "cost +", "1", true),
            Err(EditError::InvalidModifier { .. })
        ));
    }

    #[test]
    fn test_replace_rules() {
        let mut node = part();
        edit(&mut node, "%tag", "only", true).unwrap();
        assert_eq!(node.values_named("tag").collect::<Vec<_>>(), vec!["only"]);
        edit(&mut node, "%fresh", "new", true).unwrap();
        assert_eq!(node.value("fresh"), Some("new"));
        assert!(edit(&mut node, "%tag,0", "x", true).is_err());
        assert!(edit(&mut node, "%tag *", "x", true).is_err());
        assert!(edit(&mut node, "%ta*", "x", true).is_err());
    }

    #[test]
    fn test_delete_rules() {
        let mut node = part();
        assert_eq!(edit(&mut node, "-tag,1", "", true).unwrap(), 1);
        assert_eq!(node.values_named("tag").collect::<Vec<_>>(), vec!["a"]);

        let mut node = part();
        assert_eq!(edit(&mut node, "!ta*", "", true).unwrap(), 2);
        assert!(!node.has_value("tag"));

        let mut node = part();
        assert_eq!(edit(&mut node, "-tag", "", true).unwrap(), 2);
        assert!(edit(&mut node, "-mass +", "", true).is_err());
    }

    #[test]
    fn test_unspaced_star_edits_wildcard_name() {
        let mut node = Node::new("PART")
            .with_value("tagA", "a")
            .with_value("tagB", "b");
        assert_eq!(edit(&mut node, "@tag*", "x", true).unwrap(), 1);
        assert_eq!(node.value("tagA"), Some("x"));
        assert_eq!(edit(&mut node, "@tag*,*", "y", true).unwrap(), 2);
        assert_eq!(node.value("tagB"), Some("y"));
    }

    #[test]
    fn test_create_only_when_absent() {
        let mut node = part();
        assert_eq!(edit(&mut node, "&mass", "9", true).unwrap(), 0);
        assert_eq!(node.value("mass"), Some("2"));
        assert_eq!(edit(&mut node, "&cost", "9", true).unwrap(), 1);
        assert!(edit(&mut node, "&cost,1", "9", true).is_err());
    }

    #[test]
    fn test_rename() {
        let mut node = part();
        assert_eq!(edit(&mut node, "|name", "x", true).unwrap_err(), EditError::RenameRoot);
        edit(&mut node, "|name", "RENAMED", false).unwrap();
        assert_eq!(node.name, "RENAMED");
    }

    #[test]
    fn test_regex_edit() {
        let mut node = part();
        edit(&mut node, "@name ^", ":probe:drone:", true).unwrap();
        assert_eq!(node.value("name"), Some("drone"));
    }
}
