//! Child-node edits.

use confpatch_pattern::{check_constraints, ChildSelector, Command, Wildcard};
use confpatch_tree::Node;

use crate::path::{resolve_node, NodeStack};

use super::error::EditError;
use super::{modify_node, MergeContext};

/// `MODULE,2` -> (`MODULE`, Some(2)).
fn split_position(name: &str) -> (&str, Option<usize>) {
    match name.rsplit_once(',') {
        Some((head, tail)) => match tail.trim().parse::<usize>() {
            Ok(position) => (head.trim(), Some(position)),
            Err(_) => (name.trim(), None),
        },
        None => (name.trim(), None),
    }
}

/// Build a child from scratch by merging `patch` onto `seed`.
fn build_child(
    stack: &NodeStack<'_>,
    node: &Node,
    seed: &Node,
    patch: &Node,
    ctx: &mut MergeContext<'_>,
) -> Node {
    let frame = stack.replace_top(node);
    let child = frame.push(seed);
    modify_node(&child, patch, ctx)
}

/// Merge `patch` onto the existing child at `index`.
fn merge_child(
    stack: &NodeStack<'_>,
    node: &Node,
    index: usize,
    patch: &Node,
    ctx: &mut MergeContext<'_>,
) -> Node {
    let frame = stack.replace_top(node);
    let child = frame.push(&node.nodes[index]);
    modify_node(&child, patch, ctx)
}

/// Seed for Replace/Create when nothing matches: the selected type, named
/// after the selector unless the patch body sets a name itself.
fn seed_for(selector: &ChildSelector, patch: &Node) -> Node {
    let mut seed = Node::new(&selector.node_type);
    let body_names_it = patch
        .values
        .iter()
        .any(|v| Command::parse(&v.name).1.trim() == "name");
    if let Some(name) = &selector.name {
        if !body_names_it && !Wildcard::has_wildcards(name) {
            seed.add_value("name", name);
        }
    }
    seed
}

fn has_wildcards(selector: &ChildSelector) -> bool {
    Wildcard::has_wildcards(&selector.node_type)
        || selector.name.as_deref().map_or(false, Wildcard::has_wildcards)
}

/// Every candidate of a wildcard selector that satisfies its constraint.
fn wildcard_matches(selector: &ChildSelector, node: &Node) -> Vec<usize> {
    selector
        .candidates(node)
        .into_iter()
        .filter(|&i| match &selector.constraint {
            Some(constraint) => check_constraints(&node.nodes[i], constraint),
            None => true,
        })
        .collect()
}

/// Apply one patch child to `node`. Returns the number of nodes changed.
pub(super) fn edit_child(
    stack: &NodeStack<'_>,
    node: &mut Node,
    patch: &Node,
    ctx: &mut MergeContext<'_>,
) -> Result<usize, EditError> {
    let (command, rest) = Command::parse(&patch.name);
    let depth = stack.depth();

    match command {
        Command::Insert => {
            let (name, position) = split_position(rest);
            let seed = Node::new(name);
            let built = build_child(stack, node, &seed, patch, ctx);
            match position {
                Some(position) => node.insert_node(position, built),
                None => node.add_node(built),
            }
            ctx.flush(depth, node);
            return Ok(1);
        }
        Command::Paste => {
            let catalog = ctx.catalog();
            let built = {
                let frame = stack.replace_top(&*node);
                let source = resolve_node(&frame, catalog, rest)?;
                let child = frame.push(source.node);
                modify_node(&child, patch, ctx).fork()
            };
            node.add_node(built);
            ctx.flush(depth, node);
            return Ok(1);
        }
        Command::Rename | Command::Special => {
            return Err(EditError::InvalidCommand {
                command,
                kind: "node",
            })
        }
        _ => {}
    }

    let selector = ChildSelector::parse(rest)?;
    let matches = selector.select(node);

    match command {
        Command::Edit => {
            for &i in &matches {
                let edited = merge_child(stack, node, i, patch, ctx);
                node.nodes[i] = edited;
                ctx.flush(depth, node);
            }
            Ok(matches.len())
        }
        Command::Copy => {
            for &i in &matches {
                let copy = merge_child(stack, node, i, patch, ctx).fork();
                node.add_node(copy);
                ctx.flush(depth, node);
            }
            Ok(matches.len())
        }
        Command::Delete => {
            let mut doomed = if selector.index.is_none() && has_wildcards(&selector) {
                wildcard_matches(&selector, node)
            } else {
                matches
            };
            doomed.sort_unstable();
            for &i in doomed.iter().rev() {
                node.nodes.remove(i);
            }
            Ok(doomed.len())
        }
        Command::Replace => {
            match matches.first() {
                Some(&i) => {
                    let edited = merge_child(stack, node, i, patch, ctx);
                    node.nodes[i] = edited;
                }
                None => {
                    let seed = seed_for(&selector, patch);
                    let built = build_child(stack, node, &seed, patch, ctx);
                    node.add_node(built);
                }
            }
            ctx.flush(depth, node);
            Ok(1)
        }
        Command::Create => {
            if !matches.is_empty() {
                return Ok(0);
            }
            let seed = seed_for(&selector, patch);
            let built = build_child(stack, node, &seed, patch, ctx);
            node.add_node(built);
            ctx.flush(depth, node);
            Ok(1)
        }
        Command::Insert | Command::Paste | Command::Rename | Command::Special => {
            Err(EditError::InvalidCommand {
                command,
                kind: "node",
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_position() {
        assert_eq!(split_position("MODULE"), ("MODULE", None));
        assert_eq!(split_position("MODULE,2"), ("MODULE", Some(2)));
        assert_eq!(split_position("MODULE,x"), ("MODULE,x", None));
    }

    #[test]
    fn test_seed_names_from_selector() {
        let selector = ChildSelector::parse("MODULE[ModuleFoo]").unwrap();
        let seed = seed_for(&selector, &Node::new("%MODULE[ModuleFoo]"));
        assert_eq!(seed.value("name"), Some("ModuleFoo"));

        let body = Node::new("%MODULE[ModuleFoo]").with_value("name", "ModuleFoo");
        assert!(!seed_for(&selector, &body).has_value("name"));

        let wild = ChildSelector::parse("MODULE[Module*]").unwrap();
        assert!(!seed_for(&wild, &Node::new("%MODULE[Module*]")).has_value("name"));
    }
}
