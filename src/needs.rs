//! `:NEEDS[...]` filtering over the whole catalog.
//!
//! Runs to completion before any patch is extracted. Every key and node
//! name carrying a `:NEEDS` clause is either kept with the clause removed
//! or deleted, depending on the known-identifier set.

use confpatch_pattern::{contains_needs, strip_needs, NeedsExpr};
use confpatch_tree::Node;

use crate::catalog::{Catalog, DocumentRef, Origin};
use crate::known::KnownIdentifiers;
use crate::progress::Progress;

fn satisfied(expr: &NeedsExpr, known: &KnownIdentifiers) -> bool {
    expr.is_satisfied(|id| known.contains(id))
}

fn mentions_needs(node: &Node) -> bool {
    contains_needs(&node.name)
        || node.values.iter().any(|v| contains_needs(&v.name))
        || node.nodes.iter().any(mentions_needs)
}

/// Filter every document in the catalog.
pub fn apply_needs(catalog: &mut Catalog, known: &KnownIdentifiers, progress: &Progress) {
    let mut removed_roots = 0usize;

    let files: Vec<(String, usize)> = catalog
        .files()
        .iter()
        .map(|f| (f.url.clone(), f.documents.len()))
        .collect();

    for (file, (url, count)) in files.into_iter().enumerate() {
        let mut index = 0;
        for _ in 0..count {
            let at = DocumentRef { file, index };
            let keep = match catalog.document_mut(at) {
                Some(node) => filter_root(node, &url, known, progress),
                None => break,
            };
            if keep {
                index += 1;
            } else {
                catalog.remove_document(at);
                removed_roots += 1;
            }
        }
    }

    if removed_roots > 0 {
        tracing::debug!(removed_roots, "needs filter removed root documents");
    }
}

/// Returns false when the root itself must be removed.
fn filter_root(node: &mut Node, url: &str, known: &KnownIdentifiers, progress: &Progress) -> bool {
    if !mentions_needs(node) {
        return true;
    }

    let origin = Origin::new(url, &node.name);
    match strip_needs(&node.name) {
        Ok(Some((name, expr))) => {
            if !satisfied(&expr, known) {
                progress.needs_unsatisfied_root(&origin);
                return false;
            }
            node.name = name;
        }
        Ok(None) => {}
        Err(e) => {
            progress.error(&origin, None, e.to_string());
            return false;
        }
    }

    let path = node.name.clone();
    filter_children(node, &path, &origin, known, progress);
    true
}

/// Values first, then children, depth first.
fn filter_children(
    node: &mut Node,
    path: &str,
    origin: &Origin,
    known: &KnownIdentifiers,
    progress: &Progress,
) {
    let values = std::mem::take(&mut node.values);
    for mut value in values {
        match strip_needs(&value.name) {
            Ok(Some((name, expr))) => {
                if !satisfied(&expr, known) {
                    progress.needs_unsatisfied_value(origin, format!("{}/{}", path, value.name));
                    continue;
                }
                value.name = name;
            }
            Ok(None) => {}
            Err(e) => {
                progress.error(origin, None, format!("{}/{}: {}", path, value.name, e));
                continue;
            }
        }
        node.values.push(value);
    }

    let children = std::mem::take(&mut node.nodes);
    for mut child in children {
        match strip_needs(&child.name) {
            Ok(Some((name, expr))) => {
                if !satisfied(&expr, known) {
                    progress.needs_unsatisfied_node(origin, format!("{}/{}", path, child.name));
                    continue;
                }
                child.name = name;
            }
            Ok(None) => {}
            Err(e) => {
                progress.error(origin, None, format!("{}/{}: {}", path, child.name, e));
                continue;
            }
        }
        let child_path = format!("{}/{}", path, child.name);
        filter_children(&mut child, &child_path, origin, known, progress);
        node.nodes.push(child);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::{CollectSink, PatchEvent};

    fn known() -> KnownIdentifiers {
        ["A", "B"].into_iter().collect()
    }

    fn run(catalog: &mut Catalog) -> Vec<PatchEvent> {
        let sink = CollectSink::new();
        let progress = Progress::with_sink(sink.clone());
        apply_needs(catalog, &known(), &progress);
        sink.events()
    }

    #[test]
    fn test_boolean_logic_on_roots() {
        let mut catalog = Catalog::new().with_file(
            "a.cfg",
            "",
            vec![
                Node::new("PART:NEEDS[A,!C]"),
                Node::new("PART:NEEDS[A,C]"),
                Node::new("PART:NEEDS[A|C]"),
                Node::new("PART:NEEDS[!A]"),
            ],
        );
        let events = run(&mut catalog);
        let names: Vec<_> = catalog.documents().map(|(_, n)| n.name.clone()).collect();
        assert_eq!(names, vec!["PART", "PART"]);
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], PatchEvent::NeedsUnsatisfiedRoot { .. }));
    }

    #[test]
    fn test_failing_root_hides_children() {
        let root = Node::new("PART:NEEDS[Z]")
            .with_value("cost:NEEDS[Z]", "1")
            .with_node(Node::new("MODULE:NEEDS[Z]"));
        let mut catalog = Catalog::new().with_file("a.cfg", "", vec![root]);
        let events = run(&mut catalog);
        assert_eq!(catalog.document_count(), 0);
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn test_nested_values_and_nodes() {
        let root = Node::new("PART")
            .with_value("name", "probe")
            .with_value("cost:NEEDS[A]", "10")
            .with_value("mass:NEEDS[Z]", "1")
            .with_node(
                Node::new("MODULE:needs[B]")
                    .with_value("key:NEEDS[!A]", "x")
                    .with_value("keep", "y"),
            )
            .with_node(Node::new("RESOURCE:NEEDS[Z|Q]"));
        let mut catalog = Catalog::new().with_file("a.cfg", "", vec![root]);
        let events = run(&mut catalog);

        let part = &catalog.files()[0].documents[0];
        assert_eq!(part.value("cost"), Some("10"));
        assert!(!part.has_value("mass"));
        assert_eq!(part.nodes.len(), 1);
        assert_eq!(part.nodes[0].name, "MODULE");
        assert!(!part.nodes[0].has_value("key"));
        assert_eq!(part.nodes[0].value("keep"), Some("y"));

        let paths: Vec<String> = events
            .iter()
            .filter_map(|e| match e {
                PatchEvent::NeedsUnsatisfiedValue { path, .. }
                | PatchEvent::NeedsUnsatisfiedNode { path, .. } => Some(path.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(
            paths,
            vec![
                "PART/mass:NEEDS[Z]",
                "PART/MODULE/key:NEEDS[!A]",
                "PART/RESOURCE:NEEDS[Z|Q]"
            ]
        );
    }

    #[test]
    fn test_untouched_without_needs() {
        let root = Node::new("PART").with_value("name", "probe");
        let mut catalog = Catalog::new().with_file("a.cfg", "", vec![root.clone()]);
        let events = run(&mut catalog);
        assert!(events.is_empty());
        assert_eq!(catalog.files()[0].documents[0], root);
    }

    #[test]
    fn test_unterminated_needs_drops_document() {
        let mut catalog =
            Catalog::new().with_file("a.cfg", "", vec![Node::new("PART:NEEDS[A"), Node::new("PART")]);
        let events = run(&mut catalog);
        assert_eq!(catalog.document_count(), 1);
        assert!(events[0].is_failure());
    }
}
