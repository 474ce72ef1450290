//! `#text$path$text` value templates.

use crate::catalog::Catalog;
use crate::path::{resolve_value, NodeStack};

use super::error::EditError;

/// Expand a template value, or return the value unchanged.
///
/// A template starts with `#` and holds at least two `$`. Text between
/// pairs of `$` is a value path; any path that fails to resolve fails the
/// whole value.
pub fn interpolate<'r>(
    value: &str,
    stack: &NodeStack<'r>,
    catalog: &'r Catalog,
) -> Result<String, EditError> {
    let body = match value.strip_prefix('#') {
        Some(body) if body.matches('$').count() >= 2 => body,
        _ => return Ok(value.to_string()),
    };

    let parts: Vec<&str> = body.split('$').collect();
    if parts.len() % 2 == 0 {
        return Err(EditError::UnbalancedInterpolation(value.to_string()));
    }

    let mut out = String::with_capacity(body.len());
    for (i, part) in parts.into_iter().enumerate() {
        if i % 2 == 0 {
            out.push_str(part);
            continue;
        }
        let resolved = resolve_value(stack, catalog, part)
            .and_then(|target| target.read())
            .map_err(|source| EditError::Unresolved {
                placeholder: part.to_string(),
                source,
            })?;
        out.push_str(&resolved);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use confpatch_tree::Node;

    fn setup() -> (Node, Catalog) {
        let part = Node::new("PART")
            .with_value("name", "probe")
            .with_value("mass", "0.5");
        let catalog = Catalog::new().with_file(
            "a.cfg",
            "",
            vec![Node::new("GLOBALS").with_value("scale", "2")],
        );
        (part, catalog)
    }

    #[test]
    fn test_plain_values_pass_through() {
        let (part, catalog) = setup();
        let stack = NodeStack::root(&part);
        assert_eq!(interpolate("plain", &stack, &catalog).unwrap(), "plain");
        assert_eq!(interpolate("#tag", &stack, &catalog).unwrap(), "#tag");
        assert_eq!(interpolate("#one$dollar", &stack, &catalog).unwrap(), "#one$dollar");
    }

    #[test]
    fn test_template_expansion() {
        let (part, catalog) = setup();
        let stack = NodeStack::root(&part);
        assert_eq!(
            interpolate("#$name$-mk2 ($mass$t)", &stack, &catalog).unwrap(),
            "probe-mk2 (0.5t)"
        );
        assert_eq!(
            interpolate("#x$@GLOBALS/scale$", &stack, &catalog).unwrap(),
            "x2"
        );
    }

    #[test]
    fn test_odd_delimiters_are_error() {
        let (part, catalog) = setup();
        let stack = NodeStack::root(&part);
        assert!(matches!(
            interpolate("#$name$$mass", &stack, &catalog),
            Err(EditError::UnbalancedInterpolation(_))
        ));
    }

    #[test]
    fn test_unresolved_placeholder_fails_whole_value() {
        let (part, catalog) = setup();
        let stack = NodeStack::root(&part);
        let err = interpolate("#$name$ $cost$", &stack, &catalog).unwrap_err();
        assert!(matches!(err, EditError::Unresolved { ref placeholder, .. } if placeholder == "cost"));
    }
}
