//! Command sigils.
//!
//! The first character of a node or key name selects what a patch does with
//! it. Names without a recognised sigil are plain inserts.

use serde::{Deserialize, Serialize};
use std::fmt;

/// What a patch name asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Command {
    /// No sigil: add the key or node.
    Insert,
    /// `@`: modify existing matches.
    Edit,
    /// `%`: modify the first match, or create it.
    Replace,
    /// `-` or `!`: remove matches.
    Delete,
    /// `+` or `$`: modify a copy of each match and add it.
    Copy,
    /// `|`: rename the current node.
    Rename,
    /// `#`: paste a node found by path.
    Paste,
    /// `*`: assign to a value found by path.
    Special,
    /// `&`: add only when absent.
    Create,
}

impl Command {
    /// Classify `name` by its first character, returning the command and
    /// the name with the sigil removed.
    pub fn parse(name: &str) -> (Command, &str) {
        let command = match name.chars().next() {
            Some('@') => Command::Edit,
            Some('%') => Command::Replace,
            Some('-') | Some('!') => Command::Delete,
            Some('+') | Some('$') => Command::Copy,
            Some('|') => Command::Rename,
            Some('#') => Command::Paste,
            Some('*') => Command::Special,
            Some('&') => Command::Create,
            _ => return (Command::Insert, name),
        };
        (command, &name[1..])
    }

    /// Commands a root document may carry.
    pub fn is_valid_at_root(&self) -> bool {
        matches!(
            self,
            Command::Insert | Command::Edit | Command::Copy | Command::Delete
        )
    }

    /// Canonical sigil, if any.
    pub fn sigil(&self) -> Option<char> {
        match self {
            Command::Insert => None,
            Command::Edit => Some('@'),
            Command::Replace => Some('%'),
            Command::Delete => Some('-'),
            Command::Copy => Some('+'),
            Command::Rename => Some('|'),
            Command::Paste => Some('#'),
            Command::Special => Some('*'),
            Command::Create => Some('&'),
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Command::Insert => "insert",
            Command::Edit => "edit (@)",
            Command::Replace => "replace (%)",
            Command::Delete => "delete (-)",
            Command::Copy => "copy (+)",
            Command::Rename => "rename (|)",
            Command::Paste => "paste (#)",
            Command::Special => "special (*)",
            Command::Create => "create (&)",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_each_sigil() {
        let cases = [
            ("@PART", Command::Edit),
            ("%key", Command::Replace),
            ("-key", Command::Delete),
            ("!MODULE", Command::Delete),
            ("+PART", Command::Copy),
            ("$PART", Command::Copy),
            ("|name", Command::Rename),
            ("#/PART", Command::Paste),
            ("*@PART[x]/mass", Command::Special),
            ("&key", Command::Create),
        ];
        for (name, expected) in cases {
            let (command, rest) = Command::parse(name);
            assert_eq!(command, expected, "{}", name);
            assert_eq!(rest, &name[1..]);
        }
    }

    #[test]
    fn test_parse_plain_name_is_insert() {
        assert_eq!(Command::parse("PART"), (Command::Insert, "PART"));
        assert_eq!(Command::parse(""), (Command::Insert, ""));
    }

    #[test]
    fn test_root_validity() {
        assert!(Command::Edit.is_valid_at_root());
        assert!(Command::Delete.is_valid_at_root());
        assert!(!Command::Replace.is_valid_at_root());
        assert!(!Command::Paste.is_valid_at_root());
        assert!(!Command::Special.is_valid_at_root());
    }
}
