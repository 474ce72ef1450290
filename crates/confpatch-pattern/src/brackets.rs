//! Square-bracket helpers shared by the name parsers.

/// True if every `]` closes an earlier `[` and nothing is left open.
pub fn is_bracket_balanced(s: &str) -> bool {
    let mut level: i32 = 0;
    for c in s.chars() {
        match c {
            '[' => level += 1,
            ']' => {
                level -= 1;
                if level < 0 {
                    return false;
                }
            }
            _ => {}
        }
    }
    level == 0
}

/// Byte index of the `]` matching the `[` at `open`.
pub fn matching_close(s: &str, open: usize) -> Option<usize> {
    let mut level = 0usize;
    for (i, c) in s[open..].char_indices() {
        match c {
            '[' => level += 1,
            ']' => {
                level = level.checked_sub(1)?;
                if level == 0 {
                    return Some(open + i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Split on any of `separators` occurring outside brackets.
pub fn split_top_level<'a>(s: &'a str, separators: &[char]) -> Vec<&'a str> {
    let mut parts = Vec::new();
    let mut level = 0i32;
    let mut start = 0;
    for (i, c) in s.char_indices() {
        match c {
            '[' => level += 1,
            ']' => level -= 1,
            c if level == 0 && separators.contains(&c) => {
                parts.push(&s[start..i]);
                start = i + c.len_utf8();
            }
            _ => {}
        }
    }
    parts.push(&s[start..]);
    parts
}

/// ASCII case-insensitive search.
pub fn find_ignore_case(haystack: &str, needle: &str) -> Option<usize> {
    let hay = haystack.as_bytes();
    let needle = needle.as_bytes();
    if needle.is_empty() {
        return Some(0);
    }
    if hay.len() < needle.len() {
        return None;
    }
    (0..=hay.len() - needle.len()).find(|&i| hay[i..i + needle.len()].eq_ignore_ascii_case(needle))
}

/// Locate a `:TAG[...]` clause (tag matched case-insensitively).
///
/// Returns the byte range of the whole clause and of its bracket contents.
pub fn find_clause(s: &str, tag: &str) -> Option<(std::ops::Range<usize>, std::ops::Range<usize>)> {
    let marker = format!(":{}[", tag);
    let start = find_ignore_case(s, &marker)?;
    let open = start + marker.len() - 1;
    let close = matching_close(s, open)?;
    Some((start..close + 1, open + 1..close))
}
