//! Pure line-level heuristics: column resolution, word-at-cursor, and the
//! declaration-shape scorer. No teacher analogue — the teacher delegates
//! all of this to rust-analyzer; this module implements SPEC_FULL §4.D
//! directly as a set of independently-testable pure functions.

const INTERLEAVED_BEFORE_TOKEN: &[char] = &['*', '&', ':', '<', '>', ',', '('];

const PRIMITIVE_RETURN_TYPES: &[&str] = &[
    "void", "bool", "char", "short", "int", "long", "float", "double",
    "signed", "unsigned", "wchar_t",
    "int8_t", "int16_t", "int32_t", "int64_t",
    "uint8_t", "uint16_t", "uint32_t", "uint64_t",
    "size_t", "ssize_t", "intptr_t", "uintptr_t",
    "char8_t", "char16_t", "char32_t",
    "u8", "u16", "u32", "u64", "s8", "s16", "s32", "s64",
];

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Per-byte "are we inside a double-quoted string at this position" flags
/// for `line`, built by scanning from byte 0 and toggling on each
/// unescaped `"`. A `"` is escaped iff preceded by an odd number of
/// consecutive backslashes.
fn in_string_flags(bytes: &[u8]) -> Vec<bool> {
    let mut flags = vec![false; bytes.len()];
    let mut in_string = false;
    let mut backslash_run = 0u32;
    for (i, &b) in bytes.iter().enumerate() {
        flags[i] = in_string;
        if b == b'\\' {
            backslash_run += 1;
        } else {
            if b == b'"' {
                let escaped = backslash_run % 2 == 1;
                if !escaped {
                    in_string = !in_string;
                }
            }
            backslash_run = 0;
        }
    }
    flags
}

fn is_comment_only_line(line: &str) -> bool {
    line.trim_start().starts_with("//")
}

/// Resolve the 0-based byte offset of `needle`'s first "code" occurrence in
/// `line`, or `-1` to reject the line (spec §4.D `findColumn0`).
#[must_use]
pub fn find_column0(line: &str, needle: &str) -> i64 {
    if needle.is_empty() || is_comment_only_line(line) {
        return -1;
    }
    let bytes = line.as_bytes();
    let needle_bytes = needle.as_bytes();
    if needle_bytes.len() > bytes.len() {
        return -1;
    }
    let flags = in_string_flags(bytes);
    let last_start = bytes.len() - needle_bytes.len();
    for p in 0..=last_start {
        if &bytes[p..p + needle_bytes.len()] == needle_bytes && !flags[p] {
            return p as i64;
        }
    }
    -1
}

/// Whether `col` (0-based byte offset) on `line` falls inside a `//`
/// line comment, reusing the same string-aware scan as `find_column0`.
#[must_use]
pub fn cursor_in_comment(line: &str, col: usize) -> bool {
    let bytes = line.as_bytes();
    if bytes.len() < 2 {
        return false;
    }
    let flags = in_string_flags(bytes);
    for p in 0..bytes.len() - 1 {
        if bytes[p] == b'/' && bytes[p + 1] == b'/' && !flags[p] {
            return col >= p;
        }
    }
    false
}

/// Return the maximal `[A-Za-z0-9_]` run covering `(line, col)` in `text`.
/// If the cursor sits at end-of-line immediately after a word, backs up by
/// one column so the word is still identified (spec §4.D, §9).
#[must_use]
pub fn word_at(text: &str, line_idx: usize, col: usize) -> String {
    let Some(line) = text.lines().nth(line_idx) else {
        return String::new();
    };
    let chars: Vec<char> = line.chars().collect();
    let len = chars.len();
    if col > len {
        return String::new();
    }
    let mut c = col;
    if c == len {
        if c == 0 || !is_word_char(chars[c - 1]) {
            return String::new();
        }
        c -= 1;
    } else if !is_word_char(chars[c]) {
        return String::new();
    }

    let mut start = c;
    while start > 0 && is_word_char(chars[start - 1]) {
        start -= 1;
    }
    let mut end = c + 1;
    while end < len && is_word_char(chars[end]) {
        end += 1;
    }
    chars[start..end].iter().collect()
}

fn macro_define_bonus(line: &str, column: usize) -> i64 {
    let bytes = line.as_bytes();
    let mut i = 0usize;
    while i < bytes.len() && (bytes[i] as char).is_whitespace() {
        i += 1;
    }
    if i >= bytes.len() || bytes[i] != b'#' {
        return 0;
    }
    i += 1;
    while i < bytes.len() && (bytes[i] as char).is_whitespace() {
        i += 1;
    }
    if !line.is_char_boundary(i) || !line[i..].starts_with("define") {
        return 0;
    }
    i += "define".len();
    if i >= bytes.len() || !(bytes[i] as char).is_whitespace() {
        return 0;
    }
    while i < bytes.len() && (bytes[i] as char).is_whitespace() {
        i += 1;
    }
    if i == column {
        100
    } else {
        0
    }
}

fn nearest_nonws_before(line: &str, column: usize) -> Option<char> {
    let bytes = line.as_bytes();
    let mut i = column;
    while i > 0 {
        i -= 1;
        let c = bytes[i] as char;
        if !c.is_whitespace() {
            return Some(c);
        }
    }
    None
}

fn next_nonws_after(line: &str, byte_idx: usize) -> Option<char> {
    if byte_idx >= line.len() {
        return None;
    }
    line[byte_idx..].chars().find(|c| !c.is_whitespace())
}

fn primitive_return_type_before(line: &str, column: usize) -> bool {
    let bytes = line.as_bytes();
    let mut i = column;
    loop {
        if i == 0 {
            return false;
        }
        let c = bytes[i - 1] as char;
        if c.is_whitespace() || INTERLEAVED_BEFORE_TOKEN.contains(&c) {
            i -= 1;
            continue;
        }
        break;
    }
    let end = i;
    let mut start = end;
    while start > 0 {
        let c = bytes[start - 1] as char;
        if c.is_ascii_alphanumeric() || c == '_' {
            start -= 1;
        } else {
            break;
        }
    }
    if start == end {
        return false;
    }
    let token = line[start..end].to_ascii_lowercase();
    PRIMITIVE_RETURN_TYPES.contains(&token.as_str())
}

/// Score a match: `line` is the matched source line, `column` is the
/// 0-based byte offset of `needle` within it (or `-1`, which short-circuits
/// to a large negative score). Spec §4.D.
#[must_use]
pub fn score_match(line: &str, column: i64, needle: &str) -> i64 {
    if column < 0 {
        return -100_000;
    }
    let column = column as usize;
    let bytes = line.as_bytes();
    let mut score = macro_define_bonus(line, column);

    let before_is_ws_or_start = column == 0
        || bytes
            .get(column - 1)
            .is_some_and(|&b| (b as char).is_whitespace());
    if before_is_ws_or_start {
        score += 25;
    }

    if nearest_nonws_before(line, column) == Some('>') {
        score += 20;
    }

    let after_needle = column + needle.len();
    if bytes.get(after_needle) == Some(&b';') {
        score += 40;
    }

    if next_nonws_after(line, after_needle) == Some('(') {
        score += 60;
        if primitive_return_type_before(line, column) {
            score += 30;
        }
    }

    score
}
