//! C/C++ stop-word list: tokens too common or meaningless to search for.
//!
//! Checked at the handler level before any search is spawned (spec §4.D).

const STOP_WORDS: &[&str] = &[
    // control flow / keywords
    "if", "else", "for", "while", "do", "switch", "case", "default", "break",
    "continue", "return", "goto", "try", "catch", "throw",
    // storage / linkage
    "auto", "static", "extern", "register", "thread_local", "mutable",
    "const", "volatile", "constexpr", "consteval", "constinit", "inline",
    "virtual", "override", "final", "explicit", "friend", "typedef",
    "using", "namespace", "public", "private", "protected", "class",
    "struct", "union", "enum", "template", "typename", "operator",
    "new", "delete", "this", "sizeof", "alignof", "alignas", "noexcept",
    "decltype", "concept", "requires", "export", "module", "import",
    // coroutine alternative tokens
    "co_await", "co_yield", "co_return",
    // primitive / width-specific type aliases
    "void", "bool", "char", "short", "int", "long", "float", "double",
    "signed", "unsigned", "wchar_t",
    "int8_t", "int16_t", "int32_t", "int64_t",
    "uint8_t", "uint16_t", "uint32_t", "uint64_t",
    "size_t", "ssize_t", "intptr_t", "uintptr_t",
    "char8_t", "char16_t", "char32_t",
    // common kernel typedefs
    "u8", "u16", "u32", "u64", "s8", "s16", "s32", "s64",
    "true", "false", "nullptr", "null", "NULL",
];

/// Whether `word` (already lowercased by the caller) is a stop word.
#[must_use]
pub fn is_stop_word(word: &str) -> bool {
    STOP_WORDS.iter().any(|&w| w.eq_ignore_ascii_case(word))
}
