/// Reduce a county name to a case-, punctuation- and whitespace-insensitive
/// fingerprint.
///
/// Runs of non-word characters collapse to a single space, the result is
/// trimmed, then every remaining space is removed and letters are uppercased.
/// Word characters are Unicode alphanumerics plus `_`. Total and idempotent:
/// `normalize(&normalize(x)) == normalize(x)` for every `x`.
pub fn normalize(raw: &str) -> String {
    let mut collapsed = String::with_capacity(raw.len());
    let mut in_gap = false;
    for ch in raw.trim().chars() {
        if is_word_char(ch) {
            collapsed.push(ch);
            in_gap = false;
        } else if !in_gap {
            collapsed.push(' ');
            in_gap = true;
        }
    }

    // Some uppercase mappings emit combining marks (U+01F0 -> "J\u{30C}");
    // filtering after the mapping keeps the output stable under a second pass.
    collapsed
        .trim()
        .chars()
        .flat_map(char::to_uppercase)
        .filter(|c| is_word_char(*c))
        .collect()
}

/// [`normalize`] over an optional name. Absence passes through as `None`.
pub fn normalize_opt(raw: Option<&str>) -> Option<String> {
    raw.map(normalize)
}

fn is_word_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_'
}
