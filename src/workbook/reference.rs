//! Excel A1-style cell reference codec.
//! The raw fallback backend reconstructs (row, column) addresses from the
//! letter+number scheme used inside worksheet XML.

/// Converts an A1-style reference like `"B3"` to 0-based `(row, col)`.
/// Returns `None` for strings that do not follow the letters-then-digits
/// shape.
pub(crate) fn reference_to_index(reference: &str) -> Option<(usize, usize)> {
    let mut col = 0usize;
    let mut letters = 0usize;
    let mut chars = reference.chars();
    for character in chars.by_ref() {
        if character.is_ascii_uppercase() {
            col = col * 26 + (character as usize - 'A' as usize + 1);
            letters += 1;
        } else if character.is_ascii_digit() && letters > 0 {
            let digits = format!("{}{}", character, chars.as_str());
            let row = digits.parse::<usize>().ok()?;
            return (row > 0).then(|| (row - 1, col - 1));
        } else {
            return None;
        }
    }
    None
}

/// Converts 0-based `(row, col)` to an A1-style reference like `"B3"`.
pub(crate) fn index_to_reference(row: usize, col: usize) -> String {
    let mut col = col + 1;
    let mut reference = String::new();
    while col > 0 {
        col -= 1;
        let letter = char::from_u32('A' as u32 + (col % 26) as u32).expect("latin letter");
        reference.insert(0, letter);
        col /= 26;
    }
    reference.push_str(&(row + 1).to_string());
    reference
}
