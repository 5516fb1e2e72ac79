use serde_json::Value;

const NUMBER_WORDS: [&str; 10] = [
    "zero", "one", "two", "three", "four", "five", "six", "seven", "eight", "nine",
];

/// Normalizes a free-text memory-test answer so it can be compared with the
/// expected digit string: lower-case, number words become digits, and
/// spaces, commas and semicolons are removed.
/// Words are replaced in numeric order, so "eightwo" becomes "eigh2".
pub fn normalize_response(text: &str) -> String {
    let mut answer = text.to_lowercase();
    for (digit, word) in NUMBER_WORDS.into_iter().enumerate() {
        if answer.contains(word) {
            answer = answer.replace(word, &digit.to_string());
        }
    }
    answer.retain(|c| !matches!(c, ' ' | ',' | ';'));
    answer
}

/// Concatenates a list of numerals into one string, e.g. `[4, 2, 7]` -> "427".
/// Returns `None` if any element is not a number or string.
pub fn join_numerals(numerals: &[Value]) -> Option<String> {
    let mut joined = String::new();
    for numeral in numerals {
        match numeral {
            Value::Number(n) => joined.push_str(&n.to_string()),
            Value::String(s) => joined.push_str(s),
            _ => return None,
        }
    }
    Some(joined.to_lowercase())
}
