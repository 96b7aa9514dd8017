//! Display helpers for addresses.

/// Truncate an address to `0x1234...abcd` for chat messages.
///
/// Returns `"N/A"` when there is no address. Inputs shorter than ten
/// characters are returned as-is.
pub fn shorten(address: Option<&str>) -> String {
    let Some(address) = address else {
        return "N/A".to_string();
    };

    let chars: Vec<char> = address.chars().collect();
    if chars.len() < 10 {
        return address.to_string();
    }

    let head: String = chars[..6].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}...{tail}")
}
