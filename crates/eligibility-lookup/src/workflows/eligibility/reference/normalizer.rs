/// Strips currency symbols, thousands separators, and whitespace, then parses.
/// Anything empty, unparsable, or negative becomes 0.
pub(crate) fn clean_income(value: &str) -> u64 {
    let cleaned: String = value
        .chars()
        .filter(|ch| *ch != '$' && *ch != ',' && !ch.is_whitespace())
        .collect();

    match cleaned.parse::<f64>() {
        Ok(amount) if amount.is_finite() && amount > 0.0 => amount.round() as u64,
        _ => 0,
    }
}

/// Five-digit ZIP key: ZIP+4 suffixes are dropped and short codes left-padded.
pub(crate) fn normalize_zip(value: &str) -> String {
    let trimmed = value.trim();
    let base = trimmed.split('-').next().unwrap_or(trimmed).trim();
    format!("{:0>5}", base)
}

/// Household size encoded in a column header such as `3`, `hh_3`, or `Household Size 3`.
pub(crate) fn household_size_from_header(header: &str) -> Option<u8> {
    let digits: String = header.chars().filter(char::is_ascii_digit).collect();
    match digits.parse::<u8>() {
        Ok(size @ 1..=8) => Some(size),
        _ => None,
    }
}

pub(crate) fn normalize_header(value: &str) -> String {
    let cleaned = value.replace(['\u{feff}', '\u{200b}'], "");
    let collapsed = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed.to_ascii_lowercase()
}
