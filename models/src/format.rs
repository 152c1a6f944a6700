//! Display formatting shared by listing and dashboard views.

const NAIRA: char = '₦';

/// Format an amount as Naira with thousands separators.
///
/// With `decimals` the value is rounded to kobo and always shows two
/// fractional digits; without, it is rounded to the nearest Naira.
#[must_use]
pub fn format_amount(amount: f64, decimals: bool) -> String {
    if !amount.is_finite() {
        return format!("{NAIRA}0{}", if decimals { ".00" } else { "" });
    }
    let negative = amount < 0.0;
    let abs = amount.abs();

    let (whole, fraction) = if decimals {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let kobo = (abs * 100.0).round() as u128;
        (kobo / 100, Some(kobo % 100))
    } else {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let naira = abs.round() as u128;
        (naira, None)
    };

    let mut out = String::new();
    if negative && (whole > 0 || fraction.is_some_and(|f| f > 0)) {
        out.push('-');
    }
    out.push(NAIRA);
    out.push_str(&group_thousands(whole));
    if let Some(fraction) = fraction {
        out.push_str(&format!(".{fraction:02}"));
    }
    out
}

fn group_thousands(value: u128) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Turn a slug like `flats/apartments` into `Flats Apartments`.
#[must_use]
pub fn format_property_type(raw: &str) -> String {
    raw.split(|c: char| c == '/' || c == '-' || c == '_' || c.is_whitespace())
        .filter(|word| !word.is_empty())
        .map(capitalize)
        .collect::<Vec<_>>()
        .join(" ")
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
#[path = "format_test.rs"]
mod tests;
