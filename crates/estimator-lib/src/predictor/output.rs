//! Estimate output formatting
//!
//! Renders raw model outputs as currency: symbol prefix, thousands
//! separators, no fractional digits.

/// Currency symbol used when none is configured
pub const DEFAULT_CURRENCY_SYMBOL: &str = "₹";

/// Formats raw model outputs for display
#[derive(Debug, Clone)]
pub struct CurrencyFormatter {
    symbol: String,
}

impl CurrencyFormatter {
    pub fn new() -> Self {
        Self::with_symbol(DEFAULT_CURRENCY_SYMBOL)
    }

    pub fn with_symbol(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Format a value, e.g. `5333333.33` becomes `₹ 5,333,333`
    ///
    /// Rounding is half-to-even on the exact binary value.
    pub fn format(&self, value: f64) -> String {
        format!("{} {}", self.symbol, group_thousands(value))
    }
}

impl Default for CurrencyFormatter {
    fn default() -> Self {
        Self::new()
    }
}

/// Round to zero decimals and insert `,` every three digits
pub fn group_thousands(value: f64) -> String {
    let rounded = format!("{:.0}", value);
    let (sign, digits) = match rounded.strip_prefix('-') {
        Some(digits) => ("-", digits),
        None => ("", rounded.as_str()),
    };

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    format!("{}{}", sign, grouped)
}
