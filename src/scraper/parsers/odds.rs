//! Odds and line string parsing.
//!
//! The site renders American odds with typographic glyphs (`−150`, `＋130`)
//! and the literal `EVEN`; lines come as `+1.5`, `−2.5` or `PK`.

/// Map typographic sign glyphs to their ASCII equivalents.
fn ascii_signs(raw: &str) -> String {
    raw.trim()
        .chars()
        .map(|c| match c {
            '\u{2212}' | '\u{2012}' | '\u{2013}' | '\u{FE63}' | '\u{FF0D}' => '-',
            '\u{FE62}' | '\u{FF0B}' => '+',
            other => other,
        })
        .filter(|c| !c.is_whitespace())
        .collect()
}

/// Parse an American odds string. Unparseable input yields `None`.
pub fn parse_american(raw: &str) -> Option<i32> {
    let s = ascii_signs(raw);
    if s.eq_ignore_ascii_case("EVEN") || s.eq_ignore_ascii_case("EV") {
        return Some(100);
    }
    let digits = s.strip_prefix('+').unwrap_or(&s);
    digits.parse::<i32>().ok()
}

/// Parse a decimal odds string ("2.50", "1,91").
pub fn parse_decimal(raw: &str) -> Option<f64> {
    let s = ascii_signs(raw).replace(',', ".");
    s.parse::<f64>().ok().filter(|d| d.is_finite())
}

/// Parse a handicap or total line. `PK` (pick'em) is a zero line.
pub fn parse_line(raw: &str) -> Option<f64> {
    let s = ascii_signs(raw);
    if s.eq_ignore_ascii_case("PK") || s.eq_ignore_ascii_case("PICK") {
        return Some(0.0);
    }
    let digits = s.strip_prefix('+').unwrap_or(&s);
    digits.parse::<f64>().ok().filter(|l| l.is_finite())
}

/// Largest American price magnitude treated as real
const MAX_AMERICAN: f64 = 100_000.0;

/// Convert decimal odds to American odds.
///
/// Decimal >= 2.0 maps to `round((d - 1) * 100)`, below that to
/// `round(-100 / (d - 1))`. Decimal odds at or below 1.0 carry no payout
/// and yield `None`, as do conversions beyond +/-100000.
pub fn decimal_to_american(decimal: f64) -> Option<i32> {
    if !decimal.is_finite() || decimal <= 1.0 {
        return None;
    }
    let american = if decimal >= 2.0 {
        ((decimal - 1.0) * 100.0).round()
    } else {
        (-100.0 / (decimal - 1.0)).round()
    };
    (american.abs() <= MAX_AMERICAN).then_some(american as i32)
}

/// Raw odds fields carried by one selection, in whatever notation the
/// payload offered.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OddsFields {
    pub american: Option<String>,
    pub decimal: Option<String>,
    pub decimal_value: Option<f64>,
}

/// Decimal fallbacks, tried in this order; the first that yields a value wins.
const DECIMAL_RESOLUTION_ORDER: [DecimalSource; 2] =
    [DecimalSource::DisplayString, DecimalSource::TrueOdds];

#[derive(Debug, Clone, Copy)]
enum DecimalSource {
    DisplayString,
    TrueOdds,
}

impl OddsFields {
    /// Resolve to American odds. Decimal fields are only converted when no
    /// American field is present at all.
    pub fn to_american(&self) -> Option<i32> {
        if let Some(american) = &self.american {
            return parse_american(american);
        }
        DECIMAL_RESOLUTION_ORDER
            .iter()
            .find_map(|source| self.resolve_decimal(*source))
    }

    fn resolve_decimal(&self, source: DecimalSource) -> Option<i32> {
        match source {
            DecimalSource::DisplayString => self
                .decimal
                .as_deref()
                .and_then(parse_decimal)
                .and_then(decimal_to_american),
            DecimalSource::TrueOdds => self.decimal_value.and_then(decimal_to_american),
        }
    }
}
