pub fn format_money(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.abs();
    format!("{sign}{}.{:02}", group_thousands(abs / 100), abs % 100)
}

fn group_thousands(value: i64) -> String {
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

// Commas are thousands grouping, the shape format_money emits, so formatted
// values round-trip through the edit form.
pub fn parse_amount_to_cents(input: &str) -> Option<i64> {
    let mut s = input.trim().to_string();
    if s.is_empty() {
        return None;
    }
    if s.starts_with('-') {
        return None;
    }
    s = s.replace(',', "");
    let mut parts = s.split('.');
    let whole_str = parts.next()?;
    let frac_str = parts.next();
    if parts.next().is_some() {
        return None;
    }
    let whole: i64 = whole_str.parse().ok()?;
    let frac = match frac_str {
        None => 0,
        Some(frac) => {
            if frac.len() > 2 {
                return None;
            }
            let mut padded = frac.to_string();
            while padded.len() < 2 {
                padded.push('0');
            }
            padded.parse::<i64>().ok()?
        }
    };
    Some(whole * 100 + frac)
}

#[derive(Debug, Clone)]
pub struct FormatPolicy {
    pub currency_symbol: String,
    pub weight_decimals: usize,
}

impl Default for FormatPolicy {
    fn default() -> Self {
        FormatPolicy {
            currency_symbol: "₹".to_string(),
            weight_decimals: 1,
        }
    }
}

impl FormatPolicy {
    pub fn money(&self, cents: i64) -> String {
        format!("{}{}", self.currency_symbol, format_money(cents))
    }

    // Bare amount for table cells; the column header carries the symbol.
    pub fn amount(&self, cents: i64) -> String {
        format_money(cents)
    }

    pub fn weight(&self, kg: f64) -> String {
        format!("{:.*}", self.weight_decimals, kg)
    }
}
