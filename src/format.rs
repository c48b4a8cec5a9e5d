use crate::error::{Error, Result};

/// Population that fills a bar completely; larger cities saturate
pub const POPULATION_CEILING: f64 = 22_000_000.0;

/// Accent used whenever a continent has no (valid) color
pub const DEFAULT_ACCENT: &str = "#00d2ff";

const BAR_FILLED: char = '█';
const BAR_EMPTY: char = '░';

/// Short human population string: "22.3M", "2K", "999"
pub fn format_population(n: u64) -> String {
    if n >= 1_000_000 {
        format!("{:.1}M", n as f64 / 1_000_000.0)
    } else if n >= 1_000 {
        format!("{:.0}K", n as f64 / 1_000.0)
    } else {
        n.to_string()
    }
}

/// Fixed-width unicode bar proportional to population.
/// Always shows at least one filled segment when `width > 0`.
pub fn population_bar(n: u64, width: usize) -> String {
    if width == 0 {
        return String::new();
    }
    let ratio = n as f64 / POPULATION_CEILING;
    let filled = ((ratio * width as f64).round() as usize).clamp(1, width);

    let mut bar = String::with_capacity(width * BAR_FILLED.len_utf8());
    bar.extend(std::iter::repeat(BAR_FILLED).take(filled));
    bar.extend(std::iter::repeat(BAR_EMPTY).take(width - filled));
    bar
}

/// Parse a `#rrggbb` (or `rrggbb`) color into its components
pub fn parse_hex(hex: &str) -> Result<(u8, u8, u8)> {
    let h = hex.strip_prefix('#').unwrap_or(hex);
    if h.len() != 6 || !h.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(Error::InvalidColorFormat(hex.to_string()));
    }
    let channel = |i: usize| {
        u8::from_str_radix(&h[i..i + 2], 16).map_err(|_| Error::InvalidColorFormat(hex.to_string()))
    };
    Ok((channel(0)?, channel(2)?, channel(4)?))
}

/// `#rrggbb` + opacity -> `rgba(r,g,b,a)`, opacity always with a decimal point
pub fn hex_with_opacity(hex: &str, opacity: f64) -> Result<String> {
    let (r, g, b) = parse_hex(hex)?;
    Ok(format!("rgba({r},{g},{b},{:?})", opacity.clamp(0.0, 1.0)))
}

/// Parse `#rrggbb` or `rgba(r,g,b,a)` into components with opacity
pub fn parse_color(color: &str) -> Result<(u8, u8, u8, f64)> {
    let bad = || Error::InvalidColorFormat(color.to_string());
    let Some(inner) = color
        .trim()
        .strip_prefix("rgba(")
        .and_then(|rest| rest.strip_suffix(')'))
    else {
        let (r, g, b) = parse_hex(color)?;
        return Ok((r, g, b, 1.0));
    };

    let parts: Vec<&str> = inner.split(',').map(str::trim).collect();
    let [r, g, b, a] = parts.as_slice() else {
        return Err(bad());
    };
    let channel = |s: &str| s.parse::<u8>().map_err(|_| bad());
    let alpha = a.parse::<f64>().map_err(|_| bad())?;
    Ok((channel(*r)?, channel(*g)?, channel(*b)?, alpha.clamp(0.0, 1.0)))
}

/// Integer with `,` thousands separators
pub fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Truncate to `max` chars, marking the cut with an ellipsis
pub fn truncate_label(s: &str, max: usize) -> String {
    if s.chars().count() > max {
        let mut short: String = s.chars().take(max).collect();
        short.push('…');
        short
    } else {
        s.to_string()
    }
}

/// First `max` chars, no marker
pub fn clip(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}
