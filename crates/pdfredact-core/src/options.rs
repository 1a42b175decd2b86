//! Appearance of applied redactions and output serialization settings.

/// How an applied redaction is painted over the removed text.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RedactionStyle {
    /// Fill color as RGB components in `0.0..=1.0` (default: black).
    pub fill: [f32; 3],
    /// Optional text drawn inside each redacted area (default: none).
    pub label: Option<String>,
}

impl Default for RedactionStyle {
    fn default() -> Self {
        Self {
            fill: [0.0, 0.0, 0.0],
            label: None,
        }
    }
}

impl RedactionStyle {
    /// Parse a fill color written as `r,g,b` (each `0.0..=1.0`) or `#rrggbb`.
    pub fn parse_fill(value: &str) -> Option<[f32; 3]> {
        let value = value.trim();
        if let Some(hex) = value.strip_prefix('#') {
            if hex.len() != 6 || !hex.is_ascii() {
                return None;
            }
            let mut rgb = [0.0; 3];
            for (i, slot) in rgb.iter_mut().enumerate() {
                let byte = u8::from_str_radix(&hex[i * 2..i * 2 + 2], 16).ok()?;
                *slot = byte as f32 / 255.0;
            }
            return Some(rgb);
        }
        let parts: Vec<f32> = value
            .split(',')
            .map(|p| p.trim().parse::<f32>().ok())
            .collect::<Option<_>>()?;
        match parts.as_slice() {
            [r, g, b] if parts.iter().all(|c| (0.0..=1.0).contains(c)) => Some([*r, *g, *b]),
            _ => None,
        }
    }

    /// Whether a dark fill needs a light label color.
    pub fn is_dark(&self) -> bool {
        let [r, g, b] = self.fill;
        0.299 * r + 0.587 * g + 0.114 * b < 0.5
    }
}

/// Settings applied when writing a redacted document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SaveOptions {
    /// Drop objects no longer reachable from the trailer, such as replaced
    /// content streams (default: `true`).
    pub prune: bool,
    /// Flate-compress uncompressed streams (default: `true`).
    pub compress: bool,
}

impl Default for SaveOptions {
    fn default() -> Self {
        Self {
            prune: true,
            compress: true,
        }
    }
}
