use crate::config::LocaleSettings;

/// Number formatting, number parsing and label translation for the
/// inspector.
#[derive(Debug, Clone, Default)]
pub struct Locale {
    settings: LocaleSettings,
}

impl Locale {
    pub fn new(settings: LocaleSettings) -> Self {
        Self { settings }
    }

    pub fn translate(&self, text: &str) -> String {
        self.settings
            .translations
            .get(text)
            .cloned()
            .unwrap_or_else(|| text.to_string())
    }

    pub fn bool_label(&self, value: bool) -> String {
        if value {
            self.translate(&self.settings.true_label)
        } else {
            self.translate(&self.settings.false_label)
        }
    }

    /// Parses a localized True/False label. English labels are always
    /// accepted.
    pub fn parse_bool(&self, text: &str) -> Option<bool> {
        let text = text.trim();
        let matches = |label: &str| text.eq_ignore_ascii_case(label);
        if matches(&self.bool_label(true)) || matches("True") {
            Some(true)
        } else if matches(&self.bool_label(false)) || matches("False") {
            Some(false)
        } else {
            None
        }
    }

    /// Fixed-point text with grouped thousands, e.g. `1,234.500`.
    pub fn format_fixed(&self, value: f64, precision: usize) -> String {
        let text = format!("{:.*}", precision, value.abs());
        let (int_part, frac_part) = match text.split_once('.') {
            Some((i, f)) => (i, Some(f)),
            None => (text.as_str(), None),
        };

        let mut grouped = String::with_capacity(text.len() + int_part.len() / 3);
        for (i, digit) in int_part.chars().enumerate() {
            if i > 0 && (int_part.len() - i) % 3 == 0 {
                if let Some(sep) = self.settings.group_separator {
                    grouped.push(sep);
                }
            }
            grouped.push(digit);
        }
        if let Some(frac) = frac_part {
            grouped.push(self.settings.decimal_separator);
            grouped.push_str(frac);
        }
        if value.is_sign_negative() && text.chars().any(|c| matches!(c, '1'..='9')) {
            grouped.insert(0, '-');
        }
        grouped
    }

    pub fn format_int(&self, value: i64) -> String {
        value.to_string()
    }

    pub fn parse_float(&self, text: &str) -> Option<f64> {
        let normalized = self.normalize_number(text)?;
        normalized.parse::<f64>().ok().filter(|v| v.is_finite())
    }

    pub fn parse_int(&self, text: &str) -> Option<i64> {
        let normalized = self.normalize_number(text)?;
        normalized.parse::<i64>().ok()
    }

    /// Rewrites localized number text into Rust's float syntax. Group
    /// separators are only accepted between three-digit groups of the
    /// integer part.
    fn normalize_number(&self, text: &str) -> Option<String> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        let (int_part, frac_part) = match text.split_once(self.settings.decimal_separator) {
            Some((i, f)) => (i, Some(f)),
            None => (text, None),
        };

        let mut normalized = String::with_capacity(text.len());
        match self.settings.group_separator {
            Some(sep) if int_part.contains(sep) => {
                let (sign, digits) = match int_part.strip_prefix(['-', '+']) {
                    Some(rest) => (&int_part[..1], rest),
                    None => ("", int_part),
                };
                let mut groups = digits.split(sep);
                let first = groups.next()?;
                let is_digits = |g: &str| g.chars().all(|c| c.is_ascii_digit());
                if first.is_empty() || first.len() > 3 || !is_digits(first) {
                    return None;
                }
                normalized.push_str(sign);
                normalized.push_str(first);
                for group in groups {
                    if group.len() != 3 || !is_digits(group) {
                        return None;
                    }
                    normalized.push_str(group);
                }
            }
            _ => normalized.push_str(int_part),
        }

        if let Some(frac) = frac_part {
            if self.settings.group_separator.is_some_and(|sep| frac.contains(sep)) {
                return None;
            }
            normalized.push('.');
            normalized.push_str(frac);
        }
        Some(normalized)
    }
}
