//! 3D lookup tables in the `.cube` format.

use image::RgbImage;
use std::fs;
use std::path::Path;

use crate::error::LibraryError;

#[derive(Debug, Clone, PartialEq)]
pub struct CubeLut {
    title: Option<String>,
    size: usize,
    domain_min: [f32; 3],
    domain_max: [f32; 3],
    /// Output colors with red varying fastest, then green, then blue.
    table: Vec<[f32; 3]>,
}

fn parse_triplet(parts: &[&str], line: usize) -> Result<[f32; 3], LibraryError> {
    let invalid = || LibraryError::InvalidArgument(format!("line {}: expected three numbers", line));
    if parts.len() != 3 {
        return Err(invalid());
    }
    let mut values = [0.0f32; 3];
    for (value, part) in values.iter_mut().zip(parts) {
        *value = part.parse().map_err(|_| invalid())?;
    }
    Ok(values)
}

impl CubeLut {
    pub fn parse(text: &str) -> Result<Self, LibraryError> {
        let mut title = None;
        let mut size = None;
        let mut domain_min = [0.0; 3];
        let mut domain_max = [1.0; 3];
        let mut table = Vec::new();

        for (index, raw_line) in text.lines().enumerate() {
            let line_number = index + 1;
            let line = raw_line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let parts: Vec<&str> = line.split_whitespace().collect();
            match parts[0] {
                "TITLE" => {
                    title = Some(line["TITLE".len()..].trim().trim_matches('"').to_string());
                }
                "LUT_3D_SIZE" => {
                    let n: usize = parts
                        .get(1)
                        .and_then(|s| s.parse().ok())
                        .filter(|n| *n >= 2)
                        .ok_or_else(|| {
                            LibraryError::InvalidArgument(format!(
                                "line {}: invalid LUT_3D_SIZE",
                                line_number
                            ))
                        })?;
                    size = Some(n);
                }
                "LUT_1D_SIZE" => {
                    return Err(LibraryError::InvalidArgument(
                        "1D lookup tables are not supported".to_string(),
                    ));
                }
                "DOMAIN_MIN" => domain_min = parse_triplet(&parts[1..], line_number)?,
                "DOMAIN_MAX" => domain_max = parse_triplet(&parts[1..], line_number)?,
                _ => table.push(parse_triplet(&parts, line_number)?),
            }
        }

        let size = size
            .ok_or_else(|| LibraryError::InvalidArgument("missing LUT_3D_SIZE".to_string()))?;
        if table.len() != size * size * size {
            return Err(LibraryError::InvalidArgument(format!(
                "expected {} table entries, found {}",
                size * size * size,
                table.len()
            )));
        }
        Ok(Self {
            title,
            size,
            domain_min,
            domain_max,
            table,
        })
    }

    pub fn load(path: &Path) -> Result<Self, LibraryError> {
        Self::parse(&fs::read_to_string(path)?)
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn size(&self) -> usize {
        self.size
    }

    fn entry(&self, r: usize, g: usize, b: usize) -> [f32; 3] {
        self.table[r + g * self.size + b * self.size * self.size]
    }

    /// Maps a color in the table's domain, interpolating trilinearly between
    /// the eight surrounding entries.
    pub fn lookup(&self, rgb: [f32; 3]) -> [f32; 3] {
        let last = (self.size - 1) as f32;
        let mut base = [0usize; 3];
        let mut frac = [0.0f32; 3];
        for c in 0..3 {
            let span = self.domain_max[c] - self.domain_min[c];
            let t = if span > 0.0 {
                ((rgb[c] - self.domain_min[c]) / span).clamp(0.0, 1.0) * last
            } else {
                0.0
            };
            base[c] = (t.floor() as usize).min(self.size - 2);
            frac[c] = t - base[c] as f32;
        }

        let mut out = [0.0f32; 3];
        for corner in 0..8 {
            let offset = [corner & 1, (corner >> 1) & 1, (corner >> 2) & 1];
            let weight: f32 = (0..3)
                .map(|c| if offset[c] == 1 { frac[c] } else { 1.0 - frac[c] })
                .product();
            if weight == 0.0 {
                continue;
            }
            let value = self.entry(
                base[0] + offset[0],
                base[1] + offset[1],
                base[2] + offset[2],
            );
            for c in 0..3 {
                out[c] += value[c] * weight;
            }
        }
        out
    }

    pub fn apply(&self, image: &mut RgbImage) {
        for pixel in image.pixels_mut() {
            let rgb = [
                pixel[0] as f32 / 255.0,
                pixel[1] as f32 / 255.0,
                pixel[2] as f32 / 255.0,
            ];
            let mapped = self.lookup(rgb);
            for c in 0..3 {
                pixel[c] = (mapped[c] * 255.0).round().clamp(0.0, 255.0) as u8;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const INVERT: &str = "# inverts every channel
TITLE \"Invert\"
LUT_3D_SIZE 2
1 1 1
0 1 1
1 0 1
0 0 1
1 1 0
0 1 0
1 0 0
0 0 0
";

    #[test]
    fn parses_header_and_table() {
        let lut = CubeLut::parse(INVERT).unwrap();
        assert_eq!(lut.title(), Some("Invert"));
        assert_eq!(lut.size(), 2);
    }

    #[test]
    fn lookup_interpolates_between_entries() {
        let lut = CubeLut::parse(INVERT).unwrap();
        let out = lut.lookup([0.25, 0.5, 1.0]);
        assert!((out[0] - 0.75).abs() < 1e-6);
        assert!((out[1] - 0.5).abs() < 1e-6);
        assert!(out[2].abs() < 1e-6);
    }

    #[test]
    fn wrong_entry_count_is_rejected() {
        let truncated = INVERT.lines().take(6).collect::<Vec<_>>().join("\n");
        assert!(CubeLut::parse(&truncated).is_err());
    }
}
