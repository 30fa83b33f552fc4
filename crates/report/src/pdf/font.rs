//! Helvetica metrics and text sanitising for the standard PDF fonts.

/// Advance widths (1/1000 em) of Helvetica for ASCII 32..=126.
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '../
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // 0..9
    278, 278, 584, 584, 584, 556, 1015, // :..@
    667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, // A..M
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, // N..Z
    278, 278, 278, 469, 556, 333, // [..`
    556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, // a..m
    556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, // n..z
    334, 260, 334, 584, // {..~
];

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Font {
    Regular,
    Bold,
}

impl Font {
    /// Resource name in the page font dictionary.
    pub fn resource(&self) -> &'static str {
        match self {
            Font::Regular => "F1",
            Font::Bold => "F2",
        }
    }

    pub fn base_font(&self) -> &'static str {
        match self {
            Font::Regular => "Helvetica",
            Font::Bold => "Helvetica-Bold",
        }
    }

    /// Rendered width of `text` at `size` points. Expects sanitised text.
    pub fn width(&self, text: &str, size: f32) -> f32 {
        let units: u32 = text
            .chars()
            .map(|c| match c {
                ' '..='~' => u32::from(HELVETICA_WIDTHS[(c as usize) - 32]),
                '\u{a0}' => 278,
                _ => 556,
            })
            .sum();
        // Bold glyphs run about 6% wider than regular ones.
        let scale = match self {
            Font::Regular => 1.0,
            Font::Bold => 1.06,
        };
        units as f32 * size / 1000.0 * scale
    }
}

/// WinAnsi code of `c`, if the standard fonts can draw it.
pub fn win_ansi(c: char) -> Option<u8> {
    let code = match c {
        ' '..='~' | '\u{a0}'..='\u{ff}' => c as u32 as u8,
        '\u{20ac}' => 0x80,
        '\u{201a}' => 0x82,
        '\u{192}' => 0x83,
        '\u{201e}' => 0x84,
        '\u{2026}' => 0x85,
        '\u{2020}' => 0x86,
        '\u{2021}' => 0x87,
        '\u{2c6}' => 0x88,
        '\u{2030}' => 0x89,
        '\u{160}' => 0x8a,
        '\u{2039}' => 0x8b,
        '\u{152}' => 0x8c,
        '\u{17d}' => 0x8e,
        '\u{2018}' => 0x91,
        '\u{2019}' => 0x92,
        '\u{201c}' => 0x93,
        '\u{201d}' => 0x94,
        '\u{2022}' => 0x95,
        '\u{2013}' => 0x96,
        '\u{2014}' => 0x97,
        '\u{2dc}' => 0x98,
        '\u{2122}' => 0x99,
        '\u{161}' => 0x9a,
        '\u{203a}' => 0x9b,
        '\u{153}' => 0x9c,
        '\u{17e}' => 0x9e,
        '\u{178}' => 0x9f,
        _ => return None,
    };
    Some(code)
}

/// Keep characters WinAnsiEncoding can draw; tabs become spaces, anything else `?`.
pub fn sanitize(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '\t' => ' ',
            c if win_ansi(c).is_some() => c,
            _ => '?',
        })
        .collect()
}

/// WinAnsi bytes for a PDF literal string.
pub fn encode(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| if c == '\t' { b' ' } else { win_ansi(c).unwrap_or(b'?') })
        .collect()
}

/// Greedy word wrap to `max_width` points.
pub fn wrap(text: &str, font: Font, size: f32, max_width: f32) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        let candidate = if current.is_empty() {
            word.to_string()
        } else {
            format!("{current} {word}")
        };
        if font.width(&candidate, size) <= max_width || current.is_empty() {
            current = candidate;
        } else {
            lines.push(std::mem::take(&mut current));
            current = word.to_string();
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn widths_follow_helvetica_metrics() {
        assert_eq!(Font::Regular.width("i", 10.0), 2.22);
        assert!(Font::Bold.width("Acme", 12.0) > Font::Regular.width("Acme", 12.0));
    }

    #[test]
    fn sanitize_keeps_latin1_and_typographic_marks() {
        assert_eq!(
            sanitize("\u{201c}ok\u{201d} \u{2013} caf\u{e9}\tZ\u{fc}rich"),
            "\u{201c}ok\u{201d} \u{2013} caf\u{e9} Z\u{fc}rich"
        );
        assert_eq!(sanitize("\u{4e2d}\u{1f600}\n"), "???");
    }

    #[test]
    fn encode_maps_to_win_ansi_bytes() {
        assert_eq!(encode("caf\u{e9}"), b"caf\xe9".to_vec());
        assert_eq!(encode("\u{20ac}5 \u{2013} \u{2019}s"), b"\x805 \x96 \x92s".to_vec());
        assert_eq!(encode("\u{4e2d}"), b"?".to_vec());
    }

    #[test]
    fn wrap_respects_width_and_keeps_long_words() {
        let lines = wrap("alpha beta gamma delta", Font::Regular, 10.0, 60.0);
        assert!(lines.len() > 1);
        assert!(lines.iter().all(|l| Font::Regular.width(l, 10.0) <= 60.0));
        let long = wrap("supercalifragilistic", Font::Regular, 10.0, 20.0);
        assert_eq!(long, vec!["supercalifragilistic".to_string()]);
    }
}
