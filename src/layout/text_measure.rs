//! Text Measurement
//!
//! Measures text dimensions in terminal cells using `unicode-width`:
//! - ASCII printable: 1 cell
//! - CJK and most emoji: 2 cells
//! - Control and zero-width characters: 0 cells

use unicode_width::UnicodeWidthChar;

pub(crate) fn char_width(c: char) -> u16 {
    c.width().unwrap_or(0) as u16
}

/// Display width of a string in terminal cells.
///
/// Newlines are not special here; see [`text_width`] for multi-line text.
pub fn string_width(s: &str) -> u16 {
    s.chars().fold(0u16, |w, c| w.saturating_add(char_width(c)))
}

/// Width of the widest line of `text`.
pub fn text_width(text: &str) -> u16 {
    text.split('\n').map(string_width).max().unwrap_or(0)
}

/// Number of lines `text` occupies when wrapped at `available_width` cells.
///
/// Returns 0 for empty text and at least 1 otherwise.
pub fn measure_text_height(text: &str, available_width: u16) -> u16 {
    if text.is_empty() {
        return 0;
    }

    if available_width == 0 {
        return 1;
    }

    let mut lines = 0u16;
    for line in text.split('\n') {
        let mut current = 0u16;
        let mut wrapped = 1u16;
        for c in line.chars() {
            let w = char_width(c);
            if current + w > available_width && current > 0 {
                wrapped = wrapped.saturating_add(1);
                current = w;
            } else {
                current += w;
            }
        }
        lines = lines.saturating_add(wrapped);
    }

    lines.max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_width() {
        assert_eq!(string_width("hello"), 5);
        assert_eq!(string_width(""), 0);
        assert_eq!(string_width("日本"), 4);
    }

    #[test]
    fn test_text_width_takes_widest_line() {
        assert_eq!(text_width("ab\nabcd\nc"), 4);
    }

    #[test]
    fn test_measure_text_height() {
        assert_eq!(measure_text_height("", 10), 0);
        assert_eq!(measure_text_height("hello", 10), 1);
        assert_eq!(measure_text_height("hello world", 5), 3);
        assert_eq!(measure_text_height("a\nb", 10), 2);
    }
}
