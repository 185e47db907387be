//! Embedded 5x7 bitmap font for placeholder labels.
//!
//! Each glyph is seven rows of five bits, most significant bit on the left.
//! Lowercase letters render with the uppercase shapes and characters the
//! font does not know render as `?`. Glyph cells are drawn as small filled
//! squares, so text scales to any point size without a font engine.

/// Glyph width in cells.
pub const GLYPH_WIDTH: u32 = 5;

/// Glyph height in cells.
pub const GLYPH_HEIGHT: u32 = 7;

/// Horizontal advance per character, in cells.
pub const ADVANCE: u32 = GLYPH_WIDTH + 1;

/// Vertical advance per line, in cells.
pub const LINE_ADVANCE: u32 = GLYPH_HEIGHT + 3;

const UNKNOWN: [u8; 7] = [
    0b01110, 0b10001, 0b00001, 0b00010, 0b00100, 0b00000, 0b00100,
];

/// Bitmap rows of a character.
pub fn glyph(ch: char) -> [u8; 7] {
    match ch.to_ascii_uppercase() {
        ' ' => [0; 7],
        'A' => [0b01110, 0b10001, 0b10001, 0b11111, 0b10001, 0b10001, 0b10001],
        'B' => [0b11110, 0b10001, 0b10001, 0b11110, 0b10001, 0b10001, 0b11110],
        'C' => [0b01110, 0b10001, 0b10000, 0b10000, 0b10000, 0b10001, 0b01110],
        'D' => [0b11100, 0b10010, 0b10001, 0b10001, 0b10001, 0b10010, 0b11100],
        'E' => [0b11111, 0b10000, 0b10000, 0b11110, 0b10000, 0b10000, 0b11111],
        'F' => [0b11111, 0b10000, 0b10000, 0b11110, 0b10000, 0b10000, 0b10000],
        'G' => [0b01110, 0b10001, 0b10000, 0b10111, 0b10001, 0b10001, 0b01111],
        'H' => [0b10001, 0b10001, 0b10001, 0b11111, 0b10001, 0b10001, 0b10001],
        'I' => [0b01110, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0b01110],
        'J' => [0b00111, 0b00010, 0b00010, 0b00010, 0b00010, 0b10010, 0b01100],
        'K' => [0b10001, 0b10010, 0b10100, 0b11000, 0b10100, 0b10010, 0b10001],
        'L' => [0b10000, 0b10000, 0b10000, 0b10000, 0b10000, 0b10000, 0b11111],
        'M' => [0b10001, 0b11011, 0b10101, 0b10101, 0b10001, 0b10001, 0b10001],
        'N' => [0b10001, 0b10001, 0b11001, 0b10101, 0b10011, 0b10001, 0b10001],
        'O' => [0b01110, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01110],
        'P' => [0b11110, 0b10001, 0b10001, 0b11110, 0b10000, 0b10000, 0b10000],
        'Q' => [0b01110, 0b10001, 0b10001, 0b10001, 0b10101, 0b10010, 0b01101],
        'R' => [0b11110, 0b10001, 0b10001, 0b11110, 0b10100, 0b10010, 0b10001],
        'S' => [0b01111, 0b10000, 0b10000, 0b01110, 0b00001, 0b00001, 0b11110],
        'T' => [0b11111, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100],
        'U' => [0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01110],
        'V' => [0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01010, 0b00100],
        'W' => [0b10001, 0b10001, 0b10001, 0b10101, 0b10101, 0b10101, 0b01010],
        'X' => [0b10001, 0b10001, 0b01010, 0b00100, 0b01010, 0b10001, 0b10001],
        'Y' => [0b10001, 0b10001, 0b10001, 0b01010, 0b00100, 0b00100, 0b00100],
        'Z' => [0b11111, 0b00001, 0b00010, 0b00100, 0b01000, 0b10000, 0b11111],
        '0' => [0b01110, 0b10001, 0b10011, 0b10101, 0b11001, 0b10001, 0b01110],
        '1' => [0b00100, 0b01100, 0b00100, 0b00100, 0b00100, 0b00100, 0b01110],
        '2' => [0b01110, 0b10001, 0b00001, 0b00010, 0b00100, 0b01000, 0b11111],
        '3' => [0b11111, 0b00010, 0b00100, 0b00010, 0b00001, 0b10001, 0b01110],
        '4' => [0b00010, 0b00110, 0b01010, 0b10010, 0b11111, 0b00010, 0b00010],
        '5' => [0b11111, 0b10000, 0b11110, 0b00001, 0b00001, 0b10001, 0b01110],
        '6' => [0b00110, 0b01000, 0b10000, 0b11110, 0b10001, 0b10001, 0b01110],
        '7' => [0b11111, 0b00001, 0b00010, 0b00100, 0b01000, 0b01000, 0b01000],
        '8' => [0b01110, 0b10001, 0b10001, 0b01110, 0b10001, 0b10001, 0b01110],
        '9' => [0b01110, 0b10001, 0b10001, 0b01111, 0b00001, 0b00010, 0b01100],
        ':' => [0b00000, 0b01100, 0b01100, 0b00000, 0b01100, 0b01100, 0b00000],
        '.' => [0b00000, 0b00000, 0b00000, 0b00000, 0b00000, 0b01100, 0b01100],
        ',' => [0b00000, 0b00000, 0b00000, 0b00000, 0b01100, 0b00100, 0b01000],
        '-' => [0b00000, 0b00000, 0b00000, 0b11111, 0b00000, 0b00000, 0b00000],
        '_' => [0b00000, 0b00000, 0b00000, 0b00000, 0b00000, 0b00000, 0b11111],
        '+' => [0b00000, 0b00100, 0b00100, 0b11111, 0b00100, 0b00100, 0b00000],
        '(' => [0b00010, 0b00100, 0b01000, 0b01000, 0b01000, 0b00100, 0b00010],
        ')' => [0b01000, 0b00100, 0b00010, 0b00010, 0b00010, 0b00100, 0b01000],
        '/' => [0b00000, 0b00001, 0b00010, 0b00100, 0b01000, 0b10000, 0b00000],
        '\'' => [0b01100, 0b00100, 0b01000, 0b00000, 0b00000, 0b00000, 0b00000],
        '&' => [0b01100, 0b10010, 0b10100, 0b01000, 0b10101, 0b10010, 0b01101],
        '#' => [0b01010, 0b01010, 0b11111, 0b01010, 0b11111, 0b01010, 0b01010],
        _ => UNKNOWN,
    }
}

/// Width of one line of text in cells.
pub fn line_width(line: &str) -> u32 {
    match line.chars().count() as u32 {
        0 => 0,
        n => n * ADVANCE - 1,
    }
}

/// Width and height of a block of text in cells.
pub fn text_extent(text: &str) -> (u32, u32) {
    let lines: Vec<&str> = text.lines().collect();
    if lines.is_empty() {
        return (0, 0);
    }
    let w = lines.iter().map(|l| line_width(l)).max().unwrap_or(0);
    let h = (lines.len() as u32 - 1) * LINE_ADVANCE + GLYPH_HEIGHT;
    (w, h)
}

/// Lit cells of a text block as `(column, row)` pairs.
///
/// Each line is centered horizontally within the block's width.
pub fn lit_cells(text: &str) -> Vec<(u32, u32)> {
    let (block_w, _) = text_extent(text);
    let mut cells = Vec::new();
    for (li, line) in text.lines().enumerate() {
        let x0 = (block_w - line_width(line)) / 2;
        let y0 = li as u32 * LINE_ADVANCE;
        for (ci, ch) in line.chars().enumerate() {
            let rows = glyph(ch);
            let gx = x0 + ci as u32 * ADVANCE;
            for (ry, bits) in rows.iter().enumerate() {
                for cx in 0..GLYPH_WIDTH {
                    if bits & (1 << (GLYPH_WIDTH - 1 - cx)) != 0 {
                        cells.push((gx + cx, y0 + ry as u32));
                    }
                }
            }
        }
    }
    cells
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_case_folding_and_fallback() {
        assert_eq!(glyph('a'), glyph('A'));
        assert_eq!(glyph('~'), UNKNOWN);
        assert_eq!(glyph(' '), [0; 7]);
    }

    #[test]
    fn test_glyph_rows_fit_width() {
        for ch in "ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789:.,-_+()/'&#".chars() {
            assert!(glyph(ch).iter().all(|&r| r < 1 << GLYPH_WIDTH), "{}", ch);
            assert_ne!(glyph(ch), [0; 7], "{}", ch);
        }
    }

    #[test]
    fn test_extent() {
        assert_eq!(text_extent(""), (0, 0));
        assert_eq!(text_extent("AB"), (11, 7));
        assert_eq!(text_extent("Layer: x\nType: city"), (59, 17));
    }

    #[test]
    fn test_lit_cells_centered() {
        let cells = lit_cells("I\nIII");
        let (w, h) = text_extent("I\nIII");
        assert!(cells.iter().all(|&(x, y)| x < w && y < h));
        // The single I on the first line is centered over the wider second line.
        let top: Vec<u32> = cells.iter().filter(|c| c.1 == 0).map(|c| c.0).collect();
        assert_eq!(top, vec![7, 8, 9]);
    }
}
