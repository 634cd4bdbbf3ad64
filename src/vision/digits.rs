//! Template-based digit recognition over a binarized meter photo.
//!
//! The recognizer is deliberately narrow: it only knows seven-segment-ish
//! 5x7 glyphs for 0-9, which is what domestic meter displays print. Each ink
//! run of columns is boxed, downsampled to the 5x7 grid and matched against
//! every template; a box too dissimilar to any digit becomes a placeholder
//! character that the caller strips.

use image::GrayImage;

const GLYPH_COLS: usize = 5;
const GLYPH_ROWS: usize = 7;

/// Minimum fraction of matching template cells to call a box a digit.
const MATCH_FLOOR: f64 = 0.70;

/// Boxes narrower than this are treated as specks, not glyphs.
const MIN_GLYPH_WIDTH: u32 = 2;

/// 5x7 bitmaps for the digits 0-9, one row per string.
const TEMPLATES: [[&str; GLYPH_ROWS]; 10] = [
    ["01110", "10001", "10011", "10101", "11001", "10001", "01110"], // 0
    ["00100", "01100", "00100", "00100", "00100", "00100", "01110"], // 1
    ["01110", "10001", "00001", "00010", "00100", "01000", "11111"], // 2
    ["11111", "00010", "00100", "00010", "00001", "10001", "01110"], // 3
    ["00010", "00110", "01010", "10010", "11111", "00010", "00010"], // 4
    ["11111", "10000", "11110", "00001", "00001", "10001", "01110"], // 5
    ["00110", "01000", "10000", "11110", "10001", "10001", "01110"], // 6
    ["11111", "00001", "00010", "00100", "01000", "01000", "01000"], // 7
    ["01110", "10001", "10001", "01110", "10001", "10001", "01110"], // 8
    ["01110", "10001", "10001", "01111", "00001", "00010", "01100"], // 9
];

/// Otsu's global threshold over an 8-bit grayscale histogram.
pub(crate) fn otsu_threshold(gray: &GrayImage) -> u8 {
    let mut histogram = [0u64; 256];
    for pixel in gray.pixels() {
        histogram[pixel.0[0] as usize] += 1;
    }

    let total: u64 = histogram.iter().sum();
    if total == 0 {
        return 0;
    }

    let weighted_total: f64 = histogram
        .iter()
        .enumerate()
        .map(|(level, &count)| level as f64 * count as f64)
        .sum();

    let mut background_count = 0u64;
    let mut background_sum = 0.0;
    let mut best_variance = 0.0;
    let mut best_threshold = 0u8;

    for level in 0..256 {
        background_count += histogram[level];
        if background_count == 0 {
            continue;
        }
        let foreground_count = total - background_count;
        if foreground_count == 0 {
            break;
        }

        background_sum += level as f64 * histogram[level] as f64;
        let background_mean = background_sum / background_count as f64;
        let foreground_mean = (weighted_total - background_sum) / foreground_count as f64;

        let between = background_count as f64
            * foreground_count as f64
            * (background_mean - foreground_mean)
            * (background_mean - foreground_mean);
        if between > best_variance {
            best_variance = between;
            best_threshold = level as u8;
        }
    }

    best_threshold
}

/// Read glyphs left to right from a binarized image. Ink is any pixel at or
/// below `threshold` (dark digits on a light dial). Unrecognized shapes come
/// back as `?`.
pub(crate) fn read_glyphs(gray: &GrayImage, threshold: u8) -> String {
    let (width, height) = gray.dimensions();
    let is_ink = |x: u32, y: u32| gray.get_pixel(x, y).0[0] <= threshold;

    // Group consecutive columns containing ink into glyph boxes.
    let mut boxes: Vec<(u32, u32)> = Vec::new();
    let mut run_start: Option<u32> = None;
    for x in 0..width {
        let has_ink = (0..height).any(|y| is_ink(x, y));
        match (has_ink, run_start) {
            (true, None) => run_start = Some(x),
            (false, Some(start)) => {
                boxes.push((start, x));
                run_start = None;
            }
            _ => {}
        }
    }
    if let Some(start) = run_start {
        boxes.push((start, width));
    }

    let mut output = String::new();
    for (x0, x1) in boxes {
        if x1 - x0 < MIN_GLYPH_WIDTH {
            continue;
        }

        // Vertical extent of the ink inside the box.
        let mut y0 = None;
        let mut y1 = 0;
        for y in 0..height {
            if (x0..x1).any(|x| is_ink(x, y)) {
                if y0.is_none() {
                    y0 = Some(y);
                }
                y1 = y + 1;
            }
        }
        let Some(y0) = y0 else { continue };

        output.push(classify_box(gray, threshold, x0, x1, y0, y1));
    }

    output
}

/// Downsample a glyph box to the 5x7 grid by cell majority and return the
/// best-matching digit, or `?` below the similarity floor.
fn classify_box(gray: &GrayImage, threshold: u8, x0: u32, x1: u32, y0: u32, y1: u32) -> char {
    let box_width = (x1 - x0) as f64;
    let box_height = (y1 - y0) as f64;

    let mut grid = [[false; GLYPH_COLS]; GLYPH_ROWS];
    for (row, grid_row) in grid.iter_mut().enumerate() {
        for (col, cell) in grid_row.iter_mut().enumerate() {
            let cx0 = x0 + (col as f64 * box_width / GLYPH_COLS as f64) as u32;
            let cx1 = x0 + (((col + 1) as f64 * box_width / GLYPH_COLS as f64).ceil() as u32)
                .min(x1 - x0);
            let cy0 = y0 + (row as f64 * box_height / GLYPH_ROWS as f64) as u32;
            let cy1 = y0 + (((row + 1) as f64 * box_height / GLYPH_ROWS as f64).ceil() as u32)
                .min(y1 - y0);

            let mut ink = 0u32;
            let mut span = 0u32;
            for y in cy0..cy1.max(cy0 + 1) {
                for x in cx0..cx1.max(cx0 + 1) {
                    span += 1;
                    if gray.get_pixel(x, y).0[0] <= threshold {
                        ink += 1;
                    }
                }
            }
            *cell = ink * 2 > span;
        }
    }

    let mut best_digit = '?';
    let mut best_score = 0.0;
    for (digit, template) in TEMPLATES.iter().enumerate() {
        // The observed box is the tight ink extent, so compare against the
        // template trimmed to its own non-empty columns ("1" is narrower
        // than the 5-column frame) and stretched back onto the grid.
        let (t0, t1) = template_column_extent(template);
        let template_width = (t1 - t0) as f64;

        let mut matches = 0;
        for (row, template_row) in template.iter().enumerate() {
            let bytes = template_row.as_bytes();
            for (col, cell) in grid[row].iter().enumerate() {
                let source =
                    t0 + ((col as f64 + 0.5) * template_width / GLYPH_COLS as f64) as usize;
                if (bytes[source.min(t1 - 1)] == b'1') == *cell {
                    matches += 1;
                }
            }
        }
        let score = matches as f64 / (GLYPH_COLS * GLYPH_ROWS) as f64;
        if score > best_score {
            best_score = score;
            best_digit = char::from(b'0' + digit as u8);
        }
    }

    if best_score >= MATCH_FLOOR {
        best_digit
    } else {
        '?'
    }
}

/// Half-open range of columns containing ink in a template.
fn template_column_extent(template: &[&str; GLYPH_ROWS]) -> (usize, usize) {
    let mut first = GLYPH_COLS;
    let mut last = 0;
    for row in template {
        for (col, bit) in row.bytes().enumerate() {
            if bit == b'1' {
                first = first.min(col);
                last = last.max(col + 1);
            }
        }
    }
    (first, last)
}

/// Render a digit string as a black-on-white glyph strip. Test fixture for
/// the optical tier.
#[cfg(test)]
pub(crate) fn render_strip(digits: &str, scale: u32) -> GrayImage {
    let glyph_width = GLYPH_COLS as u32 * scale;
    let glyph_height = GLYPH_ROWS as u32 * scale;
    let gap = 2 * scale;
    let margin = 2 * scale;

    let count = digits.len() as u32;
    let width = margin * 2 + count * glyph_width + count.saturating_sub(1) * gap;
    let height = margin * 2 + glyph_height;

    let mut img = GrayImage::from_pixel(width, height, image::Luma([255]));
    for (index, ch) in digits.chars().enumerate() {
        let digit = ch.to_digit(10).expect("render_strip takes digits only") as usize;
        let origin_x = margin + index as u32 * (glyph_width + gap);
        for (row, template_row) in TEMPLATES[digit].iter().enumerate() {
            for (col, bit) in template_row.bytes().enumerate() {
                if bit != b'1' {
                    continue;
                }
                for dy in 0..scale {
                    for dx in 0..scale {
                        let x = origin_x + col as u32 * scale + dx;
                        let y = margin + row as u32 * scale + dy;
                        img.put_pixel(x, y, image::Luma([0]));
                    }
                }
            }
        }
    }

    img
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn otsu_splits_bimodal_histogram() {
        let mut img = GrayImage::new(10, 10);
        for (x, _, pixel) in img.enumerate_pixels_mut() {
            pixel.0[0] = if x < 5 { 20 } else { 230 };
        }
        let threshold = otsu_threshold(&img);
        assert!(threshold >= 20 && threshold < 230);
    }

    #[test]
    fn rendered_strip_reads_back() {
        let img = render_strip("0123456789", 5);
        let threshold = otsu_threshold(&img);
        assert_eq!(read_glyphs(&img, threshold), "0123456789");
    }

    #[test]
    fn blank_image_reads_nothing() {
        let img = GrayImage::from_pixel(50, 20, image::Luma([255]));
        let threshold = otsu_threshold(&img);
        assert_eq!(read_glyphs(&img, threshold), "");
    }
}
