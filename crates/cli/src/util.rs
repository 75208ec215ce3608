use unicode_width::UnicodeWidthStr;

/// Display width of a string, accounting for CJK double-width, emoji, etc.
pub(crate) fn display_width(s: &str) -> usize {
    UnicodeWidthStr::width(s)
}

/// Truncate to fit within `width` display columns, adding ".." if truncated.
pub(crate) fn truncate_display(s: &str, width: usize) -> String {
    if display_width(s) <= width {
        return s.to_string();
    }
    if width < 3 {
        return s
            .chars()
            .next()
            .filter(|ch| unicode_width::UnicodeWidthChar::width(*ch).unwrap_or(0) <= width)
            .map(String::from)
            .unwrap_or_default();
    }

    let budget = width - 2;
    let mut used = 0;
    let mut end_byte = 0;
    for (i, ch) in s.char_indices() {
        let cw = unicode_width::UnicodeWidthChar::width(ch).unwrap_or(0);
        if used + cw > budget {
            end_byte = i;
            break;
        }
        used += cw;
        end_byte = i + ch.len_utf8();
    }

    format!("{}..", &s[..end_byte])
}

/// Pad or truncate a string to exactly `width` display columns.
pub(crate) fn pad_right(s: &str, width: usize) -> String {
    let sw = display_width(s);
    if sw > width {
        truncate_display(s, width)
    } else {
        format!("{}{}", s, " ".repeat(width - sw))
    }
}

/// Column widths fitting every cell, capped at `max`.
pub(crate) fn column_widths(rows: &[Vec<String>], max: usize) -> Vec<usize> {
    let columns = rows.iter().map(Vec::len).max().unwrap_or(0);
    (0..columns)
        .map(|c| {
            rows.iter()
                .filter_map(|row| row.get(c))
                .map(|cell| display_width(cell))
                .max()
                .unwrap_or(0)
                .min(max)
        })
        .collect()
}

/// One table line: every cell but the last padded to its column width.
pub(crate) fn table_row(cells: &[String], widths: &[usize]) -> String {
    let last = cells.len().saturating_sub(1);
    cells
        .iter()
        .enumerate()
        .map(|(i, cell)| match widths.get(i) {
            Some(&width) if i != last => pad_right(cell, width),
            _ => cell.clone(),
        })
        .collect::<Vec<_>>()
        .join("  ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_width_ascii() {
        assert_eq!(display_width("revenues"), 8);
        assert_eq!(display_width(""), 0);
    }

    #[test]
    fn display_width_cjk() {
        assert_eq!(display_width("\u{4e16}\u{754c}"), 4);
    }

    #[test]
    fn truncate_cuts() {
        assert_eq!(truncate_display("jmu-athletics", 13), "jmu-athletics");
        assert_eq!(truncate_display("jmu-athletics", 6), "jmu-..");
        assert_eq!(truncate_display("abc", 2), "a");
        assert_eq!(truncate_display("", 0), "");
    }

    #[test]
    fn truncate_cjk_boundary() {
        let s = "\u{4e16}\u{754c}\u{4f60}\u{597d}";
        let t = truncate_display(s, 6);
        assert_eq!(t, "\u{4e16}\u{754c}..");
        assert!(display_width(&t) <= 6);
    }

    #[test]
    fn pad_right_pads_and_truncates() {
        assert_eq!(pad_right("JMU", 5), "JMU  ");
        assert_eq!(pad_right("Men's Basketball", 8), "Men's ..");
    }

    #[test]
    fn table_aligns_columns() {
        let rows = vec![
            vec!["VIEW".to_string(), "HUB".to_string()],
            vec!["revenues".to_string(), "JMU".to_string()],
        ];
        let widths = column_widths(&rows, 40);
        assert_eq!(widths, vec![8, 3]);
        assert_eq!(table_row(&rows[0], &widths), "VIEW      HUB");
        assert_eq!(table_row(&rows[1], &widths), "revenues  JMU");
    }
}
