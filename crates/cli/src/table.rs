// Aligned-text rendering of a grid window for terminal output.
//
// Leaf rows print as padded columns under a header line; group headers
// print as indented summary lines with their rollups inline.

use streamgrid_engine::grid::RenderRow;

const INDENT: &str = "  ";
const GUTTER: &str = "  ";

/// Format one window of render rows as aligned text. `headers` are the
/// visible column labels, in the same order as the leaf cells.
pub fn format_window(headers: &[String], rows: &[RenderRow]) -> String {
    // column widths over the header plus every leaf cell, indent included
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        if let RenderRow::Leaf { depth, cells, .. } = row {
            for (i, cell) in cells.iter().enumerate() {
                let mut len = cell.text.chars().count();
                if i == 0 {
                    len += INDENT.len() * depth;
                }
                if i < widths.len() && len > widths[i] {
                    widths[i] = len;
                }
            }
        }
    }

    let mut out = String::new();
    out.push_str(&padded_line(headers.iter().map(String::as_str), &widths, 0));
    out.push('\n');

    for row in rows {
        match row {
            RenderRow::Group { depth, column_label, value, leaf_count, aggregates } => {
                out.push_str(&INDENT.repeat(*depth));
                out.push_str(&format!("{}: {} ({} rows)", column_label, value, leaf_count));
                for (label, func, text) in aggregates {
                    out.push_str(&format!("  [{} {}: {}]", label, func, text));
                }
                out.push('\n');
            }
            RenderRow::Leaf { depth, selected, pending, cells, .. } => {
                let texts: Vec<&str> = cells.iter().map(|c| c.text.as_str()).collect();
                out.push_str(&padded_line(texts.into_iter(), &widths, *depth));
                if *pending {
                    out.push_str("  (pending)");
                }
                if *selected {
                    out.push_str("  *");
                }
                out.push('\n');
            }
        }
    }
    out
}

fn padded_line<'a>(cells: impl Iterator<Item = &'a str>, widths: &[usize], depth: usize) -> String {
    let mut line = String::new();
    for (i, text) in cells.enumerate() {
        if i > 0 {
            line.push_str(GUTTER);
        }
        let mut field = String::new();
        if i == 0 {
            field.push_str(&INDENT.repeat(depth));
        }
        field.push_str(text);
        let width = widths.get(i).copied().unwrap_or(0);
        let pad = width.saturating_sub(field.chars().count());
        line.push_str(&field);
        line.push_str(&" ".repeat(pad));
    }
    line.trim_end().to_string()
}
