//! Plain-text table rendering
//!
//! Pure, synchronous grid renderer for terminal output. Column widths come
//! from the data itself: each column is as wide as the longest of its
//! header and cells. Headers render upper-cased; rows narrower than the
//! header set simply stop early.

/// Render a bordered grid from a header row and data rows
///
/// Rows may carry fewer cells than the header; missing trailing cells are
/// absent from the output, not padded.
pub fn render_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let widths = column_widths(headers, rows);

    let mut out = String::new();
    out.push_str(&border(&widths));

    let header_cells: Vec<String> = headers.iter().map(|h| h.to_uppercase()).collect();
    out.push_str(&row_line(&header_cells, &widths));
    out.push_str(&border(&widths));

    // With no data rows the header separator already closes the grid
    if !rows.is_empty() {
        for row in rows {
            out.push_str(&row_line(row, &widths));
        }
        out.push_str(&border(&widths));
    }
    out
}

/// Each column's width is the maximum of the header length and every cell
/// length in that column
fn column_widths(headers: &[&str], rows: &[Vec<String>]) -> Vec<usize> {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate().take(widths.len()) {
            widths[i] = widths[i].max(cell.chars().count());
        }
    }
    widths
}

fn border(widths: &[usize]) -> String {
    let mut line = String::from("+");
    for width in widths {
        line.push_str(&"-".repeat(width + 2));
        line.push('+');
    }
    line.push('\n');
    line
}

fn row_line(cells: &[String], widths: &[usize]) -> String {
    let mut line = String::from("|");
    for (cell, width) in cells.iter().zip(widths) {
        line.push_str(&format!(" {:<width$} |", cell, width = *width));
    }
    line.push('\n');
    line
}
