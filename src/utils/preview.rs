// Head/tail tables printed after each CLI stage
use crate::data::series::PriceSeries;
use std::fmt::Display;
use std::ops::Range;

const TIME_WIDTH: usize = 23;
const VALUE_WIDTH: usize = 12;

fn format_value(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else if value.abs() >= 1e6 {
        format!("{:.0}", value)
    } else {
        format!("{:.4}", value)
    }
}

fn format_rows<I: Display>(series: &PriceSeries<I>, rows: Range<usize>) -> String {
    let names = series.column_names();
    let widths: Vec<usize> = names.iter().map(|n| n.len().max(VALUE_WIDTH)).collect();

    let mut out = format!("{:<width$}", "timestamp", width = TIME_WIDTH);
    for (name, width) in names.iter().zip(&widths) {
        out.push_str(&format!(" | {:<width$}", name, width = *width));
    }
    out.push('\n');

    for i in rows {
        out.push_str(&format!(
            "{:<width$}",
            series.index()[i].to_string(),
            width = TIME_WIDTH
        ));
        for (value, width) in series.row(i).into_iter().zip(&widths) {
            out.push_str(&format!(" | {:<width$}", format_value(value), width = *width));
        }
        out.push('\n');
    }
    out
}

/// First `n` rows as a table
pub fn format_head<I: Display>(series: &PriceSeries<I>, n: usize) -> String {
    format_rows(series, 0..n.min(series.len()))
}

/// Last `n` rows as a table
pub fn format_tail<I: Display>(series: &PriceSeries<I>, n: usize) -> String {
    let len = series.len();
    format_rows(series, len.saturating_sub(n)..len)
}

pub fn print_preview<I: Display>(label: &str, series: &PriceSeries<I>) {
    if series.is_empty() {
        println!("\n{}: no rows", label);
        return;
    }
    println!("\nFirst 5 rows of {}:", label);
    print!("{}", format_head(series, 5));
    println!("\nLast 5 rows of {}:", label);
    print!("{}", format_tail(series, 5));
}
