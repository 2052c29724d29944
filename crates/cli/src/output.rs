//! Terminal rendering of notices, tables and confirmation prompts.

use hms_core::print::Table;
use hms_core::{Notice, NoticeLevel};
use std::io::{self, BufRead, Write};

pub fn notice(notice: &Notice) {
    match notice.level() {
        NoticeLevel::Success => println!("[ok] {notice}"),
        NoticeLevel::Info => println!("[info] {notice}"),
        NoticeLevel::Error => eprintln!("[error] {notice}"),
    }
}

pub fn maybe_notice(n: Option<Notice>) {
    if let Some(n) = n {
        notice(&n);
    }
}

/// Prints rows under their headers with columns padded to the widest cell.
pub fn table(table: &Table) {
    let columns = table.headers.len();
    let mut widths: Vec<usize> = table.headers.iter().map(|h| h.chars().count()).collect();
    for row in &table.rows {
        for (i, cell) in row.iter().enumerate().take(columns) {
            widths[i] = widths[i].max(cell.chars().count());
        }
    }

    let line = |cells: &[String]| {
        cells
            .iter()
            .zip(&widths)
            .map(|(cell, &w)| format!("{cell:<w$}"))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };
    println!("{}", line(&table.headers));
    println!("{}", widths.iter().map(|w| "-".repeat(*w)).collect::<Vec<_>>().join("  "));
    for row in &table.rows {
        println!("{}", line(row));
    }
}

pub fn pairs(rows: &[(String, String)]) {
    let width = rows.iter().map(|(l, _)| l.chars().count()).max().unwrap_or(0);
    for (label, value) in rows {
        println!("{label:<width$}  {value}");
    }
}

/// Reads one line from stdin after showing `prompt`.
pub fn read_line(prompt: &str) -> io::Result<String> {
    print!("{prompt}");
    io::stdout().flush()?;
    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(answer.trim_end_matches(['\r', '\n']).to_string())
}

/// A yes/no confirmation. `assume_yes` answers every prompt without asking.
pub fn confirmer(assume_yes: bool) -> impl FnMut(&str) -> bool {
    move |prompt: &str| {
        if assume_yes {
            return true;
        }
        match read_line(&format!("{prompt} [y/N] ")) {
            Ok(answer) => matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"),
            Err(_) => false,
        }
    }
}
