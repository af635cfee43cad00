//! Plain-text tables and JSON printing for command results.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use convert_case::{Case, Casing};
use itertools::Itertools;
use serde::Serialize;
use std::fmt;
use t42_api::PaginationMeta;

const COLUMN_GAP: &str = "  ";

/// Left-aligned text table; every column is as wide as its widest cell.
#[derive(Debug, Default)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(headers: &[&str]) -> Self {
        Self {
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    pub fn row<I, S>(&mut self, cells: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rows.push(cells.into_iter().map(Into::into).collect());
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    fn widths(&self) -> Vec<usize> {
        (0..self.headers.len())
            .map(|i| {
                std::iter::once(&self.headers[i])
                    .chain(self.rows.iter().filter_map(|r| r.get(i)))
                    .map(|cell| cell.chars().count())
                    .max()
                    .unwrap_or(0)
            })
            .collect()
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let widths = self.widths();
        let line = |cells: &[String]| {
            cells
                .iter()
                .zip(&widths)
                .map(|(cell, width)| format!("{cell:<width$}"))
                .join(COLUMN_GAP)
                .trim_end()
                .to_string()
        };

        writeln!(f, "{}", line(&self.headers))?;
        let rule = widths.iter().sum::<usize>() + COLUMN_GAP.len() * widths.len().saturating_sub(1);
        writeln!(f, "{}", "-".repeat(rule))?;
        for row in &self.rows {
            writeln!(f, "{}", line(row))?;
        }
        Ok(())
    }
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{json}");
    Ok(())
}

/// `waiting_for_correction` -> `Waiting for correction`.
pub fn humanize(status: &str) -> String {
    status.to_case(Case::Sentence)
}

pub fn level(level: f64) -> String {
    format!("{level:.2}")
}

/// Days left before the blackhole, `BH'd` once it has passed, `-` when none is set.
pub fn blackhole(at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
    match at {
        None => "-".to_string(),
        Some(at) if at <= now => "BH'd".to_string(),
        Some(at) => format!("{}d", (at - now).num_days()),
    }
}

pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let kept: String = text.chars().take(max.saturating_sub(3)).collect();
    format!("{kept}...")
}

pub fn yes_no(value: bool) -> &'static str {
    if value { "yes" } else { "no" }
}

pub fn or_dash(value: Option<&str>) -> &str {
    value.filter(|v| !v.is_empty()).unwrap_or("-")
}

/// Pagination summary printed under a single-page listing.
pub fn page_footer(meta: &PaginationMeta, noun: &str) -> String {
    let page = meta.page.unwrap_or(1);
    let mut footer = match (meta.total_pages, meta.total_count) {
        (Some(pages), Some(total)) => format!(
            "Page {page} of {pages} ({total} total {noun}, showing {})",
            meta.count
        ),
        _ => format!("Page {page} ({} {noun} shown)", meta.count),
    };
    if meta.has_next() {
        footer.push_str(&format!("\nUse --page {} to see the next page", page + 1));
    }
    footer
}
