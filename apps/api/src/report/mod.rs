//! Report boundary: the logical schema of the exported caption schedule.
//!
//! One row per schedule slot. The same fields are laid out twice: a wide sheet
//! (field labels down column A, one column per slot) for pasting into the client's
//! delivery spreadsheet, and a tall sheet (one row per slot) for review.

pub mod handlers;
pub mod xlsx;

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::generation::orchestrator::GenerationResult;
use crate::report::xlsx::Sheet;

pub const WIDE_SHEET: &str = "Schedule";
pub const TALL_SHEET: &str = "Overview";

const WIDE_LABELS: [&str; 7] = [
    "No.",
    "Post date",
    "Post type",
    "Title",
    "Product URL (for stories)",
    "Caption",
    "Seasonal event",
];

const TALL_HEADERS: [&str; 7] = [
    "No.",
    "Post date",
    "Type",
    "Title",
    "Product URL",
    "Seasonal event",
    "Caption",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportRow {
    /// 1-based.
    pub sequence: usize,
    pub date_label: String,
    pub kind_label: String,
    pub title: String,
    #[serde(default)]
    pub source_url: Option<String>,
    pub caption: String,
    #[serde(default)]
    pub seasonal_event: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub client_label: String,
    pub rows: Vec<ReportRow>,
}

/// "Mar 2 (Mon)".
pub fn date_label(date: NaiveDate) -> String {
    format!(
        "{} {} ({})",
        month_abbrev(date.month()),
        date.day(),
        weekday_abbrev(date.weekday())
    )
}

fn month_abbrev(month: u32) -> &'static str {
    const MONTHS: [&str; 12] = [
        "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
    ];
    MONTHS[(month as usize).saturating_sub(1) % 12]
}

pub fn weekday_abbrev(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "Mon",
        Weekday::Tue => "Tue",
        Weekday::Wed => "Wed",
        Weekday::Thu => "Thu",
        Weekday::Fri => "Fri",
        Weekday::Sat => "Sat",
        Weekday::Sun => "Sun",
    }
}

fn blank_as_none(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

impl ReportRow {
    pub fn from_result(result: &GenerationResult) -> Self {
        Self {
            sequence: result.slot_index + 1,
            date_label: date_label(result.date),
            kind_label: result.kind_label.to_string(),
            title: result.item_label.clone(),
            source_url: result.source_url.clone(),
            caption: result.caption_text.clone(),
            seasonal_event: result.seasonal_event.clone(),
        }
    }

    fn wide_field(&self, field: usize) -> String {
        match field {
            0 => self.sequence.to_string(),
            1 => self.date_label.clone(),
            2 => self.kind_label.clone(),
            3 => self.title.clone(),
            4 => self.source_url.clone().unwrap_or_default(),
            5 => self.caption.clone(),
            _ => self.seasonal_event.clone().unwrap_or_default(),
        }
    }

    fn tall_cells(&self) -> Vec<String> {
        vec![
            self.sequence.to_string(),
            self.date_label.clone(),
            self.kind_label.clone(),
            self.title.clone(),
            self.source_url.clone().unwrap_or_default(),
            self.seasonal_event.clone().unwrap_or_default(),
            self.caption.clone(),
        ]
    }
}

impl Report {
    pub fn from_results(client_label: impl Into<String>, results: &[GenerationResult]) -> Self {
        Self {
            client_label: client_label.into(),
            rows: results.iter().map(ReportRow::from_result).collect(),
        }
    }

    /// Field labels in the first column, one column per slot.
    pub fn wide_layout(&self) -> Vec<Vec<String>> {
        WIDE_LABELS
            .iter()
            .enumerate()
            .map(|(field, label)| {
                std::iter::once(label.to_string())
                    .chain(self.rows.iter().map(|row| row.wide_field(field)))
                    .collect()
            })
            .collect()
    }

    /// Header row, then one row per slot.
    pub fn tall_layout(&self) -> Vec<Vec<String>> {
        std::iter::once(TALL_HEADERS.iter().map(|h| h.to_string()).collect())
            .chain(self.rows.iter().map(ReportRow::tall_cells))
            .collect()
    }

    pub fn to_sheets(&self) -> Vec<Sheet> {
        vec![
            Sheet {
                name: WIDE_SHEET.to_string(),
                rows: self.wide_layout(),
            },
            Sheet {
                name: TALL_SHEET.to_string(),
                rows: self.tall_layout(),
            },
        ]
    }

    /// Rebuilds rows from a tall layout, as read back from an exported workbook.
    pub fn from_tall_layout(
        client_label: impl Into<String>,
        layout: &[Vec<String>],
    ) -> Result<Self, AppError> {
        let mut rows = Vec::new();
        for (i, cells) in layout.iter().enumerate().skip(1) {
            let cell = |n: usize| cells.get(n).cloned().unwrap_or_default();
            let sequence = cell(0).parse::<usize>().map_err(|_| {
                AppError::Validation(format!("Row {} has no valid sequence number", i + 1))
            })?;
            rows.push(ReportRow {
                sequence,
                date_label: cell(1),
                kind_label: cell(2),
                title: cell(3),
                source_url: blank_as_none(&cell(4)),
                seasonal_event: blank_as_none(&cell(5)),
                caption: cell(6),
            });
        }
        Ok(Self {
            client_label: client_label.into(),
            rows,
        })
    }

    /// `captions_<client>_<N>posts.xlsx`, with the client label reduced to filename-safe characters.
    pub fn file_name(&self) -> String {
        let label: String = self
            .client_label
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        let label = if label.is_empty() { "output".to_string() } else { label };
        format!("captions_{}_{}posts.xlsx", label, self.rows.len())
    }
}
