//! Printed expiry date extraction from OCR text

use chrono::NaiveDate;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// Keywords that mark the line carrying the expiry date
pub const EXPIRY_KEYWORDS: &[&str] = &[
    "expiry",
    "expires",
    "use by",
    "best before",
    "use before",
    "valid until",
];

/// Recognised date layouts, in the order they are tried
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateFormat {
    /// `12-05-2024`, `12/5/2024`
    DayMonthYear,
    /// `2024-05-12`, `2024/5/12`
    YearMonthDay,
    /// `12 May 2024`
    DayMonthNameYear,
    /// `May 12, 2024`
    MonthNameDayYear,
}

const MONTH: &str = r"(jan(?:uary)?|feb(?:ruary)?|mar(?:ch)?|apr(?:il)?|may|june?|july?|aug(?:ust)?|sep(?:t(?:ember)?)?|oct(?:ober)?|nov(?:ember)?|dec(?:ember)?)";

static PATTERNS: LazyLock<Vec<(DateFormat, Regex)>> = LazyLock::new(|| {
    let sources = [
        (
            DateFormat::DayMonthYear,
            r"(?:^|\D)(\d{1,2})[-/](\d{1,2})[-/](\d{4})(?:\D|$)".to_string(),
        ),
        (
            DateFormat::YearMonthDay,
            r"(?:^|\D)(\d{4})[-/](\d{1,2})[-/](\d{1,2})(?:\D|$)".to_string(),
        ),
        (
            DateFormat::DayMonthNameYear,
            format!(r"(?i)\b(\d{{1,2}})(?:st|nd|rd|th)?\s+{MONTH}\b\.?,?\s+(\d{{4}})\b"),
        ),
        (
            DateFormat::MonthNameDayYear,
            format!(r"(?i)\b{MONTH}\b\.?\s+(\d{{1,2}})(?:st|nd|rd|th)?,?\s+(\d{{4}})\b"),
        ),
    ];

    sources
        .into_iter()
        .map(|(format, source)| {
            let regex = Regex::new(&source).expect("date pattern must compile");
            (format, regex)
        })
        .collect()
});

/// Result of scanning label text
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedExpiry {
    pub date: Option<NaiveDate>,
    pub format: Option<DateFormat>,
}

impl ExtractedExpiry {
    pub fn none() -> Self {
        Self::default()
    }

    /// `YYYY-MM-DD`, when a date was found
    pub fn iso_date(&self) -> Option<String> {
        self.date.map(|date| date.format("%Y-%m-%d").to_string())
    }

    pub fn is_found(&self) -> bool {
        self.date.is_some()
    }
}

#[derive(Debug, Clone)]
pub struct ExpiryExtractor {
    keywords: Vec<String>,
}

impl Default for ExpiryExtractor {
    fn default() -> Self {
        Self::with_keywords(EXPIRY_KEYWORDS.iter().copied())
    }
}

impl ExpiryExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_keywords<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            keywords: keywords
                .into_iter()
                .map(|keyword| keyword.as_ref().to_lowercase())
                .collect(),
        }
    }

    /// Find a printed expiry date.
    ///
    /// The first line containing an expiry keyword is searched; without one
    /// the whole text is. Patterns are tried in [`DateFormat`] order and the
    /// first match of each is used. A match that is not a real calendar date
    /// moves on to the next pattern.
    pub fn extract(&self, ocr_text: &str) -> ExtractedExpiry {
        let target = self.search_target(ocr_text);

        for (format, regex) in PATTERNS.iter() {
            let Some(caps) = regex.captures(target) else {
                continue;
            };

            match build_date(*format, &caps) {
                Some(date) => {
                    return ExtractedExpiry {
                        date: Some(date),
                        format: Some(*format),
                    };
                }
                None => {
                    tracing::trace!(
                        format = ?format,
                        candidate = &caps[0],
                        "Rejected date candidate"
                    );
                }
            }
        }

        ExtractedExpiry::none()
    }

    fn search_target<'t>(&self, ocr_text: &'t str) -> &'t str {
        ocr_text
            .lines()
            .find(|line| {
                let line = line.to_lowercase();
                self.keywords.iter().any(|keyword| line.contains(keyword.as_str()))
            })
            .unwrap_or(ocr_text)
    }
}

fn build_date(format: DateFormat, caps: &Captures<'_>) -> Option<NaiveDate> {
    let number = |i: usize| caps.get(i)?.as_str().parse::<u32>().ok();
    let year = |i: usize| caps.get(i)?.as_str().parse::<i32>().ok();

    let (y, m, d) = match format {
        DateFormat::DayMonthYear => (year(3)?, number(2)?, number(1)?),
        DateFormat::YearMonthDay => (year(1)?, number(2)?, number(3)?),
        DateFormat::DayMonthNameYear => (year(3)?, month_number(caps.get(2)?.as_str())?, number(1)?),
        DateFormat::MonthNameDayYear => (year(3)?, month_number(caps.get(1)?.as_str())?, number(2)?),
    };

    NaiveDate::from_ymd_opt(y, m, d)
}

fn month_number(name: &str) -> Option<u32> {
    const MONTHS: [&str; 12] = [
        "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
    ];
    let prefix: String = name.chars().take(3).collect::<String>().to_lowercase();
    MONTHS
        .iter()
        .position(|month| *month == prefix)
        .map(|index| index as u32 + 1)
}
