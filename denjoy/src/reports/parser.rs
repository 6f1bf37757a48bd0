//! Line-oriented parser for the plain-text inventory diagnostic report.
//!
//! The report is produced by the SPA's analysis tool:
//!
//! ```text
//! === DenJOY Inventory Analysis ===
//! Score: 72/100 (Grade: B)
//!
//! === Diagnostics ===
//! [OK] Stock levels match usage for 12 fixtures
//! [WARNING] 3 fixtures unused for 180+ days
//!
//! === Matching Statistics ===
//! Matched items: 120
//!
//! === Usage Patterns ===
//! Osstem TSIII 4.0x10mm: 34
//!
//! === Recommendations ===
//! 1. Reduce safety stock for slow movers
//! ```
//!
//! Parsing is a single pass. Lines that match nothing in the current section are skipped.

use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

use super::dimensions::{FixtureDimensions, parse_dimensions};

static HEADER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^={3,}\s*(.+?)\s*={3,}$").expect("static regex is valid"));

static SCORE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^score\s*:\s*(\d+)\s*/\s*(\d+)(?:\s*\(\s*grade\s*:\s*([A-Z][+-]?)\s*\))?").expect("static regex is valid")
});

static DIAGNOSTIC: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\[\s*([A-Za-z]+)\s*\]\s*(.+)$").expect("static regex is valid"));

static STAT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^([^:]+?)\s*:\s*(.+)$").expect("static regex is valid"));

static RECOMMENDATION: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(\d+)[.)]\s+(.+)$").expect("static regex is valid"));

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Score {
    pub value: u32,
    pub max: u32,
    pub grade: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticLevel {
    Ok,
    Info,
    Warning,
    Critical,
}

impl DiagnosticLevel {
    /// Unknown tags degrade to `Info`
    pub fn from_tag(tag: &str) -> Self {
        match tag.to_ascii_uppercase().as_str() {
            "OK" => DiagnosticLevel::Ok,
            "WARNING" | "WARN" => DiagnosticLevel::Warning,
            "CRITICAL" => DiagnosticLevel::Critical,
            _ => DiagnosticLevel::Info,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub level: DiagnosticLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatLine {
    pub label: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UsagePattern {
    pub label: String,
    pub value: String,
    pub dimensions: Option<FixtureDimensions>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Recommendation {
    pub number: u32,
    pub text: String,
}

/// Structured form of one report
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AnalysisReport {
    pub title: Option<String>,
    pub score: Option<Score>,
    pub diagnostics: Vec<Diagnostic>,
    pub matching_stats: Vec<StatLine>,
    pub usage_patterns: Vec<UsagePattern>,
    pub recommendations: Vec<Recommendation>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Preamble,
    Diagnostics,
    MatchingStatistics,
    UsagePatterns,
    Recommendations,
    Unknown,
}

impl Section {
    fn from_title(title: &str) -> Self {
        match title.to_lowercase().as_str() {
            "diagnostics" => Section::Diagnostics,
            "matching statistics" => Section::MatchingStatistics,
            "usage patterns" => Section::UsagePatterns,
            "recommendations" => Section::Recommendations,
            _ => Section::Unknown,
        }
    }
}

fn parse_score(line: &str) -> Option<Score> {
    let caps = SCORE.captures(line)?;
    Some(Score {
        value: caps.get(1)?.as_str().parse().ok()?,
        max: caps.get(2)?.as_str().parse().ok()?,
        grade: caps.get(3).map(|m| m.as_str().to_uppercase()),
    })
}

fn parse_stat(line: &str) -> Option<StatLine> {
    let caps = STAT.captures(line)?;
    Some(StatLine {
        label: caps.get(1)?.as_str().to_string(),
        value: caps.get(2)?.as_str().to_string(),
    })
}

/// Parse a report. Never fails; fields that could not be found stay empty.
pub fn parse_report(text: &str) -> AnalysisReport {
    let mut report = AnalysisReport::default();
    let mut section = Section::Preamble;

    for raw_line in text.lines() {
        let line = raw_line.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(caps) = HEADER.captures(line) {
            let title = caps.get(1).map(|m| m.as_str().trim()).unwrap_or_default();
            section = Section::from_title(title);
            if section == Section::Unknown && report.title.is_none() && !title.is_empty() {
                report.title = Some(title.to_string());
            }
            continue;
        }

        if report.score.is_none()
            && let Some(score) = parse_score(line)
        {
            report.score = Some(score);
            continue;
        }

        match section {
            Section::Diagnostics => {
                if let Some(caps) = DIAGNOSTIC.captures(line) {
                    let (Some(tag), Some(message)) = (caps.get(1), caps.get(2)) else {
                        continue;
                    };
                    report.diagnostics.push(Diagnostic {
                        level: DiagnosticLevel::from_tag(tag.as_str()),
                        message: message.as_str().to_string(),
                    });
                }
            }
            Section::MatchingStatistics => {
                if let Some(stat) = parse_stat(line) {
                    report.matching_stats.push(stat);
                }
            }
            Section::UsagePatterns => {
                if let Some(stat) = parse_stat(line) {
                    let dimensions = parse_dimensions(&stat.label).or_else(|| parse_dimensions(&stat.value));
                    report.usage_patterns.push(UsagePattern {
                        label: stat.label,
                        value: stat.value,
                        dimensions,
                    });
                }
            }
            Section::Recommendations => {
                if let Some(caps) = RECOMMENDATION.captures(line) {
                    let (Some(number), Some(text)) = (caps.get(1), caps.get(2)) else {
                        continue;
                    };
                    let Ok(number) = number.as_str().parse() else {
                        continue;
                    };
                    report.recommendations.push(Recommendation {
                        number,
                        text: text.as_str().to_string(),
                    });
                }
            }
            Section::Preamble | Section::Unknown => {}
        }
    }

    report
}
