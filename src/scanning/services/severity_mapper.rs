use crate::scanning::domain::{CvssScore, RawVulnerabilityRecord, Severity};
use std::collections::HashMap;

/// Severity derived for one advisory, with the numeric score when one was obtainable
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeverityAssessment {
    pub severity: Severity,
    pub cvss_score: Option<f64>,
}

/// Classifies an advisory into a severity tier.
///
/// Resolution order:
/// 1. a CVSS-typed severity descriptor (vector string or bare number)
/// 2. the source's secondary numeric score
/// 3. the source's severity label
/// 4. keyword match over summary/details ("critical", "high", "medium"), default LOW
pub fn assess(record: &RawVulnerabilityRecord) -> SeverityAssessment {
    let numeric = record
        .severity
        .iter()
        .filter(|d| d.kind.to_uppercase().starts_with("CVSS"))
        .find_map(|d| parse_cvss_score(&d.score))
        .or_else(|| record.secondary_score.and_then(|s| CvssScore::new(s).ok()));

    if let Some(score) = numeric {
        return SeverityAssessment {
            severity: score.severity(),
            cvss_score: Some(score.value()),
        };
    }

    let severity = record
        .severity_label
        .as_deref()
        .and_then(Severity::from_label)
        .unwrap_or_else(|| classify_text(record));

    SeverityAssessment {
        severity,
        cvss_score: None,
    }
}

/// Coarse keyword classification, an approximation when no score is published
fn classify_text(record: &RawVulnerabilityRecord) -> Severity {
    let text = format!(
        "{} {}",
        record.summary.as_deref().unwrap_or_default(),
        record.details.as_deref().unwrap_or_default()
    )
    .to_lowercase();

    if text.contains("critical") {
        Severity::Critical
    } else if text.contains("high") {
        Severity::High
    } else if text.contains("medium") {
        Severity::Medium
    } else {
        Severity::Low
    }
}

/// Parses either a bare numeric score (`"7.5"`) or a CVSS v3 vector string
pub fn parse_cvss_score(raw: &str) -> Option<CvssScore> {
    let raw = raw.trim();
    if let Ok(value) = raw.parse::<f64>() {
        return CvssScore::new(value).ok();
    }
    if raw.starts_with("CVSS:3") {
        return cvss_v3_base_score(raw);
    }
    None
}

/// CVSS v3.x base score from a vector such as `CVSS:3.1/AV:N/AC:L/PR:N/UI:N/S:U/C:H/I:H/A:H`
fn cvss_v3_base_score(vector: &str) -> Option<CvssScore> {
    let metrics: HashMap<&str, &str> = vector
        .split('/')
        .skip(1) // "CVSS:3.x"
        .filter_map(|part| part.split_once(':'))
        .collect();

    let scope_changed = match *metrics.get("S")? {
        "U" => false,
        "C" => true,
        _ => return None,
    };

    let av = match *metrics.get("AV")? {
        "N" => 0.85,
        "A" => 0.62,
        "L" => 0.55,
        "P" => 0.2,
        _ => return None,
    };
    let ac = match *metrics.get("AC")? {
        "L" => 0.77,
        "H" => 0.44,
        _ => return None,
    };
    let pr = match (*metrics.get("PR")?, scope_changed) {
        ("N", _) => 0.85,
        ("L", false) => 0.62,
        ("L", true) => 0.68,
        ("H", false) => 0.27,
        ("H", true) => 0.5,
        _ => return None,
    };
    let ui = match *metrics.get("UI")? {
        "N" => 0.85,
        "R" => 0.62,
        _ => return None,
    };

    let impact_weight = |key: &str| -> Option<f64> {
        match *metrics.get(key)? {
            "N" => Some(0.0),
            "L" => Some(0.22),
            "H" => Some(0.56),
            _ => None,
        }
    };
    let c = impact_weight("C")?;
    let i = impact_weight("I")?;
    let a = impact_weight("A")?;

    let iss = 1.0_f64 - ((1.0 - c) * (1.0 - i) * (1.0 - a));
    let impact = if scope_changed {
        7.52 * (iss - 0.029) - 3.25 * (iss - 0.02_f64).powi(15)
    } else {
        6.42 * iss
    };
    let exploitability = 8.22 * av * ac * pr * ui;

    let base = if impact <= 0.0 {
        0.0
    } else if scope_changed {
        f64::min(1.08 * (impact + exploitability), 10.0)
    } else {
        f64::min(impact + exploitability, 10.0)
    };

    CvssScore::new(round_up(base)).ok()
}

/// CVSS "Roundup": smallest one-decimal number >= the input
fn round_up(value: f64) -> f64 {
    let scaled = (value * 100_000.0).round() as i64;
    if scaled % 10_000 == 0 {
        scaled as f64 / 100_000.0
    } else {
        ((scaled / 10_000) + 1) as f64 / 10.0
    }
}
