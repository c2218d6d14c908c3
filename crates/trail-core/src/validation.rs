//! Route quality checks: per-day distance bounds and hiking loop closure.
//!
//! Issues are always returned as data. The batch entry point
//! ([`validate_itinerary`]) and the incremental one
//! ([`ValidationReport::merge_issues`]) classify identically.

use serde::{Deserialize, Serialize};

use crate::models::{ActivityType, Itinerary};
use crate::rules::ActivityRules;
use crate::spatial::haversine_km;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueCategory {
    Distance,
    Loop,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub severity: Severity,
    pub category: IssueCategory,
    /// Zero-based day the issue belongs to, `None` for trip-wide issues
    pub day_index: Option<usize>,
    pub message: String,
}

/// Accumulated validation outcome for one itinerary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub warnings: Vec<ValidationIssue>,
    pub errors: Vec<ValidationIssue>,
    pub is_valid: bool,
}

impl Default for ValidationReport {
    fn default() -> Self {
        Self {
            warnings: Vec::new(),
            errors: Vec::new(),
            is_valid: true,
        }
    }
}

impl ValidationReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append issues, partitioned by severity.
    pub fn merge_issues(&mut self, issues: impl IntoIterator<Item = ValidationIssue>) {
        for issue in issues {
            match issue.severity {
                Severity::Error => self.errors.push(issue),
                Severity::Warning => self.warnings.push(issue),
            }
        }
        self.is_valid = self.errors.is_empty();
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn is_empty(&self) -> bool {
        self.warnings.is_empty() && self.errors.is_empty()
    }

    /// Errors first, then warnings, the order a banner shows them in.
    pub fn issues(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.errors.iter().chain(self.warnings.iter())
    }
}

/// Outcome of the trip-wide loop check.
#[derive(Debug, Clone, PartialEq)]
pub struct LoopCheck {
    pub is_valid: bool,
    pub issues: Vec<ValidationIssue>,
    /// Separation between first and last spot, when the check applied
    pub separation_km: Option<f64>,
}

/// Resolved distance for one day, keyed by its index.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DayDistance {
    pub day_index: usize,
    pub distance_km: f64,
}

/// Check one day's distance against the activity bounds.
///
/// Below the minimum is a warning, above the maximum is an error.
pub fn validate_day_distance(
    distance_km: f64,
    activity: ActivityType,
    day_number: usize,
) -> Vec<ValidationIssue> {
    let rules = ActivityRules::for_activity(activity);
    let day_index = Some(day_number.saturating_sub(1));
    let mut issues = Vec::new();

    if let Some(min) = rules.min_day_km {
        if distance_km < min {
            issues.push(ValidationIssue {
                severity: Severity::Warning,
                category: IssueCategory::Distance,
                day_index,
                message: format!(
                    "Day {}: Route is {:.1}km (below {}km minimum for {})",
                    day_number, distance_km, min, activity
                ),
            });
        }
    }

    if let Some(max) = rules.max_day_km {
        if distance_km > max {
            issues.push(ValidationIssue {
                severity: Severity::Error,
                category: IssueCategory::Distance,
                day_index,
                message: format!(
                    "Day {}: Route is {:.1}km (above {}km maximum for {})",
                    day_number, distance_km, max, activity
                ),
            });
        }
    }

    issues
}

/// Check that a looping activity ends near where it started.
pub fn validate_loop_closure(itinerary: &Itinerary) -> LoopCheck {
    let rules = ActivityRules::for_activity(itinerary.activity);
    let passed = LoopCheck {
        is_valid: true,
        issues: Vec::new(),
        separation_km: None,
    };

    if !rules.requires_loop || itinerary.all_spots.len() < 2 {
        return passed;
    }
    let Some(tolerance) = rules.loop_tolerance_km else {
        return passed;
    };
    let (Some(start), Some(end)) = (itinerary.all_spots.first(), itinerary.all_spots.last())
    else {
        return passed;
    };

    let separation = haversine_km(start.coordinate, end.coordinate);
    if separation <= tolerance {
        return LoopCheck {
            separation_km: Some(separation),
            ..passed
        };
    }

    let activity = capitalize(itinerary.activity.as_str());
    LoopCheck {
        is_valid: false,
        issues: vec![ValidationIssue {
            severity: Severity::Warning,
            category: IssueCategory::Loop,
            day_index: None,
            message: format!(
                "{} route may not form a proper loop: start and end points are {:.2}km apart (should be ≤{}km)",
                activity, separation, tolerance
            ),
        }],
        separation_km: Some(separation),
    }
}

/// Run the loop check once and the distance check for every resolved day.
pub fn validate_itinerary(itinerary: &Itinerary, distances: &[DayDistance]) -> ValidationReport {
    let mut report = ValidationReport::new();
    report.merge_issues(validate_loop_closure(itinerary).issues);
    for day in distances {
        report.merge_issues(validate_day_distance(
            day.distance_km,
            itinerary.activity,
            day.day_index + 1,
        ));
    }
    report
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
