//! Per-activity route constraints.

use serde::{Deserialize, Serialize};

use crate::models::ActivityType;

/// Distance and loop constraints for one activity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ActivityRules {
    /// Minimum distance per day in kilometers
    pub min_day_km: Option<f64>,
    /// Maximum distance per day in kilometers
    pub max_day_km: Option<f64>,
    /// Whether the whole trip must end where it started
    pub requires_loop: bool,
    /// Allowed gap between first and last spot of the trip, in kilometers
    pub loop_tolerance_km: Option<f64>,
}

impl ActivityRules {
    pub const HIKING: ActivityRules = ActivityRules {
        min_day_km: Some(5.0),
        max_day_km: Some(15.0),
        requires_loop: true,
        loop_tolerance_km: Some(0.5), // 500m
    };

    pub const CYCLING: ActivityRules = ActivityRules {
        min_day_km: None,
        max_day_km: Some(60.0),
        requires_loop: false,
        loop_tolerance_km: None,
    };

    pub fn for_activity(activity: ActivityType) -> &'static ActivityRules {
        match activity {
            ActivityType::Hiking => &Self::HIKING,
            ActivityType::Cycling => &Self::CYCLING,
        }
    }
}
