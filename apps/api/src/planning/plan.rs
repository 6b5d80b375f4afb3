use std::collections::BTreeMap;

use chrono::{NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::content::models::ContentItem;
use crate::errors::AppError;

/// Monthly post count. Only the sizes the posting cadences are built for are accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct PlanSize(u32);

impl PlanSize {
    pub const ALLOWED: [u32; 4] = [8, 12, 16, 24];

    pub fn get(self) -> usize {
        self.0 as usize
    }

    pub fn weekday_policy(self) -> WeekdayPolicy {
        if self.0 == 24 {
            WeekdayPolicy::MonWedFri
        } else {
            WeekdayPolicy::MonFri
        }
    }
}

impl TryFrom<u32> for PlanSize {
    type Error = String;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        if Self::ALLOWED.contains(&value) {
            Ok(Self(value))
        } else {
            Err(format!(
                "plan size must be one of {:?}, got {value}",
                Self::ALLOWED
            ))
        }
    }
}

impl From<PlanSize> for u32 {
    fn from(size: PlanSize) -> Self {
        size.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WeekdayPolicy {
    MonFri,
    MonWedFri,
}

impl WeekdayPolicy {
    pub fn weekdays(self) -> &'static [Weekday] {
        match self {
            WeekdayPolicy::MonFri => &[Weekday::Mon, Weekday::Fri],
            WeekdayPolicy::MonWedFri => &[Weekday::Mon, Weekday::Wed, Weekday::Fri],
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            WeekdayPolicy::MonFri => "Mon/Fri",
            WeekdayPolicy::MonWedFri => "Mon/Wed/Fri",
        }
    }
}

/// Everything the operator declares before a run.
#[derive(Debug, Clone, Deserialize)]
pub struct RunPlan {
    pub plan_size: PlanSize,
    pub start_date: NaiveDate,
    pub items: Vec<ContentItem>,
    /// Slot index → seasonal event to weave into that post.
    #[serde(default)]
    pub seasonal_events: BTreeMap<usize, String>,
}

impl RunPlan {
    pub fn repeat_total(&self) -> usize {
        self.items.iter().map(|i| i.repeat_count() as usize).sum()
    }

    /// Preconditions for starting a run. A repeat total that differs from the plan size
    /// is a `ConfigurationMismatch`; nothing is padded or truncated.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.items.is_empty() {
            return Err(AppError::Validation("Add at least one content item".to_string()));
        }
        for item in &self.items {
            item.validate()?;
        }

        let expected = self.plan_size.get();
        let actual = self.repeat_total();
        if actual != expected {
            return Err(AppError::ConfigurationMismatch { expected, actual });
        }

        if let Some(index) = self.seasonal_events.keys().find(|&&i| i >= expected) {
            return Err(AppError::Validation(format!(
                "Seasonal event set for post {} but the plan has {expected} posts",
                index + 1
            )));
        }
        Ok(())
    }

    pub fn seasonal_hint(&self, slot_index: usize) -> Option<&str> {
        self.seasonal_events
            .get(&slot_index)
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn plan(value: serde_json::Value) -> RunPlan {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_plan_size_rejects_unknown_sizes() {
        assert!(serde_json::from_value::<PlanSize>(json!(12)).is_ok());
        assert!(serde_json::from_value::<PlanSize>(json!(10)).is_err());
    }

    #[test]
    fn test_cadence_follows_plan_size() {
        let three = PlanSize::try_from(24).unwrap().weekday_policy();
        assert_eq!(three.weekdays(), &[Weekday::Mon, Weekday::Wed, Weekday::Fri]);
        for size in [8, 12, 16] {
            let policy = PlanSize::try_from(size).unwrap().weekday_policy();
            assert_eq!(policy, WeekdayPolicy::MonFri);
        }
    }

    #[test]
    fn test_repeat_total_must_match_plan_size() {
        let p = plan(json!({
            "plan_size": 8,
            "start_date": "2026-03-02",
            "items": [
                {"kind": "single", "source": {"type": "url", "url": "https://shop.example/a"}, "repeat_count": 5},
                {"kind": "brand_concept", "repeat_count": 2}
            ]
        }));
        match p.validate() {
            Err(AppError::ConfigurationMismatch { expected, actual }) => {
                assert_eq!((expected, actual), (8, 7));
            }
            other => panic!("expected mismatch, got {other:?}"),
        }
    }

    #[test]
    fn test_valid_plan_with_seasonal_hint() {
        let p = plan(json!({
            "plan_size": 8,
            "start_date": "2026-03-02",
            "items": [
                {"kind": "single", "source": {"type": "url", "url": "https://shop.example/a"}, "repeat_count": 6},
                {"kind": "brand_concept", "angle": "Founder story", "repeat_count": 2}
            ],
            "seasonal_events": {"2": "White Day", "5": "  "}
        }));
        p.validate().unwrap();
        assert_eq!(p.seasonal_hint(2), Some("White Day"));
        assert_eq!(p.seasonal_hint(5), None);
    }

    #[test]
    fn test_seasonal_hint_outside_plan_is_rejected() {
        let p = plan(json!({
            "plan_size": 8,
            "start_date": "2026-03-02",
            "items": [{"kind": "brand_concept", "repeat_count": 8}],
            "seasonal_events": {"8": "Christmas"}
        }));
        assert!(matches!(p.validate(), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_document_single_without_name_is_rejected() {
        let p = plan(json!({
            "plan_size": 8,
            "start_date": "2026-03-02",
            "items": [{
                "kind": "single",
                "source": {"type": "document", "file_name": "release.pdf", "text": "New serum"},
                "repeat_count": 8
            }]
        }));
        assert!(matches!(p.validate(), Err(AppError::Validation(_))));
    }
}
