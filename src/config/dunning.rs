//! Dunning schedule configuration

use serde::Deserialize;

use super::error::ValidationError;

fn default_reminder_days() -> Vec<i64> {
    vec![0, 3, 7]
}

/// Dunning reminder schedule
///
/// Milestones are keyed by whole days since the subscription entered its
/// grace period. The first milestone also matches day 1, so a daily sweep
/// that missed the entry day still sends the first reminder.
#[derive(Debug, Clone, Deserialize)]
pub struct DunningConfig {
    /// Day offsets (since grace entry) at which reminders fire
    #[serde(default = "default_reminder_days")]
    pub reminder_days: Vec<i64>,
}

impl Default for DunningConfig {
    fn default() -> Self {
        Self {
            reminder_days: default_reminder_days(),
        }
    }
}

impl DunningConfig {
    /// Validate dunning configuration against the grace window
    pub fn validate(&self, grace_days: i64) -> Result<(), ValidationError> {
        if self.reminder_days.is_empty() {
            return Err(ValidationError::EmptyReminderSchedule);
        }
        if !self.reminder_days.windows(2).all(|w| w[0] < w[1]) {
            return Err(ValidationError::UnorderedReminderSchedule);
        }
        if *self.reminder_days.last().unwrap_or(&0) > grace_days {
            return Err(ValidationError::ReminderSchedulePastGrace);
        }
        Ok(())
    }

    /// Milestone ordinal for a day count, if one fires on that day.
    ///
    /// Day 0 or 1 both map to milestone 0 (daily sweep granularity); any
    /// other day must match its schedule entry exactly.
    pub fn milestone_for(&self, day: i64) -> Option<usize> {
        if day < 0 {
            return None;
        }
        if day <= 1 && self.reminder_days.first() == Some(&0) {
            return Some(0);
        }
        self.reminder_days.iter().position(|&d| d == day)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_schedule_is_0_3_7() {
        let config = DunningConfig::default();
        assert_eq!(config.reminder_days, vec![0, 3, 7]);
        assert!(config.validate(7).is_ok());
    }

    #[test]
    fn day_zero_and_one_map_to_first_milestone() {
        let config = DunningConfig::default();
        assert_eq!(config.milestone_for(0), Some(0));
        assert_eq!(config.milestone_for(1), Some(0));
    }

    #[test]
    fn exact_days_map_to_later_milestones() {
        let config = DunningConfig::default();
        assert_eq!(config.milestone_for(3), Some(1));
        assert_eq!(config.milestone_for(7), Some(2));
    }

    #[test]
    fn off_schedule_days_match_nothing() {
        let config = DunningConfig::default();
        for day in [2, 4, 5, 6, 8, 30] {
            assert_eq!(config.milestone_for(day), None, "day {}", day);
        }
        assert_eq!(config.milestone_for(-1), None);
    }

    #[test]
    fn unordered_schedule_fails_validation() {
        let config = DunningConfig {
            reminder_days: vec![0, 7, 3],
        };
        assert!(config.validate(7).is_err());
    }

    #[test]
    fn schedule_past_grace_fails_validation() {
        let config = DunningConfig {
            reminder_days: vec![0, 3, 10],
        };
        assert!(config.validate(7).is_err());
    }

    #[test]
    fn empty_schedule_fails_validation() {
        let config = DunningConfig {
            reminder_days: vec![],
        };
        assert!(config.validate(7).is_err());
    }
}
