//! Streak and completion math over a set of checked plan days.
//!
//! Pure functions over a `BTreeSet<u16>`; all I/O happens elsewhere.

use std::collections::BTreeSet;

use devotion_store::OriginSelector;

use crate::error::FeedResult;
use crate::types::ensure_valid_day;

/// A user's checked plan days, unified across one or more origin contexts.
/// Built once per computation; membership is the single source of truth.
#[derive(Clone, Debug)]
pub struct DayCheckSet {
    user_id: String,
    origins: Vec<OriginSelector>,
    days: BTreeSet<u16>,
}

impl DayCheckSet {
    /// Validates every day; an out-of-range member is a caller bug, not
    /// data to silently drop at this layer.
    pub fn new(
        user_id: impl Into<String>,
        origins: Vec<OriginSelector>,
        days: impl IntoIterator<Item = u16>,
    ) -> FeedResult<Self> {
        let days: BTreeSet<u16> = days.into_iter().collect();
        for &day in &days {
            ensure_valid_day(day)?;
        }
        Ok(Self {
            user_id: user_id.into(),
            origins,
            days,
        })
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn origins(&self) -> &[OriginSelector] {
        &self.origins
    }

    pub fn days(&self) -> &BTreeSet<u16> {
        &self.days
    }

    pub fn contains(&self, day_number: u16) -> bool {
        self.days.contains(&day_number)
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StreakStats {
    pub current: u32,
    pub longest: u32,
    pub total: u32,
}

/// Compute streaks against a reference day (usually "today" in plan days).
///
/// The current streak counts consecutive checked days ending at the
/// reference day, or at the day before it when the reference day itself is
/// unchecked. That grace day means a streak is not reported broken before
/// the user has had the chance to read today.
pub fn streak_stats(days: &BTreeSet<u16>, reference_day: u16) -> StreakStats {
    if days.is_empty() {
        return StreakStats::default();
    }

    let mut day = if days.contains(&reference_day) {
        reference_day
    } else {
        reference_day.saturating_sub(1)
    };
    let mut current = 0u32;
    while day >= 1 && days.contains(&day) {
        current += 1;
        day -= 1;
    }

    let mut longest = 0u32;
    let mut run = 0u32;
    let mut prev: Option<u16> = None;
    for &d in days {
        run = match prev {
            Some(p) if d == p + 1 => run + 1,
            _ => 1,
        };
        longest = longest.max(run);
        prev = Some(d);
    }

    StreakStats {
        current,
        longest,
        total: days.len() as u32,
    }
}

/// Completion percentage, rounded to the nearest whole percent.
pub fn completion_percentage(total_read_days: u32, total_plan_days: u32) -> u32 {
    if total_plan_days == 0 {
        return 0;
    }
    ((100.0 * f64::from(total_read_days)) / f64::from(total_plan_days)).round() as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use devotion_store::OriginKind;

    fn days(values: &[u16]) -> BTreeSet<u16> {
        values.iter().copied().collect()
    }

    #[test]
    fn empty_set_yields_zeros() {
        let stats = streak_stats(&BTreeSet::new(), 40);
        assert_eq!(stats, StreakStats::default());
        assert_eq!(completion_percentage(0, 365), 0);
    }

    #[test]
    fn gap_before_reference_day_splits_streaks() {
        // Days 1, 2 and 4 checked, looking from day 4: the current run is
        // just day 4, the longest run is days 1-2, three days total.
        let stats = streak_stats(&days(&[1, 2, 4]), 4);
        assert_eq!(stats.current, 1);
        assert_eq!(stats.longest, 2);
        assert_eq!(stats.total, 3);
        assert_eq!(completion_percentage(stats.total, 4), 75);
    }

    #[test]
    fn unchecked_reference_day_falls_back_one_day() {
        let stats = streak_stats(&days(&[3, 4, 5]), 6);
        assert_eq!(stats.current, 3);

        // Two days behind is a broken streak, not a grace period.
        let stats = streak_stats(&days(&[3, 4, 5]), 7);
        assert_eq!(stats.current, 0);
    }

    #[test]
    fn reference_day_one_unchecked_is_zero() {
        let stats = streak_stats(&days(&[5, 6]), 1);
        assert_eq!(stats.current, 0);
        assert_eq!(stats.longest, 2);
    }

    #[test]
    fn full_run_counts_to_reference_day() {
        let stats = streak_stats(&days(&[1, 2, 3, 4, 5]), 5);
        assert_eq!(stats.current, 5);
        assert_eq!(stats.longest, 5);
    }

    #[test]
    fn longest_streak_found_in_the_middle() {
        let stats = streak_stats(&days(&[1, 10, 11, 12, 13, 20]), 20);
        assert_eq!(stats.current, 1);
        assert_eq!(stats.longest, 4);
        assert_eq!(stats.total, 6);
    }

    #[test]
    fn percentage_rounds_to_nearest() {
        assert_eq!(completion_percentage(1, 3), 33);
        assert_eq!(completion_percentage(2, 3), 67);
        assert_eq!(completion_percentage(365, 365), 100);
        assert_eq!(completion_percentage(5, 0), 0);
    }

    #[test]
    fn check_set_rejects_out_of_range_days() {
        let origin = vec![OriginSelector::new(OriginKind::Group, "g1")];
        assert!(DayCheckSet::new("u1", origin.clone(), [1, 2, 366]).is_err());
        let set = DayCheckSet::new("u1", origin, [2, 1, 2]).expect("set");
        assert_eq!(set.days().len(), 2);
        assert!(set.contains(1));
    }
}
