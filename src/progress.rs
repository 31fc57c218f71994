//! Learner progress computation.

use std::collections::HashSet;

use crate::domain::MaterialId;

pub const MIN_PROGRESS_PERCENT: u8 = 0;
pub const MAX_PROGRESS_PERCENT: u8 = 100;

/// Percent of `total_active` materials covered by `completed`, rounded half
/// away from zero and clamped to [0, 100]. An empty material set is 0%, not
/// a division error.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
pub fn completion_percent(total_active: usize, completed: usize) -> u8 {
    if total_active == 0 {
        return MIN_PROGRESS_PERCENT;
    }

    let raw = (completed as f64 * f64::from(MAX_PROGRESS_PERCENT) / total_active as f64).round();
    raw.clamp(
        f64::from(MIN_PROGRESS_PERCENT),
        f64::from(MAX_PROGRESS_PERCENT),
    ) as u8
}

/// Percent of `active_material_ids` present in the learner's completed set.
/// Ids outside the active set do not count.
#[must_use]
pub fn percent_complete(
    active_material_ids: &[MaterialId],
    completed: &HashSet<MaterialId>,
) -> u8 {
    let done = active_material_ids
        .iter()
        .filter(|id| completed.contains(id))
        .count();
    completion_percent(active_material_ids.len(), done)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_material_set_is_zero() {
        assert_eq!(completion_percent(0, 0), 0);
    }

    #[test]
    fn quarter_complete() {
        assert_eq!(completion_percent(4, 1), 25);
    }

    #[test]
    fn fully_complete() {
        assert_eq!(completion_percent(3, 3), 100);
    }

    #[test]
    fn rounds_half_away_from_zero() {
        // 1/8 = 12.5 -> 13
        assert_eq!(completion_percent(8, 1), 13);
        // 1/3 = 33.33 -> 33, 2/3 = 66.67 -> 67
        assert_eq!(completion_percent(3, 1), 33);
        assert_eq!(completion_percent(3, 2), 67);
    }

    #[test]
    fn clamps_to_bounds() {
        // More completions than active materials can only happen with stale
        // data; the result still caps at 100.
        assert_eq!(completion_percent(2, 5), 100);
    }

    #[test]
    fn percent_complete_ignores_unrelated_completions() {
        let completed: HashSet<MaterialId> = [1, 2, 99].into_iter().collect();
        assert_eq!(percent_complete(&[1, 2, 3, 4], &completed), 50);
    }

    #[test]
    fn percent_complete_empty_course() {
        let completed: HashSet<MaterialId> = [1].into_iter().collect();
        assert_eq!(percent_complete(&[], &completed), 0);
    }
}
