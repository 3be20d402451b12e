use std::ops::Deref;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Name of the stage that counts down a work interval.
pub const WORK: &str = "Work";
/// Name of the terminal cool-down stage.
pub const FINISH: &str = "Finish";
pub const PREPARE: &str = "Prepare";
pub const REST: &str = "Rest";

/// Number of work cycles used when the caller does not pick one.
pub const DEFAULT_CYCLES: u32 = 8;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stage {
    pub name: String,
    pub duration_ms: u64,
}

impl Stage {
    pub fn new(name: impl Into<String>, duration_ms: u64) -> Self {
        Self {
            name: name.into(),
            duration_ms,
        }
    }

    pub fn is_work(&self) -> bool {
        self.name == WORK
    }

    pub fn is_finish(&self) -> bool {
        self.name == FINISH
    }

    /// `Prepare` or `Rest`: the stages that lead into work.
    pub fn is_rest_like(&self) -> bool {
        self.name == PREPARE || self.name == REST
    }
}

/// Durations used by [`build_stages_with`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageDurations {
    pub prepare_ms: u64,
    pub work_ms: u64,
    pub rest_ms: u64,
    pub finish_ms: u64,
}

impl Default for StageDurations {
    fn default() -> Self {
        Self {
            prepare_ms: 10_000,
            work_ms: 30_000,
            rest_ms: 10_000,
            finish_ms: 10_000,
        }
    }
}

/// An ordered, immutable workout program.
///
/// Cloning is cheap: every clone points at the same backing slice, so all
/// timer states derived from one program share it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageSequence(Arc<[Stage]>);

impl StageSequence {
    /// Wrap a list of stages.
    ///
    /// # Errors
    /// Returns [`ValidationError::EmptyCollection`] if `stages` is empty.
    pub fn new(stages: Vec<Stage>) -> Result<Self, ValidationError> {
        if stages.is_empty() {
            return Err(ValidationError::EmptyCollection(
                "stage sequence needs at least one stage".into(),
            ));
        }
        Ok(Self(stages.into()))
    }

    /// Saturates at `u64::MAX`.
    pub fn total_duration_ms(&self) -> u64 {
        self.0.iter().map(|s| s.duration_ms).fold(0, u64::saturating_add)
    }

    /// Milliseconds of program that lie before stage `index`.
    pub fn cumulative_ms(&self, index: usize) -> u64 {
        self.0
            .iter()
            .take(index)
            .map(|s| s.duration_ms)
            .fold(0, u64::saturating_add)
    }

    /// Total time spent in work stages, saturating at `u64::MAX`.
    pub fn work_duration_ms(&self) -> u64 {
        self.0
            .iter()
            .filter(|s| s.is_work())
            .map(|s| s.duration_ms)
            .fold(0, u64::saturating_add)
    }

    pub fn work_count(&self) -> usize {
        self.0.iter().filter(|s| s.is_work()).count()
    }

    pub fn shares_storage_with(&self, other: &StageSequence) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Deref for StageSequence {
    type Target = [Stage];

    fn deref(&self) -> &[Stage] {
        &self.0
    }
}

impl Default for StageSequence {
    fn default() -> Self {
        build_stages(DEFAULT_CYCLES)
    }
}

/// Build the standard program: `Prepare`/`Rest` followed by `Work` for each
/// cycle, then a trailing `Finish`.
pub fn build_stages(cycles: u32) -> StageSequence {
    build_stages_with(cycles, &StageDurations::default())
}

/// Like [`build_stages`] with caller-supplied durations.
///
/// A `cycles` of zero is treated as one.
pub fn build_stages_with(cycles: u32, durations: &StageDurations) -> StageSequence {
    let cycles = cycles.max(1) as usize;
    let mut stages = Vec::with_capacity(2 * cycles + 1);

    for cycle in 0..cycles {
        if cycle == 0 {
            stages.push(Stage::new(PREPARE, durations.prepare_ms));
        } else {
            stages.push(Stage::new(REST, durations.rest_ms));
        }
        stages.push(Stage::new(WORK, durations.work_ms));
    }
    stages.push(Stage::new(FINISH, durations.finish_ms));

    StageSequence(stages.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_program_has_17_stages() {
        let s = StageSequence::default();
        assert_eq!(s.len(), 17);
        assert_eq!(s.work_count(), 8);
    }

    #[test]
    fn single_cycle_layout() {
        let s = build_stages(1);
        let names: Vec<&str> = s.iter().map(|st| st.name.as_str()).collect();
        assert_eq!(names, vec!["Prepare", "Work", "Finish"]);
        assert_eq!(s[0].duration_ms, 10_000);
        assert_eq!(s[1].duration_ms, 30_000);
        assert_eq!(s[2].duration_ms, 10_000);
    }

    #[test]
    fn later_cycles_rest() {
        let s = build_stages(3);
        let names: Vec<&str> = s.iter().map(|st| st.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["Prepare", "Work", "Rest", "Work", "Rest", "Work", "Finish"]
        );
    }

    #[test]
    fn zero_cycles_is_one() {
        assert_eq!(build_stages(0).len(), 3);
    }

    #[test]
    fn custom_durations() {
        let durations = StageDurations {
            prepare_ms: 5_000,
            work_ms: 20_000,
            rest_ms: 7_000,
            finish_ms: 1_000,
        };
        let s = build_stages_with(2, &durations);
        assert_eq!(s.total_duration_ms(), 5_000 + 20_000 + 7_000 + 20_000 + 1_000);
        assert_eq!(s.cumulative_ms(2), 25_000);
    }

    #[test]
    fn totals_saturate_on_huge_durations() {
        let s = StageSequence::new(vec![
            Stage::new(PREPARE, u64::MAX - 5),
            Stage::new(WORK, u64::MAX / 2),
            Stage::new(FINISH, 10),
        ])
        .unwrap();
        assert_eq!(s.total_duration_ms(), u64::MAX);
        assert_eq!(s.cumulative_ms(2), u64::MAX);
        assert_eq!(s.cumulative_ms(1), u64::MAX - 5);
        assert_eq!(s.work_duration_ms(), u64::MAX / 2);
    }

    #[test]
    fn rest_like_names() {
        assert!(Stage::new(PREPARE, 1).is_rest_like());
        assert!(Stage::new(REST, 1).is_rest_like());
        assert!(!Stage::new("Stretch", 1).is_rest_like());
        assert!(!Stage::new(WORK, 1).is_rest_like());
    }

    #[test]
    fn empty_sequence_rejected() {
        assert!(StageSequence::new(Vec::new()).is_err());
    }

    #[test]
    fn clones_share_storage() {
        let a = build_stages(2);
        let b = a.clone();
        assert!(a.shares_storage_with(&b));
        assert!(!a.shares_storage_with(&build_stages(2)));
    }
}
