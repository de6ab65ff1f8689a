//! Completion animation model.
//!
//! The terminal onboarding screen runs a fixed 10-second progress animation
//! whose displayed percentage interpolates between named checkpoints, with a
//! rotating set of informational facts underneath. The functions here are
//! pure on elapsed time; the application layer owns the tick loop.

/// Total animation duration.
pub const COMPLETION_DURATION_MS: i64 = 10_000;

/// Pause at 100% before the store write and the transition to `Complete`.
pub const COMPLETION_HOLD_MS: i64 = 500;

/// Facts rotate on this interval.
pub const FACT_ROTATE_INTERVAL_MS: i64 = 3_000;

/// Percentage stops at believable intervals (milliseconds from start).
const PROGRESS_CHECKPOINTS: &[(i64, u8)] = &[
    (500, 10),
    (1_500, 25),
    (2_500, 40),
    (3_500, 55),
    (4_500, 70),
    (5_500, 82),
    (6_500, 90),
    (7_500, 95),
    (8_500, 98),
    (9_500, 100),
];

pub const CYCLE_FACTS: &[&str] = &[
    "You lose less than 80 mL of fluid on average during your entire period, that's less than half a cup!",
    "The average menstrual cycle is 28 days, but anywhere between 21-35 days is considered normal.",
    "Your period can last anywhere from 2 to 7 days, with the average being around 5 days.",
    "Hormone levels fluctuate throughout your cycle, affecting mood, energy, and even sleep patterns.",
    "Tracking your cycle can help you understand patterns in your mood, energy, and physical symptoms.",
];

/// Displayed percentage for the given elapsed time.
///
/// Linearly interpolates between checkpoints, holds at the last passed
/// checkpoint value otherwise, and saturates at 100 past the duration.
/// Monotonically non-decreasing in `elapsed_ms`.
pub fn progress_percent_at(elapsed_ms: i64) -> u8 {
    if elapsed_ms >= COMPLETION_DURATION_MS {
        return 100;
    }

    let mut percent = 0u8;
    for (i, &(time, checkpoint)) in PROGRESS_CHECKPOINTS.iter().enumerate() {
        if elapsed_ms >= time {
            percent = checkpoint;
        } else {
            if i > 0 {
                let (prev_time, prev_percent) = PROGRESS_CHECKPOINTS[i - 1];
                let segment = (time - prev_time) as f64;
                let into = (elapsed_ms - prev_time) as f64;
                let progress = (into / segment).min(1.0);
                percent = (f64::from(prev_percent)
                    + (f64::from(checkpoint) - f64::from(prev_percent)) * progress)
                    .round() as u8;
            }
            break;
        }
    }
    percent
}

/// Index into [`CYCLE_FACTS`] for the given elapsed time.
pub fn fact_index_at(elapsed_ms: i64) -> usize {
    let ticks = (elapsed_ms.max(0) / FACT_ROTATE_INTERVAL_MS) as usize;
    ticks % CYCLE_FACTS.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_starts_at_zero() {
        assert_eq!(progress_percent_at(0), 0);
        assert_eq!(progress_percent_at(499), 0);
    }

    #[test]
    fn progress_hits_every_checkpoint() {
        for &(time, percent) in PROGRESS_CHECKPOINTS {
            assert_eq!(progress_percent_at(time), percent, "at {time}ms");
        }
    }

    #[test]
    fn progress_interpolates_between_checkpoints() {
        // Halfway between (500, 10) and (1500, 25).
        assert_eq!(progress_percent_at(1_000), 18);
        // Halfway between (5500, 82) and (6500, 90).
        assert_eq!(progress_percent_at(6_000), 86);
    }

    #[test]
    fn progress_saturates_at_duration() {
        assert_eq!(progress_percent_at(COMPLETION_DURATION_MS), 100);
        assert_eq!(progress_percent_at(COMPLETION_DURATION_MS + 5_000), 100);
    }

    #[test]
    fn progress_is_monotonically_non_decreasing() {
        let mut last = 0;
        for elapsed in (0..=12_000).step_by(50) {
            let percent = progress_percent_at(elapsed);
            assert!(percent >= last, "regressed at {elapsed}ms");
            last = percent;
        }
    }

    #[test]
    fn facts_rotate_on_the_fixed_interval() {
        assert_eq!(fact_index_at(0), 0);
        assert_eq!(fact_index_at(FACT_ROTATE_INTERVAL_MS - 1), 0);
        assert_eq!(fact_index_at(FACT_ROTATE_INTERVAL_MS), 1);
        assert_eq!(fact_index_at(4 * FACT_ROTATE_INTERVAL_MS), 4);
        // Wraps around after the last fact.
        assert_eq!(fact_index_at(5 * FACT_ROTATE_INTERVAL_MS), 0);
    }
}
