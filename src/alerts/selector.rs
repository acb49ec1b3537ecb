//! Active level selection
//!
//! Every level is evaluated in configured order and the result is folded
//! so that the **last** satisfied level wins. Levels are therefore expected
//! to be configured in ascending severity. A level without metrics only
//! counts as satisfied when it sits first, where it acts as the baseline.

use super::threshold;
use crate::config::NotificationLevel;
use crate::prometheus::MetricSource;

/// How a single level fared in one cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelOutcome {
    /// First level with no metrics
    Baseline,
    /// One of the level's metrics reached its threshold
    Triggered,
    /// Nothing matched, or evaluation stopped on an error
    Quiet,
}

impl LevelOutcome {
    pub fn is_satisfied(self) -> bool {
        !matches!(self, LevelOutcome::Quiet)
    }
}

/// Pick the active level for this cycle, if any
pub async fn select_level<'a, S: MetricSource>(
    source: &S,
    levels: &'a [NotificationLevel],
) -> Option<&'a NotificationLevel> {
    let mut outcomes = Vec::with_capacity(levels.len());
    for (index, level) in levels.iter().enumerate() {
        let outcome = evaluate_level(source, index, level).await;
        tracing::debug!(level = %level.color, ?outcome, "Evaluated level");
        outcomes.push((level, outcome));
    }

    let active = last_satisfied(outcomes);
    match active {
        Some(level) => tracing::info!(level = %level.color, "Active level selected"),
        None => tracing::info!("No level active this cycle"),
    }
    active
}

/// Last satisfied level in iteration order
pub fn last_satisfied<'a, I>(outcomes: I) -> Option<&'a NotificationLevel>
where
    I: IntoIterator<Item = (&'a NotificationLevel, LevelOutcome)>,
{
    outcomes
        .into_iter()
        .fold(None, |active, (level, outcome)| {
            if outcome.is_satisfied() {
                Some(level)
            } else {
                active
            }
        })
}

/// Evaluate one level's metrics in order, stopping at the first match or error
pub async fn evaluate_level<S: MetricSource>(
    source: &S,
    index: usize,
    level: &NotificationLevel,
) -> LevelOutcome {
    if level.metrics.is_empty() {
        return if index == 0 {
            LevelOutcome::Baseline
        } else {
            LevelOutcome::Quiet
        };
    }

    for metric in &level.metrics {
        let reading = match source.fetch_scalar(&metric.query).await {
            Ok(reading) => reading,
            Err(e) => {
                tracing::warn!(
                    level = %level.color,
                    metric = %metric.display_name,
                    error = %e,
                    "Skipping rest of level after fetch failure"
                );
                return LevelOutcome::Quiet;
            }
        };

        match threshold::evaluate(reading, &metric.threshold) {
            Ok(true) => {
                tracing::info!(
                    level = %level.color,
                    metric = %metric.display_name,
                    reading,
                    threshold = %metric.threshold,
                    "Threshold reached"
                );
                return LevelOutcome::Triggered;
            }
            Ok(false) => {}
            Err(e) => {
                tracing::warn!(
                    level = %level.color,
                    metric = %metric.display_name,
                    error = %e,
                    "Skipping rest of level after evaluation failure"
                );
                return LevelOutcome::Quiet;
            }
        }
    }

    LevelOutcome::Quiet
}
