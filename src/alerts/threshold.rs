//! Threshold comparison

/// A level activates once the reading has risen to the threshold
pub fn exceeds(reading: f64, threshold: f64) -> bool {
    threshold <= reading
}

/// Parse a configured threshold and compare it against a reading
pub fn evaluate(reading: f64, threshold: &str) -> Result<bool, EvaluatorError> {
    if reading.is_nan() {
        return Err(EvaluatorError::InvalidReading(reading.to_string()));
    }

    let threshold_value = parse_threshold(threshold)?;
    let triggered = exceeds(reading, threshold_value);

    tracing::debug!(
        reading,
        threshold = threshold_value,
        triggered,
        "Compared reading against threshold"
    );

    Ok(triggered)
}

/// Parse a decimal threshold string
pub fn parse_threshold(threshold: &str) -> Result<f64, EvaluatorError> {
    match threshold.trim().parse::<f64>() {
        Ok(value) if !value.is_nan() => Ok(value),
        _ => Err(EvaluatorError::InvalidThreshold(threshold.to_string())),
    }
}

/// Evaluation errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EvaluatorError {
    #[error("Threshold {0:?} is not a number")]
    InvalidThreshold(String),

    #[error("Reading {0} is not comparable")]
    InvalidReading(String),
}
