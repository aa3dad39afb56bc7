use super::config::RoundConfig;

/// Validate round configuration at startup.
/// Returns all validation errors at once (not just the first).
pub fn validate_round(config: &RoundConfig) -> Result<(), Vec<String>> {
    let mut errors = Vec::new();

    let pool = config.matching_pool;
    if !pool.is_finite() || pool < 0.0 {
        errors.push(format!(
            "round.matching_pool: must be a non-negative number, got {}",
            pool
        ));
    }

    let cap = config.matching_percentage_cap;
    if !(cap > 0.0 && cap <= 1.0) {
        errors.push(format!(
            "round.matching_percentage_cap: must be in (0, 1], got {}",
            cap
        ));
    }

    let boost = config.boost_coefficient;
    if !boost.is_finite() || boost < 0.0 {
        errors.push(format!(
            "round.boost_coefficient: must be a non-negative number, got {}",
            boost
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
