use crate::error::CheckError;

const GB_PER_TB: f64 = 1024.0;

/// Capacity figures of one RAID array, in GB as reported by the agent.
#[derive(Clone, Debug, PartialEq)]
pub struct StorageReport {
    total_gb: i64,
    free_gb: i64,
    used_gb: i64,
    free_pct: f64,
    total_human: String,
    used_human: String,
}

impl StorageReport {
    #[must_use]
    pub const fn total_gb(&self) -> i64 {
        self.total_gb
    }

    #[must_use]
    pub const fn free_gb(&self) -> i64 {
        self.free_gb
    }

    #[must_use]
    pub const fn used_gb(&self) -> i64 {
        self.used_gb
    }

    #[must_use]
    pub const fn free_pct(&self) -> f64 {
        self.free_pct
    }

    #[must_use]
    pub fn total_human(&self) -> &str {
        &self.total_human
    }

    #[must_use]
    pub fn used_human(&self) -> &str {
        &self.used_human
    }
}

/// Rejects array sizes that cannot belong to a real array.
///
/// # Errors
///
/// Returns [`CheckError::InvalidSize`] if `total_gb` is zero or negative,
/// which usually means the OID does not exist on this model.
pub fn ensure_size(total_gb: i64) -> Result<i64, CheckError> {
    if total_gb > 0 {
        Ok(total_gb)
    } else {
        Err(CheckError::InvalidSize { total_gb })
    }
}

/// Derives free and used space from the array size and used percentage.
///
/// The agent reports whole percentages, so the free share is computed in
/// integers and rounded half away from zero without float error.
///
/// # Errors
///
/// Returns [`CheckError::InvalidSize`] if `total_gb` is not positive.
#[allow(clippy::cast_precision_loss)]
pub fn compute_report(
    total_gb: i64,
    used_pct: i64,
) -> Result<StorageReport, CheckError> {
    let total_gb = ensure_size(total_gb)?;

    let free_share = 100 - i128::from(used_pct);
    let free_gb = div_round(i128::from(total_gb) * free_share, 100);
    let free_gb = i64::try_from(free_gb)
        .unwrap_or(if free_gb < 0 { i64::MIN } else { i64::MAX });
    let used_gb = total_gb.saturating_sub(free_gb);

    Ok(StorageReport {
        total_gb,
        free_gb,
        used_gb,
        free_pct: round_to(free_share as f64, 2),
        total_human: humanize(total_gb as f64),
        used_human: humanize(used_gb as f64),
    })
}

/// Integer division rounding half away from zero; `divisor` is positive.
const fn div_round(dividend: i128, divisor: i128) -> i128 {
    let quotient = (dividend.abs() + divisor / 2) / divisor;

    if dividend < 0 {
        -quotient
    } else {
        quotient
    }
}

/// Renders a GB figure, switching to TB from 1024 GB on.
#[must_use]
pub fn humanize(gb: f64) -> String {
    if gb >= GB_PER_TB {
        format!("{} TB", round_to(gb / GB_PER_TB, 2))
    } else {
        format!("{} GB", gb)
    }
}

/// Rounds half away from zero to `precision` decimal places.
///
/// The scaled value is first cut to 15 significant digits, so that
/// `1.005` rounds to `1.01` although it is stored as `1.00499...`.
#[must_use]
pub fn round_to(value: f64, precision: i32) -> f64 {
    let factor = 10_f64.powi(precision);
    let rounded = pre_round(value * factor).round() / factor;

    // keeps -0 out of the output
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}

#[allow(clippy::cast_possible_truncation)]
fn pre_round(value: f64) -> f64 {
    if value == 0.0 || !value.is_finite() {
        return value;
    }

    let magnitude = value.abs().log10().floor() as i32;
    let factor = 10_f64.powi(14 - magnitude);
    let cut = (value * factor).round() / factor;

    if cut.is_finite() {
        cut
    } else {
        value
    }
}
