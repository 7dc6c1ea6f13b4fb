//! Quorum thresholds.
//!
//! Percentages are evaluated as exact fractions so that, for example, 60%
//! of 5 organizations is exactly 3 and never 3.0000000001 rounded up to 4.

use chainops_types::{Policy, PolicyRule};

use crate::GovernanceError;

/// A fraction `num / den` in `(0, 1]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Ratio {
    pub num: u128,
    pub den: u128,
}

impl Ratio {
    /// `⌈self × n⌉`.
    pub fn ceil_of(&self, n: usize) -> usize {
        let n = n as u128;
        ((self.num * n + self.den - 1) / self.den) as usize
    }
}

const MAX_FRACTION_DIGITS: usize = 18;

/// Parse a stored percentage.
///
/// Accepts a decimal percentage (`"60"`, `"66.5"`, `"60%"`) or a ratio
/// (`"2/3"`). The result must lie in `(0, 1]`.
pub fn parse_percentage(raw: &str) -> Result<Ratio, GovernanceError> {
    let malformed = || GovernanceError::MalformedPercentage(raw.to_string());
    let text = raw.trim();

    let ratio = if let Some((num, den)) = text.split_once('/') {
        let num: u128 = num.trim().parse().map_err(|_| malformed())?;
        let den: u128 = den.trim().parse().map_err(|_| malformed())?;
        Ratio { num, den }
    } else {
        let text = text.strip_suffix('%').unwrap_or(text).trim();
        let (int_part, frac_part) = text.split_once('.').unwrap_or((text, ""));
        let digits_ok = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
        if (int_part.is_empty() && frac_part.is_empty())
            || !digits_ok(int_part)
            || !digits_ok(frac_part)
            || frac_part.len() > MAX_FRACTION_DIGITS
        {
            return Err(malformed());
        }
        let scale = 10u128.pow(frac_part.len() as u32);
        let int_value: u128 = if int_part.is_empty() {
            0
        } else {
            int_part.parse().map_err(|_| malformed())?
        };
        let frac_value: u128 = if frac_part.is_empty() {
            0
        } else {
            frac_part.parse().map_err(|_| malformed())?
        };
        let num = int_value
            .checked_mul(scale)
            .and_then(|v| v.checked_add(frac_value))
            .ok_or_else(malformed)?;
        Ratio {
            num,
            den: 100 * scale,
        }
    };

    if ratio.den == 0 || ratio.num == 0 || ratio.num > ratio.den {
        return Err(malformed());
    }
    Ok(ratio)
}

/// Approvals needed for a proposal under `policy` with `total_orgs` voters.
///
/// `0` means the action is forbidden and must be refused.
pub fn required_approvals(total_orgs: usize, policy: &Policy) -> Result<usize, GovernanceError> {
    match policy.rule {
        PolicyRule::Majority => Ok(total_orgs / 2 + 1),
        PolicyRule::Any => Ok(1),
        PolicyRule::All => Ok(total_orgs),
        PolicyRule::Forbidden => Ok(0),
        PolicyRule::SelfOrg => Err(GovernanceError::UnsupportedSelfPolicy(policy.resource)),
        PolicyRule::Percentage => {
            let raw = policy.percent.as_deref().ok_or_else(|| {
                GovernanceError::MalformedPercentage("missing percentage".to_string())
            })?;
            Ok(parse_percentage(raw)?.ceil_of(total_orgs))
        }
    }
}
