#![deny(warnings)]

//! Financial math for Fortune Road.
//!
//! This module provides validated utilities for:
//! - Annuity payments and the monthly amortization recurrence
//! - The skill-biased random walk that reprices holdings
//! - End-of-life scoring and the qualitative wealth evaluation

use rand::Rng;
use sim_core::Player;
use thiserror::Error;

/// Prices never fall below this floor.
pub const MIN_PRICE: f64 = 1.0;

/// Errors produced by the financial helpers.
#[derive(Debug, Error, PartialEq)]
pub enum EconError {
    /// Principal must be finite and strictly positive.
    #[error("invalid principal")]
    InvalidPrincipal,
    /// Annual rate must be finite and strictly positive.
    #[error("invalid interest rate: {0}")]
    InvalidRate(f64),
    /// Term must be at least one year.
    #[error("invalid loan term: {0} years")]
    InvalidTerm(u32),
    /// Numeric computation left the finite range.
    #[error("non-finite numeric result")]
    NonFinite,
}

/// Fixed monthly payment that fully amortizes `principal` over `years` at the
/// given annual rate, rounded to the nearest whole currency unit.
///
/// Uses the standard annuity formula with `mr = rate/12` and `n = years×12`:
/// `P·mr·(1+mr)^n / ((1+mr)^n − 1)`.
///
/// Example:
/// let p = annuity_payment(1_000_000.0, 0.04, 30).unwrap();
/// assert_eq!(p, 4774.0);
pub fn annuity_payment(principal: f64, annual_rate: f64, years: u32) -> Result<f64, EconError> {
    if !principal.is_finite() || principal <= 0.0 {
        return Err(EconError::InvalidPrincipal);
    }
    if !annual_rate.is_finite() || annual_rate <= 0.0 {
        return Err(EconError::InvalidRate(annual_rate));
    }
    if years == 0 {
        return Err(EconError::InvalidTerm(years));
    }
    let monthly_rate = annual_rate / 12.0;
    let months = (years * 12) as i32;
    let factor = (1.0 + monthly_rate).powi(months);
    let payment = principal * monthly_rate * factor / (factor - 1.0);
    if !payment.is_finite() {
        return Err(EconError::NonFinite);
    }
    Ok(payment.round())
}

/// One month of amortization: interest accrues on the pre-payment balance,
/// then the payment is applied.
///
/// `remaining − (payment − remaining·rate/12)`. The balance the payment is
/// netted against is the one *before* this month's payment; callers must not
/// substitute a schedule-recomputing formula, since the whole book is built
/// on this recurrence.
pub fn amortize_month(remaining: f64, monthly_payment: f64, annual_rate: f64) -> f64 {
    remaining - (monthly_payment - remaining * annual_rate / 12.0)
}

/// Cadence of a repricing pass. The two windows differ only in magnitude.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PriceWindow {
    /// Small intra-year move, sampled once per elapsed month.
    Monthly,
    /// Large move applied at the year boundary.
    Yearly,
}

impl PriceWindow {
    /// Half-width of the uniform base move.
    pub fn base_magnitude(self) -> f64 {
        match self {
            PriceWindow::Monthly => 0.05,
            PriceWindow::Yearly => 0.15,
        }
    }

    /// Upward drift added per ten levels of the relevant skill.
    pub fn drift_per_ten_levels(self) -> f64 {
        match self {
            PriceWindow::Monthly => 0.003,
            PriceWindow::Yearly => 0.01,
        }
    }
}

/// Sample one relative price change for a holding whose owner has the given
/// skill level in that asset class. Skill shifts the expected drift upward
/// but never removes downside variance.
pub fn sample_change(window: PriceWindow, skill_level: u8, rng: &mut impl Rng) -> f64 {
    let base = window.base_magnitude();
    let drift = f64::from(skill_level) / 10.0 * window.drift_per_ten_levels();
    rng.gen_range(-base..base) + drift
}

/// Apply a relative change to a price, flooring at [`MIN_PRICE`].
pub fn step_price(current: f64, change: f64) -> f64 {
    (current * (1.0 + change)).max(MIN_PRICE)
}

/// Qualitative wealth tier shown at the end of a run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LifeEvaluation {
    pub title: &'static str,
    pub description: &'static str,
    /// Display color as 0xRRGGBB.
    pub color: u32,
}

/// Map final wealth onto one of six fixed tiers. Pure in wealth.
pub fn life_evaluation(wealth: f64) -> LifeEvaluation {
    if wealth >= 100_000_000.0 {
        return LifeEvaluation {
            title: "Centimillionaire",
            description: "Financial freedom achieved. You sit among the truly wealthy.",
            color: 0xFFD700,
        };
    }
    if wealth >= 10_000_000.0 {
        return LifeEvaluation {
            title: "Eight-figure fortune",
            description: "A substantial fortune; life holds no money worries.",
            color: 0xFFA500,
        };
    }
    if wealth >= 1_000_000.0 {
        return LifeEvaluation {
            title: "Millionaire",
            description: "A solid financial foundation to build on.",
            color: 0x98FB98,
        };
    }
    if wealth >= 100_000.0 {
        return LifeEvaluation {
            title: "Comfortable saver",
            description: "You have put some money aside. Keep going.",
            color: 0x87CEEB,
        };
    }
    if wealth >= 0.0 {
        return LifeEvaluation {
            title: "Breaking even",
            description: "No debt, but no savings either.",
            color: 0xC0C0C0,
        };
    }
    LifeEvaluation {
        title: "Deep in debt",
        description: "Failed investments left you owing money.",
        color: 0xFF6B6B,
    }
}

/// Composite end-of-life score.
///
/// Wealth tier (20/40/60/80/100 at 0 / 1e5 / 1e6 / 1e7 / 1e8) + up to 30
/// points from income + half of insight + a third of the top skill level +
/// milestone bonuses (married 5, 3 per child, 10 per house, 2 per car).
pub fn life_score(player: &Player) -> i64 {
    let wealth = player.stats.wealth;
    let mut score: i64 = if wealth >= 100_000_000.0 {
        100
    } else if wealth >= 10_000_000.0 {
        80
    } else if wealth >= 1_000_000.0 {
        60
    } else if wealth >= 100_000.0 {
        40
    } else if wealth >= 0.0 {
        20
    } else {
        0
    };

    score += ((player.stats.income / 100_000.0).floor() as i64 * 3).min(30);
    score += (player.stats.insight / 2.0).floor() as i64;
    score += i64::from(player.top_skill().level) / 3;

    if player.life.married {
        score += 5;
    }
    score += i64::from(player.life.children) * 3;
    score += player.life.houses.len() as i64 * 10;
    score += player.life.cars.len() as i64 * 2;

    score
}
