#![deny(warnings)]

//! Core domain models and invariants for Fortune Road.
//!
//! This crate defines the serializable player aggregate used across the
//! simulation with validation helpers to guarantee basic invariants. All
//! mutation of the aggregate beyond local bookkeeping (skill study, wealth
//! recomputation, life milestones) lives in `sim-runtime`.

use chrono::Utc;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Fixed monthly living expense every player starts with.
pub const BASE_MONTHLY_EXPENSE: f64 = 5000.0;
/// Monthly cost per child.
pub const CHILD_MONTHLY_COST: f64 = 3000.0;
/// Monthly upkeep per owned car.
pub const CAR_MONTHLY_COST: f64 = 2000.0;
/// The run ends when the player reaches this age.
pub const MAX_AGE: u32 = 100;
/// The run ends when cash drops below this floor at a year boundary.
pub const BANKRUPTCY_FLOOR: f64 = -1_000_000.0;

/// A field of expertise the player can level up, 0–100.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkillField {
    Stock,
    Fund,
    RealEstate,
    Crypto,
    Business,
    Career,
}

impl SkillField {
    /// Every field, in ledger order.
    pub const ALL: [SkillField; 6] = [
        SkillField::Stock,
        SkillField::Fund,
        SkillField::RealEstate,
        SkillField::Crypto,
        SkillField::Business,
        SkillField::Career,
    ];

    /// Stable wire key, e.g. the `<key>` in an effect mapping's `skill_<key>`.
    pub fn key(self) -> &'static str {
        match self {
            SkillField::Stock => "stock",
            SkillField::Fund => "fund",
            SkillField::RealEstate => "real_estate",
            SkillField::Crypto => "crypto",
            SkillField::Business => "business",
            SkillField::Career => "career",
        }
    }

    /// Parse a wire key. Unknown keys are the caller's problem to drop.
    pub fn from_key(key: &str) -> Option<SkillField> {
        SkillField::ALL.into_iter().find(|f| f.key() == key)
    }

    /// Human-readable name.
    pub fn label(self) -> &'static str {
        match self {
            SkillField::Stock => "stock trading",
            SkillField::Fund => "fund investing",
            SkillField::RealEstate => "real estate",
            SkillField::Crypto => "crypto",
            SkillField::Business => "business",
            SkillField::Career => "career",
        }
    }
}

/// Kinds of tradable positions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HoldingKind {
    Stock,
    Fund,
    Crypto,
    Business,
}

impl HoldingKind {
    /// The skill that biases this kind's price walk.
    pub fn skill_field(self) -> SkillField {
        match self {
            HoldingKind::Stock => SkillField::Stock,
            HoldingKind::Fund => SkillField::Fund,
            HoldingKind::Crypto => SkillField::Crypto,
            HoldingKind::Business => SkillField::Business,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            HoldingKind::Stock => "stock",
            HoldingKind::Fund => "fund",
            HoldingKind::Crypto => "crypto",
            HoldingKind::Business => "business",
        }
    }
}

/// Loan products with fixed terms.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoanKind {
    Mortgage,
    CarLoan,
    Consumer,
}

impl LoanKind {
    /// Fixed annual interest rate for the product.
    pub fn annual_rate(self) -> f64 {
        match self {
            LoanKind::Mortgage => 0.04,
            LoanKind::CarLoan => 0.05,
            LoanKind::Consumer => 0.08,
        }
    }

    /// Longest term offered, in years. Advisory; the book does not enforce it.
    pub fn max_years(self) -> u32 {
        match self {
            LoanKind::Mortgage => 30,
            LoanKind::CarLoan => 5,
            LoanKind::Consumer => 3,
        }
    }

    /// Largest financed fraction of a purchase. Advisory.
    pub fn max_ratio(self) -> f64 {
        match self {
            LoanKind::Mortgage => 0.7,
            LoanKind::CarLoan => 0.8,
            LoanKind::Consumer => 1.0,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            LoanKind::Mortgage => "mortgage",
            LoanKind::CarLoan => "car loan",
            LoanKind::Consumer => "consumer loan",
        }
    }
}

/// Coarse life phase derived from age, for flavor and driver policies.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifeStage {
    Starter,
    Growth,
    Prime,
    Mature,
    Retire,
}

impl LifeStage {
    pub fn from_age(age: u32) -> LifeStage {
        match age {
            0..=25 => LifeStage::Starter,
            26..=35 => LifeStage::Growth,
            36..=50 => LifeStage::Prime,
            51..=65 => LifeStage::Mature,
            _ => LifeStage::Retire,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            LifeStage::Starter => "starter years",
            LifeStage::Growth => "growth years",
            LifeStage::Prime => "prime years",
            LifeStage::Mature => "mature years",
            LifeStage::Retire => "retirement",
        }
    }
}

/// Headline financial stats.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Stats {
    /// Net worth: cash + holdings + durable assets − debt. Derived; see
    /// [`Player::recalculate_wealth`].
    pub wealth: f64,
    /// Liquid cash. May go negative.
    pub cash: f64,
    /// Annual salary income (household, once married).
    pub income: f64,
    /// Fixed monthly living expense, before children/cars/loans.
    pub monthly_expense: f64,
    /// Investment acumen, 0–100.
    pub insight: f64,
}

/// When a position was opened.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuyTime {
    pub age: u32,
    pub month: u32,
}

/// A tradable position.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Holding {
    pub id: u64,
    pub kind: HoldingKind,
    pub name: String,
    /// Weighted-average acquisition price.
    pub buy_price: f64,
    pub current_price: f64,
    pub shares: f64,
    /// Current cost basis.
    pub amount: f64,
    pub buy_time: BuyTime,
    /// Derived: `(current_price − buy_price) × shares`.
    pub profit: f64,
    /// Derived, in percent: `profit / (buy_price × shares) × 100`.
    pub profit_rate: f64,
}

impl Holding {
    /// Market value at the current price.
    pub fn market_value(&self) -> f64 {
        self.shares * self.current_price
    }

    /// Recompute the derived profit fields after a price or basis change.
    pub fn refresh_derived(&mut self) {
        self.profit = (self.current_price - self.buy_price) * self.shares;
        self.profit_rate = self.profit / (self.buy_price * self.shares) * 100.0;
    }
}

/// An amortizing debt instrument.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Loan {
    pub kind: LoanKind,
    /// Amount disbursed at signing. Fixed.
    pub principal: f64,
    /// Outstanding balance; forced to zero when the term ends.
    pub remaining: f64,
    /// Fixed annuity payment, whole currency units.
    pub monthly_payment: f64,
    pub months_left: u32,
    /// Annual rate, fixed at issue.
    pub interest_rate: f64,
}

impl Loan {
    pub fn is_active(&self) -> bool {
        self.months_left > 0
    }
}

/// An owned house. `current_value` starts at the purchase price; outside
/// systems may move it later.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct House {
    pub name: String,
    pub purchase_price: f64,
    pub current_value: f64,
    pub purchase_year: u32,
}

/// An owned car.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Car {
    pub name: String,
    pub purchase_price: f64,
    pub current_value: f64,
    pub purchase_year: u32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Spouse {
    pub name: String,
    /// Annual income added to the household on marriage.
    pub income: f64,
}

/// Family and durable-asset state.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LifeState {
    pub married: bool,
    pub spouse: Option<Spouse>,
    pub children: u32,
    pub cars: Vec<Car>,
    pub houses: Vec<House>,
}

/// One line of the append-only life log.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub age: u32,
    pub month: u32,
    pub event: String,
    pub choice: String,
    /// Wall-clock milliseconds when the entry was written.
    pub timestamp: i64,
}

/// Per-kind rollup of the holding book.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct KindSummary {
    pub count: usize,
    pub value: f64,
    pub profit: f64,
}

/// The strongest skill, if any has been trained at all.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TopSkill {
    pub field: Option<SkillField>,
    pub level: u8,
}

/// Session configuration.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SimConfig {
    pub starting_age: u32,
    pub starting_wealth: f64,
    /// Seed for deterministic RNG.
    pub rng_seed: u64,
}

/// The player aggregate. One per session, mutated serially; never global.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub name: String,
    pub age: u32,
    /// Current month, 1–12. May transiently exceed 12 once the year's budget
    /// is overspent; the year rollover resets it.
    pub month: u32,
    pub starting_age: u32,
    pub starting_wealth: f64,
    pub stats: Stats,
    pub skills: BTreeMap<SkillField, u8>,
    pub life: LifeState,
    pub loans: Vec<Loan>,
    pub holdings: Vec<Holding>,
    pub holding_id_counter: u64,
    /// Annual passive income (rent and the like); credited monthly.
    pub passive_income: f64,
    pub life_log: Vec<LogEntry>,
    pub is_alive: bool,
    pub job: String,
}

/// Annual income a fresh player starts with at a given age.
pub fn starting_income(age: u32) -> f64 {
    let seniority = f64::from(age.saturating_sub(18));
    (seniority * 8000.0 + 60_000.0).max(60_000.0)
}

impl Player {
    /// Create a fresh player. Cash equals the chosen starting wealth; income
    /// follows from age; insight rolls uniformly in [20, 35).
    pub fn new(cfg: &SimConfig, rng: &mut impl Rng) -> Player {
        let mut skills = BTreeMap::new();
        for field in SkillField::ALL {
            skills.insert(field, 0);
        }
        Player {
            name: "Player".to_string(),
            age: cfg.starting_age,
            month: 1,
            starting_age: cfg.starting_age,
            starting_wealth: cfg.starting_wealth,
            stats: Stats {
                wealth: cfg.starting_wealth,
                cash: cfg.starting_wealth,
                income: starting_income(cfg.starting_age),
                monthly_expense: BASE_MONTHLY_EXPENSE,
                insight: f64::from(rng.gen_range(20u32..35)),
            },
            skills,
            life: LifeState::default(),
            loans: Vec::new(),
            holdings: Vec::new(),
            holding_id_counter: 0,
            passive_income: 0.0,
            life_log: Vec::new(),
            is_alive: true,
            job: "office worker".to_string(),
        }
    }

    /// Months left in the current year's 12-month budget.
    pub fn remaining_months(&self) -> u32 {
        13u32.saturating_sub(self.month)
    }

    pub fn current_stage(&self) -> LifeStage {
        LifeStage::from_age(self.age)
    }

    pub fn skill_level(&self, field: SkillField) -> u8 {
        self.skills.get(&field).copied().unwrap_or(0)
    }

    /// The field with the strictly highest level.
    pub fn top_skill(&self) -> TopSkill {
        let mut top = TopSkill {
            field: None,
            level: 0,
        };
        for (&field, &level) in &self.skills {
            if level > top.level {
                top = TopSkill {
                    field: Some(field),
                    level,
                };
            }
        }
        top
    }

    /// Train a field. Gains shrink as the level approaches the cap but never
    /// drop below 1, so studying always moves the needle. A third of the gain
    /// (floored) feeds insight. Returns the level gain.
    pub fn study(&mut self, field: SkillField, hours: f64) -> u32 {
        let level = self.skill_level(field);
        let gain = ((hours / 20.0) * (1.0 - f64::from(level) / 150.0))
            .floor()
            .max(1.0) as u32;
        let next = (u32::from(level) + gain).min(100);
        self.skills.insert(field, next as u8);
        self.stats.insight = (self.stats.insight + f64::from(gain / 3)).min(100.0);
        gain
    }

    /// Marry. Fails if already married; the spouse's income joins the
    /// household's.
    pub fn marry(&mut self, spouse: Spouse) -> bool {
        if self.life.married {
            return false;
        }
        self.stats.income += spouse.income;
        self.life.married = true;
        self.life.spouse = Some(spouse);
        true
    }

    /// Have a child. Married players only.
    pub fn have_baby(&mut self) -> bool {
        if !self.life.married {
            return false;
        }
        self.life.children += 1;
        true
    }

    /// Register a car at its purchase price. Cash handling is the caller's.
    pub fn add_car(&mut self, name: &str, price: f64) {
        self.life.cars.push(Car {
            name: name.to_string(),
            purchase_price: price,
            current_value: price,
            purchase_year: self.age,
        });
    }

    /// Register a house at its purchase price. Cash handling is the caller's.
    pub fn add_house(&mut self, name: &str, price: f64) {
        self.life.houses.push(House {
            name: name.to_string(),
            purchase_price: price,
            current_value: price,
            purchase_year: self.age,
        });
    }

    pub fn holding(&self, id: u64) -> Option<&Holding> {
        self.holdings.iter().find(|h| h.id == id)
    }

    pub fn holding_mut(&mut self, id: u64) -> Option<&mut Holding> {
        self.holdings.iter_mut().find(|h| h.id == id)
    }

    /// Everything that leaves the account each month: fixed expense,
    /// children, car upkeep, and payments on active loans.
    pub fn total_monthly_expense(&self) -> f64 {
        let family = f64::from(self.life.children) * CHILD_MONTHLY_COST
            + self.life.cars.len() as f64 * CAR_MONTHLY_COST;
        let payments: f64 = self
            .loans
            .iter()
            .filter(|l| l.is_active())
            .map(|l| l.monthly_payment)
            .sum();
        self.stats.monthly_expense + family + payments
    }

    pub fn total_debt(&self) -> f64 {
        self.loans.iter().map(|l| l.remaining).sum()
    }

    pub fn holdings_value(&self) -> f64 {
        self.holdings.iter().map(Holding::market_value).sum()
    }

    pub fn holdings_profit(&self) -> f64 {
        self.holdings.iter().map(|h| h.profit).sum()
    }

    /// Per-kind count/value/profit rollup.
    pub fn holdings_by_kind(&self) -> BTreeMap<HoldingKind, KindSummary> {
        let mut out: BTreeMap<HoldingKind, KindSummary> = BTreeMap::new();
        for h in &self.holdings {
            let entry = out.entry(h.kind).or_default();
            entry.count += 1;
            entry.value += h.market_value();
            entry.profit += h.profit;
        }
        out
    }

    /// Recompute net worth from scratch. Idempotent; must run after every
    /// mutating operation rather than patching wealth incrementally.
    pub fn recalculate_wealth(&mut self) {
        let holdings = self.holdings_value();
        let houses: f64 = self.life.houses.iter().map(|h| h.current_value).sum();
        let cars: f64 = self.life.cars.iter().map(|c| c.current_value).sum();
        let debt = self.total_debt();
        self.stats.wealth = self.stats.cash + holdings + houses + cars - debt;
    }

    /// Append to the life log. `None` marks an automatic resolution.
    pub fn log_event(&mut self, event: &str, choice: Option<&str>) {
        self.life_log.push(LogEntry {
            age: self.age,
            month: self.month,
            event: event.to_string(),
            choice: choice.unwrap_or("auto").to_string(),
            timestamp: Utc::now().timestamp_millis(),
        });
    }
}

/// Validation errors for domain invariants.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    /// Age outside the supported range [18, 100+].
    #[error("age {0} is below the minimum of 18")]
    AgeOutOfRange(u32),
    /// Month must be at least 1.
    #[error("month {0} is out of range")]
    MonthOutOfRange(u32),
    /// Numeric field must be finite.
    #[error("non-finite numeric value encountered")]
    NonFinite,
    /// Negative amount where only non-negative values are valid.
    #[error("negative monetary value is invalid")]
    NegativeMoney,
    /// Insight must stay within [0, 100].
    #[error("insight out of [0,100]")]
    InsightOutOfRange,
    /// Skill levels must stay within [0, 100].
    #[error("skill level {0} exceeds 100")]
    SkillOutOfRange(u8),
    /// Display names must be non-empty.
    #[error("empty name")]
    EmptyName,
}

fn ensure_finite(values: &[f64]) -> Result<(), ValidationError> {
    if values.iter().all(|v| v.is_finite()) {
        Ok(())
    } else {
        Err(ValidationError::NonFinite)
    }
}

/// Validate a player aggregate, e.g. after loading a snapshot.
pub fn validate_player(player: &Player) -> Result<(), ValidationError> {
    if player.age < 18 {
        return Err(ValidationError::AgeOutOfRange(player.age));
    }
    if player.month < 1 {
        return Err(ValidationError::MonthOutOfRange(player.month));
    }
    let s = &player.stats;
    ensure_finite(&[s.wealth, s.cash, s.income, s.monthly_expense, s.insight])?;
    if !(0.0..=100.0).contains(&s.insight) {
        return Err(ValidationError::InsightOutOfRange);
    }
    for (_, &level) in &player.skills {
        if level > 100 {
            return Err(ValidationError::SkillOutOfRange(level));
        }
    }
    for h in &player.holdings {
        if h.name.trim().is_empty() {
            return Err(ValidationError::EmptyName);
        }
        ensure_finite(&[h.buy_price, h.current_price, h.shares, h.amount])?;
        if h.buy_price <= 0.0 || h.current_price <= 0.0 || h.shares <= 0.0 {
            return Err(ValidationError::NegativeMoney);
        }
    }
    for l in &player.loans {
        ensure_finite(&[l.principal, l.remaining, l.monthly_payment, l.interest_rate])?;
        if l.principal < 0.0 || l.remaining < 0.0 || l.monthly_payment < 0.0 {
            return Err(ValidationError::NegativeMoney);
        }
    }
    for h in &player.life.houses {
        ensure_finite(&[h.purchase_price, h.current_value])?;
        if h.purchase_price < 0.0 {
            return Err(ValidationError::NegativeMoney);
        }
    }
    for c in &player.life.cars {
        ensure_finite(&[c.purchase_price, c.current_value])?;
        if c.purchase_price < 0.0 {
            return Err(ValidationError::NegativeMoney);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn cfg() -> SimConfig {
        SimConfig {
            starting_age: 25,
            starting_wealth: 100_000.0,
            rng_seed: 42,
        }
    }

    fn fresh() -> Player {
        let mut rng = ChaCha8Rng::seed_from_u64(cfg().rng_seed);
        Player::new(&cfg(), &mut rng)
    }

    #[test]
    fn fresh_player_baseline() {
        let p = fresh();
        assert_eq!(p.age, 25);
        assert_eq!(p.month, 1);
        assert_eq!(p.remaining_months(), 12);
        assert_eq!(p.stats.cash, 100_000.0);
        assert_eq!(p.stats.wealth, 100_000.0);
        assert_eq!(p.stats.income, 116_000.0);
        assert!((20.0..35.0).contains(&p.stats.insight));
        assert_eq!(p.skills.len(), 6);
        assert!(p.skills.values().all(|&l| l == 0));
        validate_player(&p).unwrap();
    }

    #[test]
    fn starting_income_floors_at_entry_level() {
        assert_eq!(starting_income(18), 60_000.0);
        assert_eq!(starting_income(25), 116_000.0);
        assert_eq!(starting_income(40), 236_000.0);
    }

    #[test]
    fn study_gain_diminishes_with_level() {
        let mut p = fresh();
        let first = p.study(SkillField::Stock, 100.0);
        assert_eq!(first, 5); // 100/20 × (1 − 0/150)
        p.skills.insert(SkillField::Stock, 90);
        let late = p.study(SkillField::Stock, 100.0);
        assert!(late < first);
        assert!(late >= 1);
    }

    #[test]
    fn study_never_exceeds_cap() {
        let mut p = fresh();
        for _ in 0..200 {
            p.study(SkillField::Crypto, 100.0);
        }
        assert_eq!(p.skill_level(SkillField::Crypto), 100);
        assert!(p.stats.insight <= 100.0);
    }

    #[test]
    fn study_insight_feed_is_floored_third() {
        let mut p = fresh();
        let insight = p.stats.insight;
        let gain = p.study(SkillField::Fund, 100.0);
        assert_eq!(p.stats.insight, (insight + f64::from(gain / 3)).min(100.0));
    }

    #[test]
    fn marry_once_and_income_joins() {
        let mut p = fresh();
        let income = p.stats.income;
        assert!(p.marry(Spouse {
            name: "Alex".into(),
            income: 60_000.0,
        }));
        assert_eq!(p.stats.income, income + 60_000.0);
        assert!(!p.marry(Spouse {
            name: "Sam".into(),
            income: 1.0,
        }));
        assert_eq!(p.stats.income, income + 60_000.0);
    }

    #[test]
    fn babies_require_marriage() {
        let mut p = fresh();
        assert!(!p.have_baby());
        p.marry(Spouse {
            name: "Alex".into(),
            income: 0.0,
        });
        assert!(p.have_baby());
        assert_eq!(p.life.children, 1);
    }

    #[test]
    fn top_skill_is_strict_max() {
        let mut p = fresh();
        assert_eq!(p.top_skill().field, None);
        p.skills.insert(SkillField::Fund, 30);
        p.skills.insert(SkillField::Career, 30);
        // Ties resolve to the first field in ledger order.
        assert_eq!(p.top_skill().field, Some(SkillField::Fund));
        p.skills.insert(SkillField::Career, 31);
        assert_eq!(p.top_skill().field, Some(SkillField::Career));
        assert_eq!(p.top_skill().level, 31);
    }

    #[test]
    fn monthly_expense_counts_family_cars_and_loans() {
        let mut p = fresh();
        assert_eq!(p.total_monthly_expense(), BASE_MONTHLY_EXPENSE);
        p.marry(Spouse {
            name: "Alex".into(),
            income: 0.0,
        });
        p.have_baby();
        p.add_car("hatchback", 150_000.0);
        p.loans.push(Loan {
            kind: LoanKind::Mortgage,
            principal: 1_000_000.0,
            remaining: 1_000_000.0,
            monthly_payment: 4774.0,
            months_left: 360,
            interest_rate: 0.04,
        });
        p.loans.push(Loan {
            kind: LoanKind::Consumer,
            principal: 10_000.0,
            remaining: 0.0,
            monthly_payment: 313.0,
            months_left: 0,
            interest_rate: 0.08,
        });
        // Finished loans no longer bill.
        assert_eq!(
            p.total_monthly_expense(),
            BASE_MONTHLY_EXPENSE + CHILD_MONTHLY_COST + CAR_MONTHLY_COST + 4774.0
        );
    }

    #[test]
    fn wealth_recompute_matches_components() {
        let mut p = fresh();
        p.add_house("flat", 2_000_000.0);
        p.add_car("sedan", 200_000.0);
        p.holdings.push(Holding {
            id: 1,
            kind: HoldingKind::Stock,
            name: "blue chip".into(),
            buy_price: 100.0,
            current_price: 120.0,
            shares: 500.0,
            amount: 50_000.0,
            buy_time: BuyTime { age: 25, month: 1 },
            profit: 10_000.0,
            profit_rate: 20.0,
        });
        p.loans.push(Loan {
            kind: LoanKind::Mortgage,
            principal: 1_400_000.0,
            remaining: 1_350_000.0,
            monthly_payment: 6684.0,
            months_left: 350,
            interest_rate: 0.04,
        });
        p.recalculate_wealth();
        let expected = p.stats.cash + 500.0 * 120.0 + 2_000_000.0 + 200_000.0 - 1_350_000.0;
        assert_eq!(p.stats.wealth, expected);
    }

    #[test]
    fn refresh_derived_keeps_profit_consistent() {
        let mut h = Holding {
            id: 7,
            kind: HoldingKind::Fund,
            name: "index".into(),
            buy_price: 100.0,
            current_price: 150.0,
            shares: 10.0,
            amount: 1000.0,
            buy_time: BuyTime { age: 30, month: 2 },
            profit: 0.0,
            profit_rate: 0.0,
        };
        h.refresh_derived();
        assert_eq!(h.profit, 500.0);
        assert_eq!(h.profit_rate, 50.0);
    }

    #[test]
    fn remaining_months_saturates_past_december() {
        let mut p = fresh();
        p.month = 12;
        assert_eq!(p.remaining_months(), 1);
        p.month = 13;
        assert_eq!(p.remaining_months(), 0);
        p.month = 15;
        assert_eq!(p.remaining_months(), 0);
    }

    #[test]
    fn stage_boundaries() {
        assert_eq!(LifeStage::from_age(18), LifeStage::Starter);
        assert_eq!(LifeStage::from_age(26), LifeStage::Growth);
        assert_eq!(LifeStage::from_age(36), LifeStage::Prime);
        assert_eq!(LifeStage::from_age(51), LifeStage::Mature);
        assert_eq!(LifeStage::from_age(66), LifeStage::Retire);
        assert_eq!(LifeStage::from_age(100), LifeStage::Retire);
    }

    #[test]
    fn skill_field_keys_round_trip() {
        for field in SkillField::ALL {
            assert_eq!(SkillField::from_key(field.key()), Some(field));
        }
        assert_eq!(SkillField::from_key("poker"), None);
    }

    #[test]
    fn snapshot_round_trip() {
        let mut p = fresh();
        p.study(SkillField::RealEstate, 120.0);
        p.add_house("flat", 1_500_000.0);
        p.loans.push(Loan {
            kind: LoanKind::CarLoan,
            principal: 120_000.0,
            remaining: 90_000.0,
            monthly_payment: 2265.0,
            months_left: 40,
            interest_rate: 0.05,
        });
        p.holdings.push(Holding {
            id: 1,
            kind: HoldingKind::Crypto,
            name: "coin".into(),
            buy_price: 100.0,
            current_price: 93.5,
            shares: 200.0,
            amount: 20_000.0,
            buy_time: BuyTime { age: 25, month: 3 },
            profit: -1300.0,
            profit_rate: -6.5,
        });
        p.holding_id_counter = 1;
        p.log_event("market dip", Some("hold"));
        p.recalculate_wealth();

        let json = serde_json::to_string_pretty(&p).unwrap();
        let back: Player = serde_json::from_str(&json).unwrap();
        assert_eq!(back, p);
        validate_player(&back).unwrap();
    }

    #[test]
    fn validation_rejects_corrupt_state() {
        let mut p = fresh();
        p.age = 12;
        assert_eq!(validate_player(&p), Err(ValidationError::AgeOutOfRange(12)));

        let mut p = fresh();
        p.month = 0;
        assert_eq!(validate_player(&p), Err(ValidationError::MonthOutOfRange(0)));

        let mut p = fresh();
        p.stats.cash = f64::NAN;
        assert_eq!(validate_player(&p), Err(ValidationError::NonFinite));

        let mut p = fresh();
        p.skills.insert(SkillField::Stock, 140);
        assert_eq!(
            validate_player(&p),
            Err(ValidationError::SkillOutOfRange(140))
        );
    }

    proptest! {
        #[test]
        fn study_is_monotone_and_capped(hours in proptest::collection::vec(1.0f64..400.0, 1..40)) {
            let mut p = fresh();
            let mut prev = 0u8;
            for h in hours {
                let gain = p.study(SkillField::Business, h);
                let level = p.skill_level(SkillField::Business);
                prop_assert!(gain >= 1);
                prop_assert!(level >= prev);
                prop_assert!(level <= 100);
                prop_assert!(p.stats.insight <= 100.0);
                prev = level;
            }
        }

        #[test]
        fn wealth_equals_components(cash in -500_000.0f64..5_000_000.0,
                                    house in 0.0f64..5_000_000.0,
                                    debt in 0.0f64..2_000_000.0,
                                    shares in 0.1f64..10_000.0,
                                    price in 1.0f64..5_000.0) {
            let mut p = fresh();
            p.stats.cash = cash;
            p.add_house("home", house);
            p.loans.push(Loan {
                kind: LoanKind::Mortgage,
                principal: debt,
                remaining: debt,
                monthly_payment: 1000.0,
                months_left: 120,
                interest_rate: 0.04,
            });
            p.holdings.push(Holding {
                id: 1,
                kind: HoldingKind::Stock,
                name: "pos".into(),
                buy_price: price,
                current_price: price,
                shares,
                amount: shares * price,
                buy_time: BuyTime { age: 25, month: 1 },
                profit: 0.0,
                profit_rate: 0.0,
            });
            p.recalculate_wealth();
            let expected = cash + shares * price + house - debt;
            prop_assert!((p.stats.wealth - expected).abs() < 1e-6);
        }
    }
}
