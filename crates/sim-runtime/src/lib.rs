#![deny(warnings)]

//! Simulation runtime for Fortune Road.
//!
//! Owns a [`Session`] (the player aggregate plus a seeded RNG) and drives
//! every mutating operation over it: the month/expense ledger, the holding
//! book, the loan book, and generic effect application. The action catalog
//! and event-descriptor plumbing live in the [`actions`] and [`events`]
//! submodules.
//!
//! Everything here is synchronous and single-threaded; each operation
//! completes atomically with respect to the caller and finishes by
//! recomputing net worth from scratch.

pub mod actions;
pub mod events;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::de::Deserializer;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use sim_core::{
    BuyTime, Holding, HoldingKind, Loan, LoanKind, Player, SimConfig, SkillField,
    BANKRUPTCY_FLOOR, CAR_MONTHLY_COST, CHILD_MONTHLY_COST, MAX_AGE,
};
use sim_econ::PriceWindow;
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Price a position opens at when the outside world only names an amount.
pub const DEFAULT_BUY_PRICE: f64 = 100.0;

/// Result of closing out part or all of a position.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SellOutcome {
    /// Cash credited by the sale.
    pub proceeds: f64,
    /// Proceeds minus the cost basis of the sold shares.
    pub profit: f64,
    /// Profit over cost basis, in percent.
    pub profit_rate: f64,
}

/// One live game: the player aggregate plus the deterministic RNG that feeds
/// repricing and outcome rolls. Exactly one session is mutated, serially.
pub struct Session {
    pub player: Player,
    pub(crate) rng: ChaCha8Rng,
}

impl Session {
    /// Start a fresh session from config; the seed fixes the whole run.
    pub fn new(cfg: &SimConfig) -> Session {
        let mut rng = ChaCha8Rng::seed_from_u64(cfg.rng_seed);
        let player = Player::new(cfg, &mut rng);
        info!(
            age = player.age,
            wealth = player.stats.wealth,
            "session started"
        );
        Session { player, rng }
    }

    /// Resume a loaded snapshot with a fresh RNG stream.
    pub fn from_player(player: Player, rng_seed: u64) -> Session {
        Session {
            player,
            rng: ChaCha8Rng::seed_from_u64(rng_seed),
        }
    }

    // ---- time & expense ledger ----

    /// Consume months from the year's budget, running the monthly ledger
    /// step once per unit month. Never batched: loan balances move every
    /// step, so a single multiplied debit would drift.
    pub fn spend_time(&mut self, months: u32) {
        self.player.month += months;
        for _ in 0..months {
            self.process_month();
        }
    }

    /// One month: salary in, expenses and loan payments out, passive income
    /// in, then the small repricing pass.
    fn process_month(&mut self) {
        let p = &mut self.player;
        p.stats.cash += p.stats.income / 12.0;

        let mut total = p.stats.monthly_expense
            + f64::from(p.life.children) * CHILD_MONTHLY_COST
            + p.life.cars.len() as f64 * CAR_MONTHLY_COST;
        for loan in &mut p.loans {
            if !loan.is_active() {
                continue;
            }
            total += loan.monthly_payment;
            loan.remaining =
                sim_econ::amortize_month(loan.remaining, loan.monthly_payment, loan.interest_rate);
            loan.months_left -= 1;
            if loan.months_left == 0 {
                loan.remaining = 0.0;
            }
        }
        p.stats.cash -= total;
        p.stats.cash += p.passive_income / 12.0;
        debug!(
            month = p.month,
            cash = p.stats.cash,
            outflow = total,
            "monthly ledger step"
        );
        self.reprice_holdings(PriceWindow::Monthly);
    }

    /// Roll into the next year: age up, reset the month budget, apply the
    /// large repricing pass, purge finished loans, and evaluate the terminal
    /// conditions. Returns whether the player is still in the game.
    pub fn next_year(&mut self) -> bool {
        self.player.age += 1;
        self.player.month = 1;
        self.reprice_holdings(PriceWindow::Yearly);
        self.player.recalculate_wealth();
        self.player.loans.retain(Loan::is_active);
        if self.player.age >= MAX_AGE || self.player.stats.cash < BANKRUPTCY_FLOOR {
            self.player.is_alive = false;
        }
        info!(
            age = self.player.age,
            wealth = self.player.stats.wealth,
            cash = self.player.stats.cash,
            alive = self.player.is_alive,
            "year rollover"
        );
        self.player.is_alive
    }

    // ---- holding book ----

    /// Open a position. Fails (returns `None`) when cash cannot cover the
    /// stake or the price is non-positive.
    pub fn buy(&mut self, kind: HoldingKind, name: &str, amount: f64, price: f64) -> Option<u64> {
        if self.player.stats.cash < amount || price <= 0.0 {
            return None;
        }
        let p = &mut self.player;
        p.stats.cash -= amount;
        p.holding_id_counter += 1;
        let id = p.holding_id_counter;
        p.holdings.push(Holding {
            id,
            kind,
            name: name.to_string(),
            buy_price: price,
            current_price: price,
            shares: amount / price,
            amount,
            buy_time: BuyTime {
                age: p.age,
                month: p.month,
            },
            profit: 0.0,
            profit_rate: 0.0,
        });
        p.recalculate_wealth();
        info!(id, kind = ?kind, amount, "position opened");
        Some(id)
    }

    /// Close out `ratio` of a position. A ratio of 1 (or more) removes the
    /// holding entirely; a partial sale shrinks shares and cost basis in
    /// proportion and leaves the average buy price untouched.
    pub fn sell(&mut self, id: u64, ratio: f64) -> Option<SellOutcome> {
        let index = self.player.holdings.iter().position(|h| h.id == id)?;
        let h = &mut self.player.holdings[index];
        let sell_shares = h.shares * ratio;
        let proceeds = sell_shares * h.current_price;
        let cost_basis = sell_shares * h.buy_price;
        let profit = proceeds - cost_basis;
        let profit_rate = profit / cost_basis * 100.0;
        if ratio >= 1.0 {
            self.player.holdings.remove(index);
        } else {
            h.shares -= sell_shares;
            h.amount = h.shares * h.buy_price;
        }
        self.player.stats.cash += proceeds;
        self.player.recalculate_wealth();
        info!(id, ratio, proceeds, profit, "position sold");
        Some(SellOutcome {
            proceeds,
            profit,
            profit_rate,
        })
    }

    /// Grow a position at the current market price, re-averaging the cost
    /// basis. Fails when the id is unknown or cash cannot cover the add.
    pub fn add_to_position(&mut self, id: u64, add_amount: f64) -> bool {
        if self.player.stats.cash < add_amount {
            return false;
        }
        let h = match self.player.holding_mut(id) {
            Some(h) => h,
            None => return false,
        };
        let add_shares = add_amount / h.current_price;
        let new_cost = h.shares * h.buy_price + add_amount;
        let new_shares = h.shares + add_shares;
        h.shares = new_shares;
        h.buy_price = new_cost / new_shares;
        h.amount = new_cost;
        h.refresh_derived();
        self.player.stats.cash -= add_amount;
        self.player.recalculate_wealth();
        true
    }

    /// Walk every holding's price one step, biased by the player's skill in
    /// that asset class, then refresh derived profit fields.
    fn reprice_holdings(&mut self, window: PriceWindow) {
        let levels: Vec<u8> = self
            .player
            .holdings
            .iter()
            .map(|h| self.player.skill_level(h.kind.skill_field()))
            .collect();
        for (h, level) in self.player.holdings.iter_mut().zip(levels) {
            let change = sim_econ::sample_change(window, level, &mut self.rng);
            h.current_price = sim_econ::step_price(h.current_price, change);
            h.refresh_derived();
        }
        self.player.recalculate_wealth();
    }

    // ---- loan book ----

    /// Sign a loan: the annuity payment is fixed up front and the proceeds
    /// land in cash immediately. Amortization happens only in the monthly
    /// ledger step. Fails on a non-positive amount or zero term.
    pub fn take_loan(&mut self, kind: LoanKind, amount: f64, years: u32) -> Option<&Loan> {
        let payment = sim_econ::annuity_payment(amount, kind.annual_rate(), years).ok()?;
        self.player.loans.push(Loan {
            kind,
            principal: amount,
            remaining: amount,
            monthly_payment: payment,
            months_left: years * 12,
            interest_rate: kind.annual_rate(),
        });
        self.player.stats.cash += amount;
        self.player.recalculate_wealth();
        info!(kind = kind.label(), amount, payment, "loan signed");
        self.player.loans.last()
    }

    // ---- effect applier ----

    /// Apply a batch of deltas from an action or event. Cash, income, and
    /// the fixed monthly expense add linearly; insight clamps to [0, 100];
    /// skill deltas route through the study curve so event-granted levels
    /// still diminish. Finishes with a wealth recompute.
    pub fn apply_effect(&mut self, effect: &EffectSet) {
        for delta in &effect.0 {
            match *delta {
                StatDelta::Cash(v) => self.player.stats.cash += v,
                StatDelta::Income(v) => self.player.stats.income += v,
                StatDelta::Insight(v) => {
                    self.player.stats.insight =
                        (self.player.stats.insight + v).clamp(0.0, 100.0);
                }
                StatDelta::MonthlyExpense(v) => self.player.stats.monthly_expense += v,
                StatDelta::Skill(field, v) => {
                    self.player.study(field, v * 20.0);
                }
            }
        }
        self.player.recalculate_wealth();
    }
}

/// A single named delta against the player's stats.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum StatDelta {
    Cash(f64),
    Income(f64),
    Insight(f64),
    MonthlyExpense(f64),
    /// Routed through the study curve, never added linearly.
    Skill(SkillField, f64),
}

/// An ordered batch of deltas. On the wire this is the generator's flat JSON
/// mapping (`cash`, `income`, `insight`, `monthlyExpense`, `skill_<field>`);
/// unknown or non-numeric entries are dropped during deserialization rather
/// than rejected.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EffectSet(pub Vec<StatDelta>);

impl EffectSet {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Net cash delta across the batch.
    pub fn cash_delta(&self) -> f64 {
        self.0
            .iter()
            .map(|d| match d {
                StatDelta::Cash(v) => *v,
                _ => 0.0,
            })
            .sum()
    }

    /// Replace negative cash deltas with zero. Used when a choice's stake is
    /// debited by the investment itself, so the delta must not double-charge.
    pub fn zero_negative_cash(&mut self) {
        for delta in &mut self.0 {
            if let StatDelta::Cash(v) = delta {
                if *v < 0.0 {
                    *v = 0.0;
                }
            }
        }
    }
}

impl Serialize for EffectSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for delta in &self.0 {
            match delta {
                StatDelta::Cash(v) => map.serialize_entry("cash", v)?,
                StatDelta::Income(v) => map.serialize_entry("income", v)?,
                StatDelta::Insight(v) => map.serialize_entry("insight", v)?,
                StatDelta::MonthlyExpense(v) => map.serialize_entry("monthlyExpense", v)?,
                StatDelta::Skill(field, v) => {
                    map.serialize_entry(&format!("skill_{}", field.key()), v)?
                }
            }
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for EffectSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = BTreeMap::<String, serde_json::Value>::deserialize(deserializer)?;
        let mut deltas = Vec::new();
        for (key, value) in raw {
            let v = match value.as_f64() {
                Some(v) if v.is_finite() => v,
                _ => continue,
            };
            match key.as_str() {
                "cash" => deltas.push(StatDelta::Cash(v)),
                "income" => deltas.push(StatDelta::Income(v)),
                "insight" => deltas.push(StatDelta::Insight(v)),
                "monthlyExpense" => deltas.push(StatDelta::MonthlyExpense(v)),
                other => {
                    if let Some(field) = other
                        .strip_prefix("skill_")
                        .and_then(SkillField::from_key)
                    {
                        deltas.push(StatDelta::Skill(field, v));
                    }
                    // Anything else is generator noise; drop it.
                }
            }
        }
        Ok(EffectSet(deltas))
    }
}
