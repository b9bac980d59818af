//! The player-facing action catalog.
//!
//! Actions are plain data (id, category, time cost, cash gates) in a const
//! table; preconditions and execution are pure dispatch over [`ActionId`].
//! Performing an action always spends its time budget first, then executes,
//! then recomputes wealth.

use crate::{Session, DEFAULT_BUY_PRICE};
use rand::Rng;
use sim_core::{HoldingKind, LoanKind, Player, SkillField, Spouse};
use tracing::debug;

/// Chance that a random event fires after a time-consuming action. Exported
/// for drivers; the engine itself never rolls it.
pub const EVENT_TRIGGER_CHANCE: f64 = 0.35;

/// Menu grouping for an action.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ActionCategory {
    Invest,
    Study,
    Career,
    Life,
    Rest,
}

impl ActionCategory {
    pub fn label(self) -> &'static str {
        match self {
            ActionCategory::Invest => "investing",
            ActionCategory::Study => "learning",
            ActionCategory::Career => "career",
            ActionCategory::Life => "life",
            ActionCategory::Rest => "leisure",
        }
    }
}

/// Every action the player can take. Discriminants index [`CATALOG`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ActionId {
    BuyStock,
    BuyFund,
    BuyCrypto,
    StudyStock,
    StudyFund,
    StudyCrypto,
    StudyRealEstate,
    StudyBusiness,
    StudyCareer,
    WorkHard,
    FindJob,
    SideBusiness,
    StartBusiness,
    Dating,
    Marry,
    HaveBaby,
    BuyCar,
    BuyHouse,
    Rest,
    Travel,
    SkipMonth,
}

/// Static description of an action: costs and gates, no behavior.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ActionSpec {
    pub id: ActionId,
    pub category: ActionCategory,
    pub name: &'static str,
    pub description: &'static str,
    /// Months consumed from the year's budget.
    pub time_months: u32,
    /// Up-front spend debited during execution, if any.
    pub cost: Option<f64>,
    /// Cash the player must hold before the action is offered.
    pub min_cash: Option<f64>,
}

/// The full catalog, ordered by [`ActionId`] discriminant.
pub const CATALOG: &[ActionSpec] = &[
    ActionSpec {
        id: ActionId::BuyStock,
        category: ActionCategory::Invest,
        name: "Buy stocks",
        description: "Research and open a stock position",
        time_months: 1,
        cost: None,
        min_cash: Some(10_000.0),
    },
    ActionSpec {
        id: ActionId::BuyFund,
        category: ActionCategory::Invest,
        name: "Buy funds",
        description: "Put money into a fund",
        time_months: 1,
        cost: None,
        min_cash: Some(5000.0),
    },
    ActionSpec {
        id: ActionId::BuyCrypto,
        category: ActionCategory::Invest,
        name: "Buy crypto",
        description: "Take a position in cryptocurrency",
        time_months: 1,
        cost: None,
        min_cash: Some(5000.0),
    },
    ActionSpec {
        id: ActionId::StudyStock,
        category: ActionCategory::Study,
        name: "Study stocks",
        description: "Learn chart reading and fundamentals",
        time_months: 2,
        cost: Some(5000.0),
        min_cash: None,
    },
    ActionSpec {
        id: ActionId::StudyFund,
        category: ActionCategory::Study,
        name: "Study funds",
        description: "Learn fund selection and allocation",
        time_months: 2,
        cost: Some(3000.0),
        min_cash: None,
    },
    ActionSpec {
        id: ActionId::StudyCrypto,
        category: ActionCategory::Study,
        name: "Study crypto",
        description: "Research blockchains and trading",
        time_months: 2,
        cost: Some(3000.0),
        min_cash: None,
    },
    ActionSpec {
        id: ActionId::StudyRealEstate,
        category: ActionCategory::Study,
        name: "Study real estate",
        description: "Research the property market",
        time_months: 2,
        cost: Some(5000.0),
        min_cash: None,
    },
    ActionSpec {
        id: ActionId::StudyBusiness,
        category: ActionCategory::Study,
        name: "Study business",
        description: "Learn how companies are run",
        time_months: 3,
        cost: Some(8000.0),
        min_cash: None,
    },
    ActionSpec {
        id: ActionId::StudyCareer,
        category: ActionCategory::Study,
        name: "Take a certification",
        description: "Earn a professional credential",
        time_months: 3,
        cost: Some(10_000.0),
        min_cash: None,
    },
    ActionSpec {
        id: ActionId::WorkHard,
        category: ActionCategory::Career,
        name: "Work hard",
        description: "Push for a promotion and a raise",
        time_months: 2,
        cost: None,
        min_cash: None,
    },
    ActionSpec {
        id: ActionId::FindJob,
        category: ActionCategory::Career,
        name: "Switch jobs",
        description: "Interview around for a better offer",
        time_months: 2,
        cost: None,
        min_cash: None,
    },
    ActionSpec {
        id: ActionId::SideBusiness,
        category: ActionCategory::Career,
        name: "Side hustle",
        description: "Earn extra on the side",
        time_months: 1,
        cost: None,
        min_cash: None,
    },
    ActionSpec {
        id: ActionId::StartBusiness,
        category: ActionCategory::Career,
        name: "Start a business",
        description: "Quit and found a company (high risk)",
        time_months: 6,
        cost: None,
        min_cash: Some(100_000.0),
    },
    ActionSpec {
        id: ActionId::Dating,
        category: ActionCategory::Life,
        name: "Go dating",
        description: "Look for a partner",
        time_months: 1,
        cost: Some(3000.0),
        min_cash: None,
    },
    ActionSpec {
        id: ActionId::Marry,
        category: ActionCategory::Life,
        name: "Get married",
        description: "Throw a wedding and start a family",
        time_months: 3,
        cost: Some(200_000.0),
        min_cash: Some(150_000.0),
    },
    ActionSpec {
        id: ActionId::HaveBaby,
        category: ActionCategory::Life,
        name: "Have a baby",
        description: "Welcome a new family member",
        time_months: 6,
        cost: Some(50_000.0),
        min_cash: None,
    },
    ActionSpec {
        id: ActionId::BuyCar,
        category: ActionCategory::Life,
        name: "Buy a car",
        description: "Get your own wheels",
        time_months: 1,
        cost: None,
        min_cash: Some(100_000.0),
    },
    ActionSpec {
        id: ActionId::BuyHouse,
        category: ActionCategory::Life,
        name: "Buy a house",
        description: "Buy property, mortgage available",
        time_months: 2,
        cost: None,
        min_cash: Some(300_000.0),
    },
    ActionSpec {
        id: ActionId::Rest,
        category: ActionCategory::Rest,
        name: "Take a break",
        description: "Give yourself some time off",
        time_months: 1,
        cost: Some(2000.0),
        min_cash: None,
    },
    ActionSpec {
        id: ActionId::Travel,
        category: ActionCategory::Rest,
        name: "Travel",
        description: "See a bit of the world",
        time_months: 1,
        cost: Some(10_000.0),
        min_cash: None,
    },
    ActionSpec {
        id: ActionId::SkipMonth,
        category: ActionCategory::Rest,
        name: "Let the month pass",
        description: "Nothing special this month",
        time_months: 1,
        cost: None,
        min_cash: None,
    },
];

/// Look up the static spec for an action.
pub fn spec(id: ActionId) -> &'static ActionSpec {
    &CATALOG[id as usize]
}

/// Optional parameters a driver can attach to an action.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ActionParams {
    pub amount: Option<f64>,
    pub name: Option<String>,
    pub price: Option<f64>,
    pub down_payment: Option<f64>,
    pub years: Option<u32>,
    pub cost: Option<f64>,
    pub spouse_income: Option<f64>,
}

/// What performing an action produced.
#[derive(Clone, Debug, PartialEq)]
pub enum ActionOutcome {
    /// A position was opened.
    Invested { holding_id: u64, amount: f64 },
    /// The requested stake exceeded available cash.
    InvestmentRejected,
    Studied {
        field: SkillField,
        gain: u32,
        income_bonus: Option<f64>,
    },
    Promotion { success: bool, raise: f64 },
    JobSwitch { success: bool, increase: f64 },
    SideIncome { earned: f64 },
    /// `invested` is zero when the stake could not be raised at all.
    BusinessLaunched { success: bool, invested: f64 },
    DateFound { success: bool },
    Married { cost: f64 },
    BabyBorn,
    CarBought { price: f64 },
    HouseBought {
        price: f64,
        down_payment: f64,
        loan_amount: f64,
    },
    Refreshed { insight_gain: f64 },
    Idle,
}

fn condition_met(id: ActionId, player: &Player) -> bool {
    match id {
        ActionId::Dating | ActionId::Marry => !player.life.married,
        ActionId::HaveBaby => player.life.married && player.life.children < 3,
        _ => true,
    }
}

/// Whether the action is currently offered: enough time left in the year,
/// precondition satisfied, and cash covering both gates.
pub fn is_available(spec: &ActionSpec, player: &Player) -> bool {
    if spec.time_months > player.remaining_months() {
        return false;
    }
    if !condition_met(spec.id, player) {
        return false;
    }
    if let Some(min) = spec.min_cash {
        if player.stats.cash < min {
            return false;
        }
    }
    if let Some(cost) = spec.cost {
        if player.stats.cash < cost {
            return false;
        }
    }
    true
}

/// The catalog filtered down to what the player can do right now.
pub fn available_actions(player: &Player) -> Vec<&'static ActionSpec> {
    CATALOG.iter().filter(|s| is_available(s, player)).collect()
}

/// Perform an action end to end: availability gate, time spend, execution,
/// wealth recompute. Returns `None` (and touches nothing) when the action is
/// not currently available.
pub fn perform(session: &mut Session, id: ActionId, params: &ActionParams) -> Option<ActionOutcome> {
    let spec = spec(id);
    if !is_available(spec, &session.player) {
        return None;
    }
    if spec.time_months > 0 {
        session.spend_time(spec.time_months);
    }
    let outcome = execute(session, id, params);
    session.player.recalculate_wealth();
    debug!(action = ?id, outcome = ?outcome, "action performed");
    Some(outcome)
}

fn study_action(
    session: &mut Session,
    field: SkillField,
    tuition: f64,
    hours: f64,
) -> ActionOutcome {
    session.player.stats.cash -= tuition;
    let gain = session.player.study(field, hours);
    ActionOutcome::Studied {
        field,
        gain,
        income_bonus: None,
    }
}

fn execute(session: &mut Session, id: ActionId, params: &ActionParams) -> ActionOutcome {
    match id {
        ActionId::BuyStock => {
            let amount = params
                .amount
                .unwrap_or_else(|| (session.player.stats.cash * 0.2).min(50_000.0));
            let name = params.name.as_deref().unwrap_or("stock pick");
            match session.buy(HoldingKind::Stock, name, amount, DEFAULT_BUY_PRICE) {
                Some(holding_id) => ActionOutcome::Invested { holding_id, amount },
                None => ActionOutcome::InvestmentRejected,
            }
        }
        ActionId::BuyFund => {
            let amount = params
                .amount
                .unwrap_or_else(|| (session.player.stats.cash * 0.15).min(30_000.0));
            let name = params.name.as_deref().unwrap_or("index fund");
            match session.buy(HoldingKind::Fund, name, amount, DEFAULT_BUY_PRICE) {
                Some(holding_id) => ActionOutcome::Invested { holding_id, amount },
                None => ActionOutcome::InvestmentRejected,
            }
        }
        ActionId::BuyCrypto => {
            let amount = params
                .amount
                .unwrap_or_else(|| (session.player.stats.cash * 0.1).min(30_000.0));
            let name = params.name.as_deref().unwrap_or("crypto basket");
            match session.buy(HoldingKind::Crypto, name, amount, DEFAULT_BUY_PRICE) {
                Some(holding_id) => ActionOutcome::Invested { holding_id, amount },
                None => ActionOutcome::InvestmentRejected,
            }
        }
        ActionId::StudyStock => study_action(session, SkillField::Stock, 5000.0, 100.0),
        ActionId::StudyFund => study_action(session, SkillField::Fund, 3000.0, 100.0),
        ActionId::StudyCrypto => study_action(session, SkillField::Crypto, 3000.0, 100.0),
        ActionId::StudyRealEstate => study_action(session, SkillField::RealEstate, 5000.0, 100.0),
        ActionId::StudyBusiness => study_action(session, SkillField::Business, 8000.0, 150.0),
        ActionId::StudyCareer => {
            session.player.stats.cash -= 10_000.0;
            let gain = session.player.study(SkillField::Career, 150.0);
            // The credential sometimes pays off directly.
            let income_bonus = if session.rng.gen_bool(0.6) {
                session.player.stats.income += 12_000.0;
                Some(12_000.0)
            } else {
                None
            };
            ActionOutcome::Studied {
                field: SkillField::Career,
                gain,
                income_bonus,
            }
        }
        ActionId::WorkHard => {
            let career = f64::from(session.player.skill_level(SkillField::Career));
            let chance = (0.3 + career * 0.005).min(1.0);
            if session.rng.gen_bool(chance) {
                let raise = (session.player.stats.income * 0.1).floor();
                session.player.stats.income += raise;
                ActionOutcome::Promotion {
                    success: true,
                    raise,
                }
            } else {
                ActionOutcome::Promotion {
                    success: false,
                    raise: 0.0,
                }
            }
        }
        ActionId::FindJob => {
            let career = f64::from(session.player.skill_level(SkillField::Career));
            let chance = (0.4 + career * 0.006).min(1.0);
            if session.rng.gen_bool(chance) {
                let multiplier = 1.2 + session.rng.gen::<f64>() * 0.3;
                let new_income = (session.player.stats.income * multiplier).floor();
                let increase = new_income - session.player.stats.income;
                session.player.stats.income = new_income;
                ActionOutcome::JobSwitch {
                    success: true,
                    increase,
                }
            } else {
                ActionOutcome::JobSwitch {
                    success: false,
                    increase: 0.0,
                }
            }
        }
        ActionId::SideBusiness => {
            let business = f64::from(session.player.skill_level(SkillField::Business));
            let base = 2000.0 + session.rng.gen::<f64>() * 8000.0;
            let earned = (base * (1.0 + business * 0.02)).floor();
            session.player.stats.cash += earned;
            if session.rng.gen_bool(0.3) {
                session.player.study(SkillField::Business, 30.0);
            }
            ActionOutcome::SideIncome { earned }
        }
        ActionId::StartBusiness => {
            let investment = params.amount.unwrap_or(100_000.0);
            if session.player.stats.cash < investment {
                return ActionOutcome::BusinessLaunched {
                    success: false,
                    invested: 0.0,
                };
            }
            session.player.stats.cash -= investment;
            let business = f64::from(session.player.skill_level(SkillField::Business));
            let chance = (0.2 + business * 0.008).min(1.0);
            if session.rng.gen_bool(chance) {
                let name = params.name.as_deref().unwrap_or("startup venture");
                let _ = session.buy(
                    HoldingKind::Business,
                    name,
                    investment * 2.0,
                    DEFAULT_BUY_PRICE,
                );
                // Founding means quitting the day job.
                session.player.stats.income = 0.0;
                ActionOutcome::BusinessLaunched {
                    success: true,
                    invested: investment,
                }
            } else {
                // A failed venture still teaches.
                session.player.study(SkillField::Business, 50.0);
                ActionOutcome::BusinessLaunched {
                    success: false,
                    invested: investment,
                }
            }
        }
        ActionId::Dating => {
            session.player.stats.cash -= 3000.0;
            let chance = (0.3 + session.player.stats.insight * 0.003).min(1.0);
            ActionOutcome::DateFound {
                success: session.rng.gen_bool(chance),
            }
        }
        ActionId::Marry => {
            let cost = params.cost.unwrap_or(200_000.0);
            session.player.stats.cash -= cost;
            session.player.marry(Spouse {
                name: "Partner".to_string(),
                income: params.spouse_income.unwrap_or(60_000.0),
            });
            ActionOutcome::Married { cost }
        }
        ActionId::HaveBaby => {
            session.player.stats.cash -= 50_000.0;
            session.player.have_baby();
            ActionOutcome::BabyBorn
        }
        ActionId::BuyCar => {
            let price = params.price.unwrap_or(150_000.0);
            let name = params.name.as_deref().unwrap_or("car");
            session.player.stats.cash -= price;
            session.player.add_car(name, price);
            ActionOutcome::CarBought { price }
        }
        ActionId::BuyHouse => {
            let price = params.price.unwrap_or(2_000_000.0);
            let down_payment = params.down_payment.unwrap_or(price * 0.3);
            let name = params.name.as_deref().unwrap_or("home");
            session.player.stats.cash -= down_payment;
            session.player.add_house(name, price);
            let loan_amount = price - down_payment;
            if loan_amount > 0.0 {
                session.take_loan(
                    LoanKind::Mortgage,
                    loan_amount,
                    params.years.unwrap_or(LoanKind::Mortgage.max_years()),
                );
            }
            ActionOutcome::HouseBought {
                price,
                down_payment,
                loan_amount,
            }
        }
        ActionId::Rest => {
            session.player.stats.cash -= 2000.0;
            session.player.stats.insight = (session.player.stats.insight + 2.0).min(100.0);
            ActionOutcome::Refreshed { insight_gain: 2.0 }
        }
        ActionId::Travel => {
            session.player.stats.cash -= 10_000.0;
            session.player.stats.insight = (session.player.stats.insight + 5.0).min(100.0);
            ActionOutcome::Refreshed { insight_gain: 5.0 }
        }
        ActionId::SkipMonth => ActionOutcome::Idle,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sim_core::SimConfig;

    fn session() -> Session {
        Session::new(&SimConfig {
            starting_age: 25,
            starting_wealth: 100_000.0,
            rng_seed: 42,
        })
    }

    #[test]
    fn catalog_is_indexed_by_id() {
        for (index, spec) in CATALOG.iter().enumerate() {
            assert_eq!(spec.id as usize, index);
        }
    }

    #[test]
    fn availability_filters_on_cash_time_and_condition() {
        let s = session();
        let offered: Vec<ActionId> = available_actions(&s.player).iter().map(|a| a.id).collect();
        assert!(offered.contains(&ActionId::BuyStock));
        assert!(offered.contains(&ActionId::StartBusiness)); // exactly at the gate
        assert!(offered.contains(&ActionId::Dating));
        assert!(!offered.contains(&ActionId::Marry)); // min_cash 150k
        assert!(!offered.contains(&ActionId::HaveBaby)); // unmarried
    }

    #[test]
    fn availability_respects_the_time_budget() {
        let mut s = session();
        s.player.month = 12; // one month left
        let offered: Vec<ActionId> = available_actions(&s.player).iter().map(|a| a.id).collect();
        assert!(offered.contains(&ActionId::BuyStock));
        assert!(offered.contains(&ActionId::SkipMonth));
        assert!(!offered.contains(&ActionId::StudyStock)); // needs 2 months
        assert!(!offered.contains(&ActionId::StartBusiness)); // needs 6
    }

    #[test]
    fn unavailable_actions_do_not_run() {
        let mut s = session();
        let before = s.player.clone();
        assert_eq!(perform(&mut s, ActionId::Marry, &ActionParams::default()), None);
        assert_eq!(s.player, before);
    }

    #[test]
    fn buying_stock_spends_a_month_then_invests() {
        let mut s = session();
        let params = ActionParams {
            amount: Some(30_000.0),
            name: Some("blue chip".into()),
            ..ActionParams::default()
        };
        let outcome = perform(&mut s, ActionId::BuyStock, &params).unwrap();
        assert_eq!(s.player.month, 2);
        match outcome {
            ActionOutcome::Invested { holding_id, amount } => {
                assert_eq!(amount, 30_000.0);
                let h = s.player.holding(holding_id).unwrap();
                assert_eq!(h.name, "blue chip");
                assert_eq!(h.buy_price, DEFAULT_BUY_PRICE);
            }
            other => panic!("unexpected outcome {other:?}"),
        }
    }

    #[test]
    fn default_stake_scales_with_cash_after_the_month() {
        let mut s = session();
        let outcome = perform(&mut s, ActionId::BuyStock, &ActionParams::default()).unwrap();
        let cash_after_month: f64 = 100_000.0 + 116_000.0 / 12.0 - 5000.0;
        let expected = (cash_after_month * 0.2).min(50_000.0);
        match outcome {
            ActionOutcome::Invested { amount, .. } => {
                assert!((amount - expected).abs() < 1e-9);
            }
            other => panic!("unexpected outcome {other:?}"),
        }
    }

    #[test]
    fn studying_debits_tuition_and_levels_the_field() {
        let mut s = session();
        let outcome = perform(&mut s, ActionId::StudyStock, &ActionParams::default()).unwrap();
        match outcome {
            ActionOutcome::Studied { field, gain, .. } => {
                assert_eq!(field, SkillField::Stock);
                assert_eq!(gain, 5);
            }
            other => panic!("unexpected outcome {other:?}"),
        }
        assert_eq!(s.player.skill_level(SkillField::Stock), 5);
        assert_eq!(s.player.month, 3);
        let expected = 100_000.0 + 2.0 * (116_000.0 / 12.0 - 5000.0) - 5000.0;
        assert!((s.player.stats.cash - expected).abs() < 1e-9);
        assert_eq!(s.player.stats.wealth, s.player.stats.cash);
    }

    #[test]
    fn marriage_needs_the_gate_but_spends_the_requested_cost() {
        let mut s = session();
        s.player.stats.cash = 300_000.0;
        let params = ActionParams {
            cost: Some(180_000.0),
            spouse_income: Some(90_000.0),
            ..ActionParams::default()
        };
        let income_before = s.player.stats.income;
        let outcome = perform(&mut s, ActionId::Marry, &params).unwrap();
        assert_eq!(outcome, ActionOutcome::Married { cost: 180_000.0 });
        assert!(s.player.life.married);
        assert_eq!(s.player.stats.income, income_before + 90_000.0);
        // A second wedding is not offered.
        assert_eq!(perform(&mut s, ActionId::Marry, &params), None);
    }

    #[test]
    fn buying_a_house_finances_the_rest_with_a_mortgage() {
        let mut s = session();
        s.player.stats.cash = 700_000.0;
        let outcome = perform(&mut s, ActionId::BuyHouse, &ActionParams::default()).unwrap();
        match outcome {
            ActionOutcome::HouseBought {
                price,
                down_payment,
                loan_amount,
            } => {
                assert_eq!(price, 2_000_000.0);
                assert_eq!(down_payment, 600_000.0);
                assert_eq!(loan_amount, 1_400_000.0);
            }
            other => panic!("unexpected outcome {other:?}"),
        }
        assert_eq!(s.player.life.houses.len(), 1);
        assert_eq!(s.player.loans.len(), 1);
        assert_eq!(s.player.loans[0].kind, LoanKind::Mortgage);
        assert_eq!(s.player.loans[0].months_left, 360);
    }

    #[test]
    fn career_rolls_only_ever_raise_income() {
        let mut s = session();
        let before = s.player.stats.income;
        let outcome = perform(&mut s, ActionId::WorkHard, &ActionParams::default()).unwrap();
        match outcome {
            ActionOutcome::Promotion { success, raise } => {
                if success {
                    assert_eq!(s.player.stats.income, before + raise);
                } else {
                    assert_eq!(s.player.stats.income, before);
                }
            }
            other => panic!("unexpected outcome {other:?}"),
        }
    }

    #[test]
    fn side_hustle_always_pays_something() {
        let mut s = session();
        let cash_before_run = s.player.stats.cash;
        let outcome = perform(&mut s, ActionId::SideBusiness, &ActionParams::default()).unwrap();
        match outcome {
            ActionOutcome::SideIncome { earned } => {
                assert!(earned >= 2000.0);
                let expected = cash_before_run + 116_000.0 / 12.0 - 5000.0 + earned;
                assert!((s.player.stats.cash - expected).abs() < 1e-9);
            }
            other => panic!("unexpected outcome {other:?}"),
        }
    }

    #[test]
    fn skipping_a_month_just_moves_time() {
        let mut s = session();
        let outcome = perform(&mut s, ActionId::SkipMonth, &ActionParams::default()).unwrap();
        assert_eq!(outcome, ActionOutcome::Idle);
        assert_eq!(s.player.month, 2);
    }
}
