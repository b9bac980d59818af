//! Event descriptors: the wire contract with the external content generator.
//!
//! The generator (an outside collaborator, possibly an LLM service) returns a
//! JSON descriptor; everything here is about parsing it defensively,
//! normalizing it against the player's remaining time budget, and applying a
//! chosen branch. When the generator fails (network error, malformed
//! payload, anything) the deterministic default event stands in, and no
//! player state is touched until a full descriptor is in hand.

use crate::{EffectSet, Session, StatDelta, DEFAULT_BUY_PRICE};
use anyhow::Result;
use rand::Rng;
use serde::{Deserialize, Serialize};
use sim_core::{HoldingKind, LoanKind, Player, Spouse};
use tracing::warn;

/// Category label used when the generator omits one.
pub const GENERIC_CATEGORY: &str = "daily decision";

fn default_time_months() -> u32 {
    1
}

fn default_choice_text() -> String {
    "Continue".to_string()
}

/// A structured event offered to the player.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDescriptor {
    #[serde(default)]
    pub category: String,
    /// Months this event consumes; clamped to the remaining budget during
    /// normalization.
    #[serde(default = "default_time_months")]
    pub time_months: u32,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub choices: Vec<EventChoice>,
}

/// One branch of an event.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventChoice {
    #[serde(default = "default_choice_text")]
    pub text: String,
    #[serde(default)]
    pub result_text: String,
    #[serde(default)]
    pub effect: EffectSet,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<ChoiceAction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub investment: Option<InvestmentSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loan: Option<LoanSpec>,
}

/// Special life action a choice can trigger beyond its stat deltas.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChoiceAction {
    Marry,
    Baby,
    BuyHouse,
    BuyCar,
    BuyInvestment,
}

/// Position to open when a choice carries `buy_investment`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InvestmentSpec {
    #[serde(rename = "type")]
    pub kind: HoldingKind,
    pub name: String,
    pub amount: f64,
}

/// Loan to sign when a choice finances a purchase.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LoanSpec {
    #[serde(rename = "type")]
    pub kind: LoanKind,
    pub amount: f64,
    pub years: u32,
}

/// Where events come from. The real generator lives outside this crate; the
/// engine only requires that a source either returns a usable descriptor or
/// fails cleanly so the default event can stand in.
pub trait EventSource {
    fn next_event(&mut self, player: &Player) -> Result<EventDescriptor>;
}

/// The built-in deterministic source; always serves the default event.
pub struct DefaultEvents;

impl EventSource for DefaultEvents {
    fn next_event(&mut self, player: &Player) -> Result<EventDescriptor> {
        Ok(default_event(player))
    }
}

/// Parse a raw generator payload. Empty titles or choice lists count as
/// malformed, same as unparseable JSON.
pub fn parse_event(json: &str) -> Result<EventDescriptor> {
    let event: EventDescriptor = serde_json::from_str(json)?;
    if event.title.trim().is_empty() || event.choices.is_empty() {
        anyhow::bail!("malformed event descriptor");
    }
    Ok(event)
}

/// Clamp the time cost to what is left of the year and fill in the generic
/// category when the generator left it blank.
pub fn normalize(mut event: EventDescriptor, player: &Player) -> EventDescriptor {
    event.time_months = event.time_months.min(player.remaining_months());
    if event.category.trim().is_empty() {
        event.category = GENERIC_CATEGORY.to_string();
    }
    event
}

/// Get the next event, falling back to the default on any source failure.
/// Nothing on the player moves until a full descriptor is resolved, so a
/// failed source can never leave a partial effect behind.
pub fn resolve_event(source: &mut dyn EventSource, player: &Player) -> EventDescriptor {
    match source.next_event(player) {
        Ok(event) if !event.title.trim().is_empty() && !event.choices.is_empty() => {
            normalize(event, player)
        }
        Ok(_) => {
            warn!("event source returned a malformed descriptor, using the default event");
            default_event(player)
        }
        Err(error) => {
            warn!(%error, "event source failed, using the default event");
            default_event(player)
        }
    }
}

/// The deterministic stand-in: a quiet year-end reflection once the budget is
/// nearly spent, otherwise a small study event.
pub fn default_event(player: &Player) -> EventDescriptor {
    let remaining = player.remaining_months();
    if remaining <= 1 {
        return EventDescriptor {
            category: GENERIC_CATEGORY.to_string(),
            time_months: 1,
            title: "Year-end reflection".to_string(),
            description: "The year is winding down. Take stock of what it brought \
                          and set course for the next one."
                .to_string(),
            choices: vec![EventChoice {
                text: "Wrap up the year".to_string(),
                result_text: "You look back over the year's wins and losses and head \
                              into the new year a little wiser."
                    .to_string(),
                effect: EffectSet(vec![StatDelta::Insight(1.0)]),
                action: None,
                investment: None,
                loan: None,
            }],
        };
    }
    EventDescriptor {
        category: "learning".to_string(),
        time_months: remaining.min(2),
        title: "Investment course".to_string(),
        description: "A batch of investment courses is open for enrollment. \
                      Pick a direction to study in depth."
            .to_string(),
        choices: vec![
            EventChoice {
                text: "Study stock trading".to_string(),
                result_text: "Two months of charts and balance sheets later, your \
                              read on the market is noticeably sharper."
                    .to_string(),
                effect: EffectSet(vec![
                    StatDelta::Cash(-5000.0),
                    StatDelta::Skill(sim_core::SkillField::Stock, 5.0),
                    StatDelta::Insight(2.0),
                ]),
                action: None,
                investment: None,
                loan: None,
            },
            EventChoice {
                text: "Study fund investing".to_string(),
                result_text: "Index funds, cost averaging, allocation. Patient \
                              money, it turns out, is also a strategy."
                    .to_string(),
                effect: EffectSet(vec![
                    StatDelta::Cash(-3000.0),
                    StatDelta::Skill(sim_core::SkillField::Fund, 5.0),
                    StatDelta::Insight(2.0),
                ]),
                action: None,
                investment: None,
                loan: None,
            },
            EventChoice {
                text: "Pass for now".to_string(),
                result_text: "You decide to sit this one out and spend the time \
                              elsewhere."
                    .to_string(),
                effect: EffectSet::default(),
                action: None,
                investment: None,
                loan: None,
            },
        ],
    }
}

/// Apply a chosen branch: spend the event's time, run its special action,
/// apply the stat deltas, and append to the life log.
pub fn apply_choice(session: &mut Session, event: &EventDescriptor, choice: &EventChoice) {
    session.spend_time(event.time_months);

    let mut effect = choice.effect.clone();
    if let Some(action) = choice.action {
        match action {
            ChoiceAction::Marry => {
                let income = (session.player.stats.income * 0.3
                    + session.rng.gen::<f64>() * 50_000.0)
                    .floor();
                session.player.marry(Spouse {
                    name: "Partner".to_string(),
                    income,
                });
            }
            ChoiceAction::Baby => {
                session.player.have_baby();
            }
            ChoiceAction::BuyHouse => {
                // Financed at the mortgage ceiling when a loan is attached.
                let price = match &choice.loan {
                    Some(loan) => loan.amount / LoanKind::Mortgage.max_ratio(),
                    None => 1_000_000.0,
                };
                session.player.add_house("home", price);
                if let Some(loan) = &choice.loan {
                    let _ = session.take_loan(loan.kind, loan.amount, loan.years);
                }
            }
            ChoiceAction::BuyCar => {
                let cash_delta = effect.cash_delta();
                let price = if cash_delta != 0.0 {
                    cash_delta.abs()
                } else {
                    200_000.0
                };
                session.player.add_car("car", price);
            }
            ChoiceAction::BuyInvestment => {
                if let Some(inv) = &choice.investment {
                    // The stake is debited by the buy itself; drop any negative
                    // cash delta so it is not charged twice.
                    effect.zero_negative_cash();
                    let _ = session.buy(inv.kind, &inv.name, inv.amount, DEFAULT_BUY_PRICE);
                }
            }
        }
    }
    session.apply_effect(&effect);
    session
        .player
        .log_event(&event.title, Some(&choice.text));
}
