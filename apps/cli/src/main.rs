#![deny(warnings)]

//! Headless CLI: runs a whole simulated financial life and prints the result.
//!
//! Each year the driver picks random available actions until the 12-month
//! budget is spent, with a 35% chance of an injected event after every
//! time-consuming action, then rolls the year over. Deterministic for a
//! given seed.

use anyhow::Result;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use sim_core::SimConfig;
use sim_runtime::actions::{self, ActionParams, EVENT_TRIGGER_CHANCE};
use sim_runtime::events::{self, DefaultEvents};
use sim_runtime::Session;
use std::path::PathBuf;
use tracing::{debug, info, Level};
use tracing_subscriber::EnvFilter;

struct Args {
    age: u32,
    wealth: f64,
    years: u32,
    seed: u64,
    save: Option<PathBuf>,
    load: Option<PathBuf>,
}

fn parse_args() -> Args {
    let mut args = Args {
        age: 25,
        wealth: 100_000.0,
        years: 40,
        seed: 42,
        save: None,
        load: None,
    };
    let mut it = std::env::args().skip(1);
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--age" => {
                if let Some(v) = it.next().and_then(|s| s.parse().ok()) {
                    args.age = v;
                }
            }
            "--wealth" => {
                if let Some(v) = it.next().and_then(|s| s.parse().ok()) {
                    args.wealth = v;
                }
            }
            "--years" => {
                if let Some(v) = it.next().and_then(|s| s.parse().ok()) {
                    args.years = v;
                }
            }
            "--seed" => {
                if let Some(v) = it.next().and_then(|s| s.parse().ok()) {
                    args.seed = v;
                }
            }
            "--save" => {
                args.save =
                    Some(it.next().map(PathBuf::from).unwrap_or_else(persistence::default_save_path))
            }
            "--load" => {
                args.load =
                    Some(it.next().map(PathBuf::from).unwrap_or_else(persistence::default_save_path))
            }
            _ => {}
        }
    }
    args.age = args.age.clamp(18, 60);
    args.wealth = args.wealth.max(0.0);
    args
}

fn main() -> Result<()> {
    // Logging setup
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_max_level(Level::INFO)
        .init();

    let args = parse_args();
    info!(age = args.age, wealth = args.wealth, years = args.years, seed = args.seed, "starting run");

    let cfg = SimConfig {
        starting_age: args.age,
        starting_wealth: args.wealth,
        rng_seed: args.seed,
    };
    let mut session = match &args.load {
        Some(path) if persistence::has_snapshot(path) => {
            Session::from_player(persistence::load_snapshot(path)?, args.seed)
        }
        _ => Session::new(&cfg),
    };

    // The driver's own RNG, decoupled from the session's market stream so a
    // different policy never shifts the price walk.
    let mut policy = ChaCha8Rng::seed_from_u64(args.seed.wrapping_add(1));
    let mut source = DefaultEvents;

    for _ in 0..args.years {
        if !session.player.is_alive {
            break;
        }
        while session.player.remaining_months() > 0 {
            let offered = actions::available_actions(&session.player);
            if offered.is_empty() {
                break;
            }
            let pick = offered[policy.gen_range(0..offered.len())];
            debug!(action = pick.name, category = pick.category.label(), "picked");
            let performed = actions::perform(&mut session, pick.id, &ActionParams::default());
            if performed.is_some()
                && pick.time_months > 0
                && policy.gen_bool(EVENT_TRIGGER_CHANCE)
            {
                let event = events::resolve_event(&mut source, &session.player);
                if !event.choices.is_empty() {
                    let choice = event.choices[policy.gen_range(0..event.choices.len())].clone();
                    events::apply_choice(&mut session, &event, &choice);
                }
            }
        }
        let alive = session.next_year();
        let p = &session.player;
        println!(
            "age {:>3} | {} | wealth: {:>12.0} | cash: {:>12.0} | debt: {:>10.0} | positions: {}",
            p.age,
            p.current_stage().label(),
            p.stats.wealth,
            p.stats.cash,
            p.total_debt(),
            p.holdings.len()
        );
        if !alive {
            break;
        }
    }

    let p = &session.player;
    let score = sim_econ::life_score(p);
    let eval = sim_econ::life_evaluation(p.stats.wealth);
    println!(
        "final | age {} | wealth: {:.0} | score: {} | {}: {}",
        p.age, p.stats.wealth, score, eval.title, eval.description
    );
    let top = p.top_skill();
    if let Some(field) = top.field {
        println!("  strongest field: {} (level {})", field.label(), top.level);
    }
    for (kind, summary) in p.holdings_by_kind() {
        println!(
            "  {}: {} position(s), value {:.0}, p/l {:+.0}",
            kind.label(),
            summary.count,
            summary.value,
            summary.profit
        );
    }
    if !p.holdings.is_empty() {
        println!("  open positions p/l: {:+.0}", p.holdings_profit());
    }

    if let Some(path) = &args.save {
        persistence::save_snapshot(path, &session.player)?;
    }

    Ok(())
}
