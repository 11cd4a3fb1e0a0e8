//! Runs switch scenarios and logs their completions.

use clap::{Parser, Subcommand, ValueEnum};
use thiserror::Error;
use tickflow::{SimError, Simulator};
use tickflow_axil::{Backpressure, Command, ConfigError, ResponderModel, Route, StageConfig, SwitchConfig, Testbench};
use tickflow_std::{ArbPolicy, Buffering};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Runs a scenario on a simulated switch.
#[derive(Parser, Debug)]
#[command(name = "tickflow", version, about, long_about = None)]
struct Cli {
    /// Log filter used when `RUST_LOG` is not set
    #[arg(long, default_value = "info")]
    log: String,

    /// Arbitration policy
    #[arg(long, value_enum, default_value_t = Policy::RoundRobin)]
    arbitration: Policy,

    /// Buffering of every pipeline stage
    #[arg(long, value_enum, default_value_t = Stage::None)]
    stages: Stage,

    /// Maximum number of simulated ticks
    #[arg(long, default_value_t = 10_000)]
    limit: u64,

    #[command(subcommand)]
    scenario: Scenario,
}

#[derive(Subcommand, Debug)]
enum Scenario {
    /// Two initiators write to two responders at the same time
    Concurrent,
    /// An initiator reads an unmapped address, then a mapped one
    DecodeError,
    /// A responder withholds ready for a number of ticks
    Stall {
        /// Ticks the responder withholds ready
        #[arg(long, default_value_t = 1000)]
        ticks: u64,
    },
}

#[derive(Debug, Error)]
enum DemoError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Sim(#[from] SimError),
    #[error("invalid log filter: {0}")]
    Filter(String),
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum Policy {
    RoundRobin,
    FixedPriority,
}

impl From<Policy> for ArbPolicy {
    fn from(policy: Policy) -> Self {
        match policy {
            Policy::RoundRobin => Self::RoundRobin,
            Policy::FixedPriority => Self::FixedPriority,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    None,
    Forward,
    Backward,
    Both,
}

impl From<Stage> for Buffering {
    fn from(stage: Stage) -> Self {
        match stage {
            Stage::None => Self::None,
            Stage::Forward => Self::Forward,
            Stage::Backward => Self::Backward,
            Stage::Both => Self::Both,
        }
    }
}

fn init_logging(level: &str) -> Result<(), DemoError> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(level).map_err(|e| DemoError::Filter(e.to_string()))?,
    };
    tracing_subscriber::registry().with(fmt::layer().with_target(false)).with(filter).init();
    Ok(())
}

fn build(cli: &Cli) -> Result<Testbench, ConfigError> {
    let pages = vec![Route::range(0x0000, 0x00ff), Route::range(0x0100, 0x01ff)];
    let stages = StageConfig::uniform(cli.stages.into());

    let (config, models, scripts) = match cli.scenario {
        Scenario::Concurrent => (
            SwitchConfig::new(2, pages),
            vec![ResponderModel::default(); 2],
            vec![vec![Command::write(0x0050, 0xaa)], vec![Command::write(0x0150, 0xbb)]],
        ),
        Scenario::DecodeError => (
            SwitchConfig::new(1, pages),
            vec![ResponderModel::default(); 2],
            vec![vec![Command::read(0x0200), Command::read(0x0050)]],
        ),
        Scenario::Stall { ticks } => (
            SwitchConfig::new(1, vec![Route::masked(0x0000, 0x0000)]),
            vec![ResponderModel::default().with_backpressure(Backpressure::Until(ticks))],
            vec![vec![Command::write(0x0010, 0xdead_beef)]],
        ),
    };

    let mut testbench = Testbench::new(config.with_arbitration(cli.arbitration.into()).with_stages(stages), models)?;
    for (i, script) in scripts.into_iter().enumerate() {
        for command in script {
            testbench.initiator_mut(i).push(command);
        }
    }
    Ok(testbench)
}

fn main() -> Result<(), DemoError> {
    let cli = Cli::parse();
    init_logging(&cli.log)?;

    let mut sim = Simulator::new(build(&cli)?);
    let ticks = sim.run_until(cli.limit, Testbench::is_idle)?;
    info!(ticks, "idle");

    let top = sim.top();
    for (i, initiator) in top.initiators().iter().enumerate() {
        for completion in initiator.completions() {
            info!(
                initiator = i,
                command = ?completion.command.op,
                resp = ?completion.response.resp,
                data = completion.response.data,
                issued_at = completion.issued_at,
                completed_at = completion.completed_at,
                "completed"
            );
        }
    }
    for (tick, kind) in top.pulses() {
        info!(tick, ?kind, "decode error pulse");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn policy_and_stages_parse_as_kebab_case() {
        let cli = Cli::try_parse_from(["tickflow", "--arbitration", "fixed-priority", "--stages", "both", "concurrent"])
            .unwrap();
        assert_eq!(ArbPolicy::from(cli.arbitration), ArbPolicy::FixedPriority);
        assert_eq!(Buffering::from(cli.stages), Buffering::Both);

        let cli = Cli::try_parse_from(["tickflow", "concurrent"]).unwrap();
        assert_eq!((cli.arbitration, cli.stages), (Policy::RoundRobin, Stage::None));
        assert!(Cli::try_parse_from(["tickflow", "--stages", "sideways", "concurrent"]).is_err());
    }
}
