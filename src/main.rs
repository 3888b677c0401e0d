use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{arg, ArgMatches, Command};
use tracing_subscriber::EnvFilter;
use u_lotsizing::loading::InstanceLoader;
use u_lotsizing::solver::{LocalSearchDriver, SolverConfig};

fn cli() -> Command {
    Command::new("u-lotsizing")
        .about("Solves discrete lot sizing instances with constraint-based local search")
        .arg(
            arg!(--input <PATH> "Instance data file")
                .default_value("")
                .value_parser(clap::value_parser!(String)),
        )
        .arg(
            arg!(--lns_size <SIZE> "Periods freed by each random LNS neighbour")
                .default_value("10")
                .value_parser(clap::value_parser!(u64).range(1..)),
        )
        .arg(
            arg!(--lns_limit <FAILURES> "Failure limit of the inner repair search")
                .default_value("30")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            arg!(--seed <SEED> "Random seed")
                .default_value("42")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            arg!(--time_limit [SECONDS] "Optional wall-clock limit in seconds")
                .value_parser(clap::value_parser!(f64)),
        )
        .arg(
            arg!(--solution_limit [COUNT] "Optional number of improving solutions")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            arg!(--stall_limit <NEIGHBOURS> "Random LNS neighbours without improvement before stopping")
                .default_value("200")
                .value_parser(clap::value_parser!(usize)),
        )
        .arg(arg!(--swap "Try swap moves before random LNS"))
        .arg(
            arg!(--output [PATH] "Write the result as JSON")
                .value_parser(clap::value_parser!(PathBuf)),
        )
}

fn enable_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
}

fn config_from(matches: &ArgMatches) -> Result<SolverConfig> {
    let lns_size = *matches.get_one::<u64>("lns_size").unwrap_or(&10);
    let lns_size =
        usize::try_from(lns_size).with_context(|| format!("invalid --lns_size={lns_size}"))?;
    let mut config = SolverConfig::default()
        .with_lns_size(lns_size)
        .with_lns_limit(*matches.get_one::<u64>("lns_limit").unwrap_or(&30))
        .with_seed(*matches.get_one::<u64>("seed").unwrap_or(&42))
        .with_stall_limit(*matches.get_one::<usize>("stall_limit").unwrap_or(&200))
        .with_swap(matches.get_flag("swap"));
    if let Some(&seconds) = matches.get_one::<f64>("time_limit") {
        let limit = Duration::try_from_secs_f64(seconds)
            .with_context(|| format!("invalid --time_limit={seconds}"))?;
        config = config.with_time_limit(limit);
    }
    if let Some(&count) = matches.get_one::<u64>("solution_limit") {
        config = config.with_solution_limit(count);
    }
    Ok(config)
}

fn main() -> Result<()> {
    enable_tracing();
    let matches = cli().get_matches();

    let input = matches
        .get_one::<String>("input")
        .map(String::as_str)
        .unwrap_or_default();
    if input.is_empty() {
        bail!("Please supply a data file with --input=");
    }
    let config = config_from(&matches)?;

    let instance = InstanceLoader::new()
        .from_path(input)
        .with_context(|| format!("failed to load {input}"))?;
    tracing::info!(
        "Periods: {}, products: {}, earliness cost: {}, items: {}, idle periods: {}",
        instance.num_periods(),
        instance.num_products(),
        instance.inventory_cost(),
        instance.num_items(),
        instance.num_residual()
    );

    let result = LocalSearchDriver::new(&instance, config).solve();
    match result.objective() {
        Some(objective) => tracing::info!(
            "Finished ({}): objective {objective} after {} improving solution(s)",
            result.status,
            result.solutions.len()
        ),
        None => tracing::info!("Finished ({}): no solution", result.status),
    }

    if let Some(path) = matches.get_one::<PathBuf>("output") {
        let json = serde_json::to_string_pretty(&result)?;
        fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))?;
        tracing::info!("Wrote result to {}", path.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let matches = cli().try_get_matches_from(["u-lotsizing"]).unwrap();
        let config = config_from(&matches).unwrap();
        assert_eq!(config.lns_size, 10);
        assert_eq!(config.lns_limit, 30);
        assert_eq!(config.stall_limit, 200);
        assert!(config.time_limit.is_none());
        assert!(!config.use_swap);
    }

    #[test]
    fn test_flags_reach_config() {
        let matches = cli()
            .try_get_matches_from([
                "u-lotsizing",
                "--input=data.txt",
                "--lns_size=4",
                "--time_limit=1.5",
                "--swap",
            ])
            .unwrap();
        let config = config_from(&matches).unwrap();
        assert_eq!(config.lns_size, 4);
        assert_eq!(config.time_limit, Some(Duration::from_millis(1500)));
        assert!(config.use_swap);
    }

    #[test]
    fn test_zero_lns_size_is_rejected() {
        let err = cli()
            .try_get_matches_from(["u-lotsizing", "--input=data.txt", "--lns_size=0"])
            .unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn test_negative_time_limit_is_an_error() {
        let matches = cli()
            .try_get_matches_from(["u-lotsizing", "--time_limit=-2"])
            .unwrap();
        assert!(config_from(&matches).is_err());
    }
}
