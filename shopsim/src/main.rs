//! Machine shop simulation application.
#![warn(
    missing_docs,
    trivial_casts,
    trivial_numeric_casts,
    unused_import_braces,
    unused_qualifications
)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions, clippy::default_trait_access)]

use std::convert::TryFrom;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use clap::Parser;
use eyre::{ensure, WrapErr};
use rand::SeedableRng;
use rand_chacha::ChaChaRng;
use simpl::{Priority, Stage};

use shopsim::config::{Config, TimeUnit};
use shopsim::{report, MachineShop};

/// Runs a machine shop simulation and prints its report.
#[derive(Parser)]
#[clap(version, author)]
struct Opt {
    /// Path to a YAML file describing the simulated shop.
    #[clap(short, long)]
    config: PathBuf,

    /// Seed of the random number generator. Overrides the one in the config file.
    #[clap(long)]
    seed: Option<u64>,

    /// Length of the shift, in time units. Overrides the one in the config file.
    #[clap(long)]
    shift: Option<u64>,

    /// Interpretation of the delays drawn by the distributions.
    /// Overrides the one in the config file.
    #[clap(long)]
    time_unit: Option<TimeUnit>,

    /// Verbosity.
    #[clap(short, long, parse(from_occurrences))]
    verbose: i32,

    /// Store the logs in this file.
    #[clap(long)]
    log_output: Option<PathBuf>,

    /// Do not log to the stderr.
    #[clap(long)]
    no_stderr: bool,

    /// Store the report in this file instead of printing it to the standard output.
    #[clap(short, long)]
    output: Option<PathBuf>,

    /// Additionally write raw statistics to `devices.csv` and `queues.csv`
    /// in the working directory.
    #[clap(long)]
    csv: bool,
}

struct SimulationConfig {
    config: Config,
    output: Option<PathBuf>,
    csv: bool,
}

impl TryFrom<Opt> for SimulationConfig {
    type Error = eyre::Error;
    fn try_from(opt: Opt) -> eyre::Result<Self> {
        let config_file = File::open(&opt.config).wrap_err("unable to read config file")?;
        let mut config = Config::from_yaml(config_file)?;
        if opt.seed.is_some() {
            config.seed = opt.seed;
        }
        if let Some(shift) = opt.shift {
            ensure!(shift > 0, "Shift must be positive");
            config.shift = shift;
        }
        if let Some(time_unit) = opt.time_unit {
            config.time_unit = time_unit;
        }
        Ok(Self {
            config,
            output: opt.output,
            csv: opt.csv,
        })
    }
}

impl SimulationConfig {
    /// Runs the shift based on the given configuration and writes the report.
    fn run(&self) -> eyre::Result<()> {
        let seed = match self.config.seed {
            Some(seed) => seed,
            None => rand::random(),
        };
        log::info!("seed: {}", seed);
        let mut rng = ChaChaRng::seed_from_u64(seed);
        let shop = MachineShop::new(
            self.config.interarrival.sampler()?,
            self.config.service.sampler()?,
            self.config.time_unit.duration(self.config.shift),
            self.config.time_unit,
        )
        .queued_as(
            Priority::new(self.config.priority),
            Stage::new(self.config.stage),
        );
        let outcome = shop.run(&mut rng)?;
        log::info!("{} jobs arrived over the shift", outcome.arrived());

        let mut writer: Box<dyn Write> = if let Some(path) = &self.output {
            Box::new(BufWriter::new(
                File::create(path).wrap_err("unable to create output file")?,
            ))
        } else {
            Box::new(io::stdout())
        };
        write!(writer, "{}", report::monitor(outcome.engine()))?;
        write!(writer, "{}", report::summary(outcome.engine()))?;
        writer.flush()?;

        if self.csv {
            report::write_device_csv(outcome.engine(), File::create("devices.csv")?)?;
            report::write_queue_csv(outcome.engine(), File::create("queues.csv")?)?;
        }
        Ok(())
    }
}

fn set_up_logger(opt: &Opt) -> Result<(), fern::InitError> {
    let log_level = match opt.verbose {
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        3 => log::LevelFilter::Trace,
        _ => log::LevelFilter::Warn,
    };
    let dispatch = fern::Dispatch::new()
        .format(|out, message, record| out.finish(format_args!("[{}] {}", record.level(), message)))
        .level(log_level);
    let dispatch = if let Some(path) = &opt.log_output {
        let _ = std::fs::remove_file(path);
        dispatch.chain(
            std::fs::OpenOptions::new()
                .write(true)
                .create(true)
                .append(false)
                .open(path)?,
        )
    } else {
        dispatch
    };
    let dispatch = if opt.no_stderr {
        dispatch
    } else {
        dispatch.chain(std::io::stderr())
    };
    dispatch.apply()?;
    Ok(())
}

fn main() -> eyre::Result<()> {
    color_eyre::install()?;
    let opt = Opt::parse();
    set_up_logger(&opt)?;
    let conf = SimulationConfig::try_from(opt)?;
    conf.run()
}
