use std::path::PathBuf;
use std::process::ExitCode;
use std::str::FromStr;

use clap::{Parser, Subcommand, ValueEnum};

use ctd_autofire::acquisition::{AcquisitionSettings, SettingsFile};
use ctd_autofire::config::{self, Config};
use ctd_autofire::launcher::{self, AcquisitionLauncher, SystemProbe};
use ctd_autofire::logging::{self, Component};
use ctd_autofire::model::UserFireEntry;
use ctd_autofire::reference::ReferenceTables;
use ctd_autofire::service::AutoFireService;

#[derive(Parser)]
#[command(name = "ctd-autofire", about = "Bottle-firing plans for CTD rosette casts")]
struct Cli {
    /// Configuration file (defaults to $CTD_AUTOFIRE_CONFIG or ./ctd_autofire.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Print the basin a station belongs to
    Basin { station: String },
    /// Print the standard depth/pressure table for a station
    Pressures { station: String },
    /// Print the default fire plan for a station as JSON
    Plan {
        station: String,
        #[arg(long)]
        total_bottles: Option<u32>,
        #[arg(long)]
        active: Option<usize>,
    },
    /// Write a fire plan into the acquisition settings
    Apply {
        station: String,
        /// depth:bottle[:offset]; without entries the default plan is used
        #[arg(long = "entry")]
        entries: Vec<EntryArg>,
    },
    /// Switch auto-fire (and manual firing) on or off
    AutoFire { state: Switch },
    /// Start the acquisition program unless it is already running
    Launch,
}

#[derive(Clone, Copy, ValueEnum)]
enum Switch {
    On,
    Off,
}

#[derive(Clone, Debug)]
struct EntryArg(UserFireEntry);

impl FromStr for EntryArg {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(':').collect();
        if !(2..=3).contains(&parts.len()) {
            return Err(format!("expected depth:bottle[:offset], got '{}'", s));
        }
        let depth = parts[0].trim().parse().map_err(|e| format!("bad depth '{}': {}", parts[0], e))?;
        let bottle = parts[1].trim().parse().map_err(|e| format!("bad bottle '{}': {}", parts[1], e))?;
        let offset: f64 = match parts.get(2) {
            Some(o) => o.trim().parse().map_err(|e| format!("bad offset '{}': {}", o, e))?,
            None => 0.0,
        };
        if !offset.is_finite() {
            return Err(format!("bad offset '{}': must be a finite number", offset));
        }
        Ok(EntryArg(UserFireEntry::new(depth, bottle).with_offset(offset)))
    }
}

fn open_settings(config: &Config) -> Result<SettingsFile, Box<dyn std::error::Error>> {
    let path = &config.acquisition.settings_file;
    if path.exists() {
        Ok(SettingsFile::load(path)?)
    } else {
        logging::warn(
            Component::Acquisition,
            None,
            &format!("{} not found, starting from defaults", path.display()),
        );
        let settings = AcquisitionSettings {
            nr_of_water_bottles: config.acquisition.default_total_bottles as usize,
            ..Default::default()
        };
        Ok(SettingsFile::new(path, settings))
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config_path = config::resolve_config_path(cli.config);
    let config = config::load_config(&config_path)?;

    let log_file = config.logging.file.as_ref().map(|p| p.display().to_string());
    logging::init_logger(config.logging.level, log_file.as_deref(), config.logging.timestamps);

    if let Cmd::Launch = cli.command {
        let seasave = AcquisitionLauncher::new(
            config.acquisition.program_path.clone(),
            config.acquisition.settings_file.clone(),
            config.acquisition.process_name.clone(),
            SystemProbe,
        );
        launcher::wait(seasave.run()?)?;
        return Ok(());
    }

    let tables = ReferenceTables::load(&config.reference)?;
    let settings = open_settings(&config)?;
    let mut service = AutoFireService::new(tables, settings, config.acquisition.default_total_bottles);

    match cli.command {
        Cmd::Basin { station } => {
            println!("{}", service.basin_for(&station)?);
        }
        Cmd::Pressures { station } => {
            let mapping = service.pressure_mapping_for_station(&station)?;
            println!("{} ({})", mapping.station, mapping.basin);
            for (depth, pressure) in &mapping.pressures {
                match pressure.value() {
                    Some(p) => println!("{:>6}\t{:.1}", depth, p),
                    None => println!("{:>6}\t-", depth),
                }
            }
        }
        Cmd::Plan { station, total_bottles, active } => {
            let plan = service.auto_fire_info_for_station(&station, total_bottles, active)?;
            println!("{}", serde_json::to_string_pretty(&plan)?);
        }
        Cmd::Apply { station, entries } => {
            let plan = if entries.is_empty() {
                service.apply_default_plan(&station)?
            } else {
                let entries: Vec<UserFireEntry> = entries.into_iter().map(|e| e.0).collect();
                service.apply_user_plan(&station, &entries)?
            };
            println!("{}", serde_json::to_string_pretty(&plan)?);
        }
        Cmd::AutoFire { state } => {
            service.set_auto_fire(matches!(state, Switch::On))?;
        }
        Cmd::Launch => {}
    }
    Ok(())
}

fn main() -> ExitCode {
    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
