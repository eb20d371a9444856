use std::error::Error;
use std::path::PathBuf;

use crate::block::{BlockType, BLOCK_TYPE_NAMES};
use crate::cascade::{cascade, Simulation};
use crate::cascade_vector_return_vector;
use crate::file::{load_netlist, validate_netlist, SignalChain};
use crate::results;

/// Settings for one cascade run, as given on the command line.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Config {
    pub netlist_path: PathBuf,
    pub name: Option<String>,
    pub pin: Option<f64>,         // dBm
    pub bandwidth: Option<f64>,   // Hz
    pub temperature: Option<f64>, // Kelvin
    pub save: Option<PathBuf>,
    pub json: bool,
    pub no_output: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    Cascade(Config),
    Implemented,
    Properties(BlockType),
    Validate(PathBuf),
    Version,
    Help,
}

fn flag_value<'a>(
    flag: &str,
    values: &mut impl Iterator<Item = &'a String>,
) -> Result<&'a String, Box<dyn Error>> {
    values
        .next()
        .ok_or_else(|| format!("missing value for {}", flag).into())
}

fn number_value<'a>(
    flag: &str,
    values: &mut impl Iterator<Item = &'a String>,
) -> Result<f64, Box<dyn Error>> {
    let raw = flag_value(flag, values)?;
    raw.parse::<f64>()
        .map_err(|_| format!("{} expects a number, got '{}'", flag, raw).into())
}

impl Config {
    /// Parse the full argument list (including the program name).
    pub fn parse(args: &[String]) -> Result<Command, Box<dyn Error>> {
        if args.len() < 2 {
            return Err("not enough arguments".into());
        }

        let mut config = Config::default();
        let mut netlist_path: Option<PathBuf> = None;
        let mut values = args[1..].iter();

        while let Some(arg) = values.next() {
            match arg.as_str() {
                "--version" | "-v" => return Ok(Command::Version),
                "--help" | "-h" => return Ok(Command::Help),
                "--implemented" => return Ok(Command::Implemented),
                "--properties" => {
                    let type_name = flag_value(arg, &mut values)?;
                    let block_type = BlockType::from_name(type_name)
                        .ok_or_else(|| format!("{} is not an implemented block", type_name))?;
                    return Ok(Command::Properties(block_type));
                }
                "--validate" => {
                    let path = flag_value(arg, &mut values)?;
                    return Ok(Command::Validate(PathBuf::from(path)));
                }
                "--name" => config.name = Some(flag_value(arg, &mut values)?.clone()),
                "--pin" => config.pin = Some(number_value(arg, &mut values)?),
                "--bw" => config.bandwidth = Some(number_value(arg, &mut values)?),
                "--temp" => config.temperature = Some(number_value(arg, &mut values)?),
                "--save" | "-s" => {
                    config.save = Some(PathBuf::from(flag_value(arg, &mut values)?))
                }
                "--json" => config.json = true,
                "--no-output" => config.no_output = true,
                flag if flag.starts_with('-') => {
                    return Err(format!("unknown option {}", flag).into());
                }
                path => {
                    if netlist_path.is_some() {
                        return Err("too many arguments, expecting a single netlist file".into());
                    }
                    netlist_path = Some(PathBuf::from(path));
                }
            }
        }

        config.netlist_path = netlist_path.ok_or("missing netlist file path")?;
        Ok(Command::Cascade(config))
    }

    pub fn run(args: &[String]) -> Result<Command, Box<dyn Error>> {
        let command = Config::parse(args)?;
        match &command {
            Command::Version => print_version(),
            Command::Help => print_help(),
            Command::Implemented => println!("{}", display_implemented()),
            Command::Properties(block_type) => println!("{}", display_properties(*block_type)),
            Command::Validate(path) => {
                let chains = validate_netlist(path)?;
                println!("Netlist OK: {} ({} signal chains)", path.display(), chains);
            }
            Command::Cascade(config) => config.cascade()?,
        }
        Ok(command)
    }

    /// Netlist simulation settings with command line overrides applied.
    fn simulation(&self, netlist_sim: Simulation) -> Simulation {
        Simulation {
            pin_dbm: self.pin.unwrap_or(netlist_sim.pin_dbm),
            bandwidth_hz: self.bandwidth.unwrap_or(netlist_sim.bandwidth_hz),
            noise_temperature_k: self.temperature.unwrap_or(netlist_sim.noise_temperature_k),
        }
    }

    fn cascade(&self) -> Result<(), Box<dyn Error>> {
        let netlist = load_netlist(&self.netlist_path)?;
        let sim = self.simulation(netlist.sim);
        tracing::debug!(%sim, "cascade settings");

        let chains: Vec<&SignalChain> = match &self.name {
            Some(name) => vec![netlist.chain(name)?],
            None => netlist.chains.values().collect(),
        };
        if chains.is_empty() {
            return Err("netlist does not define any signal chain".into());
        }
        if let Some(save) = &self.save {
            if chains.len() > 1 && !save.is_dir() {
                return Err("--save must be a directory when cascading several chains".into());
            }
        }

        for chain in chains {
            let result = cascade(&chain.blocks, &sim);

            if self.json {
                let json = results::to_json(&result)?;
                if !self.no_output {
                    println!("{}", json);
                }
                if let Some(save) = &self.save {
                    let saved = results::save_json(save, &chain.name, &json)?;
                    println!("Results saved to {}", saved.display());
                }
                continue;
            }

            if !self.no_output {
                let mut blocks = chain.blocks.clone();
                let nodes = cascade_vector_return_vector(sim.pin_dbm, &mut blocks);
                println!("\n{} ({} blocks)\n", chain.name, chain.blocks.len());
                print!("{}", results::render_table(&result));
                println!();
                print!("{}", results::render_levels(&nodes));
            }

            if let Some(save) = &self.save {
                let lines = results::csv_lines(&result);
                let saved = results::save_csv(save, &chain.name, &lines)?;
                println!("Results saved to {}", saved.display());
            }
        }
        Ok(())
    }
}

pub fn display_implemented() -> String {
    let mut text = String::from("Available blocks for netlisting:");
    for (name, block_type) in BLOCK_TYPE_NAMES {
        text.push_str(&format!("\n  - {:<14}{}", name, block_type));
    }
    text
}

pub fn display_properties(block_type: BlockType) -> String {
    let mut text = format!("Available properties for {}:\n", block_type);
    for attribute in block_type.supported() {
        text.push_str(&format!(
            "  - <block>.{:<14}units={:<6}{}\n",
            attribute.key, attribute.unit, attribute.description
        ));
    }
    text
}

pub fn print_version() {
    println!("rfbudget {}", env!("CARGO_PKG_VERSION"));
}

pub fn print_error(error: &str) {
    const RED: &str = "\x1b[31m";
    const RESET: &str = "\x1b[0m";
    println!("{}Problem running rfbudget: {error}{}", RED, RESET);
}

pub fn print_help() {
    // ANSI color codes
    const BOLD: &str = "\x1b[1m";
    const CYAN: &str = "\x1b[36m";
    const GREEN: &str = "\x1b[32m";
    const YELLOW: &str = "\x1b[33m";
    const RESET: &str = "\x1b[0m";

    println!("📡 rfbudget - RF system budget and cascade analysis{}", RESET);
    println!();
    println!("{}{}VERSION:{}", BOLD, YELLOW, RESET);
    println!("    {}{}{}", GREEN, env!("CARGO_PKG_VERSION"), RESET);
    println!();
    println!("{}{}USAGE:{}", BOLD, YELLOW, RESET);
    println!("    {} rfbudget <NETLIST> [OPTIONS]{}", GREEN, RESET);
    println!();
    println!("     NETLIST: path to a toml netlist file");
    println!();
    println!("     Every signal chain in the netlist is cascaded and printed as a table.");
    println!("     [sim] values in the netlist are used unless overridden below.");
    println!();
    println!("{}{}OPTIONS:{}", BOLD, YELLOW, RESET);
    println!("    {}  --name <CHAIN>{}        Cascade only this signal chain", GREEN, RESET);
    println!("    {}  --pin <DBM>{}           Input power in dBm", GREEN, RESET);
    println!("    {}  --bw <HZ>{}             Signal bandwidth in Hz", GREEN, RESET);
    println!("    {}  --temp <K>{}            Noise temperature in Kelvin", GREEN, RESET);
    println!(
        "    {}  -s, --save <PATH>{}     Save results as csv (file or directory)",
        GREEN, RESET
    );
    println!("    {}  --json{}                Print and save results as JSON", GREEN, RESET);
    println!("    {}  --no-output{}           Do not print results", GREEN, RESET);
    println!("    {}  --implemented{}         List block types usable in a netlist", GREEN, RESET);
    println!("    {}  --properties <TYPE>{}   List properties of a block type", GREEN, RESET);
    println!("    {}  --validate <NETLIST>{}  Validate a netlist file", GREEN, RESET);
    println!("    {}  -v, --version{}         Print version information", GREEN, RESET);
    println!("    {}  -h, --help{}            Print help information", GREEN, RESET);
    println!();
    println!("{}{}EXAMPLES:{}", BOLD, YELLOW, RESET);
    println!("    {} # Cascade a receiver at -60 dBm{}", CYAN, RESET);
    println!("    {} rfbudget files/receiver.toml --name receiver --pin -60{}", GREEN, RESET);
    println!();
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        std::iter::once("program_name")
            .chain(list.iter().copied())
            .map(String::from)
            .collect()
    }

    fn setup_test_dir(name: &str) -> PathBuf {
        let mut path = std::env::temp_dir();
        path.push("rfbudget_tests");
        path.push(name);
        path.push(format!(
            "{}",
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap()
                .as_nanos()
        ));
        std::fs::create_dir_all(&path).unwrap();
        path
    }

    #[test]
    fn test_run_function() {
        let test_dir = setup_test_dir("test_run_function");
        let toml_path = test_dir.join("receiver.toml");
        fs::copy("files/receiver.toml", &toml_path).unwrap();

        let args = args(&[
            toml_path.to_str().unwrap(),
            "--save",
            test_dir.to_str().unwrap(),
            "--no-output",
        ]);
        let command = Config::run(&args).unwrap();
        assert!(matches!(command, Command::Cascade(_)));

        let saved = fs::read_to_string(test_dir.join("rf_cascade_results_receiver.csv")).unwrap();
        assert!(saved.starts_with("Total Results"));
    }

    #[test]
    fn test_run_json() {
        let test_dir = setup_test_dir("test_run_json");
        let toml_path = test_dir.join("receiver.toml");
        fs::copy("files/receiver.toml", &toml_path).unwrap();

        let args = args(&[
            toml_path.to_str().unwrap(),
            "--name",
            "receiver",
            "--json",
            "--save",
            test_dir.to_str().unwrap(),
            "--no-output",
        ]);
        Config::run(&args).unwrap();

        let saved = fs::read_to_string(test_dir.join("rf_cascade_results_receiver.json")).unwrap();
        let report: serde_json::Value = serde_json::from_str(&saved).unwrap();
        assert_eq!(report["pin"], -60.0);
        assert_eq!(report["gain"], 25.0);
        assert_eq!(report["stages"].as_array().unwrap().len(), 2);
        assert!(!test_dir.join("rf_cascade_results_receiver.csv").exists());
    }

    #[test]
    fn test_config_build_not_enough_args() {
        let args = vec![String::from("program_name")];
        let result = Config::run(&args);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_overrides() {
        let command = Config::parse(&args(&[
            "net.toml", "--name", "rx", "--pin", "-40", "--bw", "1e6", "--temp", "50", "-s",
            "out.csv", "--json", "--no-output",
        ]))
        .unwrap();
        let expected = Config {
            netlist_path: PathBuf::from("net.toml"),
            name: Some("rx".to_string()),
            pin: Some(-40.0),
            bandwidth: Some(1.0e6),
            temperature: Some(50.0),
            save: Some(PathBuf::from("out.csv")),
            json: true,
            no_output: true,
        };
        assert_eq!(command, Command::Cascade(expected));
    }

    #[test]
    fn test_simulation_overrides_netlist() {
        let config = Config {
            pin: Some(-20.0),
            ..Default::default()
        };
        let netlist_sim = Simulation {
            pin_dbm: -60.0,
            bandwidth_hz: 1.0e6,
            noise_temperature_k: 300.0,
        };
        let sim = config.simulation(netlist_sim);
        assert_eq!(sim.pin_dbm, -20.0);
        assert_eq!(sim.bandwidth_hz, 1.0e6);
        assert_eq!(sim.noise_temperature_k, 300.0);
    }

    #[test]
    fn test_parse_errors() {
        assert!(Config::parse(&args(&["--pin", "loud", "net.toml"])).is_err());
        assert!(Config::parse(&args(&["net.toml", "--name"])).is_err());
        assert!(Config::parse(&args(&["a.toml", "b.toml"])).is_err());
        assert!(Config::parse(&args(&["--frobnicate"])).is_err());
        assert!(Config::parse(&args(&["--properties", "balun"])).is_err());
        assert!(Config::parse(&args(&["--no-output"])).is_err());
    }

    #[test]
    fn test_info_commands() {
        assert_eq!(Config::parse(&args(&["-h"])).unwrap(), Command::Help);
        assert_eq!(Config::parse(&args(&["--version"])).unwrap(), Command::Version);
        assert_eq!(
            Config::parse(&args(&["--implemented"])).unwrap(),
            Command::Implemented
        );
        assert_eq!(
            Config::parse(&args(&["--properties", "VGA"])).unwrap(),
            Command::Properties(BlockType::Vga)
        );
        assert_eq!(
            Config::parse(&args(&["--validate", "x.toml"])).unwrap(),
            Command::Validate(PathBuf::from("x.toml"))
        );
    }

    #[test]
    fn test_validate_fixture() {
        let command = Config::run(&args(&["--validate", "files/receiver.toml"])).unwrap();
        assert!(matches!(command, Command::Validate(_)));
        assert!(Config::run(&args(&["--validate", "files/missing.toml"])).is_err());
    }

    #[test]
    fn test_unknown_chain_name() {
        let result = Config::run(&args(&["files/receiver.toml", "--name", "nope", "--no-output"]));
        assert!(result.is_err());
    }

    #[test]
    fn test_display_properties() {
        let text = display_properties(BlockType::Detector);
        assert!(text.contains("<block>.law"));
        assert!(text.contains("units=dBm"));
        assert_eq!(text.lines().count(), 1 + BlockType::Detector.supported().len());
    }

    #[test]
    fn test_display_implemented() {
        let text = display_implemented();
        assert_eq!(text.lines().count(), 1 + BLOCK_TYPE_NAMES.len());
        assert!(text.contains("- lna"));
    }

    #[test]
    fn test_version_output_format() {
        let version = env!("CARGO_PKG_VERSION");
        let parts: Vec<&str> = version.split('.').collect();
        assert_eq!(parts.len(), 3, "Version should be in X.Y.Z format");
    }
}
