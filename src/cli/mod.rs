pub mod devices;
pub mod light;
pub mod output;

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};

const EXAMPLES: &str = "\
EXAMPLES:
  keylight                    Open the interactive view
  keylight on                 Turn on all lights
  keylight bright 50          Set all lights to 50% brightness
  keylight temp 4000          Set all lights to 4000K
  keylight bright =           Match brightness across all lights
  keylight 1                  Toggle light 1
  keylight 2 bright +         Increase light 2 brightness
  keylight \"My Light\" on      Turn on a specific light
  keylight status             Check status of all lights";

#[derive(Parser)]
#[command(
    name = "keylight",
    version,
    about = "Elgato Key Light controller - run without a command for the interactive view",
    after_help = EXAMPLES
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Output as human-readable table instead of JSON
    #[arg(short = 't', long = "table", global = true)]
    pub table: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Settings file (defaults to ~/.config/keylight/config.json)
    #[arg(long, env = "KEYLIGHT_CONFIG", global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Log file used by the interactive view
    #[arg(long, default_value = "/tmp/keylight.log", global = true, value_name = "PATH")]
    pub log_file: PathBuf,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Turn on all lights
    On,

    /// Turn off all lights
    Off,

    /// Brightness of all lights: + / - (5% step), = (equalize) or 3-100
    Bright {
        #[arg(allow_hyphen_values = true, value_name = "+|-|=|3-100")]
        value: String,
    },

    /// Temperature of all lights: + / - (200K step), = (equalize) or 2900-7000
    Temp {
        #[arg(allow_hyphen_values = true, value_name = "+|-|=|2900-7000")]
        value: String,
    },

    /// Show all configured lights
    List,

    /// Discover lights on the network and save them
    Detect,

    /// Show status of all lights, or of one light
    Status {
        /// Light name or number
        light: Option<String>,
    },

    /// <light> [on|off|bright ..|temp ..|status]: control one light, toggle when bare
    #[command(external_subcommand)]
    Light(Vec<String>),
}

impl Cli {
    /// Global flags written after a light identifier end up inside the
    /// external subcommand. Move them back onto the parsed options.
    pub fn with_trailing_flags(mut self) -> Self {
        let Some(Commands::Light(args)) = self.command.take() else {
            return self;
        };
        let mut kept = Vec::with_capacity(args.len());
        let mut iter = args.into_iter();
        while let Some(arg) = iter.next() {
            match arg.as_str() {
                "-t" | "--table" => self.table = true,
                "--verbose" => self.verbose = self.verbose.saturating_add(1),
                flag if is_verbose_cluster(flag) => {
                    let count = u8::try_from(flag.len() - 1).unwrap_or(u8::MAX);
                    self.verbose = self.verbose.saturating_add(count);
                }
                "--config" => self.config = iter.next().map(PathBuf::from),
                "--log-file" => {
                    if let Some(path) = iter.next() {
                        self.log_file = PathBuf::from(path);
                    }
                }
                other => {
                    if let Some(path) = other.strip_prefix("--config=") {
                        self.config = Some(PathBuf::from(path));
                    } else if let Some(path) = other.strip_prefix("--log-file=") {
                        self.log_file = PathBuf::from(path);
                    } else {
                        kept.push(arg);
                    }
                }
            }
        }
        self.command = Some(Commands::Light(kept));
        self
    }
}

fn is_verbose_cluster(arg: &str) -> bool {
    arg.len() > 1 && arg.starts_with('-') && arg[1..].chars().all(|c| c == 'v')
}

impl Commands {
    /// The argument vector understood by [`crate::router::parse_args`].
    pub fn router_args(&self) -> Option<Vec<String>> {
        let args = match self {
            Commands::On => vec!["on".to_string()],
            Commands::Off => vec!["off".to_string()],
            Commands::Bright { value } => vec!["bright".to_string(), value.clone()],
            Commands::Temp { value } => vec!["temp".to_string(), value.clone()],
            Commands::Status { light: None } => vec!["status".to_string()],
            Commands::Status { light: Some(light) } => vec![light.clone(), "status".to_string()],
            Commands::Light(args) => args.clone(),
            Commands::List | Commands::Detect => return None,
        };
        Some(args)
    }
}
