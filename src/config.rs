use anyhow::{Result, anyhow, bail};

use crate::parser::{ParseOptions, Recovery};

/// Which backends the driver runs, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendSelection {
    One(String),
    All,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub backends: BackendSelection,
    pub recovery: Recovery,
    /// Print the parsed program in infix form before running it.
    pub show_tree: bool,
    /// Print the compiled instruction listing before running it.
    pub show_code: bool,
    pub input_path: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backends: BackendSelection::One("interpreter".to_string()),
            recovery: Recovery::Abort,
            show_tree: false,
            show_code: false,
            input_path: None,
        }
    }
}

impl Config {
    /// Parses command-line arguments (without the program name).
    pub fn from_args(args: impl IntoIterator<Item = String>) -> Result<Self> {
        let mut config = Config::default();
        let mut args = args.into_iter();

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--backend" | "-b" => {
                    let name = args
                        .next()
                        .ok_or_else(|| anyhow!("Missing backend name after {arg}"))?;
                    config.backends = match name.as_str() {
                        "all" => BackendSelection::All,
                        _ => BackendSelection::One(name),
                    };
                }
                "--recover" => config.recovery = Recovery::SkipStatement,
                "--tree" => config.show_tree = true,
                "--code" => config.show_code = true,
                flag if flag.starts_with('-') && flag != "-" => bail!("Unknown flag '{flag}'"),
                _ => {
                    if config.input_path.is_some() {
                        bail!("Only one input file is supported");
                    }
                    config.input_path = Some(arg);
                }
            }
        }

        Ok(config)
    }

    pub fn parse_options(&self) -> ParseOptions {
        ParseOptions {
            recovery: self.recovery,
        }
    }
}
