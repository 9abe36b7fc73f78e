//! Slotted CLI
//!
//! Usage:
//!   slotted [OPTIONS] [FILE]
//!
//! Options:
//!   -c, --config <FILE>    Engine settings and component manifest (TOML format)
//!   -x, --context <FILE>   Template variables (JSON object)
//!   -i, --isolated         Render components in isolated context
//!       --strict-slots     Reject fills for undeclared slots
//!   -u, --used             Print the templates used to stderr
//!   -h, --help             Print help

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Parser;

use slotted::{
    ComponentRegistry, ConfigError, Context, ContextBehavior, Engine, Settings, Value,
};

#[derive(Parser)]
#[command(name = "slotted")]
#[command(about = "Render templates built from reusable components")]
struct Cli {
    /// Template file (reads from stdin if not provided)
    input: Option<PathBuf>,

    /// Engine settings and `[[components]]` manifest (TOML format)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Template variables as a JSON object
    #[arg(short = 'x', long)]
    context: Option<PathBuf>,

    /// Render components in isolated context
    #[arg(short, long)]
    isolated: bool,

    /// Reject fills for slots a component never declares
    #[arg(long)]
    strict_slots: bool,

    /// Print the names of the templates used to stderr
    #[arg(short, long)]
    used: bool,
}

fn main() {
    env_logger::Builder::from_default_env()
        .format_timestamp(None)
        .init();

    let cli = Cli::parse();

    let settings = match &cli.config {
        Some(path) => Settings::from_file(path).unwrap_or_else(|e| {
            fail(&format!("Error loading config '{}': {}", path.display(), e))
        }),
        None => Settings::default(),
    };

    let registry = Arc::new(ComponentRegistry::new());
    match settings.register_components(&registry) {
        Ok(()) => {}
        Err(ConfigError::Template(e)) => fail(&e.report()),
        Err(e) => fail(&e.to_string()),
    }

    let mut config = settings.engine;
    if cli.isolated {
        config = config.with_context_behavior(ContextBehavior::Isolated);
    }
    if cli.strict_slots {
        config = config.with_strict_slots(true);
    }

    let context = match &cli.context {
        Some(path) => load_context(path).unwrap_or_else(|e| fail(&e)),
        None => Context::new(),
    };

    let source = match &cli.input {
        Some(path) => fs::read_to_string(path).unwrap_or_else(|e| {
            fail(&format!("Error reading file '{}': {}", path.display(), e))
        }),
        None => {
            let mut buffer = String::new();
            if let Err(e) = io::stdin().read_to_string(&mut buffer) {
                fail(&format!("Error reading from stdin: {}", e));
            }
            buffer
        }
    };

    let engine = Engine::with_registry(config, registry);
    let template = match engine.parse(&source) {
        Ok(template) => template,
        Err(e) => fail(&e.report()),
    };

    match engine.render(&template, context) {
        Ok(rendered) => {
            print!("{}", rendered.output);
            if cli.used {
                for name in rendered.templates_used {
                    eprintln!("used: {}", name);
                }
            }
        }
        Err(e) => fail(&format!("Error: {}", e)),
    }
}

fn fail(message: &str) -> ! {
    eprintln!("{}", message);
    std::process::exit(1);
}

fn load_context(path: &Path) -> Result<Context, String> {
    let content = fs::read_to_string(path)
        .map_err(|e| format!("Error reading context '{}': {}", path.display(), e))?;
    let value: Value = serde_json::from_str(&content)
        .map_err(|e| format!("Error parsing context '{}': {}", path.display(), e))?;
    match value {
        Value::Map(map) => Ok(Context::from_data(map)),
        _ => Err(format!("Context '{}' must be a JSON object", path.display())),
    }
}
