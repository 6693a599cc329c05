use anyhow::Result;
use clap::Parser;
use pulsefield::app;
use pulsefield::config::Config;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let cfg = Config::parse();
    init_tracing(cfg.list);

    if cfg.list {
        println!("{}", app::list_text(&app::build_engine(&cfg)));
        return Ok(());
    }

    app::run(cfg)
}

/// Stderr logging. The preview owns the terminal, so it only logs when
/// `RUST_LOG` asks for it; `--list` logs warnings by default.
fn init_tracing(plain_output: bool) {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(f) => f,
        Err(_) if plain_output => EnvFilter::new("warn"),
        Err(_) => return,
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
