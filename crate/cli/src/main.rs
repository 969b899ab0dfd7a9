use std::{io, process};

use hsm_roundtrip::{config::RoundTripConfig, error::result::CliResult, roundtrip};
use hsm_roundtrip_base_hsm::BaseHsm;
use hsm_roundtrip_logger::{debug, log_init};

fn main() {
    if let Some(err) = main_().err() {
        eprintln!("ERROR: {err}");
        process::exit(1);
    }
}

fn main_() -> CliResult<()> {
    log_init(None);
    let config = RoundTripConfig::from_env()?;
    debug!("{config:?}");

    let hsm = BaseHsm::instantiate(&config.library_path)?;
    let mut stdout = io::stdout().lock();
    roundtrip::run(&hsm, &config, &mut stdout)?;
    Ok(())
}
