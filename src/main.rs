use std::io;
use std::sync::Arc;

use clap::{CommandFactory, Parser};

use chalkmark::api::{GeminiTutor, TutorService};
use chalkmark::app::App;
use chalkmark::components::debug_log::{
    DebugLogComponent, install_panic_hook, set_global_debug_log,
};
use chalkmark::config::{Cli, Config};
use chalkmark::constants::POLL_INTERVAL;
use chalkmark::drivers::OutputDriver;
use chalkmark::drivers::console::{ConsoleInputDriver, ConsoleOutputDriver};
use chalkmark::runner::run_app;
use chalkmark::tracing_sub;

fn main() -> io::Result<()> {
    let cli = Cli::parse();
    let config = match Config::from_cli(&cli) {
        Ok(config) => config,
        Err(err) => Cli::command()
            .error(clap::error::ErrorKind::ValueValidation, err)
            .exit(),
    };

    // Log lines go to the F12 panel, never onto the alternate screen.
    let (debug_log, handle) = DebugLogComponent::new_default();
    set_global_debug_log(handle);
    install_panic_hook();
    tracing_sub::init(config.log_level);

    if config.gemini.api_key.is_none() {
        tracing::warn!("no API key; set GEMINI_API_KEY or pass --api-key");
    }
    let service: Arc<dyn TutorService> = Arc::new(GeminiTutor::new(config.gemini.clone()));
    let mut app = App::new(&config, service, debug_log);

    let mut output = ConsoleOutputDriver::new()?;
    output.enter()?;
    let result = run_app(&mut output, ConsoleInputDriver::new(), &mut app, POLL_INTERVAL);
    output.exit()?;
    result
}
