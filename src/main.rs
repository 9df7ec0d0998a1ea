// Entrypoint for the importer.
// - Keeps `main` small: parse settings, run the import, map fatal errors to
//   their exit codes.
// - A finished batch exits 0 even when individual files failed.

use anyhow::Context;
use clap::Parser;
use spira_attach::api::ApiClient;
use spira_attach::config::Settings;
use spira_attach::ui::{self, Console};
use spira_attach::{logging, scan, ConfigError, MappingTable, Uploader};
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

fn main() -> ExitCode {
    let settings = Settings::parse();
    logging::init_logging(settings.verbose);

    match run(&settings) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err:#}");
            let code = err
                .downcast_ref::<ConfigError>()
                .map(ConfigError::exit_code)
                .unwrap_or(1);
            ExitCode::from(code as u8)
        }
    }
}

fn run(settings: &Settings) -> anyhow::Result<()> {
    let options = settings.import_options();
    let console = Console::new(settings.verbose);

    // Everything that can be checked locally is checked before connecting.
    let mapping = match &options.mapping_file {
        Some(path) => MappingTable::load(path)?,
        None => MappingTable::empty(),
    };
    let files = scan::enumerate(&options.import_path, &options.filter, options.recursive)?;
    let api_key = match &settings.password {
        Some(password) => password.clone(),
        None => ui::prompt_password(&settings.user)?,
    };
    let server = settings.server_config(api_key)?;

    console.say(&format!("Importing files in {}", options.import_path.display()));
    console.detail("Connecting to Spira server...");
    let client = ApiClient::connect(&server)?;

    let cancel = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&cancel);
    ctrlc::set_handler(move || flag.store(true, Ordering::SeqCst))
        .context("Failed to install Ctrl-C handler")?;

    console.say("Uploading files...");
    let uploader = Uploader::new(&client, &mapping);
    let reporter = uploader.run_batch(files, &cancel, |outcome| console.file_done(outcome));

    console.finish(&reporter.summarize(), cancel.load(Ordering::SeqCst));
    if let Some(path) = &settings.report_file {
        reporter
            .write_json(path)
            .with_context(|| format!("Failed to write report to {}", path.display()))?;
    }
    Ok(())
}
