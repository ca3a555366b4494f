use crate::commands::*;
use crate::console::ConsoleLoader;
use crate::output::*;
use adjust_panel::{
    AdjustmentLibrary, DisplayRequest, NumericFormat, PanelConfig, PanelSessionManager,
    BUTTON_HIT_PROPERTY,
};
use automation::{Automation, Station};
use resmgr::{BenchConfig, InMemoryResourceManager, LogTraceSink, ResourceDefinition};
use std::sync::mpsc;
use std::sync::Arc;

pub fn handle_command(command: Commands) -> Result<bool, Box<dyn std::error::Error>> {
    match command {
        Commands::Run(args) => run_session(args),
        Commands::Format { format, value } => Ok(format_value(&format, value)),
    }
}

fn format_value(format: &str, value: f64) -> bool {
    match NumericFormat::parse(format) {
        Ok(parsed) => {
            println!("{}", parsed.format(value));
            true
        }
        Err(err) => {
            print_error(&format!("{} ({}): {err}", format, err.code()));
            false
        }
    }
}

fn run_session(args: RunArgs) -> Result<bool, Box<dyn std::error::Error>> {
    let benches = match &args.config {
        Some(path) => BenchConfig::load_from_file(path)?,
        None => BenchConfig {
            resources: vec![ResourceDefinition::bench("AdjustBench")],
        },
    };
    let panel_config = match &args.panel_config {
        Some(path) => PanelConfig::load_from_file(path)?,
        None => PanelConfig::default(),
    };

    let station = Arc::new(Station::new());
    let resmgr = Arc::new(InMemoryResourceManager::new(benches, Arc::new(LogTraceSink)));
    let (diag_tx, diag_rx) = mpsc::channel();
    let sessions = Arc::new(
        PanelSessionManager::new(station.clone(), Arc::new(ConsoleLoader::new()), panel_config)
            .with_diagnostics(diag_tx),
    );
    let library = AdjustmentLibrary::new(resmgr, sessions);
    let context = station.start_execution();

    let id = match library.setup(context, &args.bench) {
        Ok(id) => id,
        Err(report) => {
            print_report("Setup", &report);
            return Ok(false);
        }
    };
    print_info(&format!("Bench '{}' set up as resource {id}", args.bench));

    let request = DisplayRequest {
        step_name: &args.step,
        button_text: &args.button,
        unit: &args.unit,
        format: &args.format,
        lower_limit: args.lower,
        upper_limit: args.upper,
    };
    let mut ok = true;
    match library.display(context, id, &request) {
        Ok(()) => {
            for value in &args.values {
                match library.set_value(context, id, *value) {
                    Ok(status) => print_info(&format!("{value} -> {status:?}")),
                    Err(report) => {
                        print_report("SetValue", &report);
                        ok = false;
                    }
                }
            }
            if args.commit {
                library.sessions().operator_commit()?;
                // Commit is queued behind any pending render; a snapshot
                // round trip waits for it.
                let _ = library.sessions().snapshot();
                match station.bool_property(context, BUTTON_HIT_PROPERTY) {
                    Ok(hit) => print_info(&format!("{BUTTON_HIT_PROPERTY} = {hit}")),
                    Err(err) => print_error(&err.to_string()),
                }
            }
            if let Err(report) = library.hide(context, id) {
                print_report("Hide", &report);
                ok = false;
            }
        }
        Err(report) => {
            print_report("Display", &report);
            ok = false;
        }
    }

    for diagnostic in diag_rx.try_iter() {
        print_error(&format!("commit callback: {}", diagnostic.error));
    }
    if let Err(report) = library.cleanup(context, id) {
        print_report("Cleanup", &report);
        ok = false;
    }
    station.discard(context);
    Ok(ok)
}
