//! CLI smoke entry point.
//!
//! # Responsibility
//! - Load one extension through the full context-affine pipeline.
//! - Print what the shell would show for it (origin, popup URL, icon path).
//!
//! Usage: `deskext <extension_path> [--config=<file.json>] [--log-dir=<abs dir>]`

use deskext_core::{
    default_log_level, extension_icon_path, extension_origin, extension_url, init_logging,
    BrowserApp, CommandLine, ContextId, DirectoryResourceLoader, Dispatcher, ExtensionConfig,
    ExtensionHandler, ExtensionService, InMemoryRequestContext, LoadedExtension, ResourceRegistry,
};
use log::error;
use std::process::ExitCode;
use std::sync::mpsc::{channel, Sender};
use std::sync::{Arc, Mutex};
use std::time::Duration;

const LOAD_TIMEOUT: Duration = Duration::from_secs(10);

struct ReportingHandler {
    outcome: Mutex<Sender<Result<LoadedExtension, String>>>,
}

impl ExtensionHandler for ReportingHandler {
    fn on_extension_loaded(&self, extension: &LoadedExtension) {
        self.report(Ok(extension.clone()));
    }

    fn on_extension_load_failed(&self, extension_path: &str, reason: &str) {
        self.report(Err(format!("failed to load `{extension_path}`: {reason}")));
    }
}

impl ReportingHandler {
    fn report(&self, outcome: Result<LoadedExtension, String>) {
        if let Ok(sender) = self.outcome.lock() {
            let _ = sender.send(outcome);
        }
    }
}

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            error!("event=cli_run module=cli status=error error={}", message);
            eprintln!("deskext: {message}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &[String]) -> Result<(), String> {
    let Some(extension_path) = args.iter().find(|arg| !arg.starts_with("--")) else {
        return Err(
            "usage: deskext <extension_path> [--config=<file.json>] [--log-dir=<abs dir>]"
                .to_string(),
        );
    };
    let mut command_line = CommandLine::from_args(args);

    if command_line.has_switch("log-dir") {
        init_logging(default_log_level(), command_line.switch_value("log-dir"))
            .map_err(|err| err.to_string())?;
    }

    let config = if command_line.has_switch("config") {
        ExtensionConfig::from_json_file(command_line.switch_value("config"))
    } else {
        Ok(ExtensionConfig::default())
    }
    .and_then(ExtensionConfig::with_env_overrides)
    .map_err(|err| err.to_string())?;

    let app = BrowserApp::with_default_delegates();
    app.on_before_command_line_processing("", &mut command_line);
    app.on_context_initialized();

    let dispatcher = Dispatcher::start().map_err(|err| err.to_string())?;
    let resource_root = config
        .resource_dir
        .clone()
        .or_else(|| config.resources_dir.clone())
        .unwrap_or_else(|| ".".into());
    let service = ExtensionService::new(
        Arc::clone(&dispatcher),
        Arc::new(DirectoryResourceLoader::new(resource_root)),
        config,
    );

    let host = Arc::new(InMemoryRequestContext::new());
    let (sender, receiver) = channel();
    let handler = Arc::new(ReportingHandler {
        outcome: Mutex::new(sender),
    });
    service.load_extension(host, extension_path, handler);

    let extension = receiver
        .recv_timeout(LOAD_TIMEOUT)
        .map_err(|_| format!("timed out loading `{extension_path}`"))??;

    println!("extension_id={}", extension.id);
    println!("origin={}", extension_origin(&extension.id));
    println!("popup_url={}", extension_url(&extension));
    let (icon_path, icon_internal) = extension_icon_path(service.paths(), &extension);
    println!("icon_path={icon_path} internal={icon_internal}");

    if service.paths().is_internal(&extension.path) {
        let registry = Arc::new(ResourceRegistry::new());
        service.register_internal_provider(&extension.id, &extension.path, registry.clone());

        let (done, registered) = channel();
        dispatcher.run_on(ContextId::Io, move || {
            let _ = done.send(());
        });
        registered
            .recv_timeout(LOAD_TIMEOUT)
            .map_err(|_| "timed out registering resource provider".to_string())?;
        println!("resource_providers={}", registry.len());
    }

    dispatcher.shutdown();
    Ok(())
}
