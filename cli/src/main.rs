//! CLI entrypoint for conclave
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use anyhow::{Context, Result, anyhow, bail};
use clap::{CommandFactory, Parser};
use conclave_application::{Agent, EventBus, Orchestrator};
use conclave_domain::{ORCHESTRATOR_NAME, OutputFormat, Request, ResponseMap};
use conclave_infrastructure::events::WILDCARD_TOPIC;
use conclave_infrastructure::{
    BroadcastEventBus, ConfigLoader, FileConfig, JsonlHistoryStore, build_roster,
    build_text_client, default_roster,
};
use conclave_presentation::{
    Cli, CollaborateArgs, Command, ConsoleFormatter, HistoryArgs, OutputArg, ProcessArgs,
    ProgressReporter, QueryArgs, StatusArgs,
};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.show_config {
        for line in ConfigLoader::describe_sources(cli.config.as_deref()) {
            println!("{}", line);
        }
        return Ok(());
    }

    // Held until exit so buffered log lines reach the file
    let _log_guard = init_logging(cli.verbose, cli.log_file.as_deref())?;
    info!("Starting conclave");

    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        bail!("No command given.");
    };

    // === Configuration ===
    let mut config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_deref())
            .map_err(|e| anyhow!("Failed to load configuration: {}", e))?
    };

    let issues = config.validate();
    for issue in &issues {
        eprintln!("{}", issue);
    }
    if issues.iter().any(|issue| issue.is_error()) {
        bail!("Configuration has errors; fix them or run with --no-config.");
    }
    if config.agents.is_empty() {
        config.agents = default_roster();
    }
    ConsoleFormatter::set_color(config.output.color);

    // === Dependency Injection ===
    let events = Arc::new(BroadcastEventBus::new());
    let event_log = spawn_event_log(&events);
    let orchestrator = build_orchestrator(&config, events);

    let store = config.engine.history_path().map(JsonlHistoryStore::new);
    if let Some(store) = &store {
        match orchestrator.load_history(|| store.load()) {
            Ok(count) => debug!(entries = count, "History restored"),
            Err(e) => warn!("Could not load history: {}", e),
        }
    }

    orchestrator
        .initialize()
        .await
        .context("Failed to initialize the orchestrator")?;

    let result = run(&orchestrator, command, &config, cli.quiet).await;

    if let Some(store) = &store
        && let Err(e) = orchestrator.save_history(|entries| store.save(entries))
    {
        warn!("Could not save history: {}", e);
    }
    orchestrator.shutdown().await;
    event_log.abort();

    result
}

/// Console logging by verbosity, plus an optional non-blocking file writer
fn init_logging(verbose: u8, log_file: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let filter = || match verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"), // -vvv or more
    };

    let console = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);

    let Some(path) = log_file else {
        tracing_subscriber::registry()
            .with(filter())
            .with(console)
            .init();
        return Ok(None);
    };

    let directory = path
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let file_name = path
        .file_name()
        .ok_or_else(|| anyhow!("--log-file must name a file: {}", path.display()))?;
    std::fs::create_dir_all(directory)
        .with_context(|| format!("Failed to create log directory {}", directory.display()))?;

    let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::never(
        directory, file_name,
    ));
    let file = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_ansi(false)
        .with_writer(writer);

    tracing_subscriber::registry()
        .with(filter())
        .with(console)
        .with(file)
        .init();
    Ok(Some(guard))
}

/// Forward every orchestration event to the debug log
fn spawn_event_log(events: &Arc<BroadcastEventBus>) -> tokio::task::JoinHandle<()> {
    let mut receiver = events.subscribe(WILDCARD_TOPIC);
    tokio::spawn(async move {
        while let Ok(event) = receiver.recv().await {
            debug!(topic = event.topic(), ?event, "Orchestration event");
        }
    })
}

fn build_orchestrator(config: &FileConfig, events: Arc<BroadcastEventBus>) -> Orchestrator {
    let generator = build_text_client(&config.generation);
    let params = config.engine_params();
    let agents = build_roster(
        &config.agents,
        Arc::clone(&generator),
        params.temperature,
        params.max_tokens,
    );

    let orchestrator = Orchestrator::new(generator)
        .with_event_bus(events)
        .with_security(config.security.to_policy())
        .with_params(params)
        .with_hierarchy(config.hierarchy());

    for (name, agent) in agents {
        orchestrator.register_agent(name, agent);
    }
    orchestrator
}

async fn run(
    orchestrator: &Orchestrator,
    command: Command,
    config: &FileConfig,
    quiet: bool,
) -> Result<()> {
    let format = |arg: Option<OutputArg>| {
        arg.map(OutputFormat::from)
            .or(config.output.format)
            .unwrap_or_default()
    };

    match command {
        Command::Process(args) => {
            let format = format(args.output);
            process(orchestrator, args, format).await
        }
        Command::Collaborate(args) => {
            let format = format(args.output);
            collaborate(orchestrator, args, format, quiet).await
        }
        Command::Query(args) => {
            let format = format(args.output);
            query(orchestrator, args, format).await
        }
        Command::Status(StatusArgs { output }) => {
            let status = orchestrator.get_system_status();
            match format(output) {
                OutputFormat::Text => print!("{}", ConsoleFormatter::format_status(&status)),
                OutputFormat::Json => println!("{}", ConsoleFormatter::format_json(&status)),
            }
            Ok(())
        }
        Command::History(HistoryArgs { clear, output }) => {
            if clear {
                orchestrator.clear_history();
                println!("History cleared.");
                return Ok(());
            }
            let entries = orchestrator.history();
            match format(output) {
                OutputFormat::Text => print!("{}", ConsoleFormatter::format_history(&entries)),
                OutputFormat::Json => println!("{}", ConsoleFormatter::format_json(&entries)),
            }
            Ok(())
        }
    }
}

async fn process(
    orchestrator: &Orchestrator,
    args: ProcessArgs,
    format: OutputFormat,
) -> Result<()> {
    let mut request = Request::new(args.query, args.request_type).with_metadata("origin", "cli");
    for (key, value) in args.context {
        request = request.with_context(key, value);
    }

    let response = orchestrator.process(request).await?;
    match format {
        OutputFormat::Text => print!("{}", ConsoleFormatter::format_response(&response)),
        OutputFormat::Json => println!("{}", ConsoleFormatter::format_json(&response)),
    }
    Ok(())
}

async fn collaborate(
    orchestrator: &Orchestrator,
    args: CollaborateArgs,
    format: OutputFormat,
    quiet: bool,
) -> Result<()> {
    let agents: Vec<Arc<dyn Agent>> = orchestrator.resolve_agents(&args.agents)?;
    if agents.is_empty() {
        bail!("No active agents to collaborate with.");
    }

    let progress = (!quiet).then(ProgressReporter::new);
    let mut rounds: Vec<ResponseMap> = Vec::with_capacity(args.rounds as usize);
    for round in 1..=args.rounds {
        debug!(round, "Starting collaboration round");
        let input = orchestrator
            .collaboration_input(agents.clone(), args.mode.into())
            .with_user_input(&args.query);
        let responses = match &progress {
            Some(progress) => orchestrator.collaborate_with_progress(input, progress).await,
            None => orchestrator.collaborate(input).await,
        };
        rounds.push(responses);
    }

    let consensus = orchestrator.aggregate(&rounds);
    match format {
        OutputFormat::Text => print!(
            "{}",
            ConsoleFormatter::format_consensus(&args.query, &consensus)
        ),
        OutputFormat::Json => println!("{}", ConsoleFormatter::format_json(&consensus)),
    }
    Ok(())
}

async fn query(orchestrator: &Orchestrator, args: QueryArgs, format: OutputFormat) -> Result<()> {
    let messages = orchestrator.process_query(&args.query).await?;
    match format {
        OutputFormat::Text => print!(
            "{}",
            ConsoleFormatter::format_messages(&messages, ORCHESTRATOR_NAME)
        ),
        OutputFormat::Json => println!("{}", ConsoleFormatter::format_json(&messages)),
    }
    Ok(())
}
