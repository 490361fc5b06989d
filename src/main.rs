use std::sync::Arc;

use abserve::cli::{self, Invocation, ServeArgs};
use abserve::config::{AppState, Settings};
use abserve::content::ContentCache;
use abserve::error::{self, AppError, EXIT_USAGE};
use abserve::logger;
use abserve::refresh::RefreshSource;
use abserve::server;

fn main() {
    let argv0 = std::env::args().next().unwrap_or_default();
    let program = logger::program_name_from(&argv0);

    let args = match cli::parse(std::env::args_os()) {
        Ok(Invocation::Serve(args)) => args,
        Ok(Invocation::Help) => {
            eprintln!("{}", cli::help(&program));
            std::process::exit(EXIT_USAGE);
        }
        Ok(Invocation::Version) => {
            println!("{}", cli::version_line());
            std::process::exit(EXIT_USAGE);
        }
        Err(err @ AppError::Usage(_)) => {
            eprintln!("{program}: {err}");
            eprintln!("{}", cli::synopsis(&program));
            std::process::exit(err.exit_code());
        }
        Err(err) => {
            eprintln!("{program}: {err}");
            std::process::exit(err.exit_code());
        }
    };

    if let Err(err) = run(&program, args) {
        error::fail(&err);
    }
}

fn run(program: &str, args: ServeArgs) -> Result<(), AppError> {
    logger::set_program_name(program);
    let settings = Settings::load(args.config_file.as_deref())?;
    logger::init(program, &settings.logging).map_err(AppError::Log)?;

    // Worker threads follow the settings, CPU cores otherwise
    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();
    if let Some(workers) = settings.performance.workers {
        runtime_builder.worker_threads(workers.get());
    }
    let runtime = runtime_builder
        .build()
        .map_err(|e| AppError::Runtime(e.to_string()))?;

    runtime.block_on(async_main(args, settings))
}

async fn async_main(args: ServeArgs, settings: Settings) -> Result<(), AppError> {
    server::start_signal_handler().map_err(|e| AppError::Runtime(e.to_string()))?;

    // Reject a bad poll path before anything is bound
    let source = RefreshSource::new(args.server.poll.as_deref())?;

    let addr = args.server.listen.to_socket_addr()?;
    let listener = server::create_listener(addr, settings.performance.backlog)?;
    let local_addr = listener.local_addr().unwrap_or(addr);
    logger::log_server_start(&local_addr, &args.server, &settings);

    // Connections queue in the backlog until the first version is cached
    let content = Arc::new(ContentCache::new());
    {
        let source = source.clone();
        let content = Arc::clone(&content);
        tokio::task::spawn_blocking(move || source.initial_fill(&content))
            .await
            .map_err(|e| AppError::Runtime(e.to_string()))??;
    }

    let _poller = source
        .spawn_poller(Arc::clone(&content))
        .map_err(|e| AppError::Runtime(e.to_string()))?;

    let state = Arc::new(AppState::new(args.server, settings, content));
    server::start_server_loop(listener, state).await;
    Ok(())
}
