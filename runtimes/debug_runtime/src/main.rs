// Debug Runtime - HTTP-controlled game runtime for testing and automation
//
// Runs the testing grounds headless: no headset, no window. Tracking and
// button state come from the HTTP API instead of a VR runtime, so scripts
// can drive climbing, teleporting and movement and read back the result.

mod commands;

use std::{
    net::SocketAddr,
    path::PathBuf,
    sync::mpsc,
    thread,
    time::{Duration, Instant},
};

use anyhow::Context;
use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use clap::Parser;
use serde_json::{json, Value};
use tokio::{signal, sync::oneshot};
use tracing::{info, warn};

use engine::profile;
use vrgrounds::{
    command::Command,
    config::LocomotionConfig,
    hand::NullHapticDevice,
    input_context::InputContext,
    level::LevelDefinition,
    time::Time,
    Game,
};

use crate::commands::{
    ActionRequest, CommandResult, FrameSnapshot, InputPatch, RuntimeCommand, StepResult, StepSpec,
    TimeInfo,
};

#[derive(Parser)]
#[command(name = "debug_runtime")]
#[command(about = "HTTP-controlled runtime for the VR testing grounds")]
struct Args {
    /// Level file to load (JSON). Defaults to the built-in testing grounds.
    #[arg(short, long)]
    level: Option<PathBuf>,

    /// Locomotion config file (TOML). Defaults to built-in values.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port to bind HTTP server to
    #[arg(short, long, default_value = "8080")]
    port: u16,

    /// Simulation rate in frames per second
    #[arg(long, default_value = "90")]
    hz: u32,

    /// Only advance the simulation through /v1/step
    #[arg(long)]
    manual_step: bool,
}

type CommandSender = mpsc::Sender<RuntimeCommand>;

fn main() -> anyhow::Result<()> {
    engine::logging::init_logging("VRGROUNDS_LOG");

    let args = Args::parse();
    anyhow::ensure!(args.hz > 0, "--hz must be at least 1");

    let config = match &args.config {
        Some(path) => LocomotionConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => LocomotionConfig::default(),
    };
    let level = match &args.level {
        Some(path) => LevelDefinition::load(path)
            .with_context(|| format!("loading level {}", path.display()))?,
        None => LevelDefinition::testing_grounds(),
    };

    info!(
        "Starting debug runtime on port {} with level '{}' at {} Hz{}",
        args.port,
        level.name,
        args.hz,
        if args.manual_step { " (manual step)" } else { "" }
    );

    let game = Game::init(config, &level, Box::new(NullHapticDevice))
        .context("initializing game")?;

    let (command_tx, command_rx) = mpsc::channel();
    let (stopped_tx, stopped_rx) = oneshot::channel();
    let frame = Duration::from_nanos(1_000_000_000 / u64::from(args.hz));
    let manual_step = args.manual_step;
    let game_thread = thread::Builder::new()
        .name("game".to_string())
        .spawn(move || {
            run_game_loop(game, command_rx, frame, manual_step);
            let _ = stopped_tx.send(());
        })
        .context("spawning game thread")?;

    // Create a tokio runtime for the HTTP server
    let rt = tokio::runtime::Runtime::new()?;
    let server_result = rt.block_on(start_http_server(args.port, command_tx, stopped_rx));

    // The server's senders are gone by now, so the loop ends if it hasn't already
    if game_thread.join().is_err() {
        warn!("Game thread panicked");
    }

    server_result
}

/// Start the HTTP server
async fn start_http_server(
    port: u16,
    commands: CommandSender,
    game_stopped: oneshot::Receiver<()>,
) -> anyhow::Result<()> {
    let app = Router::new()
        .route("/v1/health", get(health_check))
        .route("/v1/info", get(get_info))
        .route("/v1/step", post(step))
        .route("/v1/input", post(set_input))
        .route("/v1/action", post(run_action))
        .route("/v1/shutdown", post(shutdown))
        .with_state(commands.clone());

    // Bind to localhost only for security
    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    info!("Debug runtime listening on http://{}", addr);

    info!("Available endpoints:");
    info!("  GET  /v1/health           - Health check and server status");
    info!("  GET  /v1/info             - Character, hands, teleport and comfort state");
    info!("  POST /v1/step             - {{\"frames\": n}} or {{\"duration\": \"2s\"}}");
    info!("  POST /v1/input            - {{\"channel\": \"right_hand.squeeze\", \"value\": 1.0}}");
    info!("  POST /v1/action           - {{\"action\": \"Teleport\"}}, {{\"axis\": ..}}, {{\"position\": ..}}");
    info!("  POST /v1/shutdown         - Stop the runtime");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {}", addr))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(commands, game_stopped))
        .await?;

    Ok(())
}

struct LoopState {
    game: Game,
    input: InputContext,
    pending: Vec<Box<dyn Command>>,
    time: Time,
    frame: Duration,
    manual_step: bool,
}

impl LoopState {
    fn tick(&mut self) {
        self.time = Time::from_delta(self.frame, &self.time);
        let commands = std::mem::take(&mut self.pending);
        profile!(
            "game.update",
            self.game.update(&self.time, &self.input, commands)
        );
    }

    fn snapshot(&self) -> FrameSnapshot {
        FrameSnapshot {
            time: TimeInfo {
                elapsed_ms: self.time.elapsed.as_secs_f32() * 1000.0,
                total_ms: self.time.total.as_secs_f32() * 1000.0,
            },
            manual_step: self.manual_step,
            game: self.game.snapshot(),
            inputs: self.input.clone(),
        }
    }

    // Returns false once the loop should stop
    fn handle(&mut self, command: RuntimeCommand) -> bool {
        match command {
            RuntimeCommand::GetInfo(reply) => {
                let _ = reply.send(self.snapshot());
            }
            RuntimeCommand::Step(spec, reply) => match spec.frame_count(self.frame) {
                Ok(frames) => {
                    for _ in 0..frames {
                        self.tick();
                    }
                    let _ = reply.send(StepResult {
                        frames_advanced: frames,
                        time_advanced: self.frame.as_secs_f32() * frames as f32,
                        new_frame_index: self.game.frame(),
                        new_total_time: self.time.total.as_secs_f32(),
                    });
                }
                Err(err) => {
                    warn!("Rejected step: {}", err);
                    // Dropping the reply reports the failure to the handler
                }
            },
            RuntimeCommand::SetInput(patch, reply) => {
                let result = match patch.apply(&mut self.input) {
                    Ok(()) => CommandResult::ok(format!("{} set", patch.channel)),
                    Err(err) => CommandResult::failed(err),
                };
                let _ = reply.send(result);
            }
            RuntimeCommand::RunAction(request, reply) => {
                let result = match request.into_command() {
                    Ok(command) => {
                        self.pending.push(command);
                        CommandResult::ok("queued for next frame")
                    }
                    Err(err) => CommandResult::failed(err),
                };
                let _ = reply.send(result);
            }
            RuntimeCommand::Shutdown => return false,
        }
        true
    }
}

/// Run the game loop until shutdown or until the server goes away
fn run_game_loop(
    game: Game,
    commands: mpsc::Receiver<RuntimeCommand>,
    frame: Duration,
    manual_step: bool,
) {
    let mut state = LoopState {
        game,
        input: InputContext::default(),
        pending: Vec::new(),
        time: Time::default(),
        frame,
        manual_step,
    };

    info!("Starting main game loop...");

    if manual_step {
        while let Ok(command) = commands.recv() {
            if !state.handle(command) {
                break;
            }
        }
    } else {
        let mut next_frame = Instant::now();
        'game: loop {
            loop {
                match commands.try_recv() {
                    Ok(command) => {
                        if !state.handle(command) {
                            break 'game;
                        }
                    }
                    Err(mpsc::TryRecvError::Empty) => break,
                    Err(mpsc::TryRecvError::Disconnected) => break 'game,
                }
            }

            state.tick();

            next_frame += frame;
            let now = Instant::now();
            if next_frame > now {
                thread::sleep(next_frame - now);
            } else {
                // Fell behind; don't try to catch up
                next_frame = now;
            }
        }
    }

    info!("Game loop ended after {} frames", state.game.frame());
}

async fn request<T>(
    commands: &CommandSender,
    make: impl FnOnce(oneshot::Sender<T>) -> RuntimeCommand,
) -> Result<T, (StatusCode, Json<Value>)> {
    let (reply_tx, reply_rx) = oneshot::channel();
    commands
        .send(make(reply_tx))
        .map_err(|_| unavailable("game loop is not running"))?;
    reply_rx
        .await
        .map_err(|_| (StatusCode::BAD_REQUEST, Json(json!({ "error": "request rejected" }))))
}

fn unavailable(message: &str) -> (StatusCode, Json<Value>) {
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(json!({ "error": message })),
    )
}

fn command_response(result: CommandResult) -> (StatusCode, Json<Value>) {
    let status = if result.success {
        StatusCode::OK
    } else {
        StatusCode::BAD_REQUEST
    };
    (status, Json(json!(result)))
}

/// Health check endpoint
async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "debug_runtime",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

async fn get_info(
    State(commands): State<CommandSender>,
) -> Result<Json<FrameSnapshot>, (StatusCode, Json<Value>)> {
    request(&commands, RuntimeCommand::GetInfo).await.map(Json)
}

async fn step(
    State(commands): State<CommandSender>,
    Json(spec): Json<StepSpec>,
) -> Result<Json<StepResult>, (StatusCode, Json<Value>)> {
    request(&commands, |reply| RuntimeCommand::Step(spec, reply))
        .await
        .map(Json)
}

async fn set_input(
    State(commands): State<CommandSender>,
    Json(patch): Json<InputPatch>,
) -> Result<(StatusCode, Json<Value>), (StatusCode, Json<Value>)> {
    request(&commands, |reply| RuntimeCommand::SetInput(patch, reply))
        .await
        .map(command_response)
}

async fn run_action(
    State(commands): State<CommandSender>,
    Json(action): Json<ActionRequest>,
) -> Result<(StatusCode, Json<Value>), (StatusCode, Json<Value>)> {
    request(&commands, |reply| RuntimeCommand::RunAction(action, reply))
        .await
        .map(command_response)
}

async fn shutdown(State(commands): State<CommandSender>) -> Json<Value> {
    info!("Shutdown requested over HTTP");
    let _ = commands.send(RuntimeCommand::Shutdown);
    Json(json!({ "status": "shutting down" }))
}

/// Wait for Ctrl+C, SIGTERM or the game loop stopping
async fn shutdown_signal(commands: CommandSender, game_stopped: oneshot::Receiver<()>) {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                warn!("Failed to install signal handler: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down gracefully...");
        },
        _ = terminate => {
            info!("Received SIGTERM, shutting down gracefully...");
        },
        _ = game_stopped => {
            info!("Game loop stopped, shutting down server...");
        },
    }

    let _ = commands.send(RuntimeCommand::Shutdown);
}
