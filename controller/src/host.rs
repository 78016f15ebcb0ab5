use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::Context;
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::mpsc::{self, error::TryRecvError, error::TrySendError},
    time::MissedTickBehavior,
};
use tracing::{info, warn};

use fermenter_common::{board::Storage, Controller, InputEvent, RuntimeConfig};

use crate::board::{FileStorage, HostBoard};

const INPUT_QUEUE_DEPTH: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HostCommand {
    Input(InputEvent),
    Quit,
}

pub async fn run() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = match std::env::var("FERMENTER_CONFIG") {
        Ok(path) => load_runtime_config(Path::new(&path))
            .await
            .unwrap_or_else(|err| {
                warn!("failed to load runtime config: {err:#}");
                RuntimeConfig::default()
            }),
        Err(_) => RuntimeConfig::default(),
    };
    let data_dir = std::env::var("FERMENTER_DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("./.fermenter"));

    let storage = FileStorage::new(&data_dir, &config.storage);
    let board = HostBoard::new(&config.simulation, storage);
    let mut controller = Controller::new(board, &config);
    info!(
        "fermenter controller running, data in {} (+/u up, -/d down, enter/c confirm, x clear, q quit)",
        data_dir.display()
    );

    let (tx, mut rx) = mpsc::channel(INPUT_QUEUE_DEPTH);
    spawn_input_reader(tx);

    let mut interval =
        tokio::time::interval(Duration::from_millis(config.timing.loop_period_ms.max(1)));
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);
    let mut input_open = true;

    'main: loop {
        tokio::select! {
            _ = interval.tick() => {}
            _ = &mut shutdown => {
                info!("interrupted");
                break;
            }
        }

        while input_open {
            match rx.try_recv() {
                Ok(HostCommand::Input(input)) => controller.handle_input(input),
                Ok(HostCommand::Quit) => break 'main,
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    info!("stdin closed, running without input");
                    input_open = false;
                }
            }
        }

        // Sensor and storage access block like the real drivers do.
        tokio::task::block_in_place(|| controller.poll());
        controller.board_mut().present();
    }

    controller.board_mut().close_log();
    info!("stopped");
    Ok(())
}

async fn load_runtime_config(path: &Path) -> anyhow::Result<RuntimeConfig> {
    let mut config = match tokio::fs::read(path).await {
        Ok(raw) => serde_json::from_slice::<RuntimeConfig>(&raw)
            .with_context(|| format!("invalid runtime config in {}", path.display()))?,
        Err(err) if err.kind() == ErrorKind::NotFound => RuntimeConfig::default(),
        Err(err) => {
            return Err(err).with_context(|| format!("failed to read {}", path.display()))
        }
    };
    config.settings.sanitize();
    Ok(config)
}

fn spawn_input_reader(tx: mpsc::Sender<HostCommand>) {
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            let line = match lines.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => break,
                Err(err) => {
                    warn!("stdin read failed: {err}");
                    break;
                }
            };

            let Some(command) = parse_command(&line) else {
                warn!("unrecognised input `{}`", line.trim());
                continue;
            };
            match tx.try_send(command) {
                Ok(()) => {}
                Err(TrySendError::Full(command)) => warn!("input queue full, dropping {command:?}"),
                Err(TrySendError::Closed(_)) => break,
            }
        }
    });
}

fn parse_command(line: &str) -> Option<HostCommand> {
    let command = match line.trim() {
        "" | "c" => HostCommand::Input(InputEvent::ConfirmPressed),
        "+" | "u" => HostCommand::Input(InputEvent::EncoderStep(1)),
        "-" | "d" => HostCommand::Input(InputEvent::EncoderStep(-1)),
        "x" => HostCommand::Input(InputEvent::ClearPressed),
        "q" => HostCommand::Quit,
        _ => return None,
    };
    Some(command)
}
