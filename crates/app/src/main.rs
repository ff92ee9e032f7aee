//! Wellcheck - Main Entry Point

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use camera_capture::ReplayCamera;
use checkin::{CheckInStateMachine, MessageKey, Phase, SessionOutcome};
use lockdown::AttentionEscalator;
use presence::{
    DetectorStrategy, FaceAnalyzer, LocalFrameHeuristic, LocalPresenceAnalyzer, RemoteFaceDetector,
};
use storage::Repository;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use wellcheck_app::{init_logging, AppConfig, SysfsBattery, TerminalPlatform};

/// Answer at the manual check-in prompt
enum ManualChoice {
    Confirm,
    Retry,
    Quit,
}

#[tokio::main]
async fn main() -> Result<()> {
    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let config = AppConfig::load(config_path.as_deref()).context("loading configuration")?;
    init_logging(&config.log);

    info!("=== Wellcheck v{} ===", env!("CARGO_PKG_VERSION"));
    info!(
        "Check-in for {} using {:?} analyzer, frames from {}",
        config.user_id,
        config.presence.strategy,
        config.frames_dir.display()
    );

    let repo = Arc::new(Repository::new());
    match config.presence.strategy {
        DetectorStrategy::Remote => {
            let detector = RemoteFaceDetector::new(config.presence.remote.clone())
                .context("building face-analysis client")?;
            info!("Remote analysis at {}", detector.endpoint());
            run_check_in(&config, detector, Arc::clone(&repo)).await?;
        }
        DetectorStrategy::LocalHeuristic => {
            let analyzer = LocalPresenceAnalyzer::new(config.presence.heuristic.clone());
            run_check_in(&config, analyzer, Arc::clone(&repo)).await?;
        }
    }

    match repo.latest(&config.user_id)? {
        Some(record) => println!(
            "Last check-in for {}: {} (#{})",
            config.user_id,
            record.check_in.timestamp.to_rfc3339(),
            record.id
        ),
        None => println!("No check-in recorded for {}", config.user_id),
    }
    Ok(())
}

async fn run_check_in<A: FaceAnalyzer>(
    config: &AppConfig,
    analyzer: A,
    repo: Arc<Repository>,
) -> Result<()> {
    let camera = ReplayCamera::from_dir(&config.frames_dir);
    let mut machine = CheckInStateMachine::new(
        config.checkin.clone(),
        config.user_id.clone(),
        camera,
        analyzer,
        repo,
    )
    .with_heuristic(LocalFrameHeuristic::new(config.presence.heuristic.clone()))
    .with_telemetry(SysfsBattery::default());

    let platform = Arc::new(TerminalPlatform::new());
    let mut lockdown = AttentionEscalator::new(Arc::clone(&platform), config.lockdown.clone());
    lockdown.set_active(true);

    let cancel = CancellationToken::new();
    let ctrl_c = tokio::spawn(watch_ctrl_c(Arc::clone(&platform), cancel.clone()));

    // Render state changes as status lines
    let mut states = machine.subscribe();
    let printer = tokio::spawn(async move {
        let mut last = String::new();
        while states.changed().await.is_ok() {
            let state = states.borrow_and_update().clone();
            if !state.guidance.is_empty() && state.guidance != last {
                println!("[{:?}] {}", state.indicator, state.guidance);
                last = state.guidance;
            }
        }
    });

    let mut stdin = BufReader::new(tokio::io::stdin()).lines();
    loop {
        match machine.run(&cancel).await {
            SessionOutcome::CheckedIn => break,
            SessionOutcome::Cancelled => {
                warn!("Check-in cancelled");
                break;
            }
            SessionOutcome::ManualFallback(reason) => {
                info!("Waiting for manual confirmation ({:?})", reason);
                println!(
                    "{}: press Enter. Type 'r' to retry the camera, 'q' to quit.",
                    machine.messages().text(MessageKey::ManualCheckIn)
                );
                match prompt(&mut stdin, &cancel).await? {
                    ManualChoice::Confirm => {
                        machine.confirm_manually().await;
                        break;
                    }
                    ManualChoice::Retry => continue,
                    ManualChoice::Quit => {
                        machine.close();
                        break;
                    }
                }
            }
        }
    }

    lockdown.set_active(false);
    if machine.phase() == Phase::Success {
        if let Some(e) = machine.last_storage_error() {
            warn!("Check-in was confirmed but not stored: {}", e);
        }
        machine.hold_confirmation().await;
    }
    machine.close();

    ctrl_c.abort();
    printer.abort();
    Ok(())
}

/// First Ctrl-C while guarded only warns; the next one cancels
async fn watch_ctrl_c(platform: Arc<TerminalPlatform>, cancel: CancellationToken) {
    let mut warned = false;
    while tokio::signal::ctrl_c().await.is_ok() {
        if platform.navigation_guarded() && !warned {
            warned = true;
            println!("A check-in is due. Press Ctrl-C again to leave anyway.");
            continue;
        }
        cancel.cancel();
        break;
    }
}

async fn prompt(
    stdin: &mut Lines<BufReader<Stdin>>,
    cancel: &CancellationToken,
) -> Result<ManualChoice> {
    let line = tokio::select! {
        line = stdin.next_line() => line.context("reading stdin")?,
        _ = cancel.cancelled() => return Ok(ManualChoice::Quit),
    };
    Ok(match line.as_deref().map(str::trim) {
        // EOF counts as quitting
        None => ManualChoice::Quit,
        Some("r") | Some("R") => ManualChoice::Retry,
        Some("q") | Some("Q") => ManualChoice::Quit,
        Some(_) => ManualChoice::Confirm,
    })
}
