use anyhow::{Context, Result};
use chess_client::console::{parse_line, ConsoleCommand, HELP};
use chess_client::{
    status_line, BoardView, ClientSettings, SessionController, SessionEvent, SessionOptions,
    SessionRunner, SessionSnapshot,
};
use protocol::{Connector, TcpConnector};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    let settings = ClientSettings::load();

    // 初始化日志
    let mut filter = tracing_subscriber::EnvFilter::from_default_env();
    for directive in settings.log_level.directives() {
        filter = filter.add_directive(directive.parse()?);
    }
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    // 首次运行时写出默认设置，便于手动修改
    if ClientSettings::settings_path().is_some_and(|path| !path.exists()) {
        if let Err(e) = settings.save() {
            warn!("Failed to write default settings: {}", e);
        }
    }

    let addr = std::env::args()
        .nth(1)
        .unwrap_or_else(|| settings.server_address.clone());

    info!("Connecting to {}", addr);
    let connection = TcpConnector
        .connect(&addr)
        .await
        .with_context(|| format!("failed to connect to {}", addr))?;

    let (gesture_tx, gesture_rx) = mpsc::channel(32);
    let (event_tx, mut event_rx) = mpsc::channel(64);
    let controller = SessionController::new(SessionOptions::from(&settings));
    let runner = SessionRunner::new(connection, controller, gesture_rx, event_tx);
    let session = tokio::spawn(runner.run());

    println!("{}", HELP);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            event = event_rx.recv() => match event {
                Some(event) => print_event(&event),
                None => break,
            },
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                match parse_line(&line) {
                    Ok(Some(ConsoleCommand::Gesture(gesture))) => {
                        if gesture_tx.send(gesture).await.is_err() {
                            break;
                        }
                    }
                    Ok(Some(ConsoleCommand::Quit)) => break,
                    Ok(None) => {}
                    Err(e) => println!("{}", e),
                }
            }
        }
    }

    // 关闭手势来源后会话自行结束
    drop(gesture_tx);
    while let Some(event) = event_rx.recv().await {
        print_event(&event);
    }
    session.await??;
    Ok(())
}

fn print_event(event: &SessionEvent) {
    match event {
        SessionEvent::Render(snapshot) => print_board(snapshot),
        SessionEvent::Feedback(outcome) => println!("> {:?}", outcome),
        SessionEvent::Notice(notice) if notice.is_fatal() => eprintln!("{}", notice),
        SessionEvent::Notice(notice) => println!("{}", notice),
    }
}

fn print_board(snapshot: &SessionSnapshot) {
    if let Some(board) = BoardView::from_position(&snapshot.store.game.position) {
        let mut highlights = Vec::new();
        if let Some(square) = snapshot.selected {
            highlights.push(square);
            highlights.extend(snapshot.store.legal_moves.targets_from(square));
        }
        print!("{}", board.render(snapshot.orientation, &highlights));
    }
    println!("{}", status_line(&snapshot.store));
    if let Some(request) = &snapshot.promotion {
        println!("promote to: {:?}", request.candidate_chars());
    }
}
