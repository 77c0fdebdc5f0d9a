//! 国际象棋会话客户端
//!
//! 远端负责判定合法性、维护对局和运行引擎；客户端只负责展示权威状态、
//! 把用户手势翻译为命令，并处理升变选择。

pub mod board;
pub mod console;
pub mod game;
pub mod network;
pub mod settings;

pub use board::{status_line, BoardView, Orientation};
pub use game::{
    ButtonKind, GameStateStore, Gesture, InteractionController, InteractionOutcome,
    PromotionNegotiator, PromotionRequest, StoreSnapshot,
};
pub use network::{
    SessionAction, SessionController, SessionEvent, SessionNotice, SessionOptions,
    SessionRunner, SessionSnapshot,
};
pub use settings::{ClientSettings, LogLevel, SettingsError};
