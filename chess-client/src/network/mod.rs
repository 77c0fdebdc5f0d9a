//! 会话控制
//!
//! `SessionController` 是对局状态的唯一写入方。每个入站帧和每个手势
//! 都是一次纯状态转换，返回需要执行的 `SessionAction`，由驱动层负责
//! 真正的收发与显示。

mod connection;

pub use connection::*;

use chrono::{DateTime, Utc};
use protocol::{ClientCommand, Role, ServerCommand, StateUpdate, WireCommand, WireFormat};
use tracing::{debug, error, info, warn};

use crate::board::Orientation;
use crate::game::{
    GameStateStore, Gesture, InteractionController, InteractionOutcome, PendingMove,
    PromotionRequest, StoreSnapshot,
};
use crate::settings::ClientSettings;

/// 会话选项
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOptions {
    pub wire_format: WireFormat,
    pub think_seconds: u32,
    pub auto_request_legals: bool,
    pub follow_role_orientation: bool,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self::from(&ClientSettings::default())
    }
}

impl From<&ClientSettings> for SessionOptions {
    fn from(settings: &ClientSettings) -> Self {
        Self {
            wire_format: settings.wire_format,
            think_seconds: settings.think_seconds,
            auto_request_legals: settings.auto_request_legals,
            follow_role_orientation: settings.follow_role_orientation,
        }
    }
}

/// 提示类型
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoticeKind {
    /// 连接已关闭，会话结束
    ChannelClosed { reason: String },
    /// 分配了新角色
    RoleAssigned(Role),
    /// 对局结束
    GameOver(protocol::TerminalReason),
}

/// 面向用户的提示
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionNotice {
    pub kind: NoticeKind,
    pub at: DateTime<Utc>,
}

impl SessionNotice {
    fn new(kind: NoticeKind) -> Self {
        Self { kind, at: Utc::now() }
    }

    /// 是否导致会话结束
    pub fn is_fatal(&self) -> bool {
        matches!(self.kind, NoticeKind::ChannelClosed { .. })
    }
}

impl std::fmt::Display for SessionNotice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] ", self.at.format("%H:%M:%S"))?;
        match &self.kind {
            NoticeKind::ChannelClosed { reason } => write!(f, "connection closed: {}", reason),
            NoticeKind::RoleAssigned(role) => write!(f, "you are {}", role),
            NoticeKind::GameOver(reason) => write!(f, "game over: {:?}", reason),
        }
    }
}

/// 会话动作
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionAction {
    /// 发送一帧（已编码）
    Send(String),
    /// 权威状态已变化，需要重绘
    Render,
    /// 手势的本地反馈
    Feedback(InteractionOutcome),
    /// 用户提示
    Notice(SessionNotice),
}

/// 供显示层读取的会话快照
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub store: StoreSnapshot,
    pub orientation: Orientation,
    pub selected: Option<protocol::Square>,
    pub pending_move: Option<PendingMove>,
    pub promotion: Option<PromotionRequest>,
    pub closed: bool,
}

/// 会话控制器
#[derive(Debug)]
pub struct SessionController {
    store: GameStateStore,
    interaction: InteractionController,
    options: SessionOptions,
    /// 已为哪个局面代数请求过合法走法
    legals_requested: Option<u64>,
    closed: bool,
}

impl SessionController {
    pub fn new(options: SessionOptions) -> Self {
        Self {
            store: GameStateStore::new(),
            interaction: InteractionController::new(Orientation::WhiteBottom),
            options,
            legals_requested: None,
            closed: false,
        }
    }

    pub fn store(&self) -> &GameStateStore {
        &self.store
    }

    pub fn interaction(&self) -> &InteractionController {
        &self.interaction
    }

    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    /// 会话是否已结束
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// 会话快照
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            store: self.store.snapshot(),
            orientation: self.interaction.orientation(),
            selected: self.interaction.selected(),
            pending_move: self.interaction.pending_move(),
            promotion: self.interaction.promotion().cloned(),
            closed: self.closed,
        }
    }

    /// 会话开始时的动作：请求合法走法
    ///
    /// 角色由远端分配，这里不会自动发送 `play`。
    pub fn start(&mut self) -> Vec<SessionAction> {
        if self.closed {
            return Vec::new();
        }
        self.legals_requested = Some(self.store.game().position_generation);
        vec![self.send(&ClientCommand::RequestLegalMoves)]
    }

    /// 处理一个入站帧
    pub fn handle_frame(&mut self, frame: &str) -> Vec<SessionAction> {
        if self.closed {
            return Vec::new();
        }

        let command = match ServerCommand::decode(frame) {
            Ok(command) => command,
            Err(e) => {
                warn!("Discarding malformed frame {:?}: {}", frame, e);
                return Vec::new();
            }
        };
        debug!("Received: {:?}", command);

        let mut actions = Vec::new();
        match command {
            ServerCommand::Info { role, moves } => {
                self.assign_role(role, &mut actions);
                self.refresh_legals(moves);
                actions.push(SessionAction::Render);
            }
            ServerCommand::Role { role } => {
                self.assign_role(role, &mut actions);
                actions.push(SessionAction::Render);
                self.maybe_request_legals(&mut actions);
            }
            ServerCommand::Legals { moves } => {
                self.refresh_legals(moves);
                actions.push(SessionAction::Render);
            }
            ServerCommand::State(update) => self.apply_state(&update, &mut actions),
        }
        actions
    }

    /// 处理一个用户手势
    pub fn handle_gesture(&mut self, gesture: Gesture) -> Vec<SessionAction> {
        if self.closed {
            return Vec::new();
        }

        let snapshot = self.store.snapshot();
        let outcome = self
            .interaction
            .handle(&snapshot, gesture, self.options.think_seconds);

        let mut actions = Vec::new();
        match &outcome {
            InteractionOutcome::Emit(command) => actions.push(self.send(command)),
            InteractionOutcome::Flipped(_) => actions.push(SessionAction::Render),
            _ => {}
        }
        actions.push(SessionAction::Feedback(outcome));
        actions
    }

    /// 连接已关闭；只在第一次调用时产生提示
    pub fn handle_channel_closed(&mut self, reason: &str) -> Vec<SessionAction> {
        if self.closed {
            return Vec::new();
        }
        self.closed = true;
        error!("Channel closed: {}", reason);
        vec![SessionAction::Notice(SessionNotice::new(
            NoticeKind::ChannelClosed {
                reason: reason.to_string(),
            },
        ))]
    }

    fn send(&self, command: &ClientCommand) -> SessionAction {
        let frame = command.encode(self.options.wire_format);
        debug!("Sending frame: {}", frame);
        SessionAction::Send(frame)
    }

    fn assign_role(&mut self, role: Role, actions: &mut Vec<SessionAction>) {
        if !self.store.set_role(role) {
            return;
        }
        info!("Assigned role: {}", role);
        self.interaction.on_role_changed();
        if self.options.follow_role_orientation {
            self.interaction.set_orientation(Orientation::for_role(role));
        }
        actions.push(SessionAction::Notice(SessionNotice::new(
            NoticeKind::RoleAssigned(role),
        )));
    }

    fn refresh_legals(&mut self, moves: Vec<protocol::MoveString>) {
        debug!("Legal moves refreshed: {} moves", moves.len());
        self.store.replace_legal_moves(moves);
        self.interaction.on_legals_refreshed();
    }

    fn apply_state(&mut self, update: &StateUpdate, actions: &mut Vec<SessionAction>) {
        let outcome = match self.store.apply(update) {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!("Discarding invalid state update: {}", e);
                return;
            }
        };

        self.interaction.on_state_update(outcome.position_changed);
        if outcome.adopted_suggestion {
            debug!("Suggested move adopted");
        }

        if outcome.changed {
            actions.push(SessionAction::Render);
        }
        if outcome.became_terminal {
            let reason = self.store.game().terminal_reason;
            info!("Game over: {:?}", reason);
            actions.push(SessionAction::Notice(SessionNotice::new(
                NoticeKind::GameOver(reason),
            )));
        }
        if outcome.position_changed {
            self.maybe_request_legals(actions);
        }
    }

    /// 轮到本方且合法走法过期时请求刷新，每个局面只请求一次
    fn maybe_request_legals(&mut self, actions: &mut Vec<SessionAction>) {
        let generation = self.store.game().position_generation;
        if !self.options.auto_request_legals
            || !self.store.is_my_turn()
            || self.store.legal_moves_current()
            || self.legals_requested == Some(generation)
        {
            return;
        }
        self.legals_requested = Some(generation);
        actions.push(self.send(&ClientCommand::RequestLegalMoves));
    }
}
