//! 命令类型定义
//!
//! 协议边界上只解码一次，之后全部使用这里的封闭枚举做穷尽匹配。

use serde::{Deserialize, Serialize};

use crate::moves::MoveString;
use crate::piece::{Mover, Role, TerminalReason};

/// 客户端发送给远端的命令
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum ClientCommand {
    /// 请求当前局面的合法走法
    #[serde(rename = "legals")]
    RequestLegalMoves,
    /// 走棋（可带升变后缀）
    #[serde(rename = "move")]
    SubmitMove { mv: MoveString },
    /// 请求加入对局 / 分配角色
    #[serde(rename = "play")]
    RequestPlay,
    /// 悔棋
    #[serde(rename = "undo")]
    RequestUndo,
    /// 重做
    #[serde(rename = "redo")]
    RequestRedo,
    /// 请求远端分析 N 秒
    #[serde(rename = "think")]
    RequestThink { seconds: u32 },
    /// 请求远端分析 N 秒后直接走出最佳着法
    #[serde(rename = "think_and_play")]
    RequestThinkAndPlay { seconds: u32 },
    /// 取消正在进行的分析
    #[serde(rename = "stop")]
    RequestStopThinking,
    /// 采纳最近一次建议着法
    #[serde(rename = "do")]
    RequestAdoptSuggestedMove,
    /// 请求远端重发完整状态
    #[serde(rename = "all")]
    RequestFullState,
}

impl ClientCommand {
    /// 分词格式中的首个标记
    pub fn token(&self) -> &'static str {
        match self {
            ClientCommand::RequestLegalMoves => "legals",
            ClientCommand::SubmitMove { .. } => "move",
            ClientCommand::RequestPlay => "play",
            ClientCommand::RequestUndo => "undo",
            ClientCommand::RequestRedo => "redo",
            ClientCommand::RequestThink { .. } => "think",
            ClientCommand::RequestThinkAndPlay { .. } => "thinkplay",
            ClientCommand::RequestStopThinking => "stop",
            ClientCommand::RequestAdoptSuggestedMove => "do",
            ClientCommand::RequestFullState => "all",
        }
    }
}

/// 远端推送给客户端的命令
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ServerCommand {
    /// 角色分配并附带合法走法
    Info {
        role: Role,
        #[serde(default)]
        moves: Vec<MoveString>,
    },
    /// 角色（重新）分配
    Role { role: Role },
    /// 当前局面的完整合法走法集合
    Legals {
        #[serde(default)]
        moves: Vec<MoveString>,
    },
    /// 状态更新
    State(StateUpdate),
}

/// 状态更新负载
///
/// 所有字段都是可选的；出现的字段要么一起提交，要么都不提交。
/// 入站的 `terminal` 也可以是布尔值，旧对端还会发送 `draw` 布尔字段。
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "WireStateUpdate")]
pub struct StateUpdate {
    /// 局面字符串（FEN 风格）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<String>,
    /// 历史走法
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub history_plies: Option<Vec<String>>,
    /// 终局状态
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub terminal: Option<TerminalReason>,
    /// 轮到哪一方走棋；缺省时从局面字符串推导
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub turn: Option<Role>,
    /// 走子方由人还是引擎操控
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mover: Option<Mover>,
    /// 引擎是否正在思考
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thinking: Option<bool>,
    /// 引擎最近一次建议着法
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_suggested_move: Option<MoveString>,
    /// 引擎最近一次搜索深度
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_search_depth: Option<u32>,
}

/// 入站 `terminal` 字段的两种写法
#[derive(Deserialize)]
#[serde(untagged)]
enum TerminalField {
    Reason(TerminalReason),
    Flag(bool),
}

/// 入站状态更新的线上形式
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireStateUpdate {
    #[serde(default)]
    position: Option<String>,
    #[serde(default)]
    history_plies: Option<Vec<String>>,
    #[serde(default)]
    terminal: Option<TerminalField>,
    #[serde(default)]
    draw: Option<bool>,
    #[serde(default)]
    turn: Option<Role>,
    #[serde(default)]
    mover: Option<Mover>,
    #[serde(default)]
    thinking: Option<bool>,
    #[serde(default)]
    last_suggested_move: Option<MoveString>,
    #[serde(default)]
    last_search_depth: Option<u32>,
}

impl TryFrom<WireStateUpdate> for StateUpdate {
    type Error = &'static str;

    fn try_from(wire: WireStateUpdate) -> Result<Self, Self::Error> {
        let draw = wire.draw == Some(true);
        let terminal = match wire.terminal {
            Some(TerminalField::Reason(reason)) if draw && reason != TerminalReason::Draw => {
                return Err("draw flag contradicts terminal reason");
            }
            Some(TerminalField::Reason(reason)) => Some(reason),
            Some(TerminalField::Flag(false)) if draw => {
                return Err("draw flag contradicts terminal: false");
            }
            Some(TerminalField::Flag(false)) => Some(TerminalReason::None),
            Some(TerminalField::Flag(true)) | None if draw => Some(TerminalReason::Draw),
            Some(TerminalField::Flag(true)) => return Err("terminal: true needs a reason"),
            None => None,
        };

        Ok(Self {
            position: wire.position,
            history_plies: wire.history_plies,
            terminal,
            turn: wire.turn,
            mover: wire.mover,
            thinking: wire.thinking,
            last_suggested_move: wire.last_suggested_move,
            last_search_depth: wire.last_search_depth,
        })
    }
}

impl StateUpdate {
    /// 只携带新局面与走子信息的更新
    pub fn position(position: impl Into<String>, turn: Role, mover: Mover) -> Self {
        Self {
            position: Some(position.into()),
            terminal: Some(TerminalReason::None),
            turn: Some(turn),
            mover: Some(mover),
            ..Default::default()
        }
    }

    /// 终局更新
    pub fn terminal(position: impl Into<String>, reason: TerminalReason) -> Self {
        Self {
            position: Some(position.into()),
            terminal: Some(reason),
            ..Default::default()
        }
    }

    /// 只携带引擎进度的更新
    pub fn engine(thinking: bool) -> Self {
        Self {
            thinking: Some(thinking),
            ..Default::default()
        }
    }

    /// 附加引擎建议
    pub fn with_suggestion(mut self, mv: MoveString, depth: u32) -> Self {
        self.last_suggested_move = Some(mv);
        self.last_search_depth = Some(depth);
        self
    }

    /// 附加历史走法
    pub fn with_history<I, S>(mut self, plies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.history_plies = Some(plies.into_iter().map(Into::into).collect());
        self
    }

    /// 是否携带引擎相关字段
    pub fn has_engine_fields(&self) -> bool {
        self.thinking.is_some()
            || self.last_suggested_move.is_some()
            || self.last_search_depth.is_some()
    }
}

/// 从局面字符串的走子方字段推导轮到谁
///
/// 局面字符串的第二个字段为 `w` 或 `b`，其余情况返回 `None`。
pub fn side_to_move(position: &str) -> Option<Role> {
    match position.split_whitespace().nth(1)? {
        "w" => Some(Role::White),
        "b" => Some(Role::Black),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const START: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

    #[test]
    fn test_client_command_json() {
        let json = serde_json::to_string(&ClientCommand::RequestThink { seconds: 5 }).unwrap();
        assert_eq!(json, r#"{"kind":"think","seconds":5}"#);

        let cmd: ClientCommand = serde_json::from_str(r#"{"kind":"move","mv":"e2e4"}"#).unwrap();
        assert_eq!(
            cmd,
            ClientCommand::SubmitMove {
                mv: MoveString::parse("e2e4").unwrap()
            }
        );

        let cmd: ClientCommand = serde_json::from_str(r#"{"kind":"do"}"#).unwrap();
        assert_eq!(cmd, ClientCommand::RequestAdoptSuggestedMove);
    }

    #[test]
    fn test_state_update_field_names() {
        let update = StateUpdate::engine(false)
            .with_suggestion(MoveString::parse("g1f3").unwrap(), 12);
        let json = serde_json::to_value(ServerCommand::State(update)).unwrap();
        assert_eq!(json["kind"], "state");
        assert_eq!(json["thinking"], false);
        assert_eq!(json["lastSuggestedMove"], "g1f3");
        assert_eq!(json["lastSearchDepth"], 12);
        assert!(json.get("position").is_none());
    }

    #[test]
    fn test_move_list_field_name() {
        let moves = vec![MoveString::parse("e2e4").unwrap()];
        let info = serde_json::to_value(ServerCommand::Info {
            role: Role::White,
            moves: moves.clone(),
        })
        .unwrap();
        let legals = serde_json::to_value(ServerCommand::Legals { moves }).unwrap();
        assert_eq!(info["moves"], legals["moves"]);
        assert!(info.get("legals").is_none());

        let cmd: ServerCommand = serde_json::from_str(r#"{"kind":"info","role":"spectator"}"#).unwrap();
        assert_eq!(
            cmd,
            ServerCommand::Info {
                role: Role::Spectator,
                moves: vec![]
            }
        );
    }

    #[test]
    fn test_state_update_missing_fields_default() {
        let cmd: ServerCommand =
            serde_json::from_str(r#"{"kind":"state","thinking":true}"#).unwrap();
        assert_eq!(cmd, ServerCommand::State(StateUpdate::engine(true)));
    }

    #[test]
    fn test_state_update_terminal_forms() {
        let decode = |json: &str| serde_json::from_str::<StateUpdate>(json);

        assert_eq!(
            decode(r#"{"terminal":"checkmate_black"}"#).unwrap().terminal,
            Some(TerminalReason::CheckmateBlack)
        );
        assert_eq!(
            decode(r#"{"terminal":false}"#).unwrap().terminal,
            Some(TerminalReason::None)
        );
        assert_eq!(
            decode(r#"{"terminal":true,"draw":true}"#).unwrap().terminal,
            Some(TerminalReason::Draw)
        );
        assert_eq!(
            decode(r#"{"draw":true}"#).unwrap().terminal,
            Some(TerminalReason::Draw)
        );
        // draw: false 不说明对局是否结束
        assert_eq!(decode(r#"{"draw":false}"#).unwrap().terminal, None);

        assert!(decode(r#"{"terminal":true}"#).is_err());
        assert!(decode(r#"{"terminal":false,"draw":true}"#).is_err());
        assert!(decode(r#"{"terminal":"checkmate_white","draw":true}"#).is_err());
        assert!(decode(r#"{"terminal":"stalemate"}"#).is_err());
    }

    #[test]
    fn test_state_update_json_round_trip() {
        let update = StateUpdate::terminal(START, TerminalReason::Draw).with_history(["e2e4"]);
        let json = serde_json::to_string(&ServerCommand::State(update.clone())).unwrap();
        let decoded: ServerCommand = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, ServerCommand::State(update));
    }

    #[test]
    fn test_side_to_move() {
        assert_eq!(side_to_move(START), Some(Role::White));
        assert_eq!(
            side_to_move("rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1"),
            Some(Role::Black)
        );
        assert_eq!(side_to_move("8/8/8/8/8/8/8/8"), None);
        assert_eq!(side_to_move("8/8/8/8/8/8/8/8 x"), None);
    }

    #[test]
    fn test_state_update_builders() {
        let update = StateUpdate::position(START, Role::White, Mover::Human);
        assert_eq!(update.terminal, Some(TerminalReason::None));
        assert!(!update.has_engine_fields());
        assert!(!StateUpdate::default().has_engine_fields());
        assert!(StateUpdate::engine(true).has_engine_fields());
    }
}
