//! 协议编解码
//!
//! 两种线上格式：
//! - 结构化（规范格式）：`{"kind": "...", ...}` 形式的 JSON 对象
//! - 分词（兼容格式）：空格分隔的文本命令，例如 `move e2e4`、`update <局面> w`
//!
//! 入站帧自动识别格式：首个非空白字符为 `{` 的按结构化解析，其余按分词解析。
//! 两种格式解码后得到相同的内部命令。

use serde::{Deserialize, Serialize};

use crate::constants::HISTORY_SEPARATOR;
use crate::error::DecodeError;
use crate::message::{ClientCommand, ServerCommand, StateUpdate};
use crate::moves::MoveString;
use crate::piece::{Mover, Role, TerminalReason};

/// 线上格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum WireFormat {
    /// 结构化 JSON
    #[default]
    Structured,
    /// 空格分隔的文本命令
    Tokenized,
}

/// 可在线上传输的命令
pub trait WireCommand: Sized {
    /// 编码为一帧文本
    fn encode(&self, format: WireFormat) -> String;

    /// 从一帧文本解码
    fn decode(frame: &str) -> Result<Self, DecodeError>;
}

/// 帧格式识别结果
enum Frame<'a> {
    Structured(&'a str),
    Tokens(&'a str, Vec<&'a str>),
}

fn split_frame(frame: &str) -> Result<Frame<'_>, DecodeError> {
    let trimmed = frame.trim();
    if trimmed.is_empty() {
        return Err(DecodeError::EmptyFrame);
    }
    if trimmed.starts_with('{') {
        return Ok(Frame::Structured(trimmed));
    }
    let mut tokens = trimmed.split_whitespace();
    let head = tokens.next().ok_or(DecodeError::EmptyFrame)?;
    Ok(Frame::Tokens(head, tokens.collect()))
}

fn expect_args(
    command: &'static str,
    expected: &'static str,
    args: &[&str],
    ok: bool,
) -> Result<(), DecodeError> {
    if ok {
        Ok(())
    } else {
        Err(DecodeError::ArgumentCount {
            command,
            expected,
            actual: args.len(),
        })
    }
}

fn bare(
    command: &'static str,
    args: &[&str],
    value: ClientCommand,
) -> Result<ClientCommand, DecodeError> {
    expect_args(command, "0", args, args.is_empty())?;
    Ok(value)
}

fn parse_seconds(command: &'static str, args: &[&str]) -> Result<u32, DecodeError> {
    expect_args(command, "1", args, args.len() == 1)?;
    args[0].parse().map_err(|_| DecodeError::InvalidInteger {
        text: args[0].to_string(),
    })
}

fn parse_role(code: &str) -> Result<Role, DecodeError> {
    Role::from_code(code).ok_or_else(|| DecodeError::InvalidRole {
        code: code.to_string(),
    })
}

/// 解析以逗号和/或空格分隔的走法列表
fn parse_move_list(args: &[&str]) -> Result<Vec<MoveString>, DecodeError> {
    args.iter()
        .flat_map(|arg| arg.split(HISTORY_SEPARATOR))
        .filter(|s| !s.is_empty())
        .map(MoveString::parse)
        .collect()
}

fn join_moves(moves: &[MoveString]) -> String {
    moves
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(&HISTORY_SEPARATOR.to_string())
}

fn to_json<T: Serialize>(value: &T) -> Option<String> {
    match serde_json::to_string(value) {
        Ok(s) => Some(s),
        Err(e) => {
            tracing::error!("Failed to serialize structured frame: {}", e);
            None
        }
    }
}

// ============================================================================
// 客户端命令
// ============================================================================

impl ClientCommand {
    fn encode_tokens(&self) -> String {
        match self {
            ClientCommand::SubmitMove { mv } => format!("move {}", mv),
            ClientCommand::RequestThink { seconds }
            | ClientCommand::RequestThinkAndPlay { seconds } => {
                format!("{} {}", self.token(), seconds)
            }
            _ => self.token().to_string(),
        }
    }

    fn decode_tokens(head: &str, args: &[&str]) -> Result<Self, DecodeError> {
        match head {
            "legals" => bare("legals", args, ClientCommand::RequestLegalMoves),
            "move" => {
                expect_args("move", "1", args, args.len() == 1)?;
                Ok(ClientCommand::SubmitMove {
                    mv: MoveString::parse(args[0])?,
                })
            }
            "play" => bare("play", args, ClientCommand::RequestPlay),
            "undo" => bare("undo", args, ClientCommand::RequestUndo),
            "redo" => bare("redo", args, ClientCommand::RequestRedo),
            "think" => Ok(ClientCommand::RequestThink {
                seconds: parse_seconds("think", args)?,
            }),
            "thinkplay" => Ok(ClientCommand::RequestThinkAndPlay {
                seconds: parse_seconds("thinkplay", args)?,
            }),
            "stop" => bare("stop", args, ClientCommand::RequestStopThinking),
            "do" => bare("do", args, ClientCommand::RequestAdoptSuggestedMove),
            "all" => bare("all", args, ClientCommand::RequestFullState),
            other => Err(DecodeError::UnknownCommand {
                token: other.to_string(),
            }),
        }
    }
}

impl WireCommand for ClientCommand {
    fn encode(&self, format: WireFormat) -> String {
        match format {
            WireFormat::Structured => to_json(self).unwrap_or_else(|| self.encode_tokens()),
            WireFormat::Tokenized => self.encode_tokens(),
        }
    }

    fn decode(frame: &str) -> Result<Self, DecodeError> {
        match split_frame(frame)? {
            Frame::Structured(json) => Ok(serde_json::from_str(json)?),
            Frame::Tokens(head, args) => Self::decode_tokens(head, &args),
        }
    }
}

// ============================================================================
// 服务端命令
// ============================================================================

/// `update` 帧的状态代码
///
/// `w`/`b` 人类走棋，`W`/`B` 引擎走棋，`d` 和棋，`m`/`M` 白方/黑方将死获胜。
fn status_to_code(update: &StateUpdate) -> Option<char> {
    match (update.terminal?, update.turn, update.mover) {
        (TerminalReason::None, Some(Role::White), Some(Mover::Human)) => Some('w'),
        (TerminalReason::None, Some(Role::Black), Some(Mover::Human)) => Some('b'),
        (TerminalReason::None, Some(Role::White), Some(Mover::Engine)) => Some('W'),
        (TerminalReason::None, Some(Role::Black), Some(Mover::Engine)) => Some('B'),
        (TerminalReason::Draw, None, None) => Some('d'),
        (TerminalReason::CheckmateWhite, None, None) => Some('m'),
        (TerminalReason::CheckmateBlack, None, None) => Some('M'),
        _ => None,
    }
}

fn update_from_code(position: String, code: &str) -> Result<StateUpdate, DecodeError> {
    let (turn, mover) = match code {
        "w" => (Role::White, Mover::Human),
        "b" => (Role::Black, Mover::Human),
        "W" => (Role::White, Mover::Engine),
        "B" => (Role::Black, Mover::Engine),
        "d" => return Ok(StateUpdate::terminal(position, TerminalReason::Draw)),
        "m" => return Ok(StateUpdate::terminal(position, TerminalReason::CheckmateWhite)),
        "M" => return Ok(StateUpdate::terminal(position, TerminalReason::CheckmateBlack)),
        other => {
            return Err(DecodeError::InvalidStatus {
                code: other.to_string(),
            })
        }
    };
    Ok(StateUpdate::position(position, turn, mover))
}

/// 旧版 `state <棋盘> <历史> <状态>` 帧
///
/// 状态代码为 `w`、`b`、`d`、`wm`、`bm`；历史为空时该字段缺失。
fn update_from_legacy_state(args: &[&str]) -> Result<StateUpdate, DecodeError> {
    expect_args("state", "2 or 3", args, (2..=3).contains(&args.len()))?;

    let board = args[0].to_string();
    let history: Vec<String> = if args.len() == 3 {
        args[1]
            .split(HISTORY_SEPARATOR)
            .filter(|s| !s.is_empty())
            .map(|s| MoveString::parse(s).map(|mv| mv.to_string()))
            .collect::<Result<_, _>>()?
    } else {
        Vec::new()
    };

    let status = args[args.len() - 1];
    let update = match status {
        "w" => StateUpdate {
            position: Some(board),
            terminal: Some(TerminalReason::None),
            turn: Some(Role::White),
            ..Default::default()
        },
        "b" => StateUpdate {
            position: Some(board),
            terminal: Some(TerminalReason::None),
            turn: Some(Role::Black),
            ..Default::default()
        },
        "d" => StateUpdate::terminal(board, TerminalReason::Draw),
        "wm" => StateUpdate::terminal(board, TerminalReason::CheckmateWhite),
        "bm" => StateUpdate::terminal(board, TerminalReason::CheckmateBlack),
        other => {
            return Err(DecodeError::InvalidStatus {
                code: other.to_string(),
            })
        }
    };

    Ok(update.with_history(history))
}

/// 能否用分词格式无损表达该状态更新
fn tokenizable(update: &StateUpdate) -> Option<(&str, char)> {
    let position = update.position.as_deref()?;
    let normalized = position.split_whitespace().collect::<Vec<_>>().join(" ");
    if normalized.is_empty()
        || normalized != position
        || position.starts_with('{')
        || update.history_plies.is_some()
        || update.has_engine_fields()
    {
        return None;
    }
    Some((position, status_to_code(update)?))
}

impl ServerCommand {
    fn encode_tokens(&self) -> Option<String> {
        Some(match self {
            ServerCommand::Legals { moves } if moves.is_empty() => "legals".to_string(),
            ServerCommand::Legals { moves } => format!("legals {}", join_moves(moves)),
            ServerCommand::Role { role } => format!("role {}", role.to_code()),
            ServerCommand::Info { role, moves } if moves.is_empty() => {
                format!("info {}", role.to_code())
            }
            ServerCommand::Info { role, moves } => {
                format!("info {} {}", role.to_code(), join_moves(moves))
            }
            ServerCommand::State(update) => {
                let (position, code) = tokenizable(update)?;
                format!("update {} {}", position, code)
            }
        })
    }

    fn decode_tokens(head: &str, args: &[&str]) -> Result<Self, DecodeError> {
        match head {
            "legals" => Ok(ServerCommand::Legals {
                moves: parse_move_list(args)?,
            }),
            "role" => {
                expect_args("role", "1", args, args.len() == 1)?;
                Ok(ServerCommand::Role {
                    role: parse_role(args[0])?,
                })
            }
            "info" => {
                expect_args("info", "at least 1", args, !args.is_empty())?;
                Ok(ServerCommand::Info {
                    role: parse_role(args[0])?,
                    moves: parse_move_list(&args[1..])?,
                })
            }
            "update" => {
                expect_args("update", "at least 2", args, args.len() >= 2)?;
                let (code, position) = args.split_last().ok_or(DecodeError::EmptyFrame)?;
                Ok(ServerCommand::State(update_from_code(position.join(" "), code)?))
            }
            "state" => Ok(ServerCommand::State(update_from_legacy_state(args)?)),
            other => Err(DecodeError::UnknownCommand {
                token: other.to_string(),
            }),
        }
    }
}

impl WireCommand for ServerCommand {
    fn encode(&self, format: WireFormat) -> String {
        let structured = || to_json(self).unwrap_or_default();
        match format {
            WireFormat::Structured => structured(),
            // 分词格式无法表达的更新（引擎进度、历史）退回结构化格式
            WireFormat::Tokenized => self.encode_tokens().unwrap_or_else(structured),
        }
    }

    fn decode(frame: &str) -> Result<Self, DecodeError> {
        match split_frame(frame)? {
            Frame::Structured(json) => Ok(serde_json::from_str(json)?),
            Frame::Tokens(head, args) => Self::decode_tokens(head, &args),
        }
    }
}
