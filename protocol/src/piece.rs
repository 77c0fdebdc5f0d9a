//! 格子、角色与升变棋子定义

use serde::{Deserialize, Serialize};

use crate::constants::{BOARD_HEIGHT, BOARD_WIDTH};

/// 角色
///
/// 只由远端分配，客户端从不自行指定。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// 观战者
    #[default]
    Spectator,
    /// 白方
    White,
    /// 黑方
    Black,
}

impl Role {
    /// 是否为执棋方（白或黑）
    pub fn is_player(&self) -> bool {
        !matches!(self, Role::Spectator)
    }

    /// 分词格式中的单字符代码
    pub fn to_code(&self) -> char {
        match self {
            Role::Spectator => 's',
            Role::White => 'w',
            Role::Black => 'b',
        }
    }

    /// 从单字符代码解析
    pub fn from_code(code: &str) -> Option<Role> {
        match code {
            "s" => Some(Role::Spectator),
            "w" => Some(Role::White),
            "b" => Some(Role::Black),
            _ => None,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Spectator => write!(f, "spectator"),
            Role::White => write!(f, "white"),
            Role::Black => write!(f, "black"),
        }
    }
}

/// 走子方由谁操控
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mover {
    /// 人类玩家
    Human,
    /// 远端引擎
    Engine,
}

/// 终局原因
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TerminalReason {
    /// 对局进行中
    #[default]
    None,
    /// 和棋
    Draw,
    /// 白方将死对手
    CheckmateWhite,
    /// 黑方将死对手
    CheckmateBlack,
}

impl TerminalReason {
    /// 是否为终局
    pub fn is_terminal(&self) -> bool {
        !matches!(self, TerminalReason::None)
    }
}

/// 升变棋子
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PromotionPiece {
    Queen,
    Rook,
    Bishop,
    Knight,
}

impl PromotionPiece {
    /// 全部升变棋子（后、车、象、马）
    pub const ALL: [PromotionPiece; 4] = [
        PromotionPiece::Queen,
        PromotionPiece::Rook,
        PromotionPiece::Bishop,
        PromotionPiece::Knight,
    ];

    /// 走法字符串中的后缀
    pub fn suffix(&self) -> char {
        match self {
            PromotionPiece::Queen => 'q',
            PromotionPiece::Rook => 'r',
            PromotionPiece::Bishop => 'b',
            PromotionPiece::Knight => 'n',
        }
    }

    /// 从后缀解析
    pub fn from_suffix(c: char) -> Option<PromotionPiece> {
        match c {
            'q' => Some(PromotionPiece::Queen),
            'r' => Some(PromotionPiece::Rook),
            'b' => Some(PromotionPiece::Bishop),
            'n' => Some(PromotionPiece::Knight),
            _ => None,
        }
    }

    /// 按执棋方着色后的 FEN 字符（白方大写）
    pub fn to_fen_char(&self, role: Role) -> char {
        match role {
            Role::Black => self.suffix(),
            _ => self.suffix().to_ascii_uppercase(),
        }
    }
}

/// 棋盘格子
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Square {
    /// 列 (0-7，对应 a-h)
    pub file: u8,
    /// 行 (0-7，对应 1-8)
    pub rank: u8,
}

impl Square {
    /// 创建新格子
    pub fn new(file: u8, rank: u8) -> Option<Self> {
        if (file as usize) < BOARD_WIDTH && (rank as usize) < BOARD_HEIGHT {
            Some(Self { file, rank })
        } else {
            None
        }
    }

    /// 创建新格子（不检查边界，内部使用）
    pub const fn new_unchecked(file: u8, rank: u8) -> Self {
        Self { file, rank }
    }

    /// 从代数记法解析，例如 `e4`
    ///
    /// 棋盘外的格子返回 `None`。
    pub fn parse(s: &str) -> Option<Self> {
        let mut chars = s.chars();
        let (f, r) = (chars.next()?, chars.next()?);
        if chars.next().is_some() {
            return None;
        }
        if !('a'..='h').contains(&f) || !('1'..='8').contains(&r) {
            return None;
        }
        Some(Self {
            file: f as u8 - b'a',
            rank: r as u8 - b'1',
        })
    }

    /// 列字符
    pub fn file_char(&self) -> char {
        (b'a' + self.file) as char
    }

    /// 行字符
    pub fn rank_char(&self) -> char {
        (b'1' + self.rank) as char
    }
}

impl std::fmt::Display for Square {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.file_char(), self.rank_char())
    }
}
