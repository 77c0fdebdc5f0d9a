//! 棋盘视图
//!
//! 只读取快照，不参与状态转换。

mod render;

pub use render::*;

use protocol::{Role, Square, BOARD_HEIGHT, BOARD_WIDTH};

/// 棋盘视角
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Orientation {
    /// 白方在下
    #[default]
    WhiteBottom,
    /// 黑方在下
    BlackBottom,
}

impl Orientation {
    /// 按执棋方确定视角；观战者白方在下
    pub fn for_role(role: Role) -> Self {
        match role {
            Role::Black => Orientation::BlackBottom,
            Role::White | Role::Spectator => Orientation::WhiteBottom,
        }
    }

    /// 翻转
    pub fn flipped(self) -> Self {
        match self {
            Orientation::WhiteBottom => Orientation::BlackBottom,
            Orientation::BlackBottom => Orientation::WhiteBottom,
        }
    }
}

/// 从局面字符串解析出的棋盘
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardView {
    /// 按 [行][列] 存放的棋子字符，白方大写
    squares: [[Option<char>; BOARD_WIDTH]; BOARD_HEIGHT],
}

impl BoardView {
    /// 解析局面字符串的棋盘字段
    ///
    /// 格式错误时返回 `None`。
    pub fn from_position(position: &str) -> Option<Self> {
        let placement = position.split_whitespace().next()?;
        let rows: Vec<&str> = placement.split('/').collect();
        if rows.len() != BOARD_HEIGHT {
            return None;
        }

        let mut squares = [[None; BOARD_WIDTH]; BOARD_HEIGHT];
        // 第一行是第 8 行
        for (i, row) in rows.iter().enumerate() {
            let rank = BOARD_HEIGHT - 1 - i;
            let mut file = 0usize;
            for c in row.chars() {
                if let Some(skip) = c.to_digit(10) {
                    if skip == 0 {
                        return None;
                    }
                    file += skip as usize;
                } else if "pnbrqkPNBRQK".contains(c) {
                    if file >= BOARD_WIDTH {
                        return None;
                    }
                    squares[rank][file] = Some(c);
                    file += 1;
                } else {
                    return None;
                }
            }
            if file != BOARD_WIDTH {
                return None;
            }
        }

        Some(Self { squares })
    }

    /// 获取格子上的棋子
    pub fn piece_at(&self, square: Square) -> Option<char> {
        self.squares
            .get(square.rank as usize)?
            .get(square.file as usize)
            .copied()
            .flatten()
    }
}
