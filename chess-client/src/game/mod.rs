//! 对局逻辑模块
//!
//! 状态存储、升变协商与手势处理

mod input;
mod promotion;
mod state;

pub use input::*;
pub use promotion::*;
pub use state::*;

use protocol::{PromotionPiece, Square};

/// 命令按钮
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonKind {
    /// 悔棋
    Undo,
    /// 重做
    Redo,
    /// 翻转棋盘（仅本地）
    Flip,
    /// 分析，`None` 使用设置中的秒数
    Think(Option<u32>),
    /// 分析后直接走棋
    ThinkAndPlay(Option<u32>),
    /// 停止分析
    Stop,
    /// 采纳建议着法
    Do,
    /// 加入对局
    Play,
    /// 请求合法走法
    Legals,
    /// 请求完整状态
    FullState,
}

/// 用户手势
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gesture {
    /// 点击格子
    Select(Square),
    /// 拖放棋子，`to` 为 `None` 表示落在棋盘外
    Drop { from: Square, to: Option<Square> },
    /// 选择升变棋子
    PromotionChoice(PromotionPiece),
    /// 关闭升变选择
    PromotionCancel,
    /// 按钮
    Button(ButtonKind),
}
