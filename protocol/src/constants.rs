//! 协议常量定义

use std::time::Duration;

/// 棋盘宽度（列数 a-h）
pub const BOARD_WIDTH: usize = 8;

/// 棋盘高度（行数 1-8）
pub const BOARD_HEIGHT: usize = 8;

/// 消息帧最大大小（字节）
pub const MAX_FRAME_SIZE: usize = 65536;

/// 连接超时（秒）
pub const CONNECT_TIMEOUT_SECS: u64 = 10;

/// 默认思考时间（秒）
pub const DEFAULT_THINK_SECS: u32 = 5;

/// 默认服务器端口
pub const DEFAULT_PORT: u16 = 9527;

/// 历史走法在分词格式中的分隔符
pub const HISTORY_SEPARATOR: char = ',';

/// 连接超时 Duration
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(CONNECT_TIMEOUT_SECS);
