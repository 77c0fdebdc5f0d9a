//! 错误类型定义

use thiserror::Error;

/// 帧解码错误
///
/// 解码失败不会修改任何状态，调用方记录日志后丢弃该帧即可。
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// 空帧
    #[error("Empty frame")]
    EmptyFrame,

    /// 未知的命令
    #[error("Unknown command: {token:?}")]
    UnknownCommand { token: String },

    /// 参数数量错误
    #[error("Wrong argument count for {command:?}: expected {expected}, got {actual}")]
    ArgumentCount {
        command: &'static str,
        expected: &'static str,
        actual: usize,
    },

    /// 无效的走法字符串
    #[error("Invalid move string: {text:?}")]
    InvalidMove { text: String },

    /// 无效的格子
    #[error("Invalid square: {text:?}")]
    InvalidSquare { text: String },

    /// 无效的角色代码
    #[error("Invalid role code: {code:?}")]
    InvalidRole { code: String },

    /// 无效的状态代码
    #[error("Invalid status code: {code:?}")]
    InvalidStatus { code: String },

    /// 无效的整数参数
    #[error("Invalid integer argument: {text:?}")]
    InvalidInteger { text: String },

    /// JSON 格式错误
    #[error("Malformed structured payload: {reason}")]
    MalformedJson { reason: String },
}

impl From<serde_json::Error> for DecodeError {
    fn from(e: serde_json::Error) -> Self {
        DecodeError::MalformedJson {
            reason: e.to_string(),
        }
    }
}

/// 协议错误类型
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// IO 错误
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON 序列化错误
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// 帧大小超限
    #[error("Frame too large: {size} bytes (max: {max})")]
    FrameTooLarge { size: usize, max: usize },

    /// 帧不是合法的 UTF-8 文本
    #[error("Frame is not valid UTF-8")]
    NotText,

    /// 连接超时
    #[error("Connection timeout")]
    ConnectionTimeout,

    /// 连接已关闭
    #[error("Connection closed")]
    ConnectionClosed,

    /// 解码错误
    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),
}

/// 协议操作结果类型
pub type Result<T> = std::result::Result<T, ProtocolError>;
