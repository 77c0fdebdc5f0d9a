//! 对局会话共享协议库
//!
//! 包含:
//! - 格子、角色、升变棋子等基础类型
//! - 走法字符串语法
//! - 命令类型定义 (ClientCommand, ServerCommand, StateUpdate)
//! - 编解码 (结构化 JSON 与分词文本两种线上格式)
//! - 传输层抽象 (Connector, Connection traits)

mod codec;
mod constants;
mod error;
mod message;
mod moves;
mod piece;
mod transport;

pub use codec::{WireCommand, WireFormat};
pub use constants::*;
pub use error::{DecodeError, ProtocolError, Result};
pub use message::{side_to_move, ClientCommand, ServerCommand, StateUpdate};
pub use moves::MoveString;
pub use piece::{Mover, PromotionPiece, Role, Square, TerminalReason};
pub use transport::{
    Connection, Connector,
    TcpConnection, TcpConnector,
    MemoryConnection,
    FrameReader, FrameWriter,
};
