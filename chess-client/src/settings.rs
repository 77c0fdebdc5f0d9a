//! 客户端设置
//!
//! 设置以 JSON 形式保存在 `<配置目录>/chess-session/settings.json`。

use std::path::{Path, PathBuf};

use protocol::{WireFormat, DEFAULT_PORT, DEFAULT_THINK_SECS};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 设置读写错误
#[derive(Error, Debug)]
pub enum SettingsError {
    /// 无法确定配置目录
    #[error("Config directory unavailable")]
    PathUnavailable,

    /// 文件读写错误
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// 序列化错误
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// 日志级别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// `EnvFilter` 指令中使用的名称
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }

    /// 本 crate 与协议 crate 的过滤指令
    pub fn directives(&self) -> [String; 2] {
        [
            format!("chess_client={}", self.as_str()),
            format!("protocol={}", self.as_str()),
        ]
    }
}

/// 客户端设置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientSettings {
    /// 远端地址
    pub server_address: String,
    /// 发送时使用的线上格式
    pub wire_format: WireFormat,
    /// 分析按钮默认的思考秒数
    pub think_seconds: u32,
    /// 轮到本方且合法走法过期时自动请求
    pub auto_request_legals: bool,
    /// 分配角色时按执棋方重置视角
    pub follow_role_orientation: bool,
    /// 日志级别
    pub log_level: LogLevel,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            server_address: format!("127.0.0.1:{}", DEFAULT_PORT),
            wire_format: WireFormat::default(),
            think_seconds: DEFAULT_THINK_SECS,
            auto_request_legals: true,
            follow_role_orientation: true,
            log_level: LogLevel::default(),
        }
    }
}

impl ClientSettings {
    /// 获取设置文件路径
    pub fn settings_path() -> Option<PathBuf> {
        dirs::config_dir().map(|mut path| {
            path.push("chess-session");
            path.push("settings.json");
            path
        })
    }

    /// 从默认位置加载设置，失败时使用默认设置
    pub fn load() -> Self {
        let Some(path) = Self::settings_path() else {
            tracing::warn!("无法获取配置目录，使用默认设置");
            return Self::default();
        };

        if !path.exists() {
            tracing::info!("设置文件不存在，使用默认设置");
            return Self::default();
        }

        match Self::load_from(&path) {
            Ok(settings) => {
                tracing::info!("已加载设置: {:?}", path);
                settings
            }
            Err(e) => {
                tracing::warn!("设置文件无效: {}，使用默认设置", e);
                Self::default()
            }
        }
    }

    /// 从指定文件加载设置
    pub fn load_from(path: &Path) -> Result<Self, SettingsError> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// 保存设置到默认位置
    pub fn save(&self) -> Result<(), SettingsError> {
        let path = Self::settings_path().ok_or(SettingsError::PathUnavailable)?;
        self.save_to(&path)
    }

    /// 保存设置到指定文件
    pub fn save_to(&self, path: &Path) -> Result<(), SettingsError> {
        // 确保目录存在
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        tracing::info!("设置已保存: {:?}", path);
        Ok(())
    }
}
