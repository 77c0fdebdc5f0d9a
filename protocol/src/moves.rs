//! 走法字符串
//!
//! 格式：`<起始格><目标格>[升变后缀]`，例如 `e2e4`、`e7e8q`。
//! 合法性由远端判定，这里只校验语法。

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DecodeError;
use crate::piece::{PromotionPiece, Square};

/// 走法
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MoveString {
    /// 起始格
    pub from: Square,
    /// 目标格
    pub to: Square,
    /// 升变棋子（如果有）
    pub promotion: Option<PromotionPiece>,
}

impl MoveString {
    /// 创建普通走法
    pub fn new(from: Square, to: Square) -> Self {
        Self {
            from,
            to,
            promotion: None,
        }
    }

    /// 创建升变走法
    pub fn with_promotion(from: Square, to: Square, piece: PromotionPiece) -> Self {
        Self {
            from,
            to,
            promotion: Some(piece),
        }
    }

    /// 去掉升变后缀后的起止格
    pub fn squares(&self) -> (Square, Square) {
        (self.from, self.to)
    }

    /// 严格按语法解析
    pub fn parse(s: &str) -> Result<Self, DecodeError> {
        let invalid = || DecodeError::InvalidMove { text: s.to_string() };

        if !s.is_ascii() || !(4..=5).contains(&s.len()) {
            return Err(invalid());
        }

        let from = Square::parse(&s[0..2]).ok_or_else(invalid)?;
        let to = Square::parse(&s[2..4]).ok_or_else(invalid)?;
        let promotion = match s[4..].chars().next() {
            Some(c) => Some(PromotionPiece::from_suffix(c).ok_or_else(invalid)?),
            None => None,
        };

        Ok(Self { from, to, promotion })
    }
}

impl FromStr for MoveString {
    type Err = DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for MoveString {
    type Error = DecodeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<MoveString> for String {
    fn from(mv: MoveString) -> Self {
        mv.to_string()
    }
}

impl std::fmt::Display for MoveString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.from, self.to)?;
        if let Some(piece) = self.promotion {
            write!(f, "{}", piece.suffix())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sq(s: &str) -> Square {
        Square::parse(s).unwrap()
    }

    #[test]
    fn test_parse_plain_move() {
        let mv = MoveString::parse("e2e4").unwrap();
        assert_eq!(mv.from, sq("e2"));
        assert_eq!(mv.to, sq("e4"));
        assert_eq!(mv.promotion, None);
        assert_eq!(mv.to_string(), "e2e4");
    }

    #[test]
    fn test_parse_promotion() {
        let mv = MoveString::parse("e7e8n").unwrap();
        assert_eq!(mv.promotion, Some(PromotionPiece::Knight));
        assert_eq!(mv.to_string(), "e7e8n");
        assert_eq!(mv.squares(), (sq("e7"), sq("e8")));
    }

    #[test]
    fn test_parse_rejects_bad_grammar() {
        for bad in ["", "e2", "e2e", "e2e9", "i2e4", "e2e4k", "e2e4qq", "E2E4", "e2-e4", "é2e4"] {
            assert!(
                matches!(MoveString::parse(bad), Err(DecodeError::InvalidMove { .. })),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_serde_as_string() {
        let mv = MoveString::with_promotion(sq("a7"), sq("a8"), PromotionPiece::Queen);
        let json = serde_json::to_string(&mv).unwrap();
        assert_eq!(json, "\"a7a8q\"");
        let back: MoveString = serde_json::from_str(&json).unwrap();
        assert_eq!(back, mv);
        assert!(serde_json::from_str::<MoveString>("\"zz\"").is_err());
    }
}
