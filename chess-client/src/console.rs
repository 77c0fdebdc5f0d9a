//! 控制台输入解析

use protocol::{PromotionPiece, Square};
use thiserror::Error;

use crate::game::{ButtonKind, Gesture};

/// 控制台输入错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConsoleError {
    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    #[error("Usage: {0}")]
    Usage(&'static str),

    #[error("Invalid square: {0}")]
    InvalidSquare(String),
}

/// 控制台命令
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleCommand {
    Gesture(Gesture),
    Quit,
}

/// 帮助文本
pub const HELP: &str = "\
commands:
  select <sq>          click a square
  drop <from> <to|->   drag a piece; '-' drops it off the board
  promote q|r|b|n      pick a promotion piece
  cancel               dismiss the promotion picker
  undo | redo | flip | stop | do | play | legals | all
  think [n] | thinkplay [n]
  quit";

/// 解析一行输入；空行返回 `Ok(None)`
pub fn parse_line(line: &str) -> Result<Option<ConsoleCommand>, ConsoleError> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let Some((&head, args)) = tokens.split_first() else {
        return Ok(None);
    };

    let button = |kind: ButtonKind| -> Result<Option<ConsoleCommand>, ConsoleError> {
        Ok(Some(ConsoleCommand::Gesture(Gesture::Button(kind))))
    };

    match (head, args) {
        ("select", [square]) => Ok(Some(ConsoleCommand::Gesture(Gesture::Select(
            parse_square(square)?,
        )))),
        ("select", _) => Err(ConsoleError::Usage("select <sq>")),
        ("drop", [from, to]) => {
            let from = parse_square(from)?;
            let to = match *to {
                "-" => None,
                to => Some(parse_square(to)?),
            };
            Ok(Some(ConsoleCommand::Gesture(Gesture::Drop { from, to })))
        }
        ("drop", _) => Err(ConsoleError::Usage("drop <from> <to|->")),
        ("promote", [piece]) => {
            let mut chars = piece.chars();
            match (chars.next().and_then(PromotionPiece::from_suffix), chars.next()) {
                (Some(piece), None) => Ok(Some(ConsoleCommand::Gesture(
                    Gesture::PromotionChoice(piece),
                ))),
                _ => Err(ConsoleError::Usage("promote q|r|b|n")),
            }
        }
        ("promote", _) => Err(ConsoleError::Usage("promote q|r|b|n")),
        ("cancel", []) => Ok(Some(ConsoleCommand::Gesture(Gesture::PromotionCancel))),
        ("undo", []) => button(ButtonKind::Undo),
        ("redo", []) => button(ButtonKind::Redo),
        ("flip", []) => button(ButtonKind::Flip),
        ("stop", []) => button(ButtonKind::Stop),
        ("do", []) => button(ButtonKind::Do),
        ("play", []) => button(ButtonKind::Play),
        ("legals", []) => button(ButtonKind::Legals),
        ("all", []) => button(ButtonKind::FullState),
        ("think", args) => button(ButtonKind::Think(parse_seconds(args, "think [n]")?)),
        ("thinkplay", args) => {
            button(ButtonKind::ThinkAndPlay(parse_seconds(args, "thinkplay [n]")?))
        }
        ("quit" | "exit", []) => Ok(Some(ConsoleCommand::Quit)),
        (
            "cancel" | "undo" | "redo" | "flip" | "stop" | "do" | "play" | "legals" | "all"
            | "quit" | "exit",
            _,
        ) => Err(ConsoleError::Usage("command takes no arguments")),
        (other, _) => Err(ConsoleError::UnknownCommand(other.to_string())),
    }
}

fn parse_square(text: &str) -> Result<Square, ConsoleError> {
    Square::parse(text).ok_or_else(|| ConsoleError::InvalidSquare(text.to_string()))
}

fn parse_seconds(args: &[&str], usage: &'static str) -> Result<Option<u32>, ConsoleError> {
    match args {
        [] => Ok(None),
        [n] => n.parse().map(Some).map_err(|_| ConsoleError::Usage(usage)),
        _ => Err(ConsoleError::Usage(usage)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sq(s: &str) -> Square {
        Square::parse(s).unwrap()
    }

    fn gesture(line: &str) -> Gesture {
        match parse_line(line) {
            Ok(Some(ConsoleCommand::Gesture(g))) => g,
            other => panic!("{line:?} parsed as {other:?}"),
        }
    }

    #[test]
    fn test_parse_gestures() {
        assert_eq!(gesture("select e2"), Gesture::Select(sq("e2")));
        assert_eq!(
            gesture("  drop e7 e8 "),
            Gesture::Drop {
                from: sq("e7"),
                to: Some(sq("e8"))
            }
        );
        assert_eq!(gesture("drop e2 -"), Gesture::Drop { from: sq("e2"), to: None });
        assert_eq!(
            gesture("promote n"),
            Gesture::PromotionChoice(PromotionPiece::Knight)
        );
        assert_eq!(gesture("cancel"), Gesture::PromotionCancel);
        assert_eq!(gesture("think"), Gesture::Button(ButtonKind::Think(None)));
        assert_eq!(
            gesture("thinkplay 10"),
            Gesture::Button(ButtonKind::ThinkAndPlay(Some(10)))
        );
        assert_eq!(gesture("all"), Gesture::Button(ButtonKind::FullState));
        assert_eq!(gesture("do"), Gesture::Button(ButtonKind::Do));
    }

    #[test]
    fn test_parse_misc() {
        assert_eq!(parse_line(""), Ok(None));
        assert_eq!(parse_line("   "), Ok(None));
        assert_eq!(parse_line("quit"), Ok(Some(ConsoleCommand::Quit)));
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(
            parse_line("castle"),
            Err(ConsoleError::UnknownCommand("castle".to_string()))
        );
        assert_eq!(
            parse_line("select z9"),
            Err(ConsoleError::InvalidSquare("z9".to_string()))
        );
        assert!(matches!(parse_line("drop e2"), Err(ConsoleError::Usage(_))));
        assert!(matches!(parse_line("promote k"), Err(ConsoleError::Usage(_))));
        assert!(matches!(parse_line("promote qq"), Err(ConsoleError::Usage(_))));
        assert!(matches!(parse_line("think soon"), Err(ConsoleError::Usage(_))));
        assert!(matches!(parse_line("undo 2"), Err(ConsoleError::Usage(_))));
    }
}
