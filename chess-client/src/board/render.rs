//! 文本渲染

use protocol::{Mover, Role, Square, TerminalReason, BOARD_HEIGHT, BOARD_WIDTH};

use super::{BoardView, Orientation};
use crate::game::StoreSnapshot;

impl BoardView {
    /// 渲染为文本棋盘
    ///
    /// 高亮格子用方括号标出，空格子显示为 `.`。
    pub fn render(&self, orientation: Orientation, highlights: &[Square]) -> String {
        let (ranks, files): (Vec<usize>, Vec<usize>) = match orientation {
            Orientation::WhiteBottom => (
                (0..BOARD_HEIGHT).rev().collect(),
                (0..BOARD_WIDTH).collect(),
            ),
            Orientation::BlackBottom => (
                (0..BOARD_HEIGHT).collect(),
                (0..BOARD_WIDTH).rev().collect(),
            ),
        };

        let mut out = String::new();
        for &rank in &ranks {
            out.push((b'1' + rank as u8) as char);
            out.push(' ');
            for &file in &files {
                let square = Square::new_unchecked(file as u8, rank as u8);
                let piece = self.piece_at(square).unwrap_or('.');
                if highlights.contains(&square) {
                    out.push_str(&format!("[{}]", piece));
                } else {
                    out.push_str(&format!(" {} ", piece));
                }
            }
            out.push('\n');
        }

        out.push_str("  ");
        for &file in &files {
            out.push_str(&format!(" {} ", (b'a' + file as u8) as char));
        }
        out.push('\n');
        out
    }
}

/// 一行状态摘要
pub fn status_line(snapshot: &StoreSnapshot) -> String {
    let game = &snapshot.game;
    let mut line = format!("role: {}", snapshot.role);

    match game.terminal_reason {
        TerminalReason::None => match game.turn_owner {
            Some(turn) => {
                let who = match game.mover {
                    Some(Mover::Engine) => " (engine)",
                    Some(Mover::Human) | None => "",
                };
                let mine = if snapshot.is_my_turn() { ", your move" } else { "" };
                line.push_str(&format!(" | {} to move{}{}", turn, who, mine));
            }
            None => line.push_str(" | waiting for position"),
        },
        TerminalReason::Draw => line.push_str(" | draw"),
        TerminalReason::CheckmateWhite => {
            line.push_str(&format!(" | checkmate, {} wins", Role::White));
        }
        TerminalReason::CheckmateBlack => {
            line.push_str(&format!(" | checkmate, {} wins", Role::Black));
        }
    }

    let engine = &snapshot.engine;
    if engine.thinking {
        line.push_str(" | thinking...");
    }
    if let Some(mv) = engine.last_suggested_move {
        line.push_str(&format!(" | best {}", mv));
        if let Some(depth) = engine.last_search_depth {
            line.push_str(&format!(" (depth {})", depth));
        }
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{EngineStatus, GameState};
    use protocol::MoveString;

    const START: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

    #[test]
    fn test_render_white_bottom() {
        let board = BoardView::from_position(START).unwrap();
        let text = board.render(Orientation::WhiteBottom, &[]);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 9);
        assert_eq!(lines[0], "8  r  n  b  q  k  b  n  r ");
        assert_eq!(lines[7], "1  R  N  B  Q  K  B  N  R ");
        assert_eq!(lines[8], "   a  b  c  d  e  f  g  h ");
    }

    #[test]
    fn test_render_black_bottom_with_highlight() {
        let board = BoardView::from_position(START).unwrap();
        let e4 = Square::parse("e4").unwrap();
        let text = board.render(Orientation::BlackBottom, &[e4]);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "1  R  N  B  K  Q  B  N  R ");
        assert_eq!(lines[4], "5  .  .  .  .  .  .  .  . ");
        assert_eq!(lines[3], "4  .  .  . [.] .  .  .  . ");
        assert_eq!(lines[8], "   h  g  f  e  d  c  b  a ");
    }

    #[test]
    fn test_status_line() {
        let snapshot = StoreSnapshot {
            role: Role::White,
            game: GameState {
                position: START.to_string(),
                turn_owner: Some(Role::White),
                mover: Some(Mover::Human),
                ..Default::default()
            },
            engine: EngineStatus {
                thinking: false,
                last_suggested_move: Some(MoveString::parse("g1f3").unwrap()),
                last_search_depth: Some(12),
            },
            ..Default::default()
        };
        assert_eq!(
            status_line(&snapshot),
            "role: white | white to move, your move | best g1f3 (depth 12)"
        );

        // 引擎代走时不提示本方走棋
        let mut engine_turn = snapshot.clone();
        engine_turn.game.mover = Some(Mover::Engine);
        engine_turn.engine = EngineStatus::default();
        assert_eq!(status_line(&engine_turn), "role: white | white to move (engine)");

        let snapshot = StoreSnapshot {
            game: GameState {
                terminal: true,
                terminal_reason: TerminalReason::CheckmateBlack,
                ..Default::default()
            },
            ..Default::default()
        };
        assert_eq!(status_line(&snapshot), "role: spectator | checkmate, black wins");
    }
}
