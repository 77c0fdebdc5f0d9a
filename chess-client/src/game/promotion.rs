//! 升变选择
//!
//! 状态机：`Idle -> AwaitingChoice -> Idle`。
//! 起止格本身不是合法走法、但追加某个升变后缀后合法时进入等待选择。

use protocol::{ClientCommand, MoveString, PromotionPiece, Role, Square};

use super::state::LegalMoveSet;

/// 等待确认或升变选择的走法
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingMove {
    pub from: Square,
    pub to: Square,
}

impl PendingMove {
    pub fn new(from: Square, to: Square) -> Self {
        Self { from, to }
    }

    /// 不带升变后缀的走法
    pub fn plain(&self) -> MoveString {
        MoveString::new(self.from, self.to)
    }

    /// 追加升变后缀
    pub fn promote(&self, piece: PromotionPiece) -> MoveString {
        MoveString::with_promotion(self.from, self.to, piece)
    }
}

/// 升变请求
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromotionRequest {
    pub pending_move: PendingMove,
    /// 可选棋子，非空，按后、车、象、马排序
    pub candidate_pieces: Vec<PromotionPiece>,
    /// 执棋方，决定棋子颜色
    pub role: Role,
}

impl PromotionRequest {
    /// 按执棋方着色的候选棋子字符
    pub fn candidate_chars(&self) -> Vec<char> {
        self.candidate_pieces
            .iter()
            .map(|piece| piece.to_fen_char(self.role))
            .collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
enum NegotiatorState {
    #[default]
    Idle,
    AwaitingChoice(PromotionRequest),
}

/// 升变协商器
#[derive(Debug, Clone, Default)]
pub struct PromotionNegotiator {
    state: NegotiatorState,
}

impl PromotionNegotiator {
    pub fn new() -> Self {
        Self::default()
    }

    /// 是否正在等待选择
    pub fn is_active(&self) -> bool {
        matches!(self.state, NegotiatorState::AwaitingChoice(_))
    }

    /// 当前请求
    pub fn request(&self) -> Option<&PromotionRequest> {
        match &self.state {
            NegotiatorState::AwaitingChoice(request) => Some(request),
            NegotiatorState::Idle => None,
        }
    }

    /// 候选走法有歧义时进入等待选择
    ///
    /// 已有请求、或走法没有歧义时返回 `None`。
    pub fn offer(
        &mut self,
        pending: PendingMove,
        legals: &LegalMoveSet,
        role: Role,
    ) -> Option<PromotionRequest> {
        if self.is_active() || legals.contains(&pending.plain()) {
            return None;
        }

        let candidate_pieces = legals.promotion_pieces(pending.from, pending.to);
        if candidate_pieces.is_empty() {
            return None;
        }

        let request = PromotionRequest {
            pending_move: pending,
            candidate_pieces,
            role,
        };
        self.state = NegotiatorState::AwaitingChoice(request.clone());
        Some(request)
    }

    /// 选择升变棋子
    ///
    /// 不在候选集合中的棋子被忽略，请求保持不变。
    pub fn choose(&mut self, piece: PromotionPiece) -> Option<(PendingMove, ClientCommand)> {
        let request = self.request()?;
        if !request.candidate_pieces.contains(&piece) {
            return None;
        }
        let pending = request.pending_move;
        self.state = NegotiatorState::Idle;
        Some((
            pending,
            ClientCommand::SubmitMove {
                mv: pending.promote(piece),
            },
        ))
    }

    /// 用户取消选择，返回需要退回的走法
    pub fn cancel(&mut self) -> Option<PendingMove> {
        match std::mem::take(&mut self.state) {
            NegotiatorState::AwaitingChoice(request) => Some(request.pending_move),
            NegotiatorState::Idle => None,
        }
    }

    /// 局面已变化，静默丢弃请求
    pub fn discard_stale(&mut self) -> bool {
        let was_active = self.is_active();
        self.state = NegotiatorState::Idle;
        was_active
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sq(s: &str) -> Square {
        Square::parse(s).unwrap()
    }

    fn legals(moves: &[&str]) -> LegalMoveSet {
        LegalMoveSet::new(moves.iter().map(|m| MoveString::parse(m).unwrap()), 0)
    }

    #[test]
    fn test_offer_all_four() {
        let mut negotiator = PromotionNegotiator::new();
        let set = legals(&["e7e8q", "e7e8r", "e7e8b", "e7e8n"]);
        let request = negotiator
            .offer(PendingMove::new(sq("e7"), sq("e8")), &set, Role::White)
            .unwrap();
        assert_eq!(request.candidate_pieces, PromotionPiece::ALL.to_vec());
        assert_eq!(request.candidate_chars(), vec!['Q', 'R', 'B', 'N']);
        assert!(negotiator.is_active());

        let (pending, cmd) = negotiator.choose(PromotionPiece::Rook).unwrap();
        assert_eq!(pending, PendingMove::new(sq("e7"), sq("e8")));
        assert_eq!(
            cmd,
            ClientCommand::SubmitMove {
                mv: MoveString::parse("e7e8r").unwrap()
            }
        );
        assert!(!negotiator.is_active());
    }

    #[test]
    fn test_offer_subset_only() {
        let mut negotiator = PromotionNegotiator::new();
        let set = legals(&["b2a1q", "b2a1n"]);
        let request = negotiator
            .offer(PendingMove::new(sq("b2"), sq("a1")), &set, Role::Black)
            .unwrap();
        assert_eq!(
            request.candidate_pieces,
            vec![PromotionPiece::Queen, PromotionPiece::Knight]
        );
        assert_eq!(request.candidate_chars(), vec!['q', 'n']);

        // 不在候选集合中的选择无效
        assert!(negotiator.choose(PromotionPiece::Rook).is_none());
        assert!(negotiator.is_active());
    }

    #[test]
    fn test_not_ambiguous() {
        let mut negotiator = PromotionNegotiator::new();
        let set = legals(&["e2e4", "e7e8q"]);
        assert!(negotiator
            .offer(PendingMove::new(sq("e2"), sq("e4")), &set, Role::White)
            .is_none());
        assert!(negotiator
            .offer(PendingMove::new(sq("a2"), sq("a3")), &set, Role::White)
            .is_none());
        assert!(!negotiator.is_active());
    }

    #[test]
    fn test_second_offer_ignored() {
        let mut negotiator = PromotionNegotiator::new();
        let set = legals(&["e7e8q", "d7d8q"]);
        negotiator
            .offer(PendingMove::new(sq("e7"), sq("e8")), &set, Role::White)
            .unwrap();
        assert!(negotiator
            .offer(PendingMove::new(sq("d7"), sq("d8")), &set, Role::White)
            .is_none());
        assert_eq!(
            negotiator.request().unwrap().pending_move,
            PendingMove::new(sq("e7"), sq("e8"))
        );
    }

    #[test]
    fn test_cancel_and_discard() {
        let mut negotiator = PromotionNegotiator::new();
        let set = legals(&["e7e8q"]);
        negotiator
            .offer(PendingMove::new(sq("e7"), sq("e8")), &set, Role::White)
            .unwrap();
        assert_eq!(
            negotiator.cancel(),
            Some(PendingMove::new(sq("e7"), sq("e8")))
        );
        assert_eq!(negotiator.cancel(), None);

        negotiator
            .offer(PendingMove::new(sq("e7"), sq("e8")), &set, Role::White)
            .unwrap();
        assert!(negotiator.discard_stale());
        assert!(!negotiator.discard_stale());
        assert!(negotiator.choose(PromotionPiece::Queen).is_none());
    }
}
