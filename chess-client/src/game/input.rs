//! 输入处理
//!
//! 把用户手势翻译为待发送命令或本地反馈。这里不修改对局状态，
//! 走法只有在远端推送新局面后才算生效。

use protocol::{ClientCommand, PromotionPiece, Square};
use tracing::{debug, info};

use super::promotion::{PendingMove, PromotionNegotiator, PromotionRequest};
use super::state::StoreSnapshot;
use super::{ButtonKind, Gesture};
use crate::board::Orientation;

/// 手势处理结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InteractionOutcome {
    /// 发送命令
    Emit(ClientCommand),
    /// 拒绝，棋子退回原格
    Reject { snapback_to: Square },
    /// 弹出升变选择
    PromotionOffered(PromotionRequest),
    /// 选中棋子，附带可到达的格子
    Selected { square: Square, targets: Vec<Square> },
    /// 取消选中
    Deselected,
    /// 视角已翻转
    Flipped(Orientation),
    /// 无事发生
    Ignored,
}

/// 交互控制器
#[derive(Debug, Default)]
pub struct InteractionController {
    selected: Option<Square>,
    pending: Option<PendingMove>,
    negotiator: PromotionNegotiator,
    orientation: Orientation,
}

impl InteractionController {
    pub fn new(orientation: Orientation) -> Self {
        Self {
            orientation,
            ..Default::default()
        }
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    pub fn set_orientation(&mut self, orientation: Orientation) {
        self.orientation = orientation;
    }

    /// 当前选中的格子
    pub fn selected(&self) -> Option<Square> {
        self.selected
    }

    /// 已发送、等待远端确认的走法
    pub fn pending_move(&self) -> Option<PendingMove> {
        self.pending
    }

    /// 正在等待选择的升变请求
    pub fn promotion(&self) -> Option<&PromotionRequest> {
        self.negotiator.request()
    }

    /// 分发一个手势
    pub fn handle(
        &mut self,
        snapshot: &StoreSnapshot,
        gesture: Gesture,
        think_seconds: u32,
    ) -> InteractionOutcome {
        match gesture {
            Gesture::Select(square) => self.on_gesture_select(snapshot, square),
            Gesture::Drop { from, to } => self.on_gesture_drop(snapshot, from, to),
            Gesture::PromotionChoice(piece) => self.on_promotion_choice(snapshot, piece),
            Gesture::PromotionCancel => self.on_promotion_cancel(),
            Gesture::Button(kind) => self.on_command_button(kind, think_seconds),
        }
    }

    /// 点击格子
    pub fn on_gesture_select(&mut self, snapshot: &StoreSnapshot, square: Square) -> InteractionOutcome {
        if self.negotiator.is_active() || self.pending.is_some() {
            return InteractionOutcome::Ignored;
        }

        let Some(selected) = self.selected else {
            return self.try_select(snapshot, square);
        };

        if selected == square {
            self.selected = None;
            return InteractionOutcome::Deselected;
        }

        if snapshot.legal_moves.targets_from(selected).contains(&square) {
            return self.on_gesture_drop(snapshot, selected, Some(square));
        }

        match self.try_select(snapshot, square) {
            InteractionOutcome::Ignored => {
                self.selected = None;
                InteractionOutcome::Deselected
            }
            outcome => outcome,
        }
    }

    fn try_select(&mut self, snapshot: &StoreSnapshot, square: Square) -> InteractionOutcome {
        if !snapshot.is_my_turn()
            || !snapshot.legal_moves_current()
            || !snapshot.legal_moves.is_origin(square)
        {
            return InteractionOutcome::Ignored;
        }
        self.selected = Some(square);
        InteractionOutcome::Selected {
            square,
            targets: snapshot.legal_moves.targets_from(square),
        }
    }

    /// 拖放棋子；`to` 为 `None` 表示落在棋盘外
    pub fn on_gesture_drop(
        &mut self,
        snapshot: &StoreSnapshot,
        from: Square,
        to: Option<Square>,
    ) -> InteractionOutcome {
        if self.negotiator.is_active() {
            return InteractionOutcome::Ignored;
        }
        self.selected = None;

        let reject = |reason: &str| {
            debug!("Rejected drop from {}: {}", from, reason);
            InteractionOutcome::Reject { snapback_to: from }
        };

        if self.pending.is_some() {
            return reject("a move is awaiting confirmation");
        }
        if !snapshot.is_my_turn() {
            return reject("not our turn");
        }
        let Some(to) = to else {
            return reject("dropped off board");
        };
        if !snapshot.legal_moves_current() {
            return reject("legal moves are stale");
        }

        let pending = PendingMove::new(from, to);
        if snapshot.legal_moves.contains(&pending.plain()) {
            self.pending = Some(pending);
            return InteractionOutcome::Emit(ClientCommand::SubmitMove { mv: pending.plain() });
        }

        match self
            .negotiator
            .offer(pending, &snapshot.legal_moves, snapshot.role)
        {
            Some(request) => {
                info!(
                    "Promotion offered for {}{}: {:?}",
                    from, to, request.candidate_pieces
                );
                InteractionOutcome::PromotionOffered(request)
            }
            None => reject("not a legal move"),
        }
    }

    /// 选择升变棋子；提交前重新确认走子权和合法走法
    pub fn on_promotion_choice(
        &mut self,
        snapshot: &StoreSnapshot,
        piece: PromotionPiece,
    ) -> InteractionOutcome {
        if self.negotiator.is_active()
            && (!snapshot.is_my_turn() || !snapshot.legal_moves_current())
        {
            debug!("Promotion choice no longer valid, cancelling request");
            return self.on_promotion_cancel();
        }
        match self.negotiator.choose(piece) {
            Some((pending, command)) => {
                self.pending = Some(pending);
                InteractionOutcome::Emit(command)
            }
            None => InteractionOutcome::Ignored,
        }
    }

    /// 取消升变选择
    pub fn on_promotion_cancel(&mut self) -> InteractionOutcome {
        match self.negotiator.cancel() {
            Some(pending) => InteractionOutcome::Reject {
                snapback_to: pending.from,
            },
            None => InteractionOutcome::Ignored,
        }
    }

    /// 按钮命令；翻转只影响本地视角
    pub fn on_command_button(&mut self, kind: ButtonKind, think_seconds: u32) -> InteractionOutcome {
        let command = match kind {
            ButtonKind::Flip => {
                self.orientation = self.orientation.flipped();
                return InteractionOutcome::Flipped(self.orientation);
            }
            ButtonKind::Undo => ClientCommand::RequestUndo,
            ButtonKind::Redo => ClientCommand::RequestRedo,
            ButtonKind::Think(seconds) => ClientCommand::RequestThink {
                seconds: seconds.unwrap_or(think_seconds),
            },
            ButtonKind::ThinkAndPlay(seconds) => ClientCommand::RequestThinkAndPlay {
                seconds: seconds.unwrap_or(think_seconds),
            },
            ButtonKind::Stop => ClientCommand::RequestStopThinking,
            ButtonKind::Do => ClientCommand::RequestAdoptSuggestedMove,
            ButtonKind::Play => ClientCommand::RequestPlay,
            ButtonKind::Legals => ClientCommand::RequestLegalMoves,
            ButtonKind::FullState => ClientCommand::RequestFullState,
        };
        InteractionOutcome::Emit(command)
    }

    /// 收到权威状态更新，丢弃所有本地未决交互
    pub fn on_state_update(&mut self, position_changed: bool) {
        if self.negotiator.discard_stale() {
            debug!("Discarded stale promotion request");
        }
        self.pending = None;
        if position_changed {
            self.selected = None;
        }
    }

    /// 角色变更，之前的选择和未决走法都不再属于本方
    pub fn on_role_changed(&mut self) {
        if self.negotiator.discard_stale() {
            debug!("Discarded promotion request after role change");
        }
        self.pending = None;
        self.selected = None;
    }

    /// 合法走法已刷新
    pub fn on_legals_refreshed(&mut self) {
        self.pending = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{GameState, LegalMoveSet};
    use protocol::{MoveString, Mover, Role};

    fn sq(s: &str) -> Square {
        Square::parse(s).unwrap()
    }

    fn mv(s: &str) -> MoveString {
        MoveString::parse(s).unwrap()
    }

    fn snapshot(role: Role, turn: Option<Role>, moves: &[&str]) -> StoreSnapshot {
        StoreSnapshot {
            role,
            game: GameState {
                position: "placeholder w".to_string(),
                turn_owner: turn,
                position_generation: 1,
                ..Default::default()
            },
            legal_moves: LegalMoveSet::new(moves.iter().map(|m| mv(m)), 1),
            ..Default::default()
        }
    }

    #[test]
    fn test_drop_legal_move() {
        let snap = snapshot(Role::White, Some(Role::White), &["e2e4", "d2d4"]);
        let mut ctrl = InteractionController::default();
        assert_eq!(
            ctrl.on_gesture_drop(&snap, sq("e2"), Some(sq("e4"))),
            InteractionOutcome::Emit(ClientCommand::SubmitMove { mv: mv("e2e4") })
        );
        assert_eq!(ctrl.pending_move(), Some(PendingMove::new(sq("e2"), sq("e4"))));

        // 等待确认期间的拖放一律退回
        assert_eq!(
            ctrl.on_gesture_drop(&snap, sq("d2"), Some(sq("d4"))),
            InteractionOutcome::Reject { snapback_to: sq("d2") }
        );
        assert_eq!(ctrl.on_gesture_select(&snap, sq("d2")), InteractionOutcome::Ignored);

        ctrl.on_state_update(true);
        assert_eq!(ctrl.pending_move(), None);
    }

    #[test]
    fn test_drop_rejections() {
        let mut ctrl = InteractionController::default();
        let snap = snapshot(Role::White, Some(Role::White), &["e2e4"]);

        assert_eq!(
            ctrl.on_gesture_drop(&snap, sq("e2"), None),
            InteractionOutcome::Reject { snapback_to: sq("e2") }
        );
        assert_eq!(
            ctrl.on_gesture_drop(&snap, sq("e2"), Some(sq("e5"))),
            InteractionOutcome::Reject { snapback_to: sq("e2") }
        );

        let mut stale = snap.clone();
        stale.game.position_generation = 2;
        assert_eq!(
            ctrl.on_gesture_drop(&stale, sq("e2"), Some(sq("e4"))),
            InteractionOutcome::Reject { snapback_to: sq("e2") }
        );
        assert_eq!(ctrl.pending_move(), None);
    }

    #[test]
    fn test_turn_gating_all_roles() {
        let moves = ["e2e4", "e7e5", "e7e8q"];
        let cases = [
            (Role::Spectator, Some(Role::White)),
            (Role::Spectator, Some(Role::Black)),
            (Role::Spectator, None),
            (Role::White, Some(Role::Black)),
            (Role::White, None),
            (Role::Black, Some(Role::White)),
            (Role::Black, None),
        ];
        for (role, turn) in cases {
            let snap = snapshot(role, turn, &moves);
            for from in 0..64u8 {
                for to in 0..64u8 {
                    let mut ctrl = InteractionController::default();
                    let from = Square::new_unchecked(from % 8, from / 8);
                    let to = Square::new_unchecked(to % 8, to / 8);
                    let outcome = ctrl.on_gesture_drop(&snap, from, Some(to));
                    assert_eq!(outcome, InteractionOutcome::Reject { snapback_to: from });
                }
            }
        }
    }

    #[test]
    fn test_promotion_flow() {
        let snap = snapshot(
            Role::White,
            Some(Role::White),
            &["e7e8q", "e7e8r", "e7e8b", "e7e8n"],
        );
        let mut ctrl = InteractionController::default();

        let InteractionOutcome::PromotionOffered(request) =
            ctrl.on_gesture_drop(&snap, sq("e7"), Some(sq("e8")))
        else {
            panic!("expected promotion offer");
        };
        assert_eq!(request.candidate_pieces, PromotionPiece::ALL.to_vec());

        // 等待选择期间的其它手势被忽略
        assert_eq!(
            ctrl.on_gesture_drop(&snap, sq("e7"), Some(sq("e8"))),
            InteractionOutcome::Ignored
        );
        assert_eq!(ctrl.on_gesture_select(&snap, sq("e7")), InteractionOutcome::Ignored);

        assert_eq!(
            ctrl.on_promotion_choice(&snap, PromotionPiece::Rook),
            InteractionOutcome::Emit(ClientCommand::SubmitMove { mv: mv("e7e8r") })
        );
        assert!(ctrl.promotion().is_none());
        assert_eq!(ctrl.pending_move(), Some(PendingMove::new(sq("e7"), sq("e8"))));
    }

    #[test]
    fn test_promotion_cancel_and_stale() {
        let snap = snapshot(Role::Black, Some(Role::Black), &["b2b1q", "b2b1n"]);
        let mut ctrl = InteractionController::default();

        ctrl.on_gesture_drop(&snap, sq("b2"), Some(sq("b1")));
        assert_eq!(
            ctrl.on_promotion_cancel(),
            InteractionOutcome::Reject { snapback_to: sq("b2") }
        );
        assert_eq!(ctrl.on_promotion_cancel(), InteractionOutcome::Ignored);

        ctrl.on_gesture_drop(&snap, sq("b2"), Some(sq("b1")));
        assert!(ctrl.promotion().is_some());
        ctrl.on_state_update(false);
        assert!(ctrl.promotion().is_none());
        assert_eq!(
            ctrl.on_promotion_choice(&snap, PromotionPiece::Queen),
            InteractionOutcome::Ignored
        );
    }

    #[test]
    fn test_promotion_choice_rechecks_turn() {
        let moves = ["e7e8q", "e7e8n"];
        let snap = snapshot(Role::White, Some(Role::White), &moves);

        // 等待选择期间变为观战者
        let mut ctrl = InteractionController::default();
        ctrl.on_gesture_drop(&snap, sq("e7"), Some(sq("e8")));
        let spectator = snapshot(Role::Spectator, Some(Role::White), &moves);
        assert_eq!(
            ctrl.on_promotion_choice(&spectator, PromotionPiece::Queen),
            InteractionOutcome::Reject { snapback_to: sq("e7") }
        );
        assert!(ctrl.promotion().is_none());
        assert_eq!(ctrl.pending_move(), None);

        // 合法走法过期
        ctrl.on_gesture_drop(&snap, sq("e7"), Some(sq("e8")));
        let mut stale = snap.clone();
        stale.game.position_generation = 2;
        assert_eq!(
            ctrl.on_promotion_choice(&stale, PromotionPiece::Knight),
            InteractionOutcome::Reject { snapback_to: sq("e7") }
        );
        assert_eq!(ctrl.pending_move(), None);
    }

    #[test]
    fn test_role_change_discards_interaction() {
        let snap = snapshot(Role::White, Some(Role::White), &["e7e8q", "e2e4"]);
        let mut ctrl = InteractionController::default();

        ctrl.on_gesture_drop(&snap, sq("e7"), Some(sq("e8")));
        assert!(ctrl.promotion().is_some());
        ctrl.on_role_changed();
        assert!(ctrl.promotion().is_none());
        assert_eq!(ctrl.on_promotion_choice(&snap, PromotionPiece::Queen), InteractionOutcome::Ignored);

        ctrl.on_gesture_drop(&snap, sq("e2"), Some(sq("e4")));
        assert!(ctrl.pending_move().is_some());
        ctrl.on_role_changed();
        assert_eq!(ctrl.pending_move(), None);
    }

    #[test]
    fn test_engine_to_move_blocks_input() {
        let mut snap = snapshot(Role::White, Some(Role::White), &["e2e4"]);
        snap.game.mover = Some(Mover::Engine);
        let mut ctrl = InteractionController::default();

        assert_eq!(
            ctrl.on_gesture_drop(&snap, sq("e2"), Some(sq("e4"))),
            InteractionOutcome::Reject { snapback_to: sq("e2") }
        );
        assert_eq!(ctrl.on_gesture_select(&snap, sq("e2")), InteractionOutcome::Ignored);

        snap.game.mover = Some(Mover::Human);
        assert_eq!(
            ctrl.on_gesture_drop(&snap, sq("e2"), Some(sq("e4"))),
            InteractionOutcome::Emit(ClientCommand::SubmitMove { mv: mv("e2e4") })
        );
    }

    #[test]
    fn test_click_to_move() {
        let snap = snapshot(Role::White, Some(Role::White), &["e2e4", "e2e3", "g1f3"]);
        let mut ctrl = InteractionController::default();

        // 非起始格不可选
        assert_eq!(ctrl.on_gesture_select(&snap, sq("e4")), InteractionOutcome::Ignored);

        assert_eq!(
            ctrl.on_gesture_select(&snap, sq("e2")),
            InteractionOutcome::Selected {
                square: sq("e2"),
                targets: vec![sq("e3"), sq("e4")],
            }
        );

        // 点击另一个起始格改为选中它
        assert_eq!(
            ctrl.on_gesture_select(&snap, sq("g1")),
            InteractionOutcome::Selected {
                square: sq("g1"),
                targets: vec![sq("f3")],
            }
        );

        assert_eq!(ctrl.on_gesture_select(&snap, sq("g1")), InteractionOutcome::Deselected);
        assert_eq!(ctrl.selected(), None);

        ctrl.on_gesture_select(&snap, sq("e2"));
        assert_eq!(ctrl.on_gesture_select(&snap, sq("a6")), InteractionOutcome::Deselected);

        ctrl.on_gesture_select(&snap, sq("e2"));
        assert_eq!(
            ctrl.on_gesture_select(&snap, sq("e4")),
            InteractionOutcome::Emit(ClientCommand::SubmitMove { mv: mv("e2e4") })
        );
        assert_eq!(ctrl.selected(), None);
    }

    #[test]
    fn test_select_not_my_turn() {
        let snap = snapshot(Role::Black, Some(Role::White), &["e2e4"]);
        let mut ctrl = InteractionController::default();
        assert_eq!(ctrl.on_gesture_select(&snap, sq("e2")), InteractionOutcome::Ignored);
    }

    #[test]
    fn test_buttons() {
        let mut ctrl = InteractionController::default();
        assert_eq!(
            ctrl.on_command_button(ButtonKind::Think(None), 5),
            InteractionOutcome::Emit(ClientCommand::RequestThink { seconds: 5 })
        );
        assert_eq!(
            ctrl.on_command_button(ButtonKind::ThinkAndPlay(Some(9)), 5),
            InteractionOutcome::Emit(ClientCommand::RequestThinkAndPlay { seconds: 9 })
        );
        assert_eq!(
            ctrl.on_command_button(ButtonKind::Do, 5),
            InteractionOutcome::Emit(ClientCommand::RequestAdoptSuggestedMove)
        );
        assert_eq!(
            ctrl.on_command_button(ButtonKind::Flip, 5),
            InteractionOutcome::Flipped(Orientation::BlackBottom)
        );
        assert_eq!(ctrl.orientation(), Orientation::BlackBottom);
        assert_eq!(ctrl.pending_move(), None);
    }
}
