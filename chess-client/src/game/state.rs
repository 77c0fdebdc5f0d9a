//! 客户端对局状态
//!
//! `GameStateStore` 是客户端视图的唯一数据源，只由会话控制器写入，
//! 其余组件只读取快照。

use std::collections::BTreeSet;

use protocol::{side_to_move, MoveString, Mover, PromotionPiece, Role, Square, StateUpdate, TerminalReason};
use thiserror::Error;

/// 状态更新校验失败
///
/// 校验失败时不提交任何字段。
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StateError {
    /// 局面字符串为空
    #[error("Empty position string")]
    EmptyPosition,

    /// 对局未结束但无法确定走子方
    #[error("Cannot determine side to move for position {position:?}")]
    UnknownTurn { position: String },

    /// 观战者不能是走子方
    #[error("Spectator cannot own the turn")]
    SpectatorTurn,

    /// 历史走法格式错误
    #[error("Malformed history ply: {ply:?}")]
    MalformedHistory { ply: String },
}

/// 对局状态
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GameState {
    /// 局面字符串
    pub position: String,
    /// 历史走法
    pub history_plies: Vec<String>,
    /// 轮到哪一方；终局时为 `None`
    pub turn_owner: Option<Role>,
    /// 走子方由人还是引擎操控
    pub mover: Option<Mover>,
    /// 是否终局
    pub terminal: bool,
    /// 终局原因；未终局时为 `TerminalReason::None`
    pub terminal_reason: TerminalReason,
    /// 局面代数，每次局面变化加一
    pub position_generation: u64,
}

impl GameState {
    /// 是否已收到过局面
    pub fn has_position(&self) -> bool {
        !self.position.is_empty()
    }
}

/// 远端引擎进度
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EngineStatus {
    pub thinking: bool,
    pub last_suggested_move: Option<MoveString>,
    pub last_search_depth: Option<u32>,
}

/// 合法走法集合
///
/// 只对 `generation` 对应的局面有效；从未收到过时为 `None`。
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LegalMoveSet {
    moves: BTreeSet<MoveString>,
    generation: Option<u64>,
}

impl LegalMoveSet {
    pub fn new(moves: impl IntoIterator<Item = MoveString>, generation: u64) -> Self {
        Self {
            moves: moves.into_iter().collect(),
            generation: Some(generation),
        }
    }

    /// 所属局面代数
    pub fn generation(&self) -> Option<u64> {
        self.generation
    }

    /// 是否属于指定局面
    pub fn is_current(&self, generation: u64) -> bool {
        self.generation == Some(generation)
    }

    pub fn contains(&self, mv: &MoveString) -> bool {
        self.moves.contains(mv)
    }

    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }

    pub fn len(&self) -> usize {
        self.moves.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &MoveString> {
        self.moves.iter()
    }

    /// 是否有从该格出发的走法
    pub fn is_origin(&self, square: Square) -> bool {
        self.moves.iter().any(|mv| mv.from == square)
    }

    /// 从该格出发可到达的目标格（升变后缀合并）
    pub fn targets_from(&self, square: Square) -> Vec<Square> {
        let targets: BTreeSet<Square> = self
            .moves
            .iter()
            .filter(|mv| mv.from == square)
            .map(|mv| mv.to)
            .collect();
        targets.into_iter().collect()
    }

    /// 起止格相同、只差升变后缀时可选的升变棋子
    pub fn promotion_pieces(&self, from: Square, to: Square) -> Vec<PromotionPiece> {
        PromotionPiece::ALL
            .into_iter()
            .filter(|&piece| self.contains(&MoveString::with_promotion(from, to, piece)))
            .collect()
    }
}

/// 一次 `apply` 的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ApplyOutcome {
    /// 是否有字段发生变化
    pub changed: bool,
    /// 局面是否变化
    pub position_changed: bool,
    /// 局面变化是否由采纳引擎建议引起
    pub adopted_suggestion: bool,
    /// 是否刚刚进入终局
    pub became_terminal: bool,
}

/// 只读快照
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StoreSnapshot {
    pub role: Role,
    pub game: GameState,
    pub engine: EngineStatus,
    pub legal_moves: LegalMoveSet,
}

impl StoreSnapshot {
    /// 是否轮到本方走棋；由引擎代走时不算
    pub fn is_my_turn(&self) -> bool {
        self.role.is_player()
            && self.game.turn_owner == Some(self.role)
            && self.game.mover != Some(Mover::Engine)
    }

    /// 合法走法是否属于当前局面
    pub fn legal_moves_current(&self) -> bool {
        self.legal_moves.is_current(self.game.position_generation)
    }
}

/// 校验通过、等待提交的状态
struct Validated {
    position: String,
    history: Option<Vec<String>>,
    reason: TerminalReason,
    turn: Option<Role>,
}

/// 对局状态存储
#[derive(Debug, Default)]
pub struct GameStateStore {
    inner: StoreSnapshot,
}

impl GameStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn role(&self) -> Role {
        self.inner.role
    }

    pub fn game(&self) -> &GameState {
        &self.inner.game
    }

    pub fn engine(&self) -> &EngineStatus {
        &self.inner.engine
    }

    pub fn legal_moves(&self) -> &LegalMoveSet {
        &self.inner.legal_moves
    }

    /// 是否轮到本方走棋
    pub fn is_my_turn(&self) -> bool {
        self.inner.is_my_turn()
    }

    /// 合法走法是否属于当前局面
    pub fn legal_moves_current(&self) -> bool {
        self.inner.legal_moves_current()
    }

    /// 获取只读快照
    pub fn snapshot(&self) -> StoreSnapshot {
        self.inner.clone()
    }

    /// 设置角色，返回是否变化
    pub fn set_role(&mut self, role: Role) -> bool {
        let changed = self.inner.role != role;
        self.inner.role = role;
        changed
    }

    /// 用远端下发的集合整体替换合法走法，归属当前局面
    pub fn replace_legal_moves(&mut self, moves: impl IntoIterator<Item = MoveString>) {
        self.inner.legal_moves = LegalMoveSet::new(moves, self.inner.game.position_generation);
    }

    /// 原子地应用一次状态更新
    pub fn apply(&mut self, update: &StateUpdate) -> Result<ApplyOutcome, StateError> {
        let validated = self.validate(update)?;
        Ok(self.commit(update, validated))
    }

    fn validate(&self, update: &StateUpdate) -> Result<Validated, StateError> {
        let current = &self.inner.game;

        let position = match &update.position {
            Some(p) if p.trim().is_empty() => return Err(StateError::EmptyPosition),
            Some(p) => p.clone(),
            None => current.position.clone(),
        };
        let position_present = update.position.is_some();

        if let Some(plies) = &update.history_plies {
            if let Some(bad) = plies
                .iter()
                .find(|ply| ply.is_empty() || ply.chars().any(char::is_whitespace))
            {
                return Err(StateError::MalformedHistory { ply: bad.clone() });
            }
        }

        // 新局面未声明终局状态时视为对局继续
        let reason = match update.terminal {
            Some(reason) => reason,
            None if position_present => TerminalReason::None,
            None => current.terminal_reason,
        };

        let turn = if reason.is_terminal() {
            None
        } else if update.turn.is_some() || position_present || current.terminal {
            let turn = update
                .turn
                .or_else(|| side_to_move(&position))
                .ok_or_else(|| StateError::UnknownTurn {
                    position: position.clone(),
                })?;
            if turn == Role::Spectator {
                return Err(StateError::SpectatorTurn);
            }
            Some(turn)
        } else {
            current.turn_owner
        };

        Ok(Validated {
            position,
            history: update.history_plies.clone(),
            reason,
            turn,
        })
    }

    fn commit(&mut self, update: &StateUpdate, v: Validated) -> ApplyOutcome {
        let before = self.inner.clone();
        let game = &mut self.inner.game;
        let engine = &mut self.inner.engine;

        let position_changed = v.position != game.position;
        let adopted_suggestion = position_changed
            && Self::is_adoption(&game.history_plies, v.history.as_deref(), engine);

        if position_changed {
            let bootstrap = !game.has_position()
                && self.inner.legal_moves.is_current(game.position_generation);
            game.position_generation += 1;
            // 首个局面到达前收到的合法走法归属于该局面
            if bootstrap {
                self.inner.legal_moves.generation = Some(game.position_generation);
            }
            if !adopted_suggestion {
                engine.last_suggested_move = None;
                engine.last_search_depth = None;
            }
        }

        let was_terminal = game.terminal;
        game.position = v.position;
        if let Some(history) = v.history {
            game.history_plies = history;
        }
        game.terminal_reason = v.reason;
        game.terminal = v.reason.is_terminal();
        game.turn_owner = v.turn;
        game.mover = if game.terminal {
            None
        } else if update.mover.is_some() {
            update.mover
        } else if position_changed {
            None
        } else {
            game.mover
        };

        if let Some(thinking) = update.thinking {
            engine.thinking = thinking;
        }
        if let Some(mv) = update.last_suggested_move {
            engine.last_suggested_move = Some(mv);
        }
        if let Some(depth) = update.last_search_depth {
            engine.last_search_depth = Some(depth);
        }

        let became_terminal = !was_terminal && game.terminal;
        ApplyOutcome {
            changed: before != self.inner,
            position_changed,
            adopted_suggestion,
            became_terminal,
        }
    }

    /// 历史恰好多出一步且该步就是引擎建议着法
    fn is_adoption(old: &[String], new: Option<&[String]>, engine: &EngineStatus) -> bool {
        let (Some(new), Some(suggested)) = (new, engine.last_suggested_move) else {
            return false;
        };
        new.len() == old.len() + 1
            && new[..old.len()] == *old
            && new.last().map(String::as_str) == Some(suggested.to_string().as_str())
    }
}
