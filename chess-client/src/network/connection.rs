//! 会话驱动
//!
//! 单个任务内用 `tokio::select!` 轮流等待入站帧和用户手势，
//! 每个事件处理完毕后才处理下一个。

use anyhow::Context;
use protocol::{Connection, ProtocolError};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::{SessionAction, SessionController, SessionNotice, SessionSnapshot};
use crate::game::{Gesture, InteractionOutcome};

/// 发给显示层的事件
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// 需要按快照重绘
    Render(SessionSnapshot),
    /// 手势反馈
    Feedback(InteractionOutcome),
    /// 用户提示
    Notice(SessionNotice),
}

/// 会话运行器
pub struct SessionRunner<C: Connection> {
    connection: C,
    controller: SessionController,
    gestures: mpsc::Receiver<Gesture>,
    events: mpsc::Sender<SessionEvent>,
}

impl<C: Connection> SessionRunner<C> {
    pub fn new(
        connection: C,
        controller: SessionController,
        gestures: mpsc::Receiver<Gesture>,
        events: mpsc::Sender<SessionEvent>,
    ) -> Self {
        Self {
            connection,
            controller,
            gestures,
            events,
        }
    }

    /// 运行会话直到连接关闭或手势来源结束
    pub async fn run(mut self) -> anyhow::Result<SessionController> {
        if let Some(addr) = self.connection.peer_addr() {
            info!("Session started with {}", addr);
        }

        let actions = self.controller.start();
        self.dispatch(actions).await;

        while !self.controller.is_closed() {
            let actions = tokio::select! {
                // 权威状态优先
                biased;

                frame = self.connection.recv_frame() => match frame {
                    Ok(frame) => self.controller.handle_frame(&frame),
                    Err(e @ (ProtocolError::NotText | ProtocolError::FrameTooLarge { .. })) => {
                        warn!("Discarding unreadable frame: {}", e);
                        Vec::new()
                    }
                    Err(e) => self.controller.handle_channel_closed(&e.to_string()),
                },
                gesture = self.gestures.recv() => match gesture {
                    Some(gesture) => self.controller.handle_gesture(gesture),
                    None => {
                        info!("Gesture source closed, ending session");
                        self.connection
                            .close()
                            .await
                            .context("failed to close connection")?;
                        break;
                    }
                },
            };
            self.dispatch(actions).await;
        }

        Ok(self.controller)
    }

    async fn dispatch(&mut self, actions: Vec<SessionAction>) {
        let mut queue = std::collections::VecDeque::from(actions);
        while let Some(action) = queue.pop_front() {
            let event = match action {
                SessionAction::Send(frame) => {
                    if self.controller.is_closed() {
                        continue;
                    }
                    if let Err(e) = self.connection.send_frame(&frame).await {
                        queue.extend(self.controller.handle_channel_closed(&e.to_string()));
                    }
                    continue;
                }
                SessionAction::Render => SessionEvent::Render(self.controller.snapshot()),
                SessionAction::Feedback(outcome) => SessionEvent::Feedback(outcome),
                SessionAction::Notice(notice) => SessionEvent::Notice(notice),
            };
            if self.events.send(event).await.is_err() {
                debug!("Event receiver dropped");
            }
        }
    }
}
