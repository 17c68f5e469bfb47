//! 提示消息 - 视图层唯一的反馈出口
//!
//! 成功、警告、错误都经由这里展示，超过设定时间后自动视为已关闭。

use std::fmt;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// 消息级别
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Warning,
    Error,
}

impl NoticeLevel {
    fn icon(self) -> &'static str {
        match self {
            NoticeLevel::Success => "✓",
            NoticeLevel::Warning => "⚠️",
            NoticeLevel::Error => "❌",
        }
    }
}

/// 一条提示消息
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub text: String,
    pub shown_at: Instant,
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.level.icon(), self.text)
    }
}

/// 消息栏，只保留最近一条
#[derive(Debug)]
pub struct NoticeBoard {
    dismiss_after: Duration,
    current: Option<Notice>,
    history: Vec<Notice>,
}

impl NoticeBoard {
    pub fn new(dismiss_after: Duration) -> Self {
        Self {
            dismiss_after,
            current: None,
            history: Vec::new(),
        }
    }

    pub fn success(&mut self, text: impl Into<String>) {
        self.push(NoticeLevel::Success, text.into());
    }

    pub fn warning(&mut self, text: impl Into<String>) {
        self.push(NoticeLevel::Warning, text.into());
    }

    pub fn error(&mut self, text: impl Into<String>) {
        self.push(NoticeLevel::Error, text.into());
    }

    fn push(&mut self, level: NoticeLevel, text: String) {
        match level {
            NoticeLevel::Success => info!("{} {}", level.icon(), text),
            NoticeLevel::Warning | NoticeLevel::Error => warn!("{} {}", level.icon(), text),
        }
        let notice = Notice {
            level,
            text,
            shown_at: Instant::now(),
        };
        self.history.push(notice.clone());
        self.current = Some(notice);
    }

    /// 当前仍在显示的消息
    pub fn visible(&self) -> Option<&Notice> {
        self.visible_at(Instant::now())
    }

    pub fn visible_at(&self, now: Instant) -> Option<&Notice> {
        self.current
            .as_ref()
            .filter(|n| now.saturating_duration_since(n.shown_at) < self.dismiss_after)
    }

    /// 手动关闭
    pub fn dismiss(&mut self) {
        self.current = None;
    }

    /// 最近一条消息，不论是否已过期
    pub fn last(&self) -> Option<&Notice> {
        self.history.last()
    }

    /// 取走自上次调用以来产生的全部消息
    pub fn drain(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.history)
    }
}
