// SPDX-License-Identifier: GPL-3.0-only

//! Transient user notices
//!
//! Sessions and the permission gate raise notices; front-ends show the
//! current one until it expires. Notices queue up so a burst of errors is
//! shown one after the other rather than overwriting each other.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Severity of a notice
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

/// A short message shown to the user for a limited time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub text: String,
}

impl Notice {
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            text: text.into(),
        }
    }

    pub fn warning(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warning,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            text: text.into(),
        }
    }
}

impl std::fmt::Display for Notice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text)
    }
}

/// Queue of notices with a fixed display duration
#[derive(Debug)]
pub struct NoticeQueue {
    duration: Duration,
    shown: Option<(Notice, Instant)>,
    pending: VecDeque<Notice>,
}

impl NoticeQueue {
    pub fn new(duration: Duration) -> Self {
        Self {
            duration,
            shown: None,
            pending: VecDeque::new(),
        }
    }

    /// Queue a notice; it is shown immediately if nothing else is
    pub fn push(&mut self, notice: Notice, now: Instant) {
        // Identical back-to-back notices collapse into one
        let duplicate = self
            .pending
            .back()
            .or(self.shown.as_ref().map(|(n, _)| n))
            .is_some_and(|last| *last == notice);
        if duplicate {
            return;
        }
        self.pending.push_back(notice);
        self.tick(now);
    }

    /// Expire the shown notice and promote the next pending one
    pub fn tick(&mut self, now: Instant) {
        if let Some((_, since)) = &self.shown
            && now.duration_since(*since) >= self.duration
        {
            self.shown = None;
        }
        if self.shown.is_none()
            && let Some(next) = self.pending.pop_front()
        {
            self.shown = Some((next, now));
        }
    }

    /// Notice currently on screen
    pub fn current(&self) -> Option<&Notice> {
        self.shown.as_ref().map(|(n, _)| n)
    }

    pub fn is_empty(&self) -> bool {
        self.shown.is_none() && self.pending.is_empty()
    }
}
