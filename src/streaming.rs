//! Progressive reveal of a reply that is already fully known.

use futures::channel::oneshot;
use std::future::Future;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RevealFrame<'a> {
    pub visible: &'a str,
    pub done: bool,
}

/// Lazy sequence of growing prefixes of `text`, `quantum` characters at a time.
///
/// The last frame is always the whole text with `done` set. Empty text yields
/// a single empty, finished frame.
#[derive(Debug, Clone)]
pub struct Reveal<'a> {
    text: &'a str,
    quantum: usize,
    cursor: usize,
    finished: bool,
}

impl<'a> Reveal<'a> {
    pub fn new(text: &'a str, quantum: usize) -> Self {
        Self {
            text,
            quantum: quantum.max(1),
            cursor: 0,
            finished: false,
        }
    }

    pub fn restart(&mut self) {
        self.cursor = 0;
        self.finished = false;
    }

    pub fn text(&self) -> &'a str {
        self.text
    }
}

impl<'a> Iterator for Reveal<'a> {
    type Item = RevealFrame<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        let rest = &self.text[self.cursor..];
        let step = rest
            .char_indices()
            .nth(self.quantum)
            .map(|(idx, _)| idx)
            .unwrap_or(rest.len());
        self.cursor += step;
        self.finished = self.cursor >= self.text.len();

        Some(RevealFrame {
            visible: &self.text[..self.cursor],
            done: self.finished,
        })
    }
}

/// Host hook that resolves once the next frame may be painted.
pub trait FrameScheduler {
    fn next_frame(&self, delay: Duration) -> impl Future<Output = ()>;
}

/// Schedules frames with the browser's `setTimeout`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TimeoutScheduler;

impl FrameScheduler for TimeoutScheduler {
    fn next_frame(&self, delay: Duration) -> impl Future<Output = ()> {
        let (tx, rx) = oneshot::channel::<()>();
        leptos::prelude::set_timeout(
            move || {
                let _ = tx.send(());
            },
            delay,
        );
        async move {
            let _ = rx.await;
        }
    }
}
