// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use log::{debug, warn};
use std::collections::VecDeque;

pub const DISMISS_LABEL: &str = "OK";

const MAX_PENDING: usize = 32;

/// Anything that can put a message in front of the user.
pub trait NotificationPresenter {
    fn show(&mut self, message: &str);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub message: String,
}

/// Modal acknowledgement dialogs. While a message is pending it blocks the
/// view underneath; requests that arrive meanwhile wait in arrival order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModalNotifications {
    queue: VecDeque<Notification>,
}

impl ModalNotifications {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<&Notification> {
        self.queue.front()
    }

    pub fn is_blocking(&self) -> bool {
        !self.queue.is_empty()
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    pub fn dismiss(&mut self) -> Option<Notification> {
        self.queue.pop_front()
    }
}

impl NotificationPresenter for ModalNotifications {
    fn show(&mut self, message: &str) {
        if self
            .queue
            .back()
            .is_some_and(|last| last.message == message)
        {
            debug!("notification already pending: {message}");
            return;
        }
        if self.queue.len() >= MAX_PENDING {
            warn!("dropping notification, {MAX_PENDING} already pending: {message}");
            return;
        }
        self.queue.push_back(Notification {
            message: message.to_owned(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::{MAX_PENDING, ModalNotifications, NotificationPresenter};

    #[test]
    fn notifications_queue_in_arrival_order() {
        let mut modal = ModalNotifications::new();
        assert!(!modal.is_blocking());

        modal.show("first");
        modal.show("second");
        assert!(modal.is_blocking());
        assert_eq!(modal.current().map(|n| n.message.as_str()), Some("first"));

        modal.dismiss();
        assert_eq!(modal.current().map(|n| n.message.as_str()), Some("second"));
        modal.dismiss();
        assert!(!modal.is_blocking());
        assert!(modal.dismiss().is_none());
    }

    #[test]
    fn repeated_message_is_coalesced() {
        let mut modal = ModalNotifications::new();
        modal.show("update rejected");
        modal.show("update rejected");
        assert_eq!(modal.pending(), 1);
    }

    #[test]
    fn queue_is_bounded() {
        let mut modal = ModalNotifications::new();
        for index in 0..MAX_PENDING + 5 {
            modal.show(&format!("message {index}"));
        }
        assert_eq!(modal.pending(), MAX_PENDING);
        assert_eq!(
            modal.current().map(|n| n.message.as_str()),
            Some("message 0")
        );
    }
}
