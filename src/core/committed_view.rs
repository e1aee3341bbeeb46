//! Last committed state per user
//!
//! Queries read from here instead of waiting on the user's lock. A view is
//! replaced whole when a mutation commits, so a reader sees the balance and
//! the history prefix of one commit together, never the gap between a
//! balance write and its history append.
//!
//! # Publication
//!
//! ```text
//! exclusive lease taken
//!     ├── pin     (first mutation of the user: record the state before it)
//!     ├── write balance, append history
//!     └── publish (only after both succeeded)
//! ```
//!
//! A user without a view has never been mutated through this engine. Loading
//! such a user and pinning it both go through the same DashMap entry, so a
//! load either completes before the first write starts or finds the pinned
//! view.

use crate::types::{HistoryId, PointHistory, UserId, UserPoint};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;

/// State of one user as of their last commit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserView {
    pub balance: UserPoint,
    /// Id of the newest history record included, `None` if there is none
    pub last_history_id: Option<HistoryId>,
}

impl UserView {
    /// Build a view from a balance and that user's full history
    pub fn from_parts(balance: UserPoint, history: &[PointHistory]) -> Self {
        Self {
            balance,
            last_history_id: history.last().map(|record| record.id),
        }
    }

    /// Keep only the records this view covers
    pub fn visible_history(&self, mut history: Vec<PointHistory>) -> Vec<PointHistory> {
        match self.last_history_id {
            Some(last) => {
                history.retain(|record| record.id <= last);
                history
            }
            None => Vec::new(),
        }
    }
}

/// Committed views keyed by user
///
/// Cheap to clone; clones share the same views.
#[derive(Debug, Clone, Default)]
pub struct CommittedViews {
    views: Arc<DashMap<UserId, UserView>>,
}

impl CommittedViews {
    pub fn new() -> Self {
        Self {
            views: Arc::new(DashMap::new()),
        }
    }

    /// The user's committed view, or `load` if they have none
    ///
    /// `load` runs under the entry's shard lock and its result is not stored,
    /// so unknown users leave nothing behind.
    pub fn read(&self, user_id: UserId, load: impl FnOnce() -> UserView) -> UserView {
        match self.views.entry(user_id) {
            Entry::Occupied(entry) => *entry.get(),
            Entry::Vacant(vacant) => {
                let view = load();
                drop(vacant);
                view
            }
        }
    }

    /// Record the state before a user's first mutation
    ///
    /// Must run under the user's exclusive lease and before the balance
    /// store is written. Does nothing if the user already has a view.
    pub fn pin(&self, user_id: UserId, load: impl FnOnce() -> UserView) {
        self.views.entry(user_id).or_insert_with(load);
    }

    /// Replace the user's view after a successful commit
    pub fn publish(&self, user_id: UserId, view: UserView) {
        self.views.insert(user_id, view);
    }

    /// Number of users with a view
    pub fn len(&self) -> usize {
        self.views.len()
    }

    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TransactionKind;
    use chrono::Utc;

    fn record(id: HistoryId, amount: i64) -> PointHistory {
        PointHistory {
            id,
            user_id: 1,
            amount,
            kind: TransactionKind::Charge,
            timestamp: Utc::now(),
        }
    }

    fn view(point: i64, last_history_id: Option<HistoryId>) -> UserView {
        UserView {
            balance: UserPoint {
                user_id: 1,
                point,
                updated_at: Utc::now(),
            },
            last_history_id,
        }
    }

    #[test]
    fn test_read_without_view_loads_and_stores_nothing() {
        let views = CommittedViews::new();

        let loaded = views.read(1, || view(30, None));

        assert_eq!(loaded.balance.point, 30);
        assert!(views.is_empty());
    }

    #[test]
    fn test_pin_keeps_existing_view() {
        let views = CommittedViews::new();
        views.pin(1, || view(10, Some(1)));
        views.pin(1, || view(99, Some(7)));

        let current = views.read(1, || panic!("view should exist"));
        assert_eq!(current.balance.point, 10);
        assert_eq!(current.last_history_id, Some(1));
    }

    #[test]
    fn test_publish_replaces_view() {
        let views = CommittedViews::new();
        views.pin(1, || view(10, Some(1)));

        views.publish(1, view(25, Some(4)));

        let current = views.read(1, || panic!("view should exist"));
        assert_eq!((current.balance.point, current.last_history_id), (25, Some(4)));
        assert_eq!(views.len(), 1);
    }

    #[test]
    fn test_visible_history_drops_uncommitted_records() {
        let history = vec![record(1, 10), record(3, 5), record(8, 7)];

        let visible = view(15, Some(3)).visible_history(history.clone());
        assert_eq!(visible.iter().map(|r| r.id).collect::<Vec<_>>(), vec![1, 3]);

        assert!(view(0, None).visible_history(history).is_empty());
    }

    #[test]
    fn test_from_parts_takes_newest_record() {
        let pinned = UserView::from_parts(view(22, None).balance, &[record(2, 10), record(5, 12)]);
        assert_eq!(pinned.last_history_id, Some(5));

        let empty = UserView::from_parts(view(0, None).balance, &[]);
        assert_eq!(empty.last_history_id, None);
    }
}
