// SPDX-License-Identifier: GPL-3.0-or-later
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use super::record::FrameRecord;

/// A handle for removing a listener that was added to a [`Coordinator`][super::Coordinator].
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct ListenerId(u64);

type Callback = dyn Fn(&Arc<FrameRecord>) + Send + Sync;

struct Entry {
    id: ListenerId,
    removed: AtomicBool,
    callback: Box<Callback>,
}

/// An ordered list of callbacks that are invoked whenever a new record is published.
///
/// Callbacks are run without the list locked, so they may add or remove listeners (including
/// themselves). A listener removed during a dispatch round is not called later in that round.
#[derive(Default)]
pub(crate) struct ListenerList {
    next_id: AtomicU64,
    entries: Mutex<Vec<Arc<Entry>>>,
}

impl ListenerList {
    pub(crate) fn add<F>(&self, callback: F) -> ListenerId
    where
        F: Fn(&Arc<FrameRecord>) + Send + Sync + 'static,
    {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let entry = Entry {
            id,
            removed: AtomicBool::new(false),
            callback: Box::new(callback),
        };
        self.entries.lock().push(Arc::new(entry));
        id
    }

    /// Remove a listener. Returns `false` if it was not registered.
    pub(crate) fn remove(&self, id: ListenerId) -> bool {
        let mut entries = self.entries.lock();
        match entries.iter().position(|entry| entry.id == id) {
            Some(index) => {
                let entry = entries.remove(index);
                entry.removed.store(true, Ordering::Release);
                true
            }
            None => false,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Call every registered listener once, in the order they were added.
    pub(crate) fn notify(&self, record: &Arc<FrameRecord>) {
        let snapshot: Vec<Arc<Entry>> = self.entries.lock().clone();
        for entry in snapshot {
            if !entry.removed.load(Ordering::Acquire) {
                (entry.callback)(record);
            }
        }
    }
}
