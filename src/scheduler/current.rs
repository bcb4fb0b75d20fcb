// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::cell::Cell;

use crate::traits::SchedulerKind;

thread_local! {
    static CURRENT: Cell<Option<SchedulerKind>> = const { Cell::new(None) };
}

/// The scheduler kind that owns the calling thread, if any.
pub fn current_kind() -> Option<SchedulerKind> {
    CURRENT.with(Cell::get)
}

pub(crate) fn mark_current(kind: SchedulerKind) {
    CURRENT.with(|current| current.set(Some(kind)));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_threads_have_no_scheduler() {
        let kind = std::thread::spawn(current_kind).join().unwrap();
        assert_eq!(kind, None);
    }

    #[test]
    fn test_mark_is_thread_local() {
        let kind = std::thread::spawn(|| {
            mark_current(SchedulerKind::EventLoop);
            current_kind()
        })
        .join()
        .unwrap();
        assert_eq!(kind, Some(SchedulerKind::EventLoop));
        assert_eq!(std::thread::spawn(current_kind).join().unwrap(), None);
    }
}
