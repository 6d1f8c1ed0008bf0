use std::cell::RefCell;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Error,
}

/// Toast layer of the host UI.
pub trait Notifier {
    fn notify(&self, kind: NoticeKind, message: &str);
}

// Headless hosts: notices only go to the log
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, kind: NoticeKind, message: &str) {
        match kind {
            NoticeKind::Success => log::info!("{}", message),
            NoticeKind::Error => log::error!("{}", message),
        }
    }
}

/// Keeps every notice in memory and mirrors it to the log; the shell drains
/// it after each command.
#[derive(Debug, Default)]
pub struct NoticeLog {
    notices: RefCell<Vec<(NoticeKind, String)>>,
}

impl NoticeLog {
    pub fn new() -> Self { Self::default() }

    pub fn drain(&self) -> Vec<(NoticeKind, String)> {
        self.notices.borrow_mut().drain(..).collect()
    }

    pub fn count(&self, kind: NoticeKind) -> usize {
        self.notices.borrow().iter().filter(|(k, _)| *k == kind).count()
    }

    pub fn messages(&self) -> Vec<String> {
        self.notices.borrow().iter().map(|(_, m)| m.clone()).collect()
    }
}

impl Notifier for NoticeLog {
    fn notify(&self, kind: NoticeKind, message: &str) {
        LogNotifier.notify(kind, message);
        self.notices.borrow_mut().push((kind, message.to_string()));
    }
}

impl<T: Notifier + ?Sized> Notifier for std::rc::Rc<T> {
    fn notify(&self, kind: NoticeKind, message: &str) {
        (**self).notify(kind, message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    #[test]
    fn notice_log_records_and_drains() {
        let log = Rc::new(NoticeLog::new());
        let shared: &dyn Notifier = &log;
        shared.notify(NoticeKind::Success, "saved");
        shared.notify(NoticeKind::Error, "failed");
        assert_eq!(log.count(NoticeKind::Error), 1);
        assert_eq!(log.messages(), vec!["saved".to_string(), "failed".to_string()]);
        assert_eq!(log.drain().len(), 2);
        assert_eq!(log.count(NoticeKind::Success), 0);
    }
}
