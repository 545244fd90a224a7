use crate::message::Frame;

/// One-shot view of the log as it was when taken.
pub type Snapshot = std::vec::IntoIter<Frame>;

/// Append-only, insertion-ordered message log. Lives as long as the process
/// and is never trimmed, so memory grows with every message published.
#[derive(Default)]
pub struct History {
    frames: Vec<Frame>,
}

impl History {
    pub fn append(&mut self, frame: Frame) {
        self.frames.push(frame);
    }

    pub fn snapshot(&self) -> Snapshot {
        self.frames.clone().into_iter()
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_is_ordered_and_frozen() {
        let mut log = History::default();
        log.append("a".into());
        log.append("b".into());

        let snap = log.snapshot();
        log.append("c".into());

        let seen: Vec<_> = snap.map(|f| f.to_string()).collect();
        assert_eq!(seen, ["a", "b"]);
        assert_eq!(log.len(), 3);
    }
}
