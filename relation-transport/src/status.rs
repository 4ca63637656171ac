/// Level-triggered status of one session.
///
/// Downstream reconciliation logic reads these booleans to decide whether
/// to act. `changed` can only be raised together with `available`, so
/// `changed` implies `available` in every reachable state. `changed` is
/// cleared only by explicit acknowledgment, never as a side effect of
/// another update.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct StatusFlags {
    connected: bool,
    available: bool,
    changed: bool,
}

impl StatusFlags {
    /// Mark the peer relation as established.
    pub fn connect(&mut self) {
        self.connected = true;
    }

    /// Record that the data expected from the peer has arrived.
    ///
    /// Raises `available` and `changed` together. Repeated calls keep an
    /// unacknowledged `changed` raised rather than losing it.
    pub fn note_data_arrived(&mut self) {
        self.available = true;
        self.changed = true;
    }

    /// Clear `changed` once the consumer has processed the data.
    /// `available` stays raised.
    pub fn acknowledge(&mut self) {
        self.changed = false;
    }

    /// Drop all flags. Used when the session goes away.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn connected(&self) -> bool {
        self.connected
    }

    pub fn available(&self) -> bool {
        self.available
    }

    pub fn changed(&self) -> bool {
        self.changed
    }
}

#[cfg(test)]
mod tests {
    use super::StatusFlags;
    use quickcheck::{Arbitrary, Gen};
    use quickcheck_macros::quickcheck;

    #[derive(Debug, Clone, Copy)]
    enum Op {
        Connect,
        DataArrived,
        Acknowledge,
        Reset,
    }

    impl Arbitrary for Op {
        fn arbitrary(g: &mut Gen) -> Self {
            *g.choose(&[
                Op::Connect,
                Op::DataArrived,
                Op::Acknowledge,
                Op::Reset,
            ])
            .unwrap()
        }
    }

    fn apply(flags: &mut StatusFlags, op: Op) {
        match op {
            Op::Connect => flags.connect(),
            Op::DataArrived => flags.note_data_arrived(),
            Op::Acknowledge => flags.acknowledge(),
            Op::Reset => flags.reset(),
        }
    }

    #[test]
    fn starts_all_clear() {
        let flags = StatusFlags::default();
        assert!(!flags.connected());
        assert!(!flags.available());
        assert!(!flags.changed());
    }

    #[test]
    fn acknowledge_keeps_available() {
        let mut flags = StatusFlags::default();
        flags.connect();
        flags.note_data_arrived();
        flags.acknowledge();
        assert!(flags.available());
        assert!(!flags.changed());
    }

    #[test]
    fn repeated_arrival_keeps_unacknowledged_change() {
        let mut flags = StatusFlags::default();
        flags.note_data_arrived();
        flags.note_data_arrived();
        assert!(flags.changed());
    }

    #[test]
    fn reset_clears_everything() {
        let mut flags = StatusFlags::default();
        flags.connect();
        flags.note_data_arrived();
        flags.reset();
        assert_eq!(flags, StatusFlags::default());
    }

    #[quickcheck]
    fn changed_implies_available(ops: Vec<Op>) -> bool {
        let mut flags = StatusFlags::default();
        for op in ops {
            apply(&mut flags, op);
            if flags.changed() && !flags.available() {
                return false;
            }
        }
        true
    }

    #[quickcheck]
    fn available_is_monotonic_until_reset(ops: Vec<Op>) -> bool {
        let mut flags = StatusFlags::default();
        for op in ops {
            let was_available = flags.available();
            apply(&mut flags, op);
            if was_available
                && !flags.available()
                && !matches!(op, Op::Reset)
            {
                return false;
            }
        }
        true
    }
}
