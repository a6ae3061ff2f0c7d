/// How many past items a new subscriber receives before live ones.
#[derive(Default, Debug, PartialEq, Eq, Copy, Clone)]
pub enum ReplayPolicy {
    /// Late subscribers only see items published after they subscribed.
    #[default]
    None,
    /// Late subscribers first receive the last `n` items.
    Last(usize),
    /// Late subscribers first receive every item published so far.
    All,
}

impl ReplayPolicy {
    /// Number of items to retain, `None` meaning unbounded.
    pub(crate) fn capacity(&self) -> Option<usize> {
        match *self {
            ReplayPolicy::None => Some(0),
            ReplayPolicy::Last(n) => Some(n),
            ReplayPolicy::All => None,
        }
    }
}
