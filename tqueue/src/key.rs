//! Sentinel links.
//!
//! Tree nodes link to their parent and children by arena key. A reserved
//! sentinel (`usize::MAX`) stands in for "no link", which keeps nodes small
//! compared to `Option<usize>` and keeps the rotation code free of `Option`
//! plumbing.

/// A link with a reserved "no link" value.
pub(crate) trait Key: Copy + Eq {
    /// The reserved "no link" value.
    const NONE: Self;

    /// `true` for the "no link" value.
    #[inline]
    fn is_none(self) -> bool {
        self == Self::NONE
    }

    /// `true` for a real link.
    #[inline]
    fn is_some(self) -> bool {
        self != Self::NONE
    }
}

impl Key for usize {
    const NONE: Self = usize::MAX;
}

/// "No node" in every `left`, `right`, `parent` and cached-node field.
pub(crate) const NIL: usize = usize::NONE;
