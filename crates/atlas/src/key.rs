use std::marker::PhantomData;

#[derive(Debug, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct Id<Tag, Repr> {
    raw: Repr,
    _marker: PhantomData<Tag>,
}

impl<Tag, Repr: Copy> Copy for Id<Tag, Repr> {}

impl<Tag, Repr: Copy> Clone for Id<Tag, Repr> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<Tag, Repr> Id<Tag, Repr> {
    pub(crate) const fn new(raw: Repr) -> Self {
        Self {
            raw,
            _marker: PhantomData,
        }
    }

    pub(crate) const fn raw(self) -> Repr
    where
        Repr: Copy,
    {
        self.raw
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum RowTag {}
pub type RowId = Id<RowTag, u32>;

/// Lookup key of a dash atlas entry.
///
/// Round-capped dashes are rasterized with extra rows, so the same dash array
/// with a round cap is a different entry than with butt or square caps.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DashKey {
    segments: Box<[u32]>,
    round: bool,
}

impl DashKey {
    pub fn new(dasharray: &[f32], round: bool) -> Self {
        let segments = dasharray
            .iter()
            // -0.0 and 0.0 describe the same dash
            .map(|length| if *length == 0.0 { 0 } else { length.to_bits() })
            .collect();
        Self { segments, round }
    }

    pub fn is_round(&self) -> bool {
        self.round
    }

    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }
}
