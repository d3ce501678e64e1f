use line_protocol::ProgramId;

/// What changed since the previously drawn tile of the layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileStateChange {
    pub program_changed: bool,
    pub tile_ratio_changed: bool,
}

impl TileStateChange {
    /// Zoom-ratio dependent uniforms are rebuilt on either change.
    pub fn needs_ratio_uniforms(self) -> bool {
        self.program_changed || self.tile_ratio_changed
    }
}

/// Tracks the program and overscaled zoom of the last drawn tile within one
/// layer draw. Skipped tiles never advance it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LoopState {
    previous_program: Option<ProgramId>,
    previous_overscaled_z: Option<u8>,
}

impl LoopState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_first_tile(&self) -> bool {
        self.previous_program.is_none()
    }

    pub fn previous_program(&self) -> Option<ProgramId> {
        self.previous_program
    }

    pub fn previous_overscaled_z(&self) -> Option<u8> {
        self.previous_overscaled_z
    }

    pub fn compare(&self, program: ProgramId, overscaled_z: u8) -> TileStateChange {
        TileStateChange {
            program_changed: self.previous_program != Some(program),
            tile_ratio_changed: self.previous_overscaled_z != Some(overscaled_z),
        }
    }

    /// State after a tile drawn with `program` at `overscaled_z`.
    #[must_use]
    pub fn advance(self, program: ProgramId, overscaled_z: u8) -> Self {
        Self {
            previous_program: Some(program),
            previous_overscaled_z: Some(overscaled_z),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::SlotMap;

    fn programs() -> (ProgramId, ProgramId) {
        let mut map: SlotMap<ProgramId, ()> = SlotMap::with_key();
        (map.insert(()), map.insert(()))
    }

    #[test]
    fn first_tile_reports_every_change() {
        let (program, _) = programs();
        let state = LoopState::new();
        assert!(state.is_first_tile());
        let change = state.compare(program, 10);
        assert!(change.program_changed);
        assert!(change.tile_ratio_changed);
    }

    #[test]
    fn same_program_and_zoom_reports_nothing() {
        let (program, _) = programs();
        let state = LoopState::new().advance(program, 10);
        assert!(!state.is_first_tile());
        let change = state.compare(program, 10);
        assert!(!change.needs_ratio_uniforms());
    }

    #[test]
    fn zoom_change_alone_rebuilds_ratio_uniforms() {
        let (program, _) = programs();
        let state = LoopState::new().advance(program, 10);
        let change = state.compare(program, 11);
        assert!(!change.program_changed);
        assert!(change.tile_ratio_changed);
        assert!(change.needs_ratio_uniforms());
    }

    #[test]
    fn program_switch_is_detected() {
        let (first, second) = programs();
        let state = LoopState::new().advance(first, 10);
        let change = state.compare(second, 10);
        assert!(change.program_changed);
        assert!(!change.tile_ratio_changed);
        assert_eq!(state.previous_program(), Some(first));
        assert_eq!(state.previous_overscaled_z(), Some(10));
    }
}
