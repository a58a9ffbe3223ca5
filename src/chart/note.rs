use serde::Serialize;

/// Playable lanes, left ring finger to right ring finger.
pub const LANE_COUNT: usize = 4;

/// Reserved, non-playable lane for region markers.
pub const MARKER_LANE: u8 = 4;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoteKind {
    Tap,
    Long,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub lane: u8,
    pub beat: f64,
    #[serde(rename = "type")]
    pub kind: NoteKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_beat: Option<f64>,
}

impl Note {
    pub fn tap(lane: u8, beat: f64) -> Self {
        Self {
            lane,
            beat: round2(beat),
            kind: NoteKind::Tap,
            end_beat: None,
        }
    }

    pub fn long(lane: u8, beat: f64, end_beat: f64) -> Self {
        Self {
            lane,
            beat: round2(beat),
            kind: NoteKind::Long,
            end_beat: Some(round2(end_beat)),
        }
    }

    pub fn is_long(&self) -> bool {
        self.kind == NoteKind::Long
    }

    /// Beat range the note occupies, widened by `margin` on both ends.
    pub fn guarded_span(&self, margin: f64) -> (f64, f64) {
        let end = self.end_beat.unwrap_or(self.beat);
        (self.beat - margin, end + margin)
    }
}

/// Round to 2 decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
