use crate::audio::timeline::AssetFrameRecord;

/// Collects which media assets were active in each rendered frame.
///
/// Nodes call [`AssetCollector::register`] while drawing; the host calls
/// [`AssetCollector::finish_frame`] once every node of the frame has drawn.
#[derive(Clone, Debug, Default)]
pub struct AssetCollector {
    current: Vec<AssetFrameRecord>,
    frames: Vec<Vec<AssetFrameRecord>>,
}

impl AssetCollector {
    /// Empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `record` for the frame being drawn. A second record with the same key in the same
    /// frame replaces the first.
    pub fn register(&mut self, record: AssetFrameRecord) {
        match self.current.iter_mut().find(|r| r.key == record.key) {
            Some(existing) => *existing = record,
            None => self.current.push(record),
        }
    }

    /// Records registered for the frame being drawn.
    pub fn pending(&self) -> &[AssetFrameRecord] {
        &self.current
    }

    /// Close the current frame and return its snapshot.
    pub fn finish_frame(&mut self) -> &[AssetFrameRecord] {
        self.frames.push(std::mem::take(&mut self.current));
        self.frames.last().map_or(&[], Vec::as_slice)
    }

    /// Snapshots of every finished frame, in order.
    pub fn frames(&self) -> &[Vec<AssetFrameRecord>] {
        &self.frames
    }

    /// Move every finished snapshot out of the collector.
    pub fn take_frames(&mut self) -> Vec<Vec<AssetFrameRecord>> {
        std::mem::take(&mut self.frames)
    }

    /// Drop pending and finished records.
    pub fn clear(&mut self) {
        self.current.clear();
        self.frames.clear();
    }
}
