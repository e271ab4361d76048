use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::world::{World, WorldSnapshot};

/// One exported frame: the render snapshot plus when it was written.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotFrame {
    pub written_at: DateTime<Utc>,
    #[serde(flatten)]
    pub snapshot: WorldSnapshot,
}

/// Writes `<dir>/<scenario>/tick_NNNNNN.json` every `interval` ticks.
/// An interval of zero turns export off.
pub struct SnapshotWriter {
    output_dir: PathBuf,
    interval: u64,
}

impl SnapshotWriter {
    pub fn new(output_dir: impl AsRef<Path>, interval: u64) -> Self {
        Self {
            output_dir: output_dir.as_ref().to_path_buf(),
            interval,
        }
    }

    pub fn maybe_write(&self, world: &World, scenario_name: &str) -> Result<Option<PathBuf>> {
        let tick = world.tick();
        if self.interval == 0 || tick % self.interval != 0 {
            return Ok(None);
        }

        let dir = self.output_dir.join(scenario_name);
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create snapshot dir {}", dir.display()))?;
        let file_path = dir.join(format!("tick_{tick:06}.json"));
        let frame = SnapshotFrame {
            written_at: Utc::now(),
            snapshot: world.snapshot(scenario_name),
        };
        let json = serde_json::to_string_pretty(&frame)?;
        fs::write(&file_path, json)
            .with_context(|| format!("Failed to write {}", file_path.display()))?;
        Ok(Some(file_path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{Terrain, WorldGrid};
    use tempfile::tempdir;

    #[test]
    fn writes_only_on_interval_ticks() {
        let temp = tempdir().unwrap();
        let writer = SnapshotWriter::new(temp.path(), 2);
        let mut world = World::new(WorldGrid::filled(3, Terrain::Grass), 1.0, 24.0);
        world.advance_clock(1.0);
        assert_eq!(writer.maybe_write(&world, "demo").unwrap(), None);
        world.advance_clock(1.0);
        let path = writer.maybe_write(&world, "demo").unwrap().unwrap();
        assert!(path.ends_with("demo/tick_000002.json"));

        let data = fs::read_to_string(path).unwrap();
        let frame: SnapshotFrame = serde_json::from_str(&data).unwrap();
        assert_eq!(frame.snapshot.tick, 2);
        assert_eq!(frame.snapshot.tiles.len(), 3);
    }

    #[test]
    fn zero_interval_disables_export() {
        let temp = tempdir().unwrap();
        let writer = SnapshotWriter::new(temp.path(), 0);
        let world = World::new(WorldGrid::filled(3, Terrain::Grass), 1.0, 24.0);
        assert_eq!(writer.maybe_write(&world, "demo").unwrap(), None);
    }
}
