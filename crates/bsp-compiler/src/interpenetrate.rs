//! Splitting of faces that pass through each other.

use crate::progress::Progress;
use crate::{Classification, Cuttable, WorldGeometry, ROUND_EPSILON};

/// Splits every face that crosses the plane of another face it touches.
///
/// For a crossing pair the straddling face is cut along the other's plane:
/// the front piece stays at its index and the back piece is appended, where
/// it is paired with the remaining faces in turn. Both directions of each
/// pair are tried. Cuts that would leave a degenerate piece are skipped.
#[derive(Debug, Clone, Copy, Default)]
pub struct InterpenetrationResolver;

impl InterpenetrationResolver {
    /// Returns the number of splits made. Face ids stay valid; new faces
    /// are appended.
    pub fn resolve(&self, world: &mut WorldGeometry) -> usize {
        let mut splits = 0;
        let mut progress = Progress::new("interpenetration", world.faces.len());

        let mut i = 0;
        while i < world.faces.len() {
            let row_start = world.faces.len();
            let mut j = i + 1;
            while j < world.faces.len() {
                if world.faces[i]
                    .bounds()
                    .overlaps(&world.faces[j].bounds(), ROUND_EPSILON)
                {
                    splits += usize::from(self.split_by(world, i, j));
                    splits += usize::from(self.split_by(world, j, i));
                }
                j += 1;
            }
            progress.extend(world.faces.len() - row_start);
            progress.tick();
            i += 1;
        }

        log::info!("interpenetration: {splits} splits, {} faces", world.faces.len());
        splits
    }

    /// Cuts face `target` by the plane of face `by` if it straddles it.
    fn split_by(&self, world: &mut WorldGeometry, target: usize, by: usize) -> bool {
        let plane = world.faces[by].polygon.plane().clone();
        let face = &world.faces[target];
        if face.polygon.classify(&plane) != Classification::Spanning {
            return false;
        }
        let (Some(front), Some(back)) = face.polygon.cut(&plane) else {
            log::debug!("interpenetration: degenerate cut of face {target} by face {by}, skipped");
            return false;
        };
        let back_face = face.with_polygon(back);
        world.faces[target].polygon = front;
        world.faces.push(back_face);
        true
    }
}
