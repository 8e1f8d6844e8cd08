//! Plane selection strategies for BSP tree construction.
//!
//! The choice of splitting plane decides how many faces get split, how
//! deep the tree grows and how well the leaves follow the walls.

use crate::{Classification, Face, FaceId, Plane3D};

/// Strategy for choosing the splitting plane of a face subset.
pub trait PlaneSelector {
    /// Select a plane from the supporting planes of `subset`.
    ///
    /// Returns `None` if the subset is empty.
    fn select(&self, faces: &[Face], subset: &[FaceId]) -> Option<Plane3D>;
}

/// Weights of the scoring terms used by [`ScoredSelector`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectorWeights {
    pub area: f32,
    pub balance: f32,
    pub straddle: f32,
    pub axis_aligned: f32,
}

impl Default for SelectorWeights {
    fn default() -> Self {
        Self {
            area: 4.0,
            balance: 2.0,
            straddle: 20.0,
            axis_aligned: 1.0,
        }
    }
}

/// Scores every distinct supporting plane of the subset and picks the best.
///
/// Strongly prefers planes that split few faces, then balanced partitions,
/// then planes covered by a lot of face area, with a small bonus for axis
/// alignment. Ties go to the plane encountered first.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScoredSelector {
    pub weights: SelectorWeights,
}

#[derive(Debug)]
struct Candidate {
    plane: Plane3D,
    area: f32,
    balance: f32,
    straddle: f32,
    axis_aligned: bool,
}

impl PlaneSelector for ScoredSelector {
    fn select(&self, faces: &[Face], subset: &[FaceId]) -> Option<Plane3D> {
        let mut candidates: Vec<Candidate> = Vec::new();
        for &id in subset {
            let polygon = &faces[id.index()].polygon;
            match candidates.iter_mut().find(|c| c.plane.approx_eq(polygon.plane())) {
                Some(candidate) => candidate.area += polygon.area(),
                None => candidates.push(Candidate {
                    plane: polygon.plane().clone(),
                    area: polygon.area(),
                    balance: 0.0,
                    straddle: 0.0,
                    axis_aligned: polygon.plane().is_axis_aligned(),
                }),
            }
        }

        for candidate in &mut candidates {
            let (mut front, mut back, mut straddle) = (0i32, 0i32, 0u32);
            for &id in subset {
                match faces[id.index()].polygon.classify(&candidate.plane) {
                    Classification::Front => front += 1,
                    Classification::Back => back += 1,
                    Classification::Spanning => straddle += 1,
                    Classification::CoplanarFront | Classification::CoplanarBack => {}
                }
            }
            candidate.balance = (front - back).abs() as f32;
            candidate.straddle = straddle as f32;
        }

        let max_area = candidates.iter().map(|c| c.area).fold(0.0, f32::max);
        let max_balance = candidates.iter().map(|c| c.balance).fold(0.0, f32::max);
        let max_straddle = candidates.iter().map(|c| c.straddle).fold(0.0, f32::max);
        let ratio = |value: f32, max: f32| if max > 0.0 { value / max } else { 0.0 };

        let w = &self.weights;
        let mut best: Option<(f32, Candidate)> = None;
        for candidate in candidates {
            let score = w.area * ratio(candidate.area, max_area)
                + w.balance * (1.0 - ratio(candidate.balance, max_balance))
                + w.straddle * (1.0 - ratio(candidate.straddle, max_straddle))
                + if candidate.axis_aligned { w.axis_aligned } else { 0.0 };
            if best.as_ref().is_none_or(|(best_score, _)| score > *best_score) {
                best = Some((score, candidate));
            }
        }

        best.map(|(_, candidate)| candidate.plane)
    }
}
