use undine_basin::BasinView;
use undine_cells::CellState;
use undine_geom::Vec3;

use crate::face::Face;
use crate::{FOAM_CUTOFF, FOAM_DIP, SURFACE_DIP};

/// One of the 8 cell corners, encoded as a bit triple:
/// bit 0 set means the +x side, bit 1 the +y side, bit 2 the +z side.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct Corner(u8);

impl Corner {
    pub const COUNT: usize = 8;
    pub const ALL: [Corner; Corner::COUNT] = [
        Corner(0),
        Corner(1),
        Corner(2),
        Corner(3),
        Corner(4),
        Corner(5),
        Corner(6),
        Corner(7),
    ];

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }

    #[inline]
    pub fn from_index(i: usize) -> Corner {
        Corner((i & 7) as u8)
    }

    /// Template position of the corner on the unit cell, components 0 or 1.
    #[inline]
    pub fn offset(self) -> Vec3 {
        Vec3::new(
            (self.0 & 1) as f32,
            ((self.0 >> 1) & 1) as f32,
            ((self.0 >> 2) & 1) as f32,
        )
    }

    /// Which side of the cell the corner sits on, per axis: -1 low, +1 high.
    #[inline]
    pub fn signs(self) -> (i32, i32, i32) {
        (
            if self.0 & 1 != 0 { 1 } else { -1 },
            if self.0 & 2 != 0 { 1 } else { -1 },
            if self.0 & 4 != 0 { 1 } else { -1 },
        )
    }
}

/// Corners of each face in outward winding order (counter-clockwise seen
/// from outside the cell). Quad emission uses exactly this order.
pub const FACE_CORNERS: [[Corner; 4]; Face::COUNT] = [
    [Corner(2), Corner(6), Corner(7), Corner(3)], // PosY
    [Corner(0), Corner(1), Corner(5), Corner(4)], // NegY
    [Corner(1), Corner(3), Corner(7), Corner(5)], // PosX
    [Corner(4), Corner(6), Corner(2), Corner(0)], // NegX
    [Corner(4), Corner(5), Corner(7), Corner(6)], // PosZ
    [Corner(1), Corner(0), Corner(2), Corner(3)], // NegZ
];

/// The 7 neighbor cell offsets sharing each corner: three along the axes,
/// three across the edges, one through the corner itself. Indexed by
/// `Corner::index()`; every entry is derivable from `Corner::signs()`.
pub const CORNER_NEIGHBORS: [[(i32, i32, i32); 7]; Corner::COUNT] = [
    [
        (-1, 0, 0),
        (0, -1, 0),
        (0, 0, -1),
        (-1, -1, 0),
        (-1, 0, -1),
        (0, -1, -1),
        (-1, -1, -1),
    ],
    [
        (1, 0, 0),
        (0, -1, 0),
        (0, 0, -1),
        (1, -1, 0),
        (1, 0, -1),
        (0, -1, -1),
        (1, -1, -1),
    ],
    [
        (-1, 0, 0),
        (0, 1, 0),
        (0, 0, -1),
        (-1, 1, 0),
        (-1, 0, -1),
        (0, 1, -1),
        (-1, 1, -1),
    ],
    [
        (1, 0, 0),
        (0, 1, 0),
        (0, 0, -1),
        (1, 1, 0),
        (1, 0, -1),
        (0, 1, -1),
        (1, 1, -1),
    ],
    [
        (-1, 0, 0),
        (0, -1, 0),
        (0, 0, 1),
        (-1, -1, 0),
        (-1, 0, 1),
        (0, -1, 1),
        (-1, -1, 1),
    ],
    [
        (1, 0, 0),
        (0, -1, 0),
        (0, 0, 1),
        (1, -1, 0),
        (1, 0, 1),
        (0, -1, 1),
        (1, -1, 1),
    ],
    [
        (-1, 0, 0),
        (0, 1, 0),
        (0, 0, 1),
        (-1, 1, 0),
        (-1, 0, 1),
        (0, 1, 1),
        (-1, 1, 1),
    ],
    [
        (1, 0, 0),
        (0, 1, 0),
        (0, 0, 1),
        (1, 1, 0),
        (1, 0, 1),
        (0, 1, 1),
        (1, 1, 1),
    ],
];

/// Slot of a `(-1..=1)^3` offset in the 27-entry neighbor scratch.
/// Slot 13 is the cell itself.
#[inline]
pub fn scratch_slot(dx: i32, dy: i32, dz: i32) -> usize {
    ((dx + 1) * 9 + (dy + 1) * 3 + (dz + 1)) as usize
}

const SCRATCH_SLOTS: usize = 27;

/// Per-cell scratch for vertex attenuation. Neighbor cells are resolved at
/// most once per cell, corner results at most once per cell, so adjacent
/// faces share identical corner data. `reset` only clears the two flag
/// arrays; the value arrays are gated by them.
pub struct AttenuationCache {
    neighbors: [CellState; SCRATCH_SLOTS],
    neighbor_valid: [bool; SCRATCH_SLOTS],
    neighbor_retrieved: [bool; SCRATCH_SLOTS],
    corner_done: [bool; Corner::COUNT],
    corner_foam: [f32; Corner::COUNT],
    corner_pos: [Vec3; Corner::COUNT],
}

impl Default for AttenuationCache {
    fn default() -> Self {
        Self::new()
    }
}

impl AttenuationCache {
    pub fn new() -> Self {
        Self {
            neighbors: [CellState::AIR; SCRATCH_SLOTS],
            neighbor_valid: [false; SCRATCH_SLOTS],
            neighbor_retrieved: [false; SCRATCH_SLOTS],
            corner_done: [false; Corner::COUNT],
            corner_foam: [0.0; Corner::COUNT],
            corner_pos: [Vec3::ZERO; Corner::COUNT],
        }
    }

    /// Readies the scratch for the next cell.
    #[inline]
    pub fn reset(&mut self) {
        self.neighbor_retrieved = [false; SCRATCH_SLOTS];
        self.corner_done = [false; Corner::COUNT];
    }

    #[inline]
    fn neighbor(
        &mut self,
        view: &BasinView,
        x: usize,
        y: usize,
        z: usize,
        dx: i32,
        dy: i32,
        dz: i32,
    ) -> Option<CellState> {
        let slot = scratch_slot(dx, dy, dz);
        if !self.neighbor_retrieved[slot] {
            self.neighbor_retrieved[slot] = true;
            match view.neighbor(x, y, z, dx, dy, dz) {
                Some(cell) => {
                    self.neighbors[slot] = cell;
                    self.neighbor_valid[slot] = true;
                }
                None => self.neighbor_valid[slot] = false,
            }
        }
        self.neighbor_valid[slot].then_some(self.neighbors[slot])
    }

    /// Foaminess and world position for one corner of the current cell.
    ///
    /// Foaminess is the share of liquid-free cells among the corner's
    /// neighborhood, the cell itself seeding the count. Values at or below
    /// the cutoff flatten to zero; above it, corners away from a shoreline
    /// dip an extra step so breaking foam reads as a ramp. Unresolvable
    /// neighbors contribute nothing.
    pub fn corner_vertex(
        &mut self,
        view: &BasinView,
        x: usize,
        y: usize,
        z: usize,
        corner: Corner,
    ) -> (f32, Vec3) {
        let ci = corner.index();
        if self.corner_done[ci] {
            return (self.corner_foam[ci], self.corner_pos[ci]);
        }

        let mut count = 1.0f32;
        let mut empty = 0.0f32;
        let mut shoreline = false;
        for (dx, dy, dz) in CORNER_NEIGHBORS[ci] {
            let Some(n) = self.neighbor(view, x, y, z, dx, dy, dz) else {
                continue;
            };
            count += 1.0;
            if n.level == 0 {
                empty += 1.0;
            }
            if !n.has_liquid() && !n.is_empty() {
                shoreline = true;
            }
        }

        let mut foam = empty / count;
        let mut ramp = Vec3::ZERO;
        if foam <= FOAM_CUTOFF {
            foam = 0.0;
        } else if !shoreline {
            ramp.y = -FOAM_DIP;
        }

        let (bx, by, bz) = view.origin();
        let origin = Vec3::new(
            (bx + x as i32) as f32,
            (by + y as i32) as f32,
            (bz + z as i32) as f32,
        );
        let mut pos = corner.offset();
        pos.y -= SURFACE_DIP;
        pos += origin + ramp;

        self.corner_foam[ci] = foam;
        self.corner_pos[ci] = pos;
        self.corner_done[ci] = true;
        (foam, pos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn corner_offsets_match_signs() {
        for corner in Corner::ALL {
            let (sx, sy, sz) = corner.signs();
            let off = corner.offset();
            assert_eq!(off.x, if sx > 0 { 1.0 } else { 0.0 });
            assert_eq!(off.y, if sy > 0 { 1.0 } else { 0.0 });
            assert_eq!(off.z, if sz > 0 { 1.0 } else { 0.0 });
        }
    }

    #[test]
    fn corner_neighbor_table_derives_from_signs() {
        for corner in Corner::ALL {
            let (sx, sy, sz) = corner.signs();
            let want = [
                (sx, 0, 0),
                (0, sy, 0),
                (0, 0, sz),
                (sx, sy, 0),
                (sx, 0, sz),
                (0, sy, sz),
                (sx, sy, sz),
            ];
            assert_eq!(CORNER_NEIGHBORS[corner.index()], want);
        }
    }

    #[test]
    fn face_corner_tables_wind_outward() {
        for face in Face::ALL {
            let corners = FACE_CORNERS[face.index()];
            let n = face.normal();
            let p: Vec<Vec3> = corners.iter().map(|c| c.offset()).collect();
            let cross = (p[1] - p[0]).cross(p[2] - p[0]);
            assert!(
                cross.dot(n) > 0.0,
                "face {:?} winds against its normal",
                face
            );
            // All four corners lie on the face plane.
            for c in &corners {
                let (cx, cy, cz) = c.signs();
                match face {
                    Face::PosY => assert_eq!(cy, 1),
                    Face::NegY => assert_eq!(cy, -1),
                    Face::PosX => assert_eq!(cx, 1),
                    Face::NegX => assert_eq!(cx, -1),
                    Face::PosZ => assert_eq!(cz, 1),
                    Face::NegZ => assert_eq!(cz, -1),
                }
            }
        }
    }

    #[test]
    fn scratch_slots_are_unique_and_centered() {
        let mut seen = [false; SCRATCH_SLOTS];
        for dx in -1..=1 {
            for dy in -1..=1 {
                for dz in -1..=1 {
                    let s = scratch_slot(dx, dy, dz);
                    assert!(s < SCRATCH_SLOTS);
                    assert!(!seen[s]);
                    seen[s] = true;
                }
            }
        }
        assert!(seen.iter().all(|s| *s));
        assert_eq!(scratch_slot(0, 0, 0), 13);
    }
}
