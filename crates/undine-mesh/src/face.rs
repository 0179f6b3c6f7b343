use undine_basin::BasinView;
use undine_geom::Vec3;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Face {
    PosY = 0,
    NegY = 1,
    PosX = 2,
    NegX = 3,
    PosZ = 4,
    NegZ = 5,
}

impl Face {
    pub const COUNT: usize = 6;
    pub const ALL: [Face; Face::COUNT] = [
        Face::PosY,
        Face::NegY,
        Face::PosX,
        Face::NegX,
        Face::PosZ,
        Face::NegZ,
    ];

    /// Returns the `[0..6)` index of this face.
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Converts a face index `[0..6)` back into a `Face` value.
    /// Falls back to `PosY` for out-of-range indices.
    #[inline]
    pub fn from_index(i: usize) -> Face {
        match i {
            0 => Face::PosY,
            1 => Face::NegY,
            2 => Face::PosX,
            3 => Face::NegX,
            4 => Face::PosZ,
            5 => Face::NegZ,
            _ => Face::PosY,
        }
    }

    /// Returns the unit-normal vector for this face.
    #[inline]
    pub fn normal(self) -> Vec3 {
        match self {
            Face::PosY => Vec3::new(0.0, 1.0, 0.0),
            Face::NegY => Vec3::new(0.0, -1.0, 0.0),
            Face::PosX => Vec3::new(1.0, 0.0, 0.0),
            Face::NegX => Vec3::new(-1.0, 0.0, 0.0),
            Face::PosZ => Vec3::new(0.0, 0.0, 1.0),
            Face::NegZ => Vec3::new(0.0, 0.0, -1.0),
        }
    }

    /// Returns the integer grid delta `(dx,dy,dz)` when stepping out of this face.
    #[inline]
    pub fn delta(self) -> (i32, i32, i32) {
        match self {
            Face::PosY => (0, 1, 0),
            Face::NegY => (0, -1, 0),
            Face::PosX => (1, 0, 0),
            Face::NegX => (-1, 0, 0),
            Face::PosZ => (0, 0, 1),
            Face::NegZ => (0, 0, -1),
        }
    }
}

/// Per-cell face visibility result.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct FaceMask([bool; Face::COUNT]);

impl FaceMask {
    #[inline]
    pub fn set(&mut self, face: Face, visible: bool) {
        self.0[face.index()] = visible;
    }

    #[inline]
    pub fn get(self, face: Face) -> bool {
        self.0[face.index()]
    }

    #[inline]
    pub fn visible_count(self) -> usize {
        self.0.iter().filter(|v| **v).count()
    }
}

/// Decides which faces of a liquid cell are worth drawing.
///
/// The underside is never drawn. The top hides under more liquid unless
/// the cell sits exactly at the reveal ceiling, where columns must be
/// capped. Sides show only against open air with no liquid in it; faces
/// whose neighbor cannot be resolved are drawn so loaded-region borders
/// have no holes.
pub fn visible_faces(view: &BasinView, x: usize, y: usize, z: usize) -> FaceMask {
    let opts = view.opts();
    let (_, by, _) = view.origin();
    let wy = by + y as i32;
    let mut mask = FaceMask::default();
    for face in Face::ALL {
        if face == Face::NegY {
            continue;
        }
        let (dx, dy, dz) = face.delta();
        let draw = match (face, view.neighbor(x, y, z, dx, dy, dz)) {
            (Face::PosY, _) if wy == opts.max_reveal_level => true,
            (Face::PosY, Some(n)) => n.level == 0,
            (_, Some(n)) => n.level == 0 && n.is_empty(),
            (_, None) => true,
        };
        mask.set(face, draw);
    }
    mask
}
