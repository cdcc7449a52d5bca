//! Tile key type definitions

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Deepest quadtree level a [`TileKey`] may address.
///
/// Level 30 keeps `x` and `y` inside `u32` (2^30 tiles per axis).
pub const MAX_LEVEL: u8 = 30;

/// Quadtree tile key.
///
/// Level 0 is a single root tile; each level below splits every tile into
/// four children. `x` grows eastward and `y` grows southward from the
/// north-west corner of the tiling profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TileKey {
    /// Level of detail (0 = root)
    pub level: u8,
    /// Column at this level, 0 at west
    pub x: u32,
    /// Row at this level, 0 at north
    pub y: u32,
}

impl TileKey {
    /// Creates a validated tile key.
    pub fn new(level: u8, x: u32, y: u32) -> Result<Self, CoordError> {
        if level > MAX_LEVEL {
            return Err(CoordError::InvalidLevel(level));
        }
        let dim = Self::tiles_per_axis(level);
        if x >= dim || y >= dim {
            return Err(CoordError::OutOfRange { level, x, y });
        }
        Ok(Self { level, x, y })
    }

    /// The single level-0 tile.
    pub const fn root() -> Self {
        Self {
            level: 0,
            x: 0,
            y: 0,
        }
    }

    /// Number of tiles along one axis at `level`.
    #[inline]
    pub fn tiles_per_axis(level: u8) -> u32 {
        1u32 << level.min(MAX_LEVEL)
    }

    /// Returns the tile one level up, or `None` for the root.
    #[inline]
    pub fn parent(&self) -> Option<TileKey> {
        if self.level == 0 {
            return None;
        }
        Some(TileKey {
            level: self.level - 1,
            x: self.x >> 1,
            y: self.y >> 1,
        })
    }

    /// Returns the four children in quadkey order (NW, NE, SW, SE).
    ///
    /// At [`MAX_LEVEL`] this returns four copies of `self` since there is
    /// no deeper level to address.
    pub fn children(&self) -> [TileKey; 4] {
        if self.level >= MAX_LEVEL {
            return [*self; 4];
        }
        let level = self.level + 1;
        let (x, y) = (self.x << 1, self.y << 1);
        [
            TileKey { level, x, y },
            TileKey { level, x: x + 1, y },
            TileKey { level, x, y: y + 1 },
            TileKey {
                level,
                x: x + 1,
                y: y + 1,
            },
        ]
    }

    /// Returns true if `other` is this tile or lies beneath it.
    pub fn contains(&self, other: &TileKey) -> bool {
        if other.level < self.level {
            return false;
        }
        let shift = other.level - self.level;
        (other.x >> shift) == self.x && (other.y >> shift) == self.y
    }

    /// Bing-style quadkey: one digit per level, most significant first.
    ///
    /// The root tile has an empty quadkey.
    pub fn quadkey(&self) -> String {
        let mut quadkey = String::with_capacity(self.level as usize);
        for i in (1..=self.level).rev() {
            let mask = 1u32 << (i - 1);
            let mut digit = b'0';
            if self.x & mask != 0 {
                digit += 1;
            }
            if self.y & mask != 0 {
                digit += 2;
            }
            quadkey.push(digit as char);
        }
        quadkey
    }

    /// Parses a quadkey back into a tile key.
    pub fn from_quadkey(quadkey: &str) -> Result<Self, CoordError> {
        if quadkey.len() > MAX_LEVEL as usize {
            return Err(CoordError::InvalidQuadkey(quadkey.to_string()));
        }
        let (mut x, mut y) = (0u32, 0u32);
        for c in quadkey.chars() {
            x <<= 1;
            y <<= 1;
            match c {
                '0' => {}
                '1' => x |= 1,
                '2' => y |= 1,
                '3' => {
                    x |= 1;
                    y |= 1;
                }
                _ => return Err(CoordError::InvalidQuadkey(quadkey.to_string())),
            }
        }
        Ok(Self {
            level: quadkey.len() as u8,
            x,
            y,
        })
    }
}

impl fmt::Display for TileKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.level, self.x, self.y)
    }
}

impl FromStr for TileKey {
    type Err = CoordError;

    /// Parses the `level/x/y` form produced by `Display`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.trim().split('/');
        let mut next = || {
            parts
                .next()
                .and_then(|p| p.parse::<u32>().ok())
                .ok_or_else(|| CoordError::Malformed(s.to_string()))
        };
        let level = next()?;
        let x = next()?;
        let y = next()?;
        if parts.next().is_some() {
            return Err(CoordError::Malformed(s.to_string()));
        }
        let level = u8::try_from(level).map_err(|_| CoordError::Malformed(s.to_string()))?;
        TileKey::new(level, x, y)
    }
}

/// Errors that can occur when building or parsing tile keys.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoordError {
    /// Level is deeper than [`MAX_LEVEL`]
    #[error("Invalid level: {0} (must be between 0 and {max})", max = MAX_LEVEL)]
    InvalidLevel(u8),

    /// Column or row lies outside the tiling at this level
    #[error("Tile {x},{y} is out of range at level {level}")]
    OutOfRange { level: u8, x: u32, y: u32 },

    /// Quadkey contains invalid characters or is too long
    #[error("Invalid quadkey: '{0}' (must contain only digits 0-3 and length <= {max})", max = MAX_LEVEL)]
    InvalidQuadkey(String),

    /// Text is not of the form `level/x/y`
    #[error("Malformed tile key: '{0}' (expected level/x/y)")]
    Malformed(String),
}
