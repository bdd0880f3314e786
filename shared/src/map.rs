//! The fixed arena grid. Both sides know it at compile time, so it never
//! travels on the wire.

use thiserror::Error;

const WALL: char = '#';
const OPEN: char = ' ';

/// Layout of the default arena, `#` for walls and space for open floor.
pub const ARENA_ROWS: [&str; 20] = [
    "########################################",
    "#                                      #",
    "#  ####    ####    ####    ####    #####",
    "#  #       #       #  #    #  #    #   #",
    "#  ####    ####    #  #    #  #    #####",
    "#     #       #    #  #    #  #       ##",
    "#  ####    ####    ####    ####    #####",
    "#                                      #",
    "#                                      #",
    "#  ##  ##  ##  ##  ##  ##  ##  ##  ##  #",
    "#                                      #",
    "#                                      #",
    "#  ####    ####    ####    ####    #####",
    "#  #       #       #  #    #  #    #   #",
    "#  ####    ####    #  #    #  #    #####",
    "#     #       #    #  #    #  #       ##",
    "#  ####    ####    ####    ####    #####",
    "#                                      #",
    "#                                      #",
    "########################################",
];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MapError {
    #[error("map has no rows")]
    Empty,

    #[error("row {row} is {found} cells wide, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("unknown cell {cell:?} at ({x}, {y})")]
    InvalidCell { x: usize, y: usize, cell: char },
}

/// Immutable wall/open grid. Cells outside the grid count as walls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Map {
    width: usize,
    height: usize,
    walls: Vec<bool>,
}

impl Map {
    /// Builds a map from text rows of equal width.
    pub fn parse<S: AsRef<str>>(rows: &[S]) -> Result<Self, MapError> {
        let width = rows
            .first()
            .map(|row| row.as_ref().chars().count())
            .ok_or(MapError::Empty)?;
        if width == 0 {
            return Err(MapError::Empty);
        }

        let mut walls = Vec::with_capacity(width * rows.len());
        for (y, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            let found = row.chars().count();
            if found != width {
                return Err(MapError::RaggedRow {
                    row: y,
                    expected: width,
                    found,
                });
            }
            for (x, cell) in row.chars().enumerate() {
                match cell {
                    WALL => walls.push(true),
                    OPEN => walls.push(false),
                    cell => return Err(MapError::InvalidCell { x, y, cell }),
                }
            }
        }

        Ok(Self {
            width,
            height: rows.len(),
            walls,
        })
    }

    /// The default arena every server and client ships with.
    pub fn arena() -> Self {
        match Self::parse(&ARENA_ROWS) {
            Ok(map) => map,
            Err(e) => unreachable!("built-in arena is malformed: {}", e),
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height
    }

    pub fn is_wall(&self, x: i32, y: i32) -> bool {
        if !self.in_bounds(x, y) {
            return true;
        }
        self.walls[y as usize * self.width + x as usize]
    }

    /// All open cells in row-major order.
    pub fn open_cells(&self) -> impl Iterator<Item = (i32, i32)> + '_ {
        (0..self.height as i32)
            .flat_map(move |y| (0..self.width as i32).map(move |x| (x, y)))
            .filter(move |&(x, y)| !self.is_wall(x, y))
    }
}

impl Default for Map {
    fn default() -> Self {
        Self::arena()
    }
}
