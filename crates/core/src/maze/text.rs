//! Text form of a maze: `#` wall, `.` passable, `S` start, `E` end.

use std::fmt;

use super::{Maze, RewardScheme};
use crate::error::MazeError;
use crate::types::{NodeType, Pos};

impl Maze {
    pub fn from_rows<S: AsRef<str>>(rows: &[S], rewards: RewardScheme) -> Result<Self, MazeError> {
        let height = rows.len();
        let width = rows.first().map_or(0, |row| row.as_ref().chars().count());
        let mut maze = Maze::new(width, height, rewards)?;
        let mut start = None;
        let mut end = None;

        for (y, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            if row.chars().count() != width {
                return Err(MazeError::InvalidLayout {
                    row: y,
                    reason: format!("expected {width} cells, found {}", row.chars().count()),
                });
            }
            for (x, cell) in row.chars().enumerate() {
                let pos = Pos::new(x as i32, y as i32);
                let slot = match cell {
                    '#' => continue,
                    '.' => None,
                    'S' => Some(&mut start),
                    'E' => Some(&mut end),
                    other => {
                        return Err(MazeError::InvalidLayout {
                            row: y,
                            reason: format!("unknown cell '{other}'"),
                        });
                    }
                };
                if let Some(slot) = slot {
                    if slot.is_some() {
                        return Err(MazeError::InvalidLayout {
                            row: y,
                            reason: format!("duplicate '{cell}'"),
                        });
                    }
                    *slot = Some(pos);
                }
                maze.set_node_type(pos, NodeType::Passable)?;
            }
        }

        if let Some(pos) = start {
            maze.set_start(pos)?;
        }
        if let Some(pos) = end {
            maze.set_end(pos)?;
        }
        Ok(maze)
    }

    pub fn rows(&self) -> Vec<String> {
        (0..self.height)
            .map(|y| {
                (0..self.width)
                    .map(|x| match self.node_type(Pos::new(x as i32, y as i32)) {
                        NodeType::Wall => '#',
                        NodeType::Passable => '.',
                        NodeType::Start => 'S',
                        NodeType::End => 'E',
                    })
                    .collect()
            })
            .collect()
    }

    /// Inverse of [`Maze::from_rows`], rows joined by newlines.
    pub fn render(&self) -> String {
        self.rows().join("\n")
    }
}

impl fmt::Display for Maze {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}
