//! Seeded construction of fresh mazes: start and end placed far apart with a
//! staircase corridor between them.

use crate::error::MazeError;
use crate::maze::{Maze, RewardScheme};
use crate::operators::monotone_walk;
use crate::seed::{choose, random_usize, stream_rng, streams};
use crate::types::{NodeType, Pos};

#[derive(Clone, Debug, PartialEq)]
pub struct MazeGenerator {
    width: usize,
    height: usize,
    rewards: RewardScheme,
}

impl MazeGenerator {
    pub fn new(width: usize, height: usize, rewards: RewardScheme) -> Self {
        Self { width, height, rewards }
    }

    pub fn generate(&self, seed: u64) -> Result<Maze, MazeError> {
        if self.width < 2 || self.height < 2 {
            return Err(MazeError::InvalidDimensions { width: self.width, height: self.height });
        }
        let mut maze = Maze::new(self.width, self.height, self.rewards)?;
        let mut rng = stream_rng(seed, streams::GENERATOR);

        let start = Pos::new(
            random_usize(&mut rng, 0, self.width - 1) as i32,
            random_usize(&mut rng, 0, self.height - 1) as i32,
        );
        let min_distance = ((self.width + self.height) / 2) as u32;
        let far: Vec<Pos> = (0..self.height)
            .flat_map(|y| (0..self.width).map(move |x| Pos::new(x as i32, y as i32)))
            .filter(|pos| pos.manhattan(start) >= min_distance)
            .collect();
        let end = match choose(&mut rng, &far) {
            Some(&end) => end,
            None => self.farthest_corner(start),
        };

        let corridor = monotone_walk(start, end, &mut rng);
        maze.set_nodes(&corridor, NodeType::Passable)?;
        maze.set_start(start)?;
        maze.set_end(end)?;
        Ok(maze)
    }

    fn farthest_corner(&self, from: Pos) -> Pos {
        let right = self.width as i32 - 1;
        let bottom = self.height as i32 - 1;
        [Pos::new(0, 0), Pos::new(right, 0), Pos::new(0, bottom), Pos::new(right, bottom)]
            .into_iter()
            .max_by_key(|corner| corner.manhattan(from))
            .unwrap_or(from)
    }
}
