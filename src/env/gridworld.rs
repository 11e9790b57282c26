use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::common::spaces::{BoxSpace, Discrete, Space};

use super::base::{Env, EnvError, EnvObservation, Info, InfoData, ResetOptions, RewardRange};

// cell values of the field
const EMPTY: f32 = 0.0;
const HOLE: f32 = 1.0;
const GOAL: f32 = 2.0;
const PLAYER: f32 = 3.0;

#[derive(Clone, Debug, Copy, PartialEq)]
struct Pos {
    x: usize,
    y: usize,
}

/// Square grid with holes and a goal. The player moves one cell per step and
/// the episode ends on reaching the goal (+1), falling in a hole (-1), or after
/// `maxlen` steps.
///
/// Actions: 0 = left, 1 = up, 2 = right, 3 = down. Moving into a wall is a
/// no-op. Observations are the flattened field.
pub struct GridWorldEnv {
    // row-major, indexed by y * dim + x
    field: Vec<f32>,
    dim: usize,
    maxlen: usize,
    curr_len: usize,
    pos: Pos,
    needs_reset: bool,
    obstacle_prob: f32,
    rng: StdRng,
    render_to_stdout: bool,
    frame: String,
}

impl Default for GridWorldEnv {
    fn default() -> Self {
        Self::new(4, 20, 0.1)
    }
}

impl GridWorldEnv {
    pub fn new(dim: usize, maxlen: usize, obstacle_prob: f32) -> Self {
        Self {
            field: vec![EMPTY; dim * dim],
            dim,
            maxlen,
            curr_len: 0,
            pos: Pos { x: 0, y: 0 },
            needs_reset: true,
            obstacle_prob,
            rng: StdRng::from_entropy(),
            render_to_stdout: true,
            frame: String::new(),
        }
    }

    /// Keep rendered frames in memory only, see [`GridWorldEnv::frame`].
    pub fn with_render_to_stdout(mut self, render_to_stdout: bool) -> Self {
        self.render_to_stdout = render_to_stdout;
        self
    }

    /// The last rendered frame.
    pub fn frame(&self) -> &str {
        &self.frame
    }

    fn idx(&self, x: usize, y: usize) -> usize {
        y * self.dim + x
    }

    fn random_cell(&mut self) -> Pos {
        Pos {
            x: self.rng.gen_range(0..self.dim),
            y: self.rng.gen_range(0..self.dim),
        }
    }

    fn info(&self) -> Info<Vec<f32>> {
        let mut info = Info::new();
        info.insert("x".to_string(), InfoData::Int(self.pos.x as i32));
        info.insert("y".to_string(), InfoData::Int(self.pos.y as i32));
        info.insert("len".to_string(), InfoData::Int(self.curr_len as i32));
        info
    }
}

impl Env<Vec<f32>, usize> for GridWorldEnv {
    fn step(&mut self, action: &usize) -> Result<EnvObservation<Vec<f32>>, EnvError> {
        if self.needs_reset {
            return Err(EnvError::NeedsReset);
        }

        let Pos { x, y } = self.pos;
        let target = match action {
            0 => (x > 0).then(|| Pos { x: x - 1, y }),
            1 => (y > 0).then(|| Pos { x, y: y - 1 }),
            2 => (x < self.dim - 1).then(|| Pos { x: x + 1, y }),
            3 => (y < self.dim - 1).then(|| Pos { x, y: y + 1 }),
            _ => return Err(EnvError::InvalidAction(format!("unknown action {action}"))),
        };

        let mut reward = 0.0;
        let mut terminated = false;

        if let Some(new_pos) = target {
            let curr = self.idx(x, y);
            let next = self.idx(new_pos.x, new_pos.y);

            self.field[curr] = EMPTY;
            if self.field[next] == HOLE {
                reward = -1.0;
                terminated = true;
            } else if self.field[next] == GOAL {
                reward = 1.0;
                terminated = true;
            } else {
                self.field[next] = PLAYER;
            }
            self.pos = new_pos;
        }

        self.curr_len += 1;
        let truncated = self.curr_len >= self.maxlen;
        self.needs_reset = terminated | truncated;

        Ok(EnvObservation {
            obs: self.field.clone(),
            reward,
            terminated,
            truncated,
            info: self.info(),
        })
    }

    fn reset(
        &mut self,
        seed: Option<u64>,
        _options: Option<ResetOptions>,
    ) -> Result<(Vec<f32>, Info<Vec<f32>>), EnvError> {
        if let Some(seed) = seed {
            self.rng = StdRng::seed_from_u64(seed);
        }

        if self.dim < 2 {
            return Err(EnvError::Other(format!(
                "grid must be at least 2x2, got {0}x{0}",
                self.dim
            )));
        }

        self.curr_len = 0;

        // reset the obstacles
        for i in 0..self.field.len() {
            self.field[i] = if self.rng.gen::<f32>() < self.obstacle_prob {
                HOLE
            } else {
                EMPTY
            };
        }

        let goal = self.random_cell();
        let goal_idx = self.idx(goal.x, goal.y);
        self.field[goal_idx] = GOAL;

        let mut player = self.random_cell();
        while player == goal {
            player = self.random_cell();
        }
        let player_idx = self.idx(player.x, player.y);
        self.field[player_idx] = PLAYER;
        self.pos = player;

        self.needs_reset = false;
        self.frame.clear();

        Ok((self.field.clone(), self.info()))
    }

    fn action_space(&self) -> Box<dyn Space<usize>> {
        Box::new(Discrete::from(4))
    }

    fn observation_space(&self) -> Box<dyn Space<Vec<f32>>> {
        Box::new(BoxSpace::from((
            vec![EMPTY; self.dim * self.dim],
            vec![PLAYER; self.dim * self.dim],
        )))
    }

    fn reward_range(&self) -> RewardRange {
        RewardRange {
            low: -1.0,
            high: 1.0,
        }
    }

    fn render(&mut self) -> Result<(), EnvError> {
        if self.dim == 0 {
            return Err(EnvError::Render("empty grid".to_string()));
        }

        let mut frame = String::with_capacity(self.dim * (self.dim + 1));
        for row in self.field.chunks(self.dim) {
            for cell in row {
                let c = if *cell == HOLE {
                    'O'
                } else if *cell == GOAL {
                    'G'
                } else if *cell == PLAYER {
                    'P'
                } else {
                    '.'
                };
                frame.push(c);
            }
            frame.push('\n');
        }

        if self.render_to_stdout {
            println!("{frame}");
        }
        self.frame = frame;

        Ok(())
    }

    fn renderable(&self) -> bool {
        true
    }

    fn close(&mut self) {
        self.needs_reset = true;
        self.frame.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::{GridWorldEnv, GOAL, PLAYER};
    use crate::env::base::{Env, EnvError};

    #[test]
    fn test_gridworld_default() {
        let gridworld = GridWorldEnv::default();

        assert_eq!(gridworld.dim, 4);
        assert_eq!(gridworld.obstacle_prob, 0.1);
        assert_eq!(gridworld.maxlen, 20);
    }

    #[test]
    fn test_gridworld_reset() {
        let mut gridworld = GridWorldEnv::default();

        let (obs, _) = gridworld.reset(Some(7), None).unwrap();

        // check there is only one goal and one player
        assert_eq!(obs.iter().filter(|c| **c == GOAL).count(), 1);
        assert_eq!(obs.iter().filter(|c| **c == PLAYER).count(), 1);
        assert!(gridworld.observation_space().contains(&obs));
    }

    #[test]
    fn test_gridworld_seeded_reset_is_reproducible() {
        let mut a = GridWorldEnv::new(6, 20, 0.3);
        let mut b = GridWorldEnv::new(6, 20, 0.3);

        assert_eq!(
            a.reset(Some(11), None).unwrap().0,
            b.reset(Some(11), None).unwrap().0
        );
    }

    #[test]
    fn test_gridworld_step_without_reset_errors() {
        let mut gridworld = GridWorldEnv::default();

        let action = gridworld.action_space().sample();
        assert_eq!(gridworld.step(&action).unwrap_err(), EnvError::NeedsReset);
    }

    #[test]
    fn test_gridworld_unknown_action() {
        let mut gridworld = GridWorldEnv::default();
        gridworld.reset(None, None).unwrap();

        assert!(matches!(
            gridworld.step(&4),
            Err(EnvError::InvalidAction(_))
        ));
    }

    #[test]
    fn test_gridworld_truncates_at_maxlen() {
        // no holes, so the episode can only end at the goal or at maxlen
        let mut gridworld = GridWorldEnv::new(5, 3, 0.0);
        gridworld.reset(Some(3), None).unwrap();

        let mut done = false;
        let mut len = 0;
        while !done {
            let step = gridworld.step(&gridworld.action_space().sample()).unwrap();
            done = step.terminated | step.truncated;
            len += 1;
            if step.truncated {
                assert_eq!(len, 3);
            }
        }

        assert!(len <= 3);
        assert_eq!(gridworld.step(&0).unwrap_err(), EnvError::NeedsReset);
    }

    #[test]
    fn test_gridworld_render() {
        let mut gridworld = GridWorldEnv::new(3, 10, 0.0).with_render_to_stdout(false);
        gridworld.reset(Some(1), None).unwrap();
        gridworld.render().unwrap();

        let frame = gridworld.frame();
        assert_eq!(frame.lines().count(), 3);
        assert_eq!(frame.matches('P').count(), 1);
        assert_eq!(frame.matches('G').count(), 1);
    }

    #[test]
    fn test_gridworld_too_small() {
        let mut gridworld = GridWorldEnv::new(1, 10, 0.0);

        assert!(gridworld.reset(None, None).is_err());
    }
}
