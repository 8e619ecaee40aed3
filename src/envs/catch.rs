use ndarray::Array2;
use rand::Rng;

use crate::core::{Env, GymError, Info, Result, Step};
use crate::spaces::{AnySpace, BoxSpace, DictSpace, Discrete, Dtype, Value};
use crate::utils::blend::{blend_by_flag, flag};
use crate::utils::rng::PrngKey;

pub const DEFAULT_ROWS: usize = 10;
pub const DEFAULT_COLUMNS: usize = 5;
pub const DEFAULT_MAX_STEPS_IN_EPISODE: u32 = 2000;

/// Episode configuration for [`Catch`]. The environment only reads it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CatchParams {
    /// Drivers truncate an episode once `time` reaches this many steps.
    pub max_steps_in_episode: u32,
}

impl Default for CatchParams {
    fn default() -> Self {
        Self { max_steps_in_episode: DEFAULT_MAX_STEPS_IN_EPISODE }
    }
}

impl CatchParams {
    pub fn with_max_steps_in_episode(mut self, max_steps_in_episode: u32) -> Self {
        self.max_steps_in_episode = max_steps_in_episode;
        self
    }
}

/// Catch state. All fields share one integer type so transitions are plain
/// arithmetic; `done` is `0` or `1`.
///
/// The array layout `[ball_x, ball_y, paddle_x, paddle_y, time, done]` is what
/// recorded trajectories use, see [`CatchState::to_array`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CatchState {
    pub ball_x: i32,
    pub ball_y: i32,
    pub paddle_x: i32,
    pub paddle_y: i32,
    pub time: i32,
    pub done: i32,
}

impl CatchState {
    pub fn to_array(&self) -> [i32; 6] {
        [self.ball_x, self.ball_y, self.paddle_x, self.paddle_y, self.time, self.done]
    }

    pub fn from_array(a: [i32; 6]) -> Self {
        let [ball_x, ball_y, paddle_x, paddle_y, time, done] = a;
        Self { ball_x, ball_y, paddle_x, paddle_y, time, done }
    }

    pub fn is_done(&self) -> bool { self.done != 0 }
}

/// Catch (bsuite): a ball falls one row per step from a random column of a
/// `rows x columns` board and the agent slides a paddle along the bottom row.
///
/// Actions: Discrete(3) {0: left, 1: stay, 2: right}.
/// Observation: `rows x columns` grid with 1.0 at the ball and the paddle.
/// Reward: +1 when the ball reaches the bottom row above the paddle, -1 when it
/// lands elsewhere, 0 otherwise.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Catch {
    rows: usize,
    columns: usize,
}

impl Default for Catch {
    fn default() -> Self {
        Self { rows: DEFAULT_ROWS, columns: DEFAULT_COLUMNS }
    }
}

impl Catch {
    /// A board of the given size. The ball needs at least one row to fall
    /// through, so `rows >= 2` and `columns >= 1`.
    pub fn new(rows: usize, columns: usize) -> Result<Self> {
        if rows < 2 {
            return Err(GymError::InvalidEnvConfig(format!("Catch requires rows >= 2, got {rows}")));
        }
        if columns == 0 {
            return Err(GymError::InvalidEnvConfig("Catch requires columns >= 1".into()));
        }
        if i32::try_from(rows).is_err() || i32::try_from(columns).is_err() {
            return Err(GymError::InvalidEnvConfig(format!("Catch board {rows}x{columns} is too large")));
        }
        Ok(Self { rows, columns })
    }

    pub fn rows(&self) -> usize { self.rows }
    pub fn columns(&self) -> usize { self.columns }

    /// A fresh episode start: ball at a random column of the top row, paddle
    /// centred on the bottom row.
    pub fn sample_init_state(&self, key: PrngKey) -> CatchState {
        let columns = self.columns as i32;
        CatchState {
            ball_x: key.into_rng().gen_range(0..columns),
            ball_y: 0,
            paddle_x: columns / 2,
            paddle_y: self.rows as i32 - 1,
            time: 0,
            done: 0,
        }
    }

    /// Board with the ball and paddle cells set. Each call allocates a new grid.
    pub fn render(&self, state: &CatchState) -> Array2<f32> {
        let mut board = Array2::zeros((self.rows, self.columns));
        for (y, x) in [(state.ball_y, state.ball_x), (state.paddle_y, state.paddle_x)] {
            if let (Ok(y), Ok(x)) = (usize::try_from(y), usize::try_from(x)) {
                if let Some(cell) = board.get_mut((y, x)) {
                    *cell = 1.0;
                }
            }
        }
        board
    }

    /// ASCII board for logs: `o` ball, `=` paddle, `@` both, `.` empty.
    pub fn render_text(&self, state: &CatchState) -> String {
        let mut out = String::with_capacity(self.rows * (self.columns + 1));
        for y in 0..self.rows as i32 {
            for x in 0..self.columns as i32 {
                let ball = (y, x) == (state.ball_y, state.ball_x);
                let paddle = (y, x) == (state.paddle_y, state.paddle_x);
                out.push(match (ball, paddle) {
                    (true, true) => '@',
                    (true, false) => 'o',
                    (false, true) => '=',
                    (false, false) => '.',
                });
            }
            out.push('\n');
        }
        out
    }
}

impl Env for Catch {
    type Params = CatchParams;
    type State = CatchState;
    type Obs = Array2<f32>;
    type Act = u32;

    fn default_params(&self) -> CatchParams { CatchParams::default() }

    fn reset(&self, key: PrngKey, _params: &CatchParams) -> (Array2<f32>, CatchState) {
        let state = self.sample_init_state(key);
        (self.render(&state), state)
    }

    /// One branch-free transition.
    ///
    /// A candidate start state is always drawn from `key`; every field is then
    /// blended between the continued episode and that candidate by the incoming
    /// `done` flag. A step taken from a terminal state therefore returns exactly
    /// the state `reset` would return for the same key, with `time` back at 0.
    ///
    /// `action` must be 0, 1 or 2. Larger values are not rejected and move the
    /// paddle one cell right, like 2.
    fn step(
        &self,
        key: PrngKey,
        _params: &CatchParams,
        state: &CatchState,
        action: u32,
    ) -> Step<Array2<f32>, CatchState> {
        let fresh = self.sample_init_state(key);
        let prev_done = state.done;

        let dx = (i64::from(action) - 1).clamp(-1, 1) as i32;
        let paddle_x = blend_by_flag(
            (state.paddle_x + dx).clamp(0, self.columns as i32 - 1),
            fresh.paddle_x,
            prev_done,
        );
        let ball_y = blend_by_flag(state.ball_y + 1, fresh.ball_y, prev_done);
        let ball_x = blend_by_flag(state.ball_x, fresh.ball_x, prev_done);
        let paddle_y = blend_by_flag(state.paddle_y, fresh.paddle_y, prev_done);
        let time = blend_by_flag(state.time + 1, fresh.time, prev_done);

        let done: i32 = flag(ball_y == paddle_y);
        let caught: i32 = flag(paddle_x == ball_x);
        let reward = done * (caught - (1 - caught));

        let next = CatchState { ball_x, ball_y, paddle_x, paddle_y, time, done };
        Step::new(self.render(&next), next, reward as f32, done == 1, Info::new())
    }

    fn observe(&self, state: &CatchState, _params: &CatchParams) -> Array2<f32> {
        self.render(state)
    }

    fn is_truncated(&self, state: &CatchState, params: &CatchParams) -> bool {
        i64::from(state.time) >= i64::from(params.max_steps_in_episode)
    }

    fn action_space(&self, _params: &CatchParams) -> AnySpace {
        Discrete::new_unchecked(3).into()
    }

    fn observation_space(&self, _params: &CatchParams) -> AnySpace {
        BoxSpace::new_unchecked(0.0, 1.0, &[self.rows, self.columns], Dtype::F32).into()
    }

    fn state_space(&self, params: &CatchParams) -> AnySpace {
        let rows = Discrete::new_unchecked(self.rows as i64);
        let columns = Discrete::new_unchecked(self.columns as i64);
        // Without a truncating driver an episode still ends at rows - 1.
        let max_time = i64::from(params.max_steps_in_episode).max(self.rows as i64 - 1);
        let time = Discrete::new_unchecked(max_time + 1);
        DictSpace::new_unchecked(vec![
            ("ball_x".to_string(), columns.clone().into()),
            ("ball_y".to_string(), rows.clone().into()),
            ("paddle_x".to_string(), columns.into()),
            ("paddle_y".to_string(), rows.into()),
            ("time".to_string(), time.into()),
            ("done".to_string(), Discrete::new_unchecked(2).into()),
        ])
        .into()
    }

    fn name(&self) -> &'static str { "Catch-bsuite" }

    fn num_actions(&self, _params: &CatchParams) -> usize { 3 }
}

/// The state as a `Value` of [`Catch::state_space`], for containment checks.
pub fn state_value(state: &CatchState) -> Value {
    Value::Dict(vec![
        ("ball_x".to_string(), Value::Discrete(state.ball_x.into())),
        ("ball_y".to_string(), Value::Discrete(state.ball_y.into())),
        ("paddle_x".to_string(), Value::Discrete(state.paddle_x.into())),
        ("paddle_y".to_string(), Value::Discrete(state.paddle_y.into())),
        ("time".to_string(), Value::Discrete(state.time.into())),
        ("done".to_string(), Value::Discrete(state.done.into())),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spaces::Space;

    fn state(ball_x: i32, ball_y: i32, paddle_x: i32) -> CatchState {
        CatchState { ball_x, ball_y, paddle_x, paddle_y: 9, time: ball_y, done: 0 }
    }

    fn lit_cells(board: &Array2<f32>) -> Vec<(usize, usize)> {
        board.indexed_iter().filter(|(_, v)| **v == 1.0).map(|(ix, _)| ix).collect()
    }

    #[test]
    fn reset_seed_zero_layout() {
        let env = Catch::default();
        let params = CatchParams::default();
        let (obs, s) = env.reset(PrngKey::new(0), &params);
        assert_eq!(s.ball_y, 0);
        assert_eq!(s.paddle_x, 2);
        assert_eq!(s.paddle_y, 9);
        assert_eq!(s.time, 0);
        assert_eq!(s.done, 0);
        assert!((0..5).contains(&s.ball_x));
        assert_eq!(obs.dim(), (10, 5));
        assert_eq!(s.ball_x, env.sample_init_state(PrngKey::new(0)).ball_x);
    }

    #[test]
    fn noop_catch_from_row_eight() {
        let env = Catch::default();
        let params = env.default_params();
        let s = state(2, 8, 2);
        let out = env.step(PrngKey::new(4), &params, &s, 1);
        assert_eq!(out.state.ball_y, 9);
        assert_eq!(out.state.done, 1);
        assert!(out.done);
        assert_eq!(out.reward, 1.0);
        assert!(out.info.is_empty());
    }

    #[test]
    fn miss_costs_one() {
        let env = Catch::default();
        let s = state(0, 8, 3);
        let out = env.step(PrngKey::new(4), &CatchParams::default(), &s, 2);
        assert_eq!(out.state.paddle_x, 4);
        assert!(out.done);
        assert_eq!(out.reward, -1.0);
    }

    #[test]
    fn paddle_clipped_at_edges() {
        let env = Catch::default();
        let p = CatchParams::default();
        let left = env.step(PrngKey::new(1), &p, &state(3, 1, 0), 0);
        assert_eq!(left.state.paddle_x, 0);
        let right = env.step(PrngKey::new(1), &p, &state(3, 1, 4), 2);
        assert_eq!(right.state.paddle_x, 4);
    }

    #[test]
    fn out_of_range_actions_stay_on_board() {
        let env = Catch::default();
        let p = CatchParams::default();
        for action in [3, 1 << 31, u32::MAX] {
            let out = env.step(PrngKey::new(1), &p, &state(3, 1, 2), action);
            assert_eq!(out.state.paddle_x, 3);
            let edge = env.step(PrngKey::new(1), &p, &state(3, 1, 4), action);
            assert_eq!(edge.state.paddle_x, 4);
        }
    }

    #[test]
    fn mid_episode_step_advances() {
        let env = Catch::default();
        let s = state(1, 3, 2);
        let out = env.step(PrngKey::new(8), &CatchParams::default(), &s, 0);
        assert_eq!(out.state, CatchState { ball_x: 1, ball_y: 4, paddle_x: 1, paddle_y: 9, time: 4, done: 0 });
        assert_eq!(out.reward, 0.0);
        assert!(!out.done);
    }

    #[test]
    fn terminal_state_auto_resets_from_key() {
        let env = Catch::default();
        let p = CatchParams::default();
        let terminal = CatchState { ball_x: 1, ball_y: 9, paddle_x: 4, paddle_y: 9, time: 9, done: 1 };
        for seed in 0..20 {
            let out = env.step(PrngKey::new(seed), &p, &terminal, 2);
            let (obs, fresh) = env.reset(PrngKey::new(seed), &p);
            assert_eq!(out.state, fresh);
            assert_eq!(out.observation, obs);
            assert_eq!(out.reward, 0.0);
            assert!(!out.done);
        }
    }

    #[test]
    fn render_sets_exactly_ball_and_paddle() {
        let env = Catch::default();
        let board = env.render(&state(3, 4, 1));
        assert_eq!(lit_cells(&board), vec![(4, 3), (9, 1)]);
        let caught = env.render(&CatchState { ball_x: 2, ball_y: 9, paddle_x: 2, paddle_y: 9, time: 9, done: 1 });
        assert_eq!(lit_cells(&caught), vec![(9, 2)]);
    }

    #[test]
    fn render_text_marks_cells() {
        let env = Catch::new(3, 3).unwrap();
        let text = env.render_text(&CatchState { ball_x: 0, ball_y: 0, paddle_x: 1, paddle_y: 2, time: 0, done: 0 });
        assert_eq!(text, "o..\n...\n.=.\n");
    }

    #[test]
    fn array_layout_is_stable() {
        let s = CatchState { ball_x: 1, ball_y: 2, paddle_x: 3, paddle_y: 9, time: 5, done: 0 };
        assert_eq!(s.to_array(), [1, 2, 3, 9, 5, 0]);
        assert_eq!(CatchState::from_array(s.to_array()), s);
    }

    #[test]
    fn new_validates_board() {
        assert!(matches!(Catch::new(1, 5), Err(GymError::InvalidEnvConfig(_))));
        assert!(matches!(Catch::new(10, 0), Err(GymError::InvalidEnvConfig(_))));
        let env = Catch::new(6, 7).unwrap();
        let (obs, s) = env.reset(PrngKey::new(2), &CatchParams::default());
        assert_eq!(obs.dim(), (6, 7));
        assert_eq!((s.paddle_x, s.paddle_y), (3, 5));
    }

    #[test]
    fn truncation_reads_params() {
        let env = Catch::default();
        let p = CatchParams::default().with_max_steps_in_episode(5);
        assert!(!env.is_truncated(&state(0, 4, 0), &p));
        assert!(env.is_truncated(&CatchState { time: 5, ..state(0, 4, 0) }, &p));
    }

    #[test]
    fn spaces_describe_reachable_values() {
        let env = Catch::default();
        let p = CatchParams::default();
        let (obs, s) = env.reset(PrngKey::new(3), &p);
        assert_eq!(env.num_actions(&p), 3);
        assert!(env.action_space(&p).contains(&Value::Discrete(2)));
        assert!(!env.action_space(&p).contains(&Value::Discrete(3)));
        let obs = Value::Box(obs.mapv(f64::from).into_dyn());
        assert!(env.observation_space(&p).contains(&obs));
        assert!(env.state_space(&p).contains(&state_value(&s)));
        let sampled = env.action_space(&p).sample(PrngKey::new(1));
        assert!(env.action_space(&p).contains(&sampled));
    }

    #[test]
    fn state_space_covers_untruncated_episodes() {
        let env = Catch::default();
        let p = CatchParams::default().with_max_steps_in_episode(3);
        let space = env.state_space(&p);
        let (_obs, mut s) = env.reset(PrngKey::new(8), &p);
        for key in PrngKey::new(9).split(30) {
            s = env.step(key, &p, &s, 1).state;
            assert!(space.contains(&state_value(&s)), "time {}", s.time);
        }
        let long = CatchParams::default().with_max_steps_in_episode(50);
        let at_limit = CatchState { time: 50, ..state(0, 4, 0) };
        assert!(env.state_space(&long).contains(&state_value(&at_limit)));
    }
}
