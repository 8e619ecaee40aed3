// Random-policy rollout of Catch across several lanes.
//
// Run with: RUST_LOG=debug cargo run --example random_rollout

use log::info;
use pure_gym::wrappers::episode_summary;
use pure_gym::{Catch, CatchParams, Env, PrngKey, RecordEpisodeStatistics, Space, SyncVectorEnv};

const LANES: usize = 8;
const STEPS: usize = 500;

fn main() {
    env_logger::init();

    let env = RecordEpisodeStatistics::new(Catch::default());
    let params = CatchParams::default();
    let action_space = env.action_space(&params);
    let mut v = SyncVectorEnv::new(LANES, env, params);
    v.reset_all(0);

    let mut policy_key = PrngKey::new(1);
    let mut returns = Vec::new();
    for _ in 0..STEPS {
        let (step_key, next) = policy_key.split2();
        policy_key = next;
        let actions: Vec<u32> = step_key
            .split(LANES)
            .into_iter()
            .map(|k| action_space.sample(k).as_discrete().unwrap_or(1) as u32)
            .collect();
        let steps = match v.step_all(actions) {
            Ok(steps) => steps,
            Err(e) => {
                eprintln!("step failed: {e}");
                return;
            }
        };
        returns.extend(steps.iter().filter_map(|s| episode_summary(&s.info)).map(|(ret, _)| ret));
    }

    let caught = returns.iter().filter(|&&r| r > 0.0).count();
    info!("{} episodes, {} caught", returns.len(), caught);
    println!(
        "episodes: {}  catch rate: {:.3}",
        returns.len(),
        caught as f64 / returns.len().max(1) as f64
    );
    let lane0 = &v.states()[0].env_state;
    print!("{}", v.env().inner().render_text(lane0));
}
