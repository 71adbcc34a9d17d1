//! Flap Rush headless runner
//!
//! Drives the simulation with a simple autopilot and logs what happens.
//! Usage: `flap-rush [tuning.json] [seed] [runs]`

#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use flap_rush::consts::{MAX_SUBSTEPS, SIM_DT};
    use flap_rush::sim::{GameEvent, GameState, RunState, TickInput, tick};
    use flap_rush::{LogSink, SoundSink, Tuning};

    /// Simulated display refresh; substeps fill the gap to `SIM_DT`
    const FRAME_DT: f32 = 1.0 / 60.0;
    /// Give up on a run that never ends
    const MAX_RUN_SECONDS: f32 = 600.0;

    /// Flap when sinking below the next gap's center
    fn autopilot(state: &GameState) -> bool {
        let player = state.player();
        if state.run_state() != RunState::Active {
            return true;
        }
        let target = state
            .obstacles()
            .iter()
            .find(|o| o.x + o.width > player.x - player.size.x / 2.0)
            .map(|o| o.gap_center_y + o.gap / 6.0)
            .unwrap_or(state.tuning().center_y());
        player.y > target && player.velocity_y > 0.0
    }

    struct Runner {
        state: GameState,
        sink: LogSink,
        accumulator: f32,
        input: TickInput,
    }

    impl Runner {
        fn new(seed: u64, tuning: Tuning) -> Self {
            Self {
                state: GameState::new(seed, tuning),
                sink: LogSink::new(),
                accumulator: 0.0,
                input: TickInput::default(),
            }
        }

        /// One display frame worth of fixed ticks
        fn update(&mut self, dt: f32) {
            self.accumulator += dt.min(0.1);

            let mut substeps = 0;
            while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
                self.input.flap = autopilot(&self.state);
                let input = self.input.clone();
                tick(&mut self.state, &input, SIM_DT);
                self.accumulator -= SIM_DT;
                substeps += 1;
                self.input.flap = false;
            }
        }

        /// Route events to the sound sink; returns the final score if the run ended
        fn drain(&mut self) -> Option<u32> {
            let mut ended = None;
            for event in self.state.drain_events() {
                match event {
                    GameEvent::Sound(cue) => self.sink.play(cue),
                    GameEvent::ModifierActivated(kind) => log::info!("Picked up {}", kind.label()),
                    GameEvent::HazardEngaged(kind) => log::info!("{:?} incoming!", kind),
                    GameEvent::RunEnded { score, .. } => ended = Some(score),
                    _ => {}
                }
            }
            ended
        }

        fn play_run(&mut self) -> u32 {
            let mut elapsed = 0.0;
            loop {
                self.update(FRAME_DT);
                if let Some(score) = self.drain() {
                    return score;
                }
                elapsed += FRAME_DT;
                if elapsed > MAX_RUN_SECONDS {
                    log::warn!("Run exceeded {}s, ending it", MAX_RUN_SECONDS);
                    self.state.end();
                    return self.drain().unwrap_or(self.state.session().score());
                }
            }
        }
    }

    pub fn run() {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

        let mut args = std::env::args().skip(1);
        let tuning = match args.next() {
            Some(path) => Tuning::load(&path).unwrap_or_else(|e| {
                log::warn!("Falling back to default tuning: {}", e);
                Tuning::default()
            }),
            None => Tuning::default(),
        };
        let seed = args
            .next()
            .and_then(|s| s.parse().ok())
            .unwrap_or(0x5EED_F1A9);
        let runs: u32 = args.next().and_then(|s| s.parse().ok()).unwrap_or(3);

        log::info!("Flap Rush (headless) seed={} runs={}", seed, runs);
        let mut runner = Runner::new(seed, tuning);
        for run in 1..=runs {
            let score = runner.play_run();
            log::info!(
                "Run {}/{}: score {} (best {})",
                run,
                runs,
                score,
                runner.state.high_score().best()
            );
            runner.state.restart();
            runner.accumulator = 0.0;
        }
        log::info!("Played {} sound cues", runner.sink.played());
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    headless::run();
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // Hosts embed the library directly on the web
}
