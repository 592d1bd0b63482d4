use std::future::Future;
use std::time::Instant;

use futures::StreamExt;

use crate::error::Result;
use crate::Resource;
use super::Pipeline;

/// Where the reload loop is.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum State {
    Idle,
    Building,
    Done,
}

impl Pipeline {
    /// Drains the pipeline like [`Pipeline::for_each()`], then drains it again
    /// every time the reload trigger fires, calling `on_reload` before each
    /// rebuild. Returns the number of builds once the trigger ends.
    ///
    /// Builds never overlap: each is awaited in full before the next pulse
    /// is taken, and every pulse causes exactly one rebuild. The first error
    /// from any build ends the loop. Without a trigger, this builds once.
    ///
    /// The triggers are consumed: a second call on this pipeline, or on one
    /// sharing its triggers, builds once.
    pub async fn for_each_with_reloading<F, Fut, R>(&self, f: F, mut on_reload: R) -> Result<usize>
        where F: Fn(Resource) -> Fut,
              Fut: Future<Output = Result<()>>,
              R: FnMut(),
    {
        let mut trigger = self.take_trigger();
        let mut builds = 0;
        let mut state = State::Building;
        loop {
            state = match state {
                State::Building => {
                    let start = Instant::now();
                    self.for_each(&f).await?;
                    builds += 1;
                    let elapsed_ms = start.elapsed().as_millis() as u64;
                    tracing::info!(build = builds, elapsed_ms, "build complete");
                    State::Idle
                }
                State::Idle => {
                    let pulse = match trigger.as_mut() {
                        Some(trigger) => trigger.next().await,
                        None => None,
                    };

                    match pulse {
                        Some(()) => {
                            tracing::info!("reloading");
                            on_reload();
                            State::Building
                        }
                        None => State::Done,
                    }
                }
                State::Done => return Ok(builds),
            };
        }
    }
}
