use ibfsi::engine::progress::{Progress, ProgressCallback};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressState, ProgressStyle};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::warn;

const SPINNER_TICK_MS: u64 = 80;

struct Display {
    bar: ProgressBar,
    /// Simulation time reached by the last completed coupling step.
    reached: Option<f64>,
}

impl Display {
    fn handle(&mut self, progress: Progress) {
        let bar = &self.bar;
        match progress {
            Progress::PhaseStart { name } => {
                bar.reset();
                bar.set_length(0);
                bar.set_style(spinner_style());
                bar.enable_steady_tick(Duration::from_millis(SPINNER_TICK_MS));
                bar.set_message(name.to_string());
            }
            Progress::PhaseFinish => {
                bar.disable_steady_tick();
                let message = match self.reached {
                    Some(time) => format!("✓ Reached t = {time:.4e}"),
                    None => "✓ Done".to_string(),
                };
                bar.finish_with_message(message);
            }
            Progress::TaskStart { total_steps } => {
                bar.disable_steady_tick();
                bar.reset();
                bar.set_length(total_steps);
                bar.set_style(bar_style());
                bar.set_message("Coupling");
            }
            Progress::TaskIncrement => bar.inc(1),
            Progress::TaskFinish => {
                if let Some(length) = bar.length() {
                    bar.set_position(length);
                }
                bar.finish();
            }
            Progress::StepCompleted { step, time } => {
                self.reached = Some(time);
                bar.set_message(format!("step {step}, t = {time:.4e}"));
            }
            Progress::StatusUpdate { text } => bar.println(format!("  {text}")),
            Progress::Message(msg) => bar.set_message(msg),
        }
    }
}

/// Renders coupling progress on stderr: a spinner per workflow phase and a
/// bar over the time steps that shows the time reached.
#[derive(Clone)]
pub struct CliProgressHandler {
    display: Arc<Mutex<Display>>,
}

impl CliProgressHandler {
    pub fn new() -> Self {
        Self::with_draw_target(ProgressDrawTarget::stderr())
    }

    fn with_draw_target(target: ProgressDrawTarget) -> Self {
        let bar = ProgressBar::with_draw_target(Some(0), target).with_style(spinner_style());
        Self {
            display: Arc::new(Mutex::new(Display { bar, reached: None })),
        }
    }

    pub fn get_callback(&self) -> ProgressCallback<'static> {
        let display = self.display.clone();
        Box::new(move |progress: Progress| match display.lock() {
            Ok(mut display) => display.handle(progress),
            Err(_) => warn!("Progress display mutex was poisoned. Cannot update progress."),
        })
    }
}

impl Default for CliProgressHandler {
    fn default() -> Self {
        Self::new()
    }
}

fn spinner_style() -> ProgressStyle {
    ProgressStyle::with_template("{spinner:.green} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
}

fn bar_style() -> ProgressStyle {
    ProgressStyle::with_template("{msg:<28} [{bar:40.cyan/blue}] {pos}/{len} steps ({eta})")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .with_key(
            "eta",
            |state: &ProgressState, w: &mut dyn std::fmt::Write| {
                let _ = write!(w, "{:.1}s", state.eta().as_secs_f64());
            },
        )
        .progress_chars("##-")
}
