use tracing::info;

/// Progress reporting for long-running steps.
///
/// Purely observational: implementations must never influence control flow.
pub trait Stepper {
    /// Start a transient step, replacing the current one if any.
    fn start_temporary_step(&self, step: &str);

    fn stop_current_step(&self);
}

/// Discards every step. Used when no progress surface is attached.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopStepper;

impl Stepper for NoopStepper {
    fn start_temporary_step(&self, _step: &str) {}

    fn stop_current_step(&self) {}
}

/// Reports steps as `tracing` events, for non-interactive output.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogStepper;

impl Stepper for LogStepper {
    fn start_temporary_step(&self, step: &str) {
        info!("{step}");
    }

    fn stop_current_step(&self) {}
}

impl<T: Stepper + ?Sized> Stepper for &T {
    fn start_temporary_step(&self, step: &str) {
        (**self).start_temporary_step(step);
    }

    fn stop_current_step(&self) {
        (**self).stop_current_step();
    }
}
