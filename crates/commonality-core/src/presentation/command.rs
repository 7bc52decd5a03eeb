//! Commands bound to an action and an optional enablement check.

use tokio::sync::broadcast;

type Action<P> = Box<dyn Fn(&P) + Send + Sync>;
type Predicate<P> = Box<dyn Fn(&P) -> bool + Send + Sync>;

/// A user-invocable action.
///
/// Views subscribe to learn when the result of [`Command::can_execute`]
/// may have changed, and re-query it.
pub struct Command<P> {
    action: Action<P>,
    can_execute: Option<Predicate<P>>,
    changed: broadcast::Sender<()>,
}

impl<P> Command<P> {
    /// Command that can always execute.
    pub fn new(action: impl Fn(&P) + Send + Sync + 'static) -> Self {
        let (changed, _) = broadcast::channel(16);
        Self {
            action: Box::new(action),
            can_execute: None,
            changed,
        }
    }

    /// Command that only executes while `can_execute` holds.
    pub fn with_can_execute(
        action: impl Fn(&P) + Send + Sync + 'static,
        can_execute: impl Fn(&P) -> bool + Send + Sync + 'static,
    ) -> Self {
        let mut command = Self::new(action);
        command.can_execute = Some(Box::new(can_execute));
        command
    }

    pub fn can_execute(&self, parameter: &P) -> bool {
        self.can_execute.as_ref().map_or(true, |check| check(parameter))
    }

    /// Run the action if it can execute. Returns whether it ran.
    pub fn execute(&self, parameter: &P) -> bool {
        if !self.can_execute(parameter) {
            return false;
        }
        (self.action)(parameter);
        true
    }

    /// Tell subscribers to re-query [`Command::can_execute`].
    pub fn raise_can_execute_changed(&self) {
        let _ = self.changed.send(());
    }

    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.changed.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_execute_runs_action() {
        let runs = Arc::new(AtomicUsize::new(0));
        let command = {
            let runs = runs.clone();
            Command::new(move |step: &usize| {
                runs.fetch_add(*step, Ordering::SeqCst);
            })
        };

        assert!(command.can_execute(&2));
        assert!(command.execute(&2));
        assert!(command.execute(&3));
        assert_eq!(runs.load(Ordering::SeqCst), 5);
    }

    #[test]
    fn test_disabled_command_does_not_run() {
        let enabled = Arc::new(AtomicBool::new(false));
        let ran = Arc::new(AtomicBool::new(false));
        let command = {
            let enabled = enabled.clone();
            let ran = ran.clone();
            Command::with_can_execute(
                move |_: &()| ran.store(true, Ordering::SeqCst),
                move |_| enabled.load(Ordering::SeqCst),
            )
        };

        assert!(!command.execute(&()));
        assert!(!ran.load(Ordering::SeqCst));

        enabled.store(true, Ordering::SeqCst);
        assert!(command.execute(&()));
        assert!(ran.load(Ordering::SeqCst));
    }

    #[test]
    fn test_can_execute_changed() {
        let command = Command::new(|_: &()| {});
        let mut rx = command.subscribe();

        command.raise_can_execute_changed();

        assert!(rx.try_recv().is_ok());
        assert!(rx.try_recv().is_err());
    }
}
