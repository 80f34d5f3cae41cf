use parking_lot::Mutex;
use std::sync::Arc;

use gridkernel_sched::TaskArgs;

/// Identifies one registered scene within a navigator. Scene `0` is
/// reserved for "no scene active".
pub type SceneId = u64;

/// The lifecycle state of one gated scene. A scene starts `NeedsInit`; once
/// activated it cycles `NeedsInit -> Updating -> NeedsUninit -> UninitWait`
/// and stays `UninitWait` until something (typically a controlling task
/// outside the gate) sets it back to `NeedsInit`.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum SceneState {
    NeedsInit,
    Updating,
    NeedsUninit,
    UninitWait,
}

/// The navigator's current position: which scene is active, and where that
/// scene is in its lifecycle. Gated tasks compare their own required
/// `(SceneId, SceneState)` against this pair; only the one driver task
/// (see [`scene_driver_task`]) ever advances it.
pub struct SceneGate {
    current: Mutex<(SceneId, SceneState)>,
}

impl SceneGate {
    pub fn new(scene: SceneId) -> Arc<Self> {
        Arc::new(Self {
            current: Mutex::new((scene, SceneState::NeedsInit)),
        })
    }

    pub fn current(&self) -> (SceneId, SceneState) {
        *self.current.lock()
    }

    /// Requests a switch to `scene`: a currently `Updating` scene moves to
    /// `NeedsUninit` so the next driver tick runs its uninit pass once,
    /// then activates `scene` once uninit has drained. No-op from any
    /// other state (a transition already in flight isn't interrupted).
    pub fn request_navigate(&self, scene: SceneId) {
        let mut c = self.current.lock();
        if c.1 == SceneState::Updating {
            *c = (scene, SceneState::NeedsUninit);
        }
    }

    /// Requests (re)activation of the currently idle scene, so the next
    /// driver tick runs its init pass again.
    pub fn request_init(&self) {
        let mut c = self.current.lock();
        if c.1 == SceneState::UninitWait {
            c.1 = SceneState::NeedsInit;
        }
    }

    /// Advances the FSM one step and returns the state it was *in* before
    /// advancing (the state gated tasks should have been checking against
    /// this tick). Must be driven by exactly one task per frame — see
    /// [`scene_driver_task`] — since calling it more than once per frame
    /// would skip or repeat lifecycle phases.
    fn advance(&self) -> SceneState {
        let mut c = self.current.lock();
        let ran_as = c.1;
        c.1 = match c.1 {
            SceneState::NeedsInit => SceneState::Updating,
            SceneState::Updating => SceneState::Updating,
            SceneState::NeedsUninit => SceneState::UninitWait,
            SceneState::UninitWait => SceneState::UninitWait,
        };
        ran_as
    }
}

/// The sole FSM driver for one `SceneGate`. Register exactly once per
/// navigator, ahead of every task wrapped with [`gate_task`] that shares
/// the same gate — this task's [`Pinning::Synchronous`](gridkernel_sched::Pinning::Synchronous)
/// pinning forces it to finish before any later-submitted task starts, so
/// every gated check in the same frame observes this tick's freshly
/// advanced state.
pub fn scene_driver_task(gate: Arc<SceneGate>) -> impl Fn(&TaskArgs) + Send + Sync + 'static {
    move |_args| {
        gate.advance();
    }
}

/// Wraps `body` so it only runs when `gate`'s current `(SceneId,
/// SceneState)` matches `(required_scene, required_state)`. Purely a
/// read-only check: it never advances `gate`'s own FSM, so any number of
/// tasks can share one gate without racing each other's lifecycle phase.
/// The wrapped task still enters the dependency graph unconditionally;
/// gating only skips the body, never the scheduling.
pub fn gate_task<F>(gate: Arc<SceneGate>, required_scene: SceneId, required_state: SceneState, body: F) -> impl Fn(&TaskArgs) + Send + Sync + 'static
where
    F: Fn(&TaskArgs) + Send + Sync + 'static,
{
    move |args| {
        if gate.current() == (required_scene, required_state) {
            body(args);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_cycle_runs_each_body_once_then_idles() {
        let gate = SceneGate::new(1);
        assert_eq!(gate.advance(), SceneState::NeedsInit);
        assert_eq!(gate.current(), (1, SceneState::Updating));
        assert_eq!(gate.advance(), SceneState::Updating);
        gate.request_navigate(2);
        assert_eq!(gate.advance(), SceneState::NeedsUninit);
        assert_eq!(gate.current(), (2, SceneState::UninitWait));
        assert_eq!(gate.advance(), SceneState::UninitWait);
        gate.request_init();
        assert_eq!(gate.current(), (2, SceneState::NeedsInit));
    }

    #[test]
    fn gate_task_predicate_is_read_only_and_tracks_the_gate_unassisted() {
        // Fake TaskArgs is hard to construct standalone, so this exercises
        // the predicate `gate_task` wraps directly instead of through the
        // closure: two independent checkers sharing one gate must not
        // multiply-advance it between them.
        let gate = SceneGate::new(1);
        let _first_checker = gate_task(gate.clone(), 1, SceneState::NeedsInit, |_| {});
        let _second_checker = gate_task(gate.clone(), 1, SceneState::Updating, |_| {});

        assert_eq!(gate.current(), (1, SceneState::NeedsInit));
        assert_eq!(gate.current(), (1, SceneState::NeedsInit));

        gate.advance();
        assert_eq!(gate.current(), (1, SceneState::Updating));
    }
}
