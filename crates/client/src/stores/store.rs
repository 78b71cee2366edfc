//! The store: owns the dashboard state and serializes every mutation.

use std::sync::Arc;

use tokio::sync::{mpsc, watch};

use super::reducer::reduce;
use super::state::DashboardState;
use crate::actions::Action;

/// Synchronous observer, called after every applied action.
pub type Subscriber = Box<dyn FnMut(&Action, &DashboardState) + Send>;

/// Single owner of the dashboard state.
///
/// All mutation goes through [`Store::dispatch`]. When driven by
/// [`Store::run`], actions are applied one at a time in channel order.
pub struct Store {
    state: Arc<DashboardState>,
    subscribers: Vec<Subscriber>,
    snapshots: watch::Sender<Arc<DashboardState>>,
}

impl Store {
    pub fn new() -> Self {
        Self::with_state(DashboardState::default())
    }

    pub fn with_state(state: DashboardState) -> Self {
        let state = Arc::new(state);
        let (snapshots, _) = watch::channel(state.clone());
        Self {
            state,
            subscribers: Vec::new(),
            snapshots,
        }
    }

    /// Register an observer. It sees each action and the state it produced,
    /// before the next action is applied.
    pub fn subscribe(&mut self, subscriber: impl FnMut(&Action, &DashboardState) + Send + 'static) {
        self.subscribers.push(Box::new(subscriber));
    }

    pub fn state(&self) -> &Arc<DashboardState> {
        &self.state
    }

    /// Read handle for other tasks.
    pub fn handle(&self) -> StoreHandle {
        StoreHandle {
            snapshots: self.snapshots.subscribe(),
        }
    }

    /// Apply one action and notify every subscriber.
    pub fn dispatch(&mut self, action: Action) {
        let next = reduce(Arc::clone(&self.state), &action);
        let changed = !Arc::ptr_eq(&next, &self.state);
        self.state = next;

        tracing::debug!(action = action.name(), changed, "action applied");

        for subscriber in self.subscribers.iter_mut() {
            subscriber(&action, &*self.state);
        }
        if changed {
            self.snapshots.send_replace(Arc::clone(&self.state));
        }
    }

    /// Apply actions from `actions` until every sender is gone.
    pub async fn run(mut self, mut actions: mpsc::UnboundedReceiver<Action>) {
        while let Some(action) = actions.recv().await {
            self.dispatch(action);
        }
        tracing::debug!("action channel closed, store task exiting");
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

/// Cloneable read access to the latest dashboard state.
///
/// Snapshots are never cached: every read returns the state as of the most
/// recent applied action.
#[derive(Clone)]
pub struct StoreHandle {
    snapshots: watch::Receiver<Arc<DashboardState>>,
}

impl StoreHandle {
    /// The current state.
    pub fn snapshot(&self) -> Arc<DashboardState> {
        Arc::clone(&self.snapshots.borrow())
    }

    /// Wait for the next state change. `None` once the store is gone.
    pub async fn changed(&mut self) -> Option<Arc<DashboardState>> {
        self.snapshots.changed().await.ok()?;
        Some(Arc::clone(&self.snapshots.borrow_and_update()))
    }

    /// Wait until the state satisfies `predicate`, checking the current state
    /// first. `None` once the store is gone.
    pub async fn wait_for(
        &mut self,
        mut predicate: impl FnMut(&DashboardState) -> bool,
    ) -> Option<Arc<DashboardState>> {
        let state = self.snapshots.wait_for(|state| predicate(&**state)).await.ok()?;
        Some(Arc::clone(&state))
    }
}
