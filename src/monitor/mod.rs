//! Change notification module
//!
//! Delivers hardware change notifications to the thread that owns
//! UI-visible state.
//!
//! # Architecture
//!
//! - `MainQueue`: task queue pumped by the owning (UI) thread
//! - `MainContext`: cloneable sender that platform callbacks post through
//! - `VolumeSubscription`: owns a platform volume listener; dropping it
//!   removes the listener and discards undelivered events
//!
//! # Example Usage
//!
//! ```no_run
//! use island::control::HardwareControlFacade;
//! use island::monitor::MainQueue;
//! use std::time::Duration;
//!
//! let facade = HardwareControlFacade::system(Default::default());
//! let queue = MainQueue::new();
//!
//! let subscription = facade.subscribe_volume_change(&queue.context(), |level| {
//!     println!("volume is now {level}");
//! });
//!
//! // Pump the queue on this thread; callbacks only ever run here.
//! while subscription.is_active() {
//!     queue.run_one_timeout(Duration::from_millis(250));
//! }
//! ```

pub mod main_queue;
pub mod volume_monitor;

pub use main_queue::{MainContext, MainQueue};
pub use volume_monitor::VolumeSubscription;
