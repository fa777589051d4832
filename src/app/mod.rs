pub mod client;
pub mod event;
pub mod reducer;
pub mod state;

pub use client::{ClientSettings, LiveListClient};
pub use event::{Command, DashboardEvent, Notification, NotificationLevel, Outcome, RequestKind};
pub use reducer::reduce;
pub use state::{AlertFilter, ConnectionState, DashboardState, Remote};
