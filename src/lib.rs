// === Embedded Contract Dispatcher ===
pub mod contract;

// === Read-only Queries ===
pub mod view;

// === Call Replay ===
pub mod replay;

pub use contract::{handler_for, MergeMiningContract};
pub use replay::{parse_json_args, replay, ReplayCall, ReplayRecord, ReplaySummary};
pub use view::MergeMiningView;
