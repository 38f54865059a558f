pub mod error;

pub mod cli;

pub mod logging;
pub use logging::Logger;

pub mod pool;

pub mod fs {
    pub mod entry;
    pub mod progress;
    pub mod walker;
}

pub mod model {
    pub mod app_state;
    pub use app_state::{AppState, FocusedPane, Redraw, UiMode};

    pub mod mark_set;
    pub use mark_set::{MarkSet, MarkTab};

    pub mod view_model;
    pub use view_model::{DirView, SortMode};
}

pub mod controller {
    pub mod actions;
    pub use actions::Action;

    pub mod event_loop;
    pub use event_loop::EventLoop;
}

pub mod view {
    pub mod theme;

    pub mod ui;

    pub mod help_overlay;
    pub mod main_table;
    pub mod mark_pane;
    pub mod status_bar;
}

pub mod glob;

pub mod quickview;

pub mod report {
    pub mod aggregate;
    pub mod tree;
}

pub mod util {
    pub mod format;
}

pub use error::{AppError, AppResult};
