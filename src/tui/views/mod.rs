mod dashboard;
mod explorer;
mod scenarios;
mod services;

pub use dashboard::{draw_dashboard_view, DashboardContext};
pub use explorer::{
    draw_explorer_view, node_at_cursor, row_of, ExplorerContext, ExplorerViewState,
};
pub use scenarios::{draw_scenarios_view, ScenariosViewState};
pub use services::{draw_services_view, ServicesViewState};
