mod employee_service;
mod log_service;
mod team_service;
mod user_service;

pub use employee_service::{EmployeeChanges, EmployeeService, NewEmployee};
pub use log_service::{LogQuery, LogService};
pub use team_service::{TeamChanges, TeamService};
pub use user_service::{ProfileChanges, UserService};
