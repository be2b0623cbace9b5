mod employee;
mod log;
mod organisation;
mod team;
mod user;

pub use employee::{Employee, EmployeeWithTeams};
pub use log::{Log, LogUser, LogWithUser};
pub use organisation::Organisation;
pub use team::{Team, TeamWithEmployees};
pub use user::{Profile, ProfileOrganisation, Role, User};
