//! Business services: user CRUD and admin accounts.

pub mod admins;
pub mod users;

pub use admins::AdminService;
pub use users::UserService;
