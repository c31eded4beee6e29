pub mod department;
pub mod leave;
pub mod leave_type;
pub mod user;
