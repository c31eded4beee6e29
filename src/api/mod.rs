pub mod department;
pub mod faculty;
pub mod leave;
pub mod leave_type;
