use crate::api::department::{CreateDepartment, UpdateDepartment};
use crate::api::faculty::{FacultyFilter, FacultyLoadQuery};
use crate::api::leave::{
    AdminLeaveRow, ApplyLeaveRequest, LeaveCounts, LeaveTypeBrief, MyLeave, UpdateLeaveStatus,
};
use crate::api::leave_type::{CreateLeaveType, UpdateLeaveType};
use crate::auth::handlers::{
    ForgotPasswordRequest, LoginRequest, ResetPasswordRequest, SignupRequest,
};
use crate::model::leave_type::LeaveType;
use crate::model::user::PublicUser;
use utoipa::Modify;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Faculty Leave Management API",
        version = "1.0.0",
        description = r#"
## Faculty Leave Management System

REST backend for a college leave-management portal.

### 🔹 Key Features
- **Faculty accounts**
  - Signup, login, and profile lookup with JWT cookie sessions
- **Leave workflow**
  - Apply for leave against configured leave types, with admin approval/rejection
- **Notifications**
  - Per-leave decision flags so the portal can surface unseen outcomes
- **Departments & leave types**
  - Admin-managed reference data with live employee counts

### 🔐 Security
The session token is read from the `token` cookie, or from an
`Authorization: Bearer` header as a fallback. The admin role is derived
from the configured admin email; it is never stored on the account.

---
Built with **Rust**, **Actix Web**, **SQLx**, and **Utoipa**.
"#,
    ),
    paths(
        crate::auth::handlers::signup,
        crate::auth::handlers::login,
        crate::auth::handlers::current_user,
        crate::auth::handlers::logout,
        crate::auth::handlers::forgot_password,
        crate::auth::handlers::reset_password,

        crate::api::leave::apply_leave,
        crate::api::leave::my_leaves,
        crate::api::leave::all_leaves,
        crate::api::leave::set_leave_status,
        crate::api::leave::my_leave_counts,
        crate::api::leave::pending_notifications,
        crate::api::leave::mark_notified,
        crate::api::leave::remaining_balance,
        crate::api::leave::delete_leave,

        crate::api::department::list_departments,
        crate::api::department::create_department,
        crate::api::department::update_department,
        crate::api::department::delete_department,

        crate::api::leave_type::list_leave_types,
        crate::api::leave_type::create_leave_type,
        crate::api::leave_type::update_leave_type,
        crate::api::leave_type::delete_leave_type,

        crate::api::faculty::list_faculties,
        crate::api::faculty::delete_faculty,
        crate::api::faculty::faculty_load
    ),
    components(
        schemas(
            SignupRequest,
            LoginRequest,
            ForgotPasswordRequest,
            ResetPasswordRequest,
            PublicUser,
            ApplyLeaveRequest,
            UpdateLeaveStatus,
            MyLeave,
            AdminLeaveRow,
            LeaveTypeBrief,
            LeaveCounts,
            LeaveType,
            CreateLeaveType,
            UpdateLeaveType,
            CreateDepartment,
            UpdateDepartment,
            FacultyFilter,
            FacultyLoadQuery
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Signup, login, and password reset APIs"),
        (name = "Leave", description = "Leave application and decision APIs"),
        (name = "Department", description = "Department management APIs"),
        (name = "LeaveType", description = "Leave type management APIs"),
        (name = "Faculty", description = "Faculty directory APIs"),
    )
)]
pub struct ApiDoc;

pub struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}
