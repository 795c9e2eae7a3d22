pub mod ids;
pub mod user;
pub mod member;
pub mod group;
pub mod activity;
pub mod attendance;
pub mod audit;

// Re-exports for convenience
pub use ids::Id;
pub use user::User;
pub use member::{Member, MemberPatch, NewMember};
pub use group::MemberGroup;
pub use activity::{Activity, ActivityKind, ActivityPatch, NewActivity, Recurrence, RecurrenceRule};
pub use attendance::{Attendance, AttendanceMark, AttendanceStatus};
pub use audit::AuditEntry;
