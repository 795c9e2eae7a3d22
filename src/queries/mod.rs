pub mod member_queries;
pub mod activity_queries;
pub mod attendance_queries;
pub mod report_queries;
pub mod audit_queries;
