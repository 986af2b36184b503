pub mod attendance_record;
pub mod learner;
pub mod roster;
pub mod roster_instructor;
pub mod session;
pub mod user;

pub use attendance_record::Entity as AttendanceRecord;
pub use learner::Entity as Learner;
pub use roster::Entity as Roster;
pub use roster_instructor::Entity as RosterInstructor;
pub use session::Entity as Session;
pub use user::Entity as User;
