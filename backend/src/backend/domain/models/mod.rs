pub mod lesson;
pub mod state;
pub mod student;

pub use lesson::Lesson;
pub use state::TrackerState;
pub use student::Student;
