pub mod lesson_mapper;
pub mod student_mapper;

pub use lesson_mapper::LessonMapper;
pub use student_mapper::StudentMapper;
