use anyhow::{bail, Context, Result};
use chrono::{NaiveDate, NaiveTime};
use shared::{AddLessonRequest, Lesson as SharedLesson};

use crate::backend::domain::commands::lessons::AddLessonCommand;
use crate::backend::domain::errors::{TrackerError, TrackerResult};
use crate::backend::domain::models::lesson::is_valid_duration;
use crate::backend::domain::models::Lesson as DomainLesson;

pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const HOUR_FORMAT: &str = "%H:%M";

pub fn parse_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).with_context(|| format!("Invalid date '{}'", value))
}

/// Accepts `HH:MM`, and `HH:MM:SS` as written by some older files
pub fn parse_hour(value: &str) -> Result<NaiveTime> {
    let value = value.trim();
    NaiveTime::parse_from_str(value, HOUR_FORMAT)
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M:%S"))
        .with_context(|| format!("Invalid hour '{}'", value))
}

/// Mapper to convert between shared Lesson DTOs and domain Lesson models.
pub struct LessonMapper;

impl LessonMapper {
    pub fn to_domain(dto: SharedLesson) -> Result<DomainLesson> {
        let date = parse_date(&dto.date).with_context(|| format!("Lesson {} has a bad date", dto.id))?;
        let hour = parse_hour(&dto.hour).with_context(|| format!("Lesson {} has a bad hour", dto.id))?;
        if !is_valid_duration(dto.duration) {
            bail!("Lesson {} has an invalid duration {}", dto.id, dto.duration);
        }

        Ok(DomainLesson {
            id: dto.id,
            date,
            hour,
            student_id: dto.student_id,
            price: dto.price,
            duration: dto.duration,
            student_phone_number: dto.student_phone_number,
            recurring_id: dto.recurring_id,
            is_paid: dto.is_paid,
            tips: dto.tips,
        })
    }

    pub fn to_dto(domain: DomainLesson) -> SharedLesson {
        SharedLesson {
            id: domain.id,
            date: domain.date.format(DATE_FORMAT).to_string(),
            hour: domain.hour.format(HOUR_FORMAT).to_string(),
            student_id: domain.student_id,
            price: domain.price,
            duration: domain.duration,
            student_phone_number: domain.student_phone_number,
            recurring_id: domain.recurring_id,
            is_paid: domain.is_paid,
            tips: domain.tips,
        }
    }

    pub fn to_dto_list(lessons: &[DomainLesson]) -> Vec<SharedLesson> {
        lessons.iter().cloned().map(Self::to_dto).collect()
    }

    /// Parse a UI add request; bad dates or hours are user input errors
    pub fn to_add_command(request: AddLessonRequest) -> TrackerResult<AddLessonCommand> {
        let date = parse_date(&request.date).map_err(|e| TrackerError::InvalidInput(e.to_string()))?;
        let hour = parse_hour(&request.hour).map_err(|e| TrackerError::InvalidInput(e.to_string()))?;
        Ok(AddLessonCommand {
            student_name: request.student_name,
            price: request.price,
            duration: request.duration,
            date,
            hour,
            student_phone_number: request.student_phone_number,
        })
    }
}
