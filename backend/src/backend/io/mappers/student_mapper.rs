use anyhow::Result;
use chrono::{DateTime, Utc};
use log::warn;
use shared::Student as SharedStudent;

use crate::backend::domain::models::Student as DomainStudent;

/// Mapper to convert between shared Student DTOs and domain Student models.
pub struct StudentMapper;

impl StudentMapper {
    /// An unreadable `archivedDate` is dropped; it never costs the student
    pub fn to_domain(dto: SharedStudent) -> Result<DomainStudent> {
        let archived_date = match dto.archived_date.as_deref().filter(|d| !d.is_empty()) {
            Some(raw) => match DateTime::parse_from_rfc3339(raw) {
                Ok(parsed) => Some(parsed.with_timezone(&Utc)),
                Err(e) => {
                    warn!("Student {} has a bad archivedDate '{}': {}; clearing it", dto.id, raw, e);
                    None
                }
            },
            None => None,
        };

        Ok(DomainStudent {
            id: dto.id,
            name: dto.name,
            color: dto.color,
            balance: dto.balance,
            is_archived: dto.is_archived.unwrap_or(false),
            archived_date,
        })
    }

    pub fn to_dto(domain: DomainStudent) -> SharedStudent {
        SharedStudent {
            id: domain.id,
            name: domain.name,
            color: domain.color,
            balance: domain.balance,
            is_archived: domain.is_archived.then_some(true),
            archived_date: domain.archived_date.map(|d| d.to_rfc3339()),
        }
    }

    pub fn to_dto_list(students: &[DomainStudent]) -> Vec<SharedStudent> {
        students.iter().cloned().map(Self::to_dto).collect()
    }
}
