//! Use cases: the one validation rule sits here, in front of the repositories.

use crate::error::{Result, RosterError};
use crate::http::HttpRequest;
use crate::repository::{ClassRepository, SchoolRepository};
use crate::transport::Transport;
use crate::types::{ClassEntity, CreateClass, CreateSchool, School};

const SCHOOL_NAME_REQUIRED: &str = "School name is required";
const CLASS_NAME_REQUIRED: &str = "Class name is required";

pub fn load_schools<X: Transport + ?Sized>(
    repo: &SchoolRepository,
    transport: &X,
    search: &str,
) -> Result<Vec<School>> {
    repo.list(transport, search)
}

pub fn load_classes<X: Transport + ?Sized>(
    repo: &ClassRepository,
    transport: &X,
    search: &str,
) -> Result<Vec<ClassEntity>> {
    repo.list(transport, search)
}

/// Validate `input` and build its create request without sending it.
pub fn prepare_create_school(repo: &SchoolRepository, input: &CreateSchool) -> Result<HttpRequest> {
    require_name(&input.name, SCHOOL_NAME_REQUIRED)?;
    repo.build_create(input)
}

pub fn prepare_create_class(repo: &ClassRepository, input: &CreateClass) -> Result<HttpRequest> {
    require_name(&input.name, CLASS_NAME_REQUIRED)?;
    repo.build_create(input)
}

pub fn create_school<X: Transport + ?Sized>(
    repo: &SchoolRepository,
    transport: &X,
    input: &CreateSchool,
) -> Result<School> {
    require_name(&input.name, SCHOOL_NAME_REQUIRED)?;
    repo.create(transport, input)
}

pub fn create_class<X: Transport + ?Sized>(
    repo: &ClassRepository,
    transport: &X,
    input: &CreateClass,
) -> Result<ClassEntity> {
    require_name(&input.name, CLASS_NAME_REQUIRED)?;
    repo.create(transport, input)
}

fn require_name(name: &str, message: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(RosterError::validation(message));
    }
    Ok(())
}
