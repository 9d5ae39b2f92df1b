use crate::task::TaskMetadata;
use std::collections::HashSet;
use std::fmt;

#[derive(Debug, Clone)]
pub struct TaskValidationError {
    message: String,
}

impl TaskValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for TaskValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for TaskValidationError {}

fn check_seconds(task_id: &str, field: &str, value: f64) -> Result<(), TaskValidationError> {
    if !value.is_finite() {
        return Err(TaskValidationError::new(format!(
            "task {task_id} has non-finite {field} {value}"
        )));
    }
    if value < 0.0 {
        return Err(TaskValidationError::new(format!(
            "task {task_id} has negative {field} {value}"
        )));
    }
    Ok(())
}

pub fn validate_task_metadata(metadata: &TaskMetadata) -> Result<(), TaskValidationError> {
    if metadata.task_id.trim().is_empty() {
        return Err(TaskValidationError::new("task metadata requires a non-empty task_id"));
    }
    check_seconds(&metadata.task_id, "duration", metadata.duration)?;
    check_seconds(&metadata.task_id, "cpu_user", metadata.cpu_user)?;
    check_seconds(&metadata.task_id, "cpu_system", metadata.cpu_system)?;
    Ok(())
}

pub fn validate_task_metadata_collection(
    tasks: &[TaskMetadata],
) -> Result<(), TaskValidationError> {
    let mut seen_ids = HashSet::with_capacity(tasks.len());
    for task in tasks {
        validate_task_metadata(task)?;
        if !seen_ids.insert(task.task_id.as_str()) {
            return Err(TaskValidationError::new(format!(
                "duplicate task id {}",
                task.task_id
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_negative_and_nan_durations() {
        assert!(validate_task_metadata(&TaskMetadata::new("1", -1.0)).is_err());
        assert!(validate_task_metadata(&TaskMetadata::new("1", f64::NAN)).is_err());
        assert!(validate_task_metadata(&TaskMetadata::new("1", 0.0)).is_ok());
    }

    #[test]
    fn rejects_duplicates_and_blank_ids() {
        let tasks = vec![TaskMetadata::new("1", 1.0), TaskMetadata::new("1", 2.0)];
        let err = validate_task_metadata_collection(&tasks).unwrap_err();
        assert_eq!(err.to_string(), "duplicate task id 1");
        assert!(validate_task_metadata(&TaskMetadata::new("  ", 1.0)).is_err());
    }
}
