use anyhow::Context;
use reelsync_core::models::UploadTask;
use serde::Serialize;

/// Split recipient arguments on commas and whitespace, dropping empties.
///
/// `--share "a@x.org, b@x.org" c@x.org` yields three recipients.
pub fn parse_recipients<S: AsRef<str>>(args: &[S]) -> Vec<String> {
    args.iter()
        .flat_map(|arg| {
            arg.as_ref()
                .split(|c: char| c == ',' || c.is_whitespace())
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect::<Vec<_>>()
        })
        .collect()
}

/// Row printed by `reelsync list`.
#[derive(Debug, Serialize)]
pub struct TaskRow {
    pub id: String,
    pub source_path: String,
    pub status: String,
    pub recipients: Vec<String>,
    pub retry_count: i32,
    pub container_id: Option<String>,
    pub last_error: Option<String>,
}

impl From<&UploadTask> for TaskRow {
    fn from(task: &UploadTask) -> Self {
        Self {
            id: task.id.to_string(),
            source_path: task.source_path.display().to_string(),
            status: task.status.to_string(),
            recipients: task.recipients.clone(),
            retry_count: task.retry_count,
            container_id: task.container_id.clone(),
            last_error: task.last_error.clone(),
        }
    }
}

pub fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize output")?;
    println!("{}", out);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use reelsync_core::models::TaskStatus;

    #[test]
    fn recipients_split_on_commas_and_spaces() {
        assert_eq!(
            parse_recipients(&["a@x.org, b@x.org", "c@x.org d@x.org", ",,"]),
            vec!["a@x.org", "b@x.org", "c@x.org", "d@x.org"]
        );
    }

    #[test]
    fn no_recipients() {
        assert!(parse_recipients::<&str>(&[]).is_empty());
        assert!(parse_recipients(&["  "]).is_empty());
    }

    #[test]
    fn task_row_shows_status_and_error() {
        let mut task = UploadTask::new("/rec/show-1", vec!["a@x.org".to_string()]);
        task.status = TaskStatus::Failed;
        task.last_error = Some("HTTP 503: busy".to_string());

        let row = TaskRow::from(&task);
        assert_eq!(row.status, "failed");
        assert_eq!(row.source_path, "/rec/show-1");
        assert_eq!(row.last_error.as_deref(), Some("HTTP 503: busy"));
    }
}
