use onboard_core::{
    ApiError, ApiResponse, ApiResult, FeedbackForm, NewTask, OnboardingApi, TaskRecord,
    TaskService, TaskServiceError, TaskStatus, UserRecord,
};
use std::sync::Mutex;

#[derive(Default)]
struct ScriptedTaskApi {
    created: Mutex<Vec<NewTask>>,
    reject_updates: bool,
    offline: bool,
}

impl ScriptedTaskApi {
    fn transport(&self) -> ApiResult<()> {
        if self.offline {
            Err(ApiError::Transport("offline".to_string()))
        } else {
            Ok(())
        }
    }
}

impl OnboardingApi for ScriptedTaskApi {
    fn list_users(&self, _token: &str) -> ApiResult<ApiResponse<Vec<UserRecord>>> {
        Ok(ApiResponse::ok(Vec::new()))
    }

    fn list_tasks(&self, _token: &str) -> ApiResult<ApiResponse<Vec<TaskRecord>>> {
        Ok(ApiResponse::ok(Vec::new()))
    }

    fn list_forms(&self, _token: &str) -> ApiResult<ApiResponse<Vec<FeedbackForm>>> {
        Ok(ApiResponse::ok(Vec::new()))
    }

    fn create_task(&self, _token: &str, task: &NewTask) -> ApiResult<ApiResponse<TaskRecord>> {
        self.transport()?;
        self.created.lock().unwrap().push(task.clone());
        Ok(ApiResponse::ok(TaskRecord {
            id: "t-new".to_string(),
            title: task.title.clone(),
            description: task.description.clone(),
            assigned_to: Some(task.assigned_to.clone()),
            status: TaskStatus::Pending,
            due_date: task.due_date.clone(),
        }))
    }

    fn update_task_status(
        &self,
        _token: &str,
        task_id: &str,
        status: TaskStatus,
    ) -> ApiResult<ApiResponse<TaskRecord>> {
        self.transport()?;
        if self.reject_updates {
            return Ok(ApiResponse::failure("Task not found"));
        }
        Ok(ApiResponse::ok(TaskRecord {
            id: task_id.to_string(),
            title: "existing".to_string(),
            description: None,
            assigned_to: None,
            status,
            due_date: None,
        }))
    }

    fn delete_task(
        &self,
        _token: &str,
        task_id: &str,
    ) -> ApiResult<ApiResponse<serde_json::Value>> {
        self.transport()?;
        if task_id == "missing" {
            return Ok(ApiResponse::failure("Task not found"));
        }
        Ok(ApiResponse {
            success: true,
            data: None,
            error: None,
        })
    }
}

fn new_task(title: &str, assignee: &str) -> NewTask {
    NewTask {
        title: title.to_string(),
        description: Some("   ".to_string()),
        assigned_to: assignee.to_string(),
        due_date: Some("2024-04-01".to_string()),
    }
}

#[test]
fn assign_task_normalizes_input_before_sending() {
    let service = TaskService::new(ScriptedTaskApi::default());
    let created = service
        .assign_task("tok", new_task("  Set up laptop ", " 42 "))
        .unwrap();
    assert_eq!(created.id, "t-new");
    assert_eq!(created.title, "Set up laptop");
    assert_eq!(created.assigned_to.as_deref(), Some("42"));
    assert_eq!(created.description, None);
    assert_eq!(created.due_date.as_deref(), Some("2024-04-01"));
}

#[test]
fn assign_task_rejects_blank_title_or_assignee_without_calling_api() {
    let api = ScriptedTaskApi::default();
    let service = TaskService::new(api);
    let title = service.assign_task("tok", new_task("  ", "42")).unwrap_err();
    assert!(matches!(title, TaskServiceError::Validation(_)));
    let assignee = service.assign_task("tok", new_task("Read handbook", "")).unwrap_err();
    assert!(matches!(assignee, TaskServiceError::Validation(_)));
}

#[test]
fn update_status_surfaces_server_rejection_message() {
    let service = TaskService::new(ScriptedTaskApi {
        reject_updates: true,
        ..ScriptedTaskApi::default()
    });
    let err = service
        .update_status("tok", "t1", TaskStatus::Completed)
        .unwrap_err();
    assert_eq!(err, TaskServiceError::Rejected("Task not found".to_string()));
}

#[test]
fn update_status_refuses_unknown_status_and_blank_id() {
    let service = TaskService::new(ScriptedTaskApi::default());
    assert!(matches!(
        service.update_status("tok", "t1", TaskStatus::Other),
        Err(TaskServiceError::Validation(_))
    ));
    assert!(matches!(
        service.update_status("tok", "  ", TaskStatus::Completed),
        Err(TaskServiceError::Validation(_))
    ));
    let updated = service
        .update_status("tok", " t1 ", TaskStatus::InProgress)
        .unwrap();
    assert_eq!(updated.id, "t1");
    assert_eq!(updated.status, TaskStatus::InProgress);
}

#[test]
fn delete_task_reports_rejection_and_transport_errors() {
    let service = TaskService::new(ScriptedTaskApi::default());
    service.delete_task("tok", "t1").unwrap();
    assert!(matches!(
        service.delete_task("tok", "missing"),
        Err(TaskServiceError::Rejected(_))
    ));

    let offline = TaskService::new(ScriptedTaskApi {
        offline: true,
        ..ScriptedTaskApi::default()
    });
    assert!(matches!(
        offline.delete_task("tok", "t1"),
        Err(TaskServiceError::Api(ApiError::Transport(_)))
    ));
}
