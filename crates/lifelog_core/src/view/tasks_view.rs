//! Tasks screen state: filters, sort orders and completion toggling.

use super::{matches_search, recover, LoadState};
use crate::clock::{day_of, day_range_ms};
use crate::model::task::Task;
use crate::model::EntityId;
use crate::repo::task_repo::TaskRepository;
use crate::service::task_service::TaskService;
use std::cmp::{Ordering, Reverse};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TaskFilter {
    #[default]
    All,
    Active,
    Completed,
    Overdue,
    /// Due during the current UTC day.
    DueToday,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TaskSort {
    /// Highest priority first, then earliest due date.
    #[default]
    Priority,
    /// Earliest due date first; undated tasks last.
    DueDate,
    /// Newest first.
    Created,
}

pub struct TasksViewModel<R: TaskRepository> {
    service: TaskService<R>,
    tasks: Vec<Task>,
    state: LoadState,
    filter: TaskFilter,
    sort: TaskSort,
    category: Option<String>,
    search_text: String,
}

impl<R: TaskRepository> TasksViewModel<R> {
    pub fn new(repo: R) -> Self {
        Self {
            service: TaskService::new(repo),
            tasks: Vec::new(),
            state: LoadState::Idle,
            filter: TaskFilter::All,
            sort: TaskSort::Priority,
            category: None,
            search_text: String::new(),
        }
    }

    pub fn load(&mut self) {
        self.state = LoadState::Loading;
        let tasks = self.service.repository().fetch_all();
        self.tasks = recover(tasks, Vec::new(), "tasks", "load", &mut self.state);
        if !self.state.is_failed() {
            self.state = LoadState::settled(self.tasks.is_empty());
        }
    }

    pub fn state(&self) -> &LoadState {
        &self.state
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn set_filter(&mut self, filter: TaskFilter) {
        self.filter = filter;
    }

    pub fn set_sort(&mut self, sort: TaskSort) {
        self.sort = sort;
    }

    pub fn set_category(&mut self, category: Option<&str>) {
        self.category = category
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string);
    }

    pub fn set_search_text(&mut self, text: impl Into<String>) {
        self.search_text = text.into();
    }

    /// Tasks passing the active filter, category and search, in sort order.
    pub fn visible_tasks(&self, now: i64) -> Vec<&Task> {
        let today = day_of(now).map(day_range_ms);
        let mut visible: Vec<&Task> = self
            .tasks
            .iter()
            .filter(|task| match self.filter {
                TaskFilter::All => true,
                TaskFilter::Active => !task.is_completed,
                TaskFilter::Completed => task.is_completed,
                TaskFilter::Overdue => task.is_overdue(now),
                TaskFilter::DueToday => {
                    today.is_some_and(|(start, end)| task.is_due_within(start, end))
                }
            })
            .filter(|task| match &self.category {
                Some(category) => task.category.as_deref() == Some(category.as_str()),
                None => true,
            })
            .filter(|task| {
                matches_search(&[task.title.as_str(), task.notes.as_str()], &self.search_text)
            })
            .collect();
        visible.sort_by(|a, b| compare_tasks(self.sort, a, b));
        visible
    }

    /// Flips completion and reloads; completing a recurring task adds its
    /// next occurrence to the list.
    pub fn toggle_completion(&mut self, id: EntityId) -> bool {
        let toggled = self.service.toggle_completion(id).map(|_| true);
        if recover(toggled, false, "tasks", "toggle", &mut self.state) {
            self.load();
            true
        } else {
            false
        }
    }

    pub fn delete(&mut self, id: EntityId) -> bool {
        let deleted = self.service.delete_task(id).map(|()| true);
        if recover(deleted, false, "tasks", "delete", &mut self.state) {
            self.tasks.retain(|task| task.id != id);
            self.state = LoadState::settled(self.tasks.is_empty());
            true
        } else {
            false
        }
    }

    pub fn completion_rate(&mut self) -> f64 {
        let rate = self.service.repository().completion_rate();
        recover(rate, 0.0, "tasks", "completion_rate", &mut self.state)
    }

    pub fn overdue_count(&mut self, now: i64) -> u64 {
        let count = self.service.repository().overdue_count(now);
        recover(count, 0, "tasks", "overdue_count", &mut self.state)
    }

    pub fn categories(&mut self) -> Vec<String> {
        let categories = self.service.repository().categories();
        recover(categories, Vec::new(), "tasks", "categories", &mut self.state)
    }
}

fn compare_tasks(sort: TaskSort, a: &Task, b: &Task) -> Ordering {
    let by_due = |a: &Task, b: &Task| due_key(a).cmp(&due_key(b));
    let ordering = match sort {
        TaskSort::Priority => b.priority.cmp(&a.priority).then_with(|| by_due(a, b)),
        TaskSort::DueDate => by_due(a, b).then_with(|| b.priority.cmp(&a.priority)),
        TaskSort::Created => Reverse(a.created_at).cmp(&Reverse(b.created_at)),
    };
    ordering
        .then_with(|| b.created_at.cmp(&a.created_at))
        .then_with(|| a.id.cmp(&b.id))
}

/// Undated tasks sort after every dated one.
fn due_key(task: &Task) -> (bool, i64) {
    match task.due_at {
        Some(due) => (false, due),
        None => (true, 0),
    }
}

#[cfg(test)]
mod tests {
    use super::{compare_tasks, TaskSort};
    use crate::model::task::{Priority, Task};

    fn task(title: &str, priority: Priority, due_at: Option<i64>, created_at: i64) -> Task {
        let mut task = Task::new(title);
        task.priority = priority;
        task.due_at = due_at;
        task.created_at = created_at;
        task
    }

    fn titles(sort: TaskSort, tasks: &mut [Task]) -> Vec<String> {
        tasks.sort_by(|a, b| compare_tasks(sort, a, b));
        tasks.iter().map(|task| task.title.clone()).collect()
    }

    #[test]
    fn sort_orders_follow_selected_key() {
        let mut tasks = vec![
            task("low-soon", Priority::Low, Some(10), 1),
            task("high-undated", Priority::High, None, 2),
            task("high-late", Priority::High, Some(50), 3),
            task("none-undated", Priority::None, None, 4),
        ];

        assert_eq!(
            titles(TaskSort::Priority, &mut tasks),
            ["high-late", "high-undated", "low-soon", "none-undated"]
        );
        assert_eq!(
            titles(TaskSort::DueDate, &mut tasks),
            ["low-soon", "high-late", "high-undated", "none-undated"]
        );
        assert_eq!(
            titles(TaskSort::Created, &mut tasks),
            ["none-undated", "high-late", "high-undated", "low-soon"]
        );
    }
}
