use serde::Serialize;
use std::collections::HashMap;

use super::Task;
use crate::error::{Error, Result};
use crate::utils::suggest::suggest;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskSummary {
    pub name: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,
    pub help: String,
    pub is_default: bool,
    pub hooks: Vec<&'static str>,
}

/// Every task known to the process, looked up by name or alias.
#[derive(Default)]
pub struct TaskRegistry {
    tasks: Vec<Task>,
    index: HashMap<String, usize>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, task: Task) -> Result<()> {
        let position = self.tasks.len();
        let mut names = vec![task.name.clone()];
        names.extend(task.aliases.iter().cloned());

        for name in &names {
            if self.index.contains_key(name) {
                return Err(Error::validation_invalid_argument(
                    "task",
                    format!("Task name or alias '{}' is already registered", name),
                    None,
                ));
            }
        }

        if task.is_default {
            if let Some(existing) = self.default_task() {
                return Err(Error::validation_invalid_argument(
                    "task",
                    format!(
                        "'{}' cannot be the default task, '{}' already is",
                        task.name, existing.name
                    ),
                    None,
                ));
            }
        }

        for name in names {
            self.index.insert(name, position);
        }
        self.tasks.push(task);
        Ok(())
    }

    /// Resolve a name or alias. Dashes and underscores are interchangeable.
    pub fn get(&self, name: &str) -> Result<&Task> {
        let underscored = name.replace('-', "_");
        self.index
            .get(name)
            .or_else(|| self.index.get(&underscored))
            .map(|&i| &self.tasks[i])
            .ok_or_else(|| {
                let known: Vec<&str> = self.index.keys().map(String::as_str).collect();
                Error::task_not_found(name, suggest(name, &known))
            })
    }

    pub fn default_task(&self) -> Option<&Task> {
        self.tasks.iter().find(|t| t.is_default)
    }

    pub fn tasks(&self) -> impl Iterator<Item = &Task> {
        self.tasks.iter()
    }

    pub fn summaries(&self) -> Vec<TaskSummary> {
        let mut summaries: Vec<TaskSummary> = self
            .tasks
            .iter()
            .map(|t| TaskSummary {
                name: t.name.clone(),
                aliases: t.aliases.clone(),
                help: t.help.clone(),
                is_default: t.is_default,
                hooks: t.hook_names(),
            })
            .collect();
        summaries.sort_by(|a, b| a.name.cmp(&b.name));
        summaries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::{Args, ExecutionContext};
    use serde_json::Value;

    fn noop(_: &mut ExecutionContext<'_>, _: &Args) -> Result<Value> {
        Ok(Value::Null)
    }

    #[test]
    fn aliases_and_dashes_resolve() {
        let mut registry = TaskRegistry::new();
        registry
            .register(
                Task::new("full_deploy_with_migrate", noop)
                    .alias("extra-full-deploy")
                    .alias("xfull-deploy"),
            )
            .unwrap();

        assert_eq!(registry.get("xfull-deploy").unwrap().name, "full_deploy_with_migrate");
        assert_eq!(registry.get("extra-full-deploy").unwrap().name, "full_deploy_with_migrate");
        assert_eq!(registry.get("full-deploy-with-migrate").unwrap().name, "full_deploy_with_migrate");
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let mut registry = TaskRegistry::new();
        registry.register(Task::new("pull", noop)).unwrap();
        let err = registry
            .register(Task::new("full_pull", noop).alias("pull"))
            .unwrap_err();
        assert_eq!(err.code.as_str(), "validation.invalid_argument");
    }

    #[test]
    fn only_one_default_task() {
        let mut registry = TaskRegistry::new();
        registry.register(Task::new("a", noop).default_task()).unwrap();
        assert!(registry.register(Task::new("b", noop).default_task()).is_err());
        assert_eq!(registry.default_task().unwrap().name, "a");
    }

    #[test]
    fn summaries_are_sorted() {
        let mut registry = TaskRegistry::new();
        registry.register(Task::new("pull", noop).help("git pull")).unwrap();
        registry.register(Task::new("bounce_services", noop).alias("bounce")).unwrap();
        let names: Vec<String> = registry.summaries().into_iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["bounce_services", "pull"]);
    }
}
