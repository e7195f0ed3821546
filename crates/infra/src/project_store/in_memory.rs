use std::collections::BTreeMap;
use std::sync::RwLock;

use async_trait::async_trait;

use nommer_core::{Event, Project, ProjectName, ProjectSummary};

use super::r#trait::{ProjectStore, ProjectStoreError};

/// In-memory project document store.
///
/// Intended for tests/dev. The map key doubles as the unique index on `name`,
/// and every operation holds the lock for its whole duration, so each call is
/// atomic with respect to the others.
#[derive(Debug, Default)]
pub struct InMemoryProjectStore {
    projects: RwLock<BTreeMap<ProjectName, Project>>,
}

impl InMemoryProjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn poisoned() -> ProjectStoreError {
        ProjectStoreError::Backend("lock poisoned".to_string())
    }
}

#[async_trait]
impl ProjectStore for InMemoryProjectStore {
    async fn find_by_name(
        &self,
        name: &ProjectName,
    ) -> Result<Option<Project>, ProjectStoreError> {
        let projects = self.projects.read().map_err(|_| Self::poisoned())?;
        Ok(projects.get(name).cloned())
    }

    async fn insert(&self, project: &Project) -> Result<(), ProjectStoreError> {
        let mut projects = self.projects.write().map_err(|_| Self::poisoned())?;
        if projects.contains_key(&project.name) {
            return Err(ProjectStoreError::NameTaken(project.name.to_string()));
        }
        projects.insert(project.name.clone(), project.clone());
        Ok(())
    }

    async fn push_event(
        &self,
        name: &ProjectName,
        event: &Event,
    ) -> Result<(), ProjectStoreError> {
        let mut projects = self.projects.write().map_err(|_| Self::poisoned())?;
        let project = projects
            .get_mut(name)
            .ok_or_else(|| ProjectStoreError::NotFound(name.to_string()))?;
        project.events.push(event.clone());
        Ok(())
    }

    async fn list(&self) -> Result<Vec<ProjectSummary>, ProjectStoreError> {
        let projects = self.projects.read().map_err(|_| Self::poisoned())?;
        Ok(projects.values().map(Project::summary).collect())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use nommer_core::ApiKey;
    use serde_json::{Map, json};

    use super::*;

    fn project(name: &str) -> Project {
        Project::register(ProjectName::parse(name).unwrap(), ApiKey::new(format!("key-{name}")))
    }

    fn event(x: i64) -> Event {
        let mut data = Map::new();
        data.insert("x".to_string(), json!(x));
        Event::accept(data)
    }

    #[tokio::test]
    async fn insert_then_find() {
        let store = InMemoryProjectStore::new();
        let p = project("alpha");
        store.insert(&p).await.unwrap();

        let found = store.find_by_name(&p.name).await.unwrap().unwrap();
        assert_eq!(found, p);

        let missing = ProjectName::parse("beta").unwrap();
        assert!(store.find_by_name(&missing).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn duplicate_name_is_rejected_and_original_kept() {
        let store = InMemoryProjectStore::new();
        let first = project("alpha");
        store.insert(&first).await.unwrap();

        let second = project("alpha");
        let err = store.insert(&second).await.unwrap_err();
        assert!(matches!(err, ProjectStoreError::NameTaken(_)));

        let found = store.find_by_name(&first.name).await.unwrap().unwrap();
        assert_eq!(found.id, first.id);
    }

    #[tokio::test]
    async fn push_appends_in_call_order() {
        let store = InMemoryProjectStore::new();
        let p = project("alpha");
        store.insert(&p).await.unwrap();

        store.push_event(&p.name, &event(1)).await.unwrap();
        store.push_event(&p.name, &event(2)).await.unwrap();

        let found = store.find_by_name(&p.name).await.unwrap().unwrap();
        let xs: Vec<_> = found.events.iter().map(|e| e.data["x"].clone()).collect();
        assert_eq!(xs, vec![json!(1), json!(2)]);
    }

    #[tokio::test]
    async fn push_to_unknown_project_is_not_found() {
        let store = InMemoryProjectStore::new();
        let name = ProjectName::parse("ghost").unwrap();
        let err = store.push_event(&name, &event(1)).await.unwrap_err();
        assert!(matches!(err, ProjectStoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn list_is_ordered_by_name() {
        let store = InMemoryProjectStore::new();
        for name in ["gamma", "alpha", "beta"] {
            store.insert(&project(name)).await.unwrap();
        }
        let alpha = ProjectName::parse("alpha").unwrap();
        store.push_event(&alpha, &event(1)).await.unwrap();

        let listed = store.list().await.unwrap();
        let names: Vec<_> = listed.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["alpha", "beta", "gamma"]);
        assert_eq!(listed[0].event_count, 1);
        assert_eq!(listed[1].event_count, 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_pushes_are_not_lost() {
        let store = Arc::new(InMemoryProjectStore::new());
        let p = project("alpha");
        store.insert(&p).await.unwrap();

        let mut handles = Vec::new();
        for i in 0..64 {
            let store = store.clone();
            let name = p.name.clone();
            handles.push(tokio::spawn(async move {
                store.push_event(&name, &event(i)).await
            }));
        }
        for h in handles {
            h.await.unwrap().unwrap();
        }

        let found = store.find_by_name(&p.name).await.unwrap().unwrap();
        assert_eq!(found.events.len(), 64);
    }
}
