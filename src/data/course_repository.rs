use crate::domain::models::Course;
use crate::domain::repository::CourseRepository;
use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, instrument, trace};

#[derive(Clone)]
pub struct InMemoryCourseRepository {
    storage: Arc<RwLock<HashMap<String, Course>>>,
}

impl InMemoryCourseRepository {
    pub fn new() -> Self {
        Self {
            storage: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl Default for InMemoryCourseRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CourseRepository for InMemoryCourseRepository {
    #[instrument(skip(self), fields(course_id = %course.id, title = %course.title))]
    async fn save_course(&self, course: Course) -> Result<()> {
        let mut storage = self.storage.write().await;
        debug!(
            course_id = %course.id,
            dates = course.dates.len(),
            "Course saved to memory storage"
        );
        storage.insert(course.id.clone(), course);
        Ok(())
    }

    #[instrument(skip(self), fields(course_id = id))]
    async fn find_course_by_id(&self, id: &str) -> Result<Option<Course>> {
        let storage = self.storage.read().await;
        let course = storage.get(id).cloned();
        if course.is_none() {
            trace!(course_id = id, "Course not found in storage");
        }
        Ok(course)
    }

    #[instrument(skip(self))]
    async fn list_courses(&self) -> Result<Vec<Course>> {
        let storage = self.storage.read().await;
        let mut courses: Vec<Course> = storage.values().cloned().collect();
        courses.sort_by(|a, b| a.title.cmp(&b.title).then_with(|| a.id.cmp(&b.id)));
        Ok(courses)
    }

    #[instrument(skip(self), fields(course_id = id))]
    async fn delete_course(&self, id: &str) -> Result<Option<Course>> {
        let mut storage = self.storage.write().await;
        let removed = storage.remove(id);
        if removed.is_some() {
            debug!(course_id = id, "Course removed from memory storage");
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::CourseCategory;

    fn course(id: &str, title: &str) -> Course {
        Course {
            id: id.to_string(),
            title: title.to_string(),
            description: None,
            price: 10.0,
            organiser: None,
            lecturer: "lecturer-1".to_string(),
            category: CourseCategory::Meeting,
            dates: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_save_and_find_course() {
        let repo = InMemoryCourseRepository::new();
        repo.save_course(course("c1", "Rust")).await.unwrap();

        let found = repo.find_course_by_id("c1").await.unwrap().unwrap();
        assert_eq!(found.title, "Rust");
        assert!(repo.find_course_by_id("c2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_course_replaces_document() {
        let repo = InMemoryCourseRepository::new();
        repo.save_course(course("c1", "Old")).await.unwrap();
        repo.save_course(course("c1", "New")).await.unwrap();

        let courses = repo.list_courses().await.unwrap();
        assert_eq!(courses.len(), 1);
        assert_eq!(courses[0].title, "New");
    }

    #[tokio::test]
    async fn test_list_courses_is_ordered_by_title() {
        let repo = InMemoryCourseRepository::new();
        repo.save_course(course("c2", "Beta")).await.unwrap();
        repo.save_course(course("c1", "Alpha")).await.unwrap();

        let titles: Vec<String> = repo
            .list_courses()
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.title)
            .collect();
        assert_eq!(titles, vec!["Alpha", "Beta"]);
    }

    #[tokio::test]
    async fn test_delete_course_returns_removed_document() {
        let repo = InMemoryCourseRepository::new();
        repo.save_course(course("c1", "Gone")).await.unwrap();

        let removed = repo.delete_course("c1").await.unwrap();
        assert_eq!(removed.unwrap().title, "Gone");
        assert!(repo.delete_course("c1").await.unwrap().is_none());
        assert!(repo.find_course_by_id("c1").await.unwrap().is_none());
    }
}
