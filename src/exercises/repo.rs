use std::sync::Mutex;

use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::exercises::repo_types::Exercise;

/// Access to exercise records, always scoped to their owner.
#[async_trait]
pub trait ExerciseStore: Send + Sync {
    /// Records of `user_id` whose muscle group equals `muscle`, oldest first.
    async fn list(&self, user_id: Uuid, muscle: &str) -> anyhow::Result<Vec<Exercise>>;

    /// Delete record `id` if `user_id` owns it. `false` when nothing matched.
    async fn delete(&self, user_id: Uuid, id: Uuid) -> anyhow::Result<bool>;
}

#[derive(Clone)]
pub struct PgExerciseStore {
    db: PgPool,
}

impl PgExerciseStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ExerciseStore for PgExerciseStore {
    async fn list(&self, user_id: Uuid, muscle: &str) -> anyhow::Result<Vec<Exercise>> {
        let rows = sqlx::query_as::<_, Exercise>(
            r#"
            SELECT id, user_id, name, muscle_group, sets, reps, weight_kg, created_at
              FROM exercises
             WHERE user_id = $1 AND muscle_group = $2
             ORDER BY created_at ASC
            "#,
        )
        .bind(user_id)
        .bind(muscle)
        .fetch_all(&self.db)
        .await
        .context("list exercises")?;
        Ok(rows)
    }

    async fn delete(&self, user_id: Uuid, id: Uuid) -> anyhow::Result<bool> {
        let res = sqlx::query("DELETE FROM exercises WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.db)
            .await
            .context("delete exercise")?;
        Ok(res.rows_affected() > 0)
    }
}

#[derive(Default)]
pub struct MemoryExerciseStore {
    rows: Mutex<Vec<Exercise>>,
}

impl MemoryExerciseStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> anyhow::Result<std::sync::MutexGuard<'_, Vec<Exercise>>> {
        self.rows
            .lock()
            .map_err(|_| anyhow::anyhow!("exercise store lock poisoned"))
    }

    pub fn insert(&self, exercise: Exercise) -> anyhow::Result<()> {
        self.lock()?.push(exercise);
        Ok(())
    }
}

#[async_trait]
impl ExerciseStore for MemoryExerciseStore {
    async fn list(&self, user_id: Uuid, muscle: &str) -> anyhow::Result<Vec<Exercise>> {
        let rows = self.lock()?;
        let mut found: Vec<Exercise> = rows
            .iter()
            .filter(|e| e.user_id == user_id && e.muscle_group == muscle)
            .cloned()
            .collect();
        found.sort_by_key(|e| e.created_at);
        Ok(found)
    }

    async fn delete(&self, user_id: Uuid, id: Uuid) -> anyhow::Result<bool> {
        let mut rows = self.lock()?;
        let before = rows.len();
        rows.retain(|e| !(e.id == id && e.user_id == user_id));
        Ok(rows.len() < before)
    }
}

#[cfg(test)]
mod tests {
    use time::{Duration, OffsetDateTime};

    use super::*;

    fn exercise(user_id: Uuid, name: &str, muscle: &str, age_min: i64) -> Exercise {
        Exercise {
            id: Uuid::new_v4(),
            user_id,
            name: name.into(),
            muscle_group: muscle.into(),
            sets: 3,
            reps: 10,
            weight_kg: None,
            created_at: OffsetDateTime::now_utc() - Duration::minutes(age_min),
        }
    }

    #[tokio::test]
    async fn memory_store_filters_by_user_and_muscle() {
        let store = MemoryExerciseStore::new();
        let me = Uuid::new_v4();
        let other = Uuid::new_v4();
        store.insert(exercise(me, "Incline press", "Chest", 1)).unwrap();
        store.insert(exercise(me, "Bench press", "Chest", 10)).unwrap();
        store.insert(exercise(me, "Squat", "Legs", 5)).unwrap();
        store.insert(exercise(other, "Dips", "Chest", 3)).unwrap();

        let chest = store.list(me, "Chest").await.unwrap();
        let names: Vec<_> = chest.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["Bench press", "Incline press"]);

        assert!(store.list(me, "chest").await.unwrap().is_empty());
        assert!(store.list(me, "Back").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn memory_store_deletes_only_owned_rows() {
        let store = MemoryExerciseStore::new();
        let me = Uuid::new_v4();
        let other = Uuid::new_v4();
        let mine = exercise(me, "Bench press", "Chest", 1);
        let theirs = exercise(other, "Dips", "Chest", 1);
        let (mine_id, theirs_id) = (mine.id, theirs.id);
        store.insert(mine).unwrap();
        store.insert(theirs).unwrap();

        assert!(!store.delete(me, theirs_id).await.unwrap());
        assert_eq!(store.list(other, "Chest").await.unwrap().len(), 1);

        assert!(store.delete(me, mine_id).await.unwrap());
        assert!(!store.delete(me, mine_id).await.unwrap());
        assert!(store.list(me, "Chest").await.unwrap().is_empty());
    }
}
