use uuid::Uuid;

use crate::exercises::{repo::ExerciseStore, repo_types::Exercise};

/// "chEST" -> "Chest". Muscle groups are stored in this form.
pub fn capitalize_muscle(raw: &str) -> String {
    let mut chars = raw.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

pub async fn list_for(
    store: &dyn ExerciseStore,
    user_id: Uuid,
    muscle: &str,
) -> anyhow::Result<Vec<Exercise>> {
    store.list(user_id, &capitalize_muscle(muscle)).await
}
