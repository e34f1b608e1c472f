use std::collections::HashMap;

pub const TEAM_ID_KEY: &str = "fpl_team_id";

/// Key/value storage scoped to a single application session.
///
/// Passed explicitly to whoever needs it; there is no process-wide instance.
pub trait SessionStore: Send {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: String);
    fn clear(&mut self);
}

/// Session store that lives and dies with the process.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    values: HashMap<String, String>,
}

impl SessionStore for MemorySessionStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) {
        self.values.insert(key.to_owned(), value);
    }

    fn clear(&mut self) {
        self.values.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_get_and_clear() {
        let mut store = MemorySessionStore::default();
        assert_eq!(store.get(TEAM_ID_KEY), None);

        store.set(TEAM_ID_KEY, "123456".into());
        store.set(TEAM_ID_KEY, "654321".into());
        assert_eq!(store.get(TEAM_ID_KEY).as_deref(), Some("654321"));

        store.clear();
        assert_eq!(store.get(TEAM_ID_KEY), None);
    }
}
