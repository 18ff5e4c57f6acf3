use crate::*;

/// A board bound to a storage key: restored once when opened and written back
/// on [`Session::save`].
#[derive(Debug)]
pub struct Session<S, C = SystemClock> {
    store: S,
    key: String,
    engine: BoardEngine<C>,
}

impl<S: SnapshotStore> Session<S, SystemClock> {
    pub fn open(store: S, key: impl Into<String>, default_config: BoardConfig) -> Result<Self> {
        Self::open_with(store, key, BoardEngine::new(default_config)?)
    }
}

impl<S: SnapshotStore, C: Clock> Session<S, C> {
    /// Opens a session around `engine`, replacing its board with the stored one
    /// when the store holds a usable snapshot.
    pub fn open_with(store: S, key: impl Into<String>, mut engine: BoardEngine<C>) -> Result<Self> {
        let key = key.into();

        match store.get(&key) {
            Ok(Some(snapshot)) => match snapshot.config() {
                Ok(_) => {
                    engine.restore(&snapshot)?;
                    log::debug!("Resumed {:?} at stage {:?}", key, engine.stage());
                }
                Err(err) => log::warn!("Stored board {:?} is unusable: {}", key, err),
            },
            Ok(None) => log::debug!("No stored board for {:?}", key),
            Err(err) => log::warn!("Could not read stored board {:?}: {}", key, err),
        }

        Ok(Self { store, key, engine })
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn engine(&self) -> &BoardEngine<C> {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut BoardEngine<C> {
        &mut self.engine
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Persists the board, or drops the entry while nothing has been played.
    pub fn save(&mut self) -> core::result::Result<(), StoreError> {
        if self.engine.stage().is_ready() {
            return self.store.remove(&self.key);
        }
        self.store.set(&self.key, &self.engine.dump())
    }

    pub fn clear(&mut self) -> core::result::Result<(), StoreError> {
        self.store.remove(&self.key)
    }

    pub fn into_parts(self) -> (S, BoardEngine<C>) {
        (self.store, self.engine)
    }
}
