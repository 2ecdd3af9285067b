/// Trait for loading service configuration from environment variables.
///
/// Implementors derive `serde::Deserialize`; field names map to upper-cased
/// env vars (`database_url` ← `DATABASE_URL`). A `.env` file in the working
/// directory is loaded first when present, without overriding variables that
/// are already set.
pub trait Config: Sized + serde::de::DeserializeOwned {
    fn from_env() -> Result<Self, envy::Error> {
        let _ = dotenv::dotenv();
        envy::from_env()
    }

    /// Load from an explicit set of key/value pairs (tests, tooling).
    fn from_pairs<I>(pairs: I) -> Result<Self, envy::Error>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        envy::from_iter(pairs)
    }
}
