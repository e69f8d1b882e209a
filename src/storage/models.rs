/// Cached login profile (single row)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    pub username: String,
    pub saved_at: i64,
}
