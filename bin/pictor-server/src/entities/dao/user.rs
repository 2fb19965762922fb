/// A row in the `users` table.
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub id: i64,
    pub username: String,
    /// Argon2id PHC string.
    pub password_hash: String,
}
