/// Database row types. These map directly to SQLite rows and never leave the
/// server; the password column holds a PHC hash string.

#[derive(Debug, Clone)]
pub struct UserRow {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub password: String,
    pub created_at: String,
}
