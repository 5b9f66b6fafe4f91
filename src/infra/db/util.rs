use crate::application::repos::RepoError;

// SQLSTATE classes: 23505 unique violation, other 23xxx integrity
// violations, 22xxx data exceptions, 57014 cancelled statement.
pub fn map_sqlx_error(err: sqlx::Error) -> RepoError {
    match err {
        sqlx::Error::RowNotFound => RepoError::NotFound,
        sqlx::Error::Database(db) => {
            let code = db.code().map(|code| code.into_owned()).unwrap_or_default();
            match code.as_str() {
                "23505" => RepoError::Duplicate {
                    constraint: db.constraint().unwrap_or("unknown").to_string(),
                },
                "57014" => RepoError::Timeout,
                _ if code.starts_with("22") || code.starts_with("23") => {
                    RepoError::InvalidInput {
                        message: db.message().to_string(),
                    }
                }
                _ => RepoError::from_persistence(db.message()),
            }
        }
        other => RepoError::from_persistence(other),
    }
}
