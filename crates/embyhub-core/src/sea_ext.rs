use sea_orm::{DbErr, SqlErr};

pub trait DbErrExt {
    /// `true` when the statement failed on a unique index (duplicate insert race).
    fn is_unique_violation(&self) -> bool;
}

impl DbErrExt for DbErr {
    fn is_unique_violation(&self) -> bool {
        matches!(self.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
    }
}
