//! Generic record access
//!
//! Parameterized query/insert/update helpers shared by every component. Table
//! and column names come only from the [`Table`] and [`Column`] enums, and
//! every value is bound as a parameter, so no caller-supplied text ever ends
//! up inside a statement.

use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection, OptionalExtension, Params, Row};

use super::error::{StoreError, StoreResult};
use super::transaction::TransactionCoordinator;

/// Tables writable through [`insert`] and [`update`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Users,
    UserLevels,
    Badges,
    UserBadges,
    XpBonuses,
    StudyLogs,
    Goals,
    MockExams,
    MoodLogs,
    Friendships,
}

/// Column identifiers known at compile time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    Id,
    Username,
    CreatedAt,
    UserId,
    CurrentLevel,
    CurrentXp,
    TotalXp,
    UpdatedAt,
    Name,
    Description,
    Icon,
    Category,
    RequirementType,
    RequirementValue,
    Points,
    BadgeId,
    EarnedDate,
    Amount,
    Reason,
    AwardedAt,
    Subject,
    Topic,
    Duration,
    Date,
    PerformanceRating,
    Notes,
    Title,
    Deadline,
    Progress,
    Completed,
    ExamType,
    ExamDate,
    TotalTime,
    SubjectResults,
    Mood,
    StressLevel,
    FriendId,
    Status,
}

impl Table {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Users => "users",
            Self::UserLevels => "user_levels",
            Self::Badges => "badges",
            Self::UserBadges => "user_badges",
            Self::XpBonuses => "xp_bonuses",
            Self::StudyLogs => "study_logs",
            Self::Goals => "goals",
            Self::MockExams => "mock_exams",
            Self::MoodLogs => "mood_logs",
            Self::Friendships => "friendships",
        }
    }

    /// Columns of this table that the helpers may reference
    pub fn columns(&self) -> &'static [Column] {
        use Column::*;
        match self {
            Self::Users => &[Id, Username, CreatedAt],
            Self::UserLevels => &[UserId, CurrentLevel, CurrentXp, TotalXp, UpdatedAt],
            Self::Badges => &[
                Id,
                Name,
                Description,
                Icon,
                Category,
                RequirementType,
                RequirementValue,
                Points,
            ],
            Self::UserBadges => &[Id, UserId, BadgeId, EarnedDate],
            Self::XpBonuses => &[Id, UserId, Amount, Reason, AwardedAt],
            Self::StudyLogs => &[
                Id,
                UserId,
                Subject,
                Topic,
                Duration,
                Date,
                PerformanceRating,
                Notes,
            ],
            Self::Goals => &[Id, UserId, Title, Deadline, Progress, Completed, UpdatedAt],
            Self::MockExams => &[Id, UserId, ExamType, ExamDate, TotalTime, SubjectResults],
            Self::MoodLogs => &[Id, UserId, Mood, StressLevel, Notes, Date],
            Self::Friendships => &[Id, UserId, FriendId, Status, UpdatedAt],
        }
    }

    fn check(&self, column: Column) -> StoreResult<&'static str> {
        if self.columns().contains(&column) {
            Ok(column.as_str())
        } else {
            Err(StoreError::InvalidField {
                table: self.as_str(),
                column: column.as_str(),
            })
        }
    }
}

impl Column {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Username => "username",
            Self::CreatedAt => "created_at",
            Self::UserId => "user_id",
            Self::CurrentLevel => "current_level",
            Self::CurrentXp => "current_xp",
            Self::TotalXp => "total_xp",
            Self::UpdatedAt => "updated_at",
            Self::Name => "name",
            Self::Description => "description",
            Self::Icon => "icon",
            Self::Category => "category",
            Self::RequirementType => "requirement_type",
            Self::RequirementValue => "requirement_value",
            Self::Points => "points",
            Self::BadgeId => "badge_id",
            Self::EarnedDate => "earned_date",
            Self::Amount => "amount",
            Self::Reason => "reason",
            Self::AwardedAt => "awarded_at",
            Self::Subject => "subject",
            Self::Topic => "topic",
            Self::Duration => "duration",
            Self::Date => "date",
            Self::PerformanceRating => "performance_rating",
            Self::Notes => "notes",
            Self::Title => "title",
            Self::Deadline => "deadline",
            Self::Progress => "progress",
            Self::Completed => "completed",
            Self::ExamType => "exam_type",
            Self::ExamDate => "exam_date",
            Self::TotalTime => "total_time",
            Self::SubjectResults => "subject_results",
            Self::Mood => "mood",
            Self::StressLevel => "stress_level",
            Self::FriendId => "friend_id",
            Self::Status => "status",
        }
    }
}

/// Typed construction of a record from a result row
pub trait FromRow: Sized {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self>;
}

impl FromRow for i64 {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        row.get(0)
    }
}

impl FromRow for f64 {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        row.get(0)
    }
}

impl FromRow for String {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        row.get(0)
    }
}

/// Run `sql` and map the first row, if any
pub fn query_one<T: FromRow, P: Params>(
    conn: &Connection,
    sql: &'static str,
    params: P,
) -> StoreResult<Option<T>> {
    let mut stmt = conn.prepare_cached(sql)?;
    Ok(stmt.query_row(params, T::from_row).optional()?)
}

/// Run `sql` and map every row
pub fn query_many<T: FromRow, P: Params>(
    conn: &Connection,
    sql: &'static str,
    params: P,
) -> StoreResult<Vec<T>> {
    let mut stmt = conn.prepare_cached(sql)?;
    let rows = stmt
        .query_map(params, T::from_row)?
        .collect::<rusqlite::Result<Vec<T>>>()?;
    Ok(rows)
}

/// Insert one row and return its rowid
pub fn insert(conn: &Connection, table: Table, fields: &[(Column, Value)]) -> StoreResult<i64> {
    let sql = insert_sql(table, fields)?;
    conn.execute(&sql, params_from_iter(fields.iter().map(|(_, v)| v)))?;
    Ok(conn.last_insert_rowid())
}

/// Update rows matching every `(column, value)` equality in `filter`.
///
/// Returns the number of rows changed.
pub fn update(
    conn: &Connection,
    table: Table,
    fields: &[(Column, Value)],
    filter: &[(Column, Value)],
) -> StoreResult<usize> {
    let sql = update_sql(table, fields, filter)?;
    let values = fields.iter().chain(filter.iter()).map(|(_, v)| v);
    Ok(conn.execute(&sql, params_from_iter(values))?)
}

fn insert_sql(table: Table, fields: &[(Column, Value)]) -> StoreResult<String> {
    if fields.is_empty() {
        return Err(StoreError::EmptyStatement("insert"));
    }
    let columns = fields
        .iter()
        .map(|(c, _)| table.check(*c))
        .collect::<StoreResult<Vec<_>>>()?;
    let placeholders = (1..=columns.len())
        .map(|i| format!("?{i}"))
        .collect::<Vec<_>>();
    Ok(format!(
        "INSERT INTO {} ({}) VALUES ({})",
        table.as_str(),
        columns.join(", "),
        placeholders.join(", ")
    ))
}

fn update_sql(
    table: Table,
    fields: &[(Column, Value)],
    filter: &[(Column, Value)],
) -> StoreResult<String> {
    if fields.is_empty() || filter.is_empty() {
        return Err(StoreError::EmptyStatement("update"));
    }
    let mut index = 0;
    let mut assign = |(c, _): &(Column, Value)| -> StoreResult<String> {
        index += 1;
        Ok(format!("{} = ?{index}", table.check(*c)?))
    };
    let set = fields.iter().map(&mut assign).collect::<StoreResult<Vec<_>>>()?;
    let condition = filter.iter().map(&mut assign).collect::<StoreResult<Vec<_>>>()?;
    Ok(format!(
        "UPDATE {} SET {} WHERE {}",
        table.as_str(),
        set.join(", "),
        condition.join(" AND ")
    ))
}

impl TransactionCoordinator {
    /// [`query_one`] in its own read transaction
    pub fn query_one<T: FromRow, P: Params + Clone>(
        &self,
        sql: &'static str,
        params: P,
    ) -> StoreResult<Option<T>> {
        self.with_read_transaction(|tx| query_one(tx, sql, params.clone()))
    }

    /// [`query_many`] in its own read transaction
    pub fn query_many<T: FromRow, P: Params + Clone>(
        &self,
        sql: &'static str,
        params: P,
    ) -> StoreResult<Vec<T>> {
        self.with_read_transaction(|tx| query_many(tx, sql, params.clone()))
    }

    /// [`insert`] in its own write transaction
    pub fn insert(&self, table: Table, fields: &[(Column, Value)]) -> StoreResult<i64> {
        self.with_transaction(|tx| insert(tx, table, fields))
    }

    /// [`update`] in its own write transaction
    pub fn update(
        &self,
        table: Table,
        fields: &[(Column, Value)],
        filter: &[(Column, Value)],
    ) -> StoreResult<usize> {
        self.with_transaction(|tx| update(tx, table, fields, filter))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_sql_numbers_placeholders() {
        let sql = insert_sql(
            Table::XpBonuses,
            &[
                (Column::UserId, Value::Integer(1)),
                (Column::Amount, Value::Integer(50)),
                (Column::Reason, Value::Text("streak".to_string())),
            ],
        )
        .unwrap();
        assert_eq!(
            sql,
            "INSERT INTO xp_bonuses (user_id, amount, reason) VALUES (?1, ?2, ?3)"
        );
    }

    #[test]
    fn test_update_sql_binds_filter_after_fields() {
        let sql = update_sql(
            Table::UserLevels,
            &[
                (Column::CurrentXp, Value::Integer(10)),
                (Column::TotalXp, Value::Integer(20)),
            ],
            &[(Column::UserId, Value::Integer(7))],
        )
        .unwrap();
        assert_eq!(
            sql,
            "UPDATE user_levels SET current_xp = ?1, total_xp = ?2 WHERE user_id = ?3"
        );
    }

    #[test]
    fn test_column_outside_table_is_rejected() {
        let err = insert_sql(Table::Users, &[(Column::Points, Value::Integer(1))]).unwrap_err();
        assert!(matches!(
            err,
            StoreError::InvalidField { table: "users", column: "points" }
        ));
    }

    #[test]
    fn test_update_without_filter_is_rejected() {
        let err =
            update_sql(Table::Goals, &[(Column::Progress, Value::Integer(5))], &[]).unwrap_err();
        assert!(matches!(err, StoreError::EmptyStatement("update")));
    }
}
