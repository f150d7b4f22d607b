use crate::schema::{attendance, auth_sessions, class_students, classes, principals, sessions};
use chrono::{NaiveDate, NaiveDateTime};
use diesel::backend::Backend;
use diesel::deserialize::{self, FromSql, FromSqlRow};
use diesel::expression::AsExpression;
use diesel::prelude::*;
use diesel::serialize::{self, IsNull, Output, ToSql};
use diesel::sql_types::Text;
use diesel::sqlite::Sqlite;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// An authenticated instructor account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub id: String,
    pub email: String,
}

#[derive(Queryable, Selectable, Insertable, Identifiable, Debug, Clone, PartialEq, Eq)]
#[diesel(table_name = classes)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Class {
    pub id: String,
    pub owner_id: String,
    pub name: String,
    pub term: String,
    pub created_at: NaiveDateTime,
}

/// A roster entry belonging to exactly one [`Class`].
#[derive(Queryable, Selectable, Insertable, Identifiable, Debug, Clone, PartialEq, Eq)]
#[diesel(table_name = class_students)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct EnrolledStudent {
    pub id: String,
    pub class_id: String,
    pub name: String,
    pub email: String,
    pub created_at: NaiveDateTime,
}

/// A dated meeting of a [`Class`] against which attendance is recorded.
#[derive(Queryable, Selectable, Insertable, Identifiable, Debug, Clone, PartialEq, Eq)]
#[diesel(table_name = sessions)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Session {
    pub id: String,
    pub class_id: String,
    pub date: NaiveDate,
    pub created_at: NaiveDateTime,
}

/// The recorded [`Status`] of one student in one session. There is at most one per
/// `(session_id, user_id)` pair.
#[derive(Queryable, Selectable, Insertable, Identifiable, Debug, Clone, PartialEq, Eq)]
#[diesel(table_name = attendance)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct AttendanceRecord {
    pub id: String,
    pub session_id: String,
    pub user_id: String,
    pub status: Status,
    pub updated_at: NaiveDateTime,
}

#[derive(Queryable, Selectable, Insertable, Debug, Clone)]
#[diesel(table_name = principals)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct PrincipalRow {
    pub id: String,
    pub email: String,
    pub password_hash: String,
    pub email_confirmed: bool,
    pub created_at: NaiveDateTime,
}

#[derive(Queryable, Selectable, Insertable, Debug, Clone)]
#[diesel(table_name = auth_sessions)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct AuthSessionRow {
    pub access_token: String,
    pub principal_id: String,
    pub expires_at: NaiveDateTime,
    pub created_at: NaiveDateTime,
}

/// Attendance status of a student for a session.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    AsExpression,
    FromSqlRow,
    clap::ValueEnum,
)]
#[diesel(sql_type = Text)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Present,
    Absent,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Present => "present",
            Status::Absent => "absent",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "present" => Ok(Status::Present),
            "absent" => Ok(Status::Absent),
            other => Err(format!("unrecognized attendance status `{other}`")),
        }
    }
}

impl ToSql<Text, Sqlite> for Status {
    fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Sqlite>) -> serialize::Result {
        out.set_value(self.as_str());
        Ok(IsNull::No)
    }
}

impl FromSql<Text, Sqlite> for Status {
    fn from_sql(bytes: <Sqlite as Backend>::RawValue<'_>) -> deserialize::Result<Self> {
        let raw = <String as FromSql<Text, Sqlite>>::from_sql(bytes)?;
        raw.parse().map_err(Into::into)
    }
}
